use crate::application::civil_time::CivilTime;
use crate::domain::reservation::{ReservationDetails, ReservationStatus};
use crate::domain::slot::{Price, ProviderSlot, Slot, SlotListing, SlotStatus};
use crate::domain::user::{CustomerProfile, ProviderProfile, Role, ServiceType, User};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ======================= AUTH =======================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub service_type: Option<ServiceType>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_type: Option<ServiceType>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role(),
            service_type: user.account.service_type(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: UserView,
    pub token: String,
    pub token_type: String, // "Bearer"
    pub expires_in: i64,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: UserView,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// ======================= SLOTS =======================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSlotsRequest {
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub slot_duration_minutes: i64,
    pub price: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableSlotsQuery {
    pub date: Option<String>,
    pub service_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotView {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub start_time: String,
    pub end_time: String,
    pub price: Price,
    pub status: SlotStatus,
}

impl SlotView {
    pub fn render(slot: &Slot, civil: &CivilTime) -> Self {
        Self {
            id: slot.id,
            provider_id: slot.provider_id,
            start_time: civil.format_minutes(slot.start_time),
            end_time: civil.format_minutes(slot.end_time),
            price: slot.price,
            status: slot.status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateSlotsResponse {
    pub message: String,
    pub count: u64,
    pub slots: Vec<SlotView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableSlotView {
    pub id: Uuid,
    pub start_time: String,
    pub end_time: String,
    pub price: Price,
    pub provider_id: Uuid,
    pub provider_name: String,
    pub service_type: ServiceType,
}

impl AvailableSlotView {
    pub fn render(listing: &SlotListing, civil: &CivilTime) -> Self {
        Self {
            id: listing.slot.id,
            start_time: civil.format_minutes(listing.slot.start_time),
            end_time: civil.format_minutes(listing.slot.end_time),
            price: listing.slot.price,
            provider_id: listing.provider.id,
            provider_name: listing.provider.name.clone(),
            service_type: listing.provider.service_type,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotReservationView {
    pub id: Uuid,
    pub status: ReservationStatus,
    pub booking_time: String,
    pub customer: CustomerSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSlotView {
    pub id: Uuid,
    pub start_time: String,
    pub end_time: String,
    pub price: Price,
    pub status: SlotStatus,
    pub reservation: Option<SlotReservationView>,
}

impl ProviderSlotView {
    pub fn render(entry: &ProviderSlot, civil: &CivilTime) -> Self {
        Self {
            id: entry.slot.id,
            start_time: civil.format_minutes(entry.slot.start_time),
            end_time: civil.format_minutes(entry.slot.end_time),
            price: entry.slot.price,
            status: entry.slot.status,
            reservation: entry
                .reservation
                .as_ref()
                .map(|(reservation, customer)| SlotReservationView {
                    id: reservation.id,
                    status: reservation.status,
                    booking_time: civil.format_seconds(reservation.booking_time),
                    customer: customer.into(),
                }),
        }
    }
}

// ======================= RESERVATIONS =======================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservationRequest {
    pub slot_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct UpdateReservationStatusRequest {
    pub status: ReservationStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSummary {
    pub id: Uuid,
    pub name: String,
    pub service_type: ServiceType,
}

impl From<&ProviderProfile> for ProviderSummary {
    fn from(provider: &ProviderProfile) -> Self {
        Self {
            id: provider.id,
            name: provider.name.clone(),
            service_type: provider.service_type,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CustomerSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&CustomerProfile> for CustomerSummary {
    fn from(customer: &CustomerProfile) -> Self {
        Self {
            id: customer.id,
            name: customer.name.clone(),
            email: customer.email.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationSlotView {
    pub id: Uuid,
    pub start_time: String,
    pub end_time: String,
    pub price: Price,
    pub provider: ProviderSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationView {
    pub id: Uuid,
    pub status: ReservationStatus,
    pub booking_time: String,
    pub slot: ReservationSlotView,
    pub customer: CustomerSummary,
}

impl ReservationView {
    pub fn render(details: &ReservationDetails, civil: &CivilTime) -> Self {
        Self {
            id: details.reservation.id,
            status: details.reservation.status,
            booking_time: civil.format_seconds(details.reservation.booking_time),
            slot: ReservationSlotView {
                id: details.slot.id,
                start_time: civil.format_minutes(details.slot.start_time),
                end_time: civil.format_minutes(details.slot.end_time),
                price: details.slot.price,
                provider: (&details.provider).into(),
            },
            customer: (&details.customer).into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReservationResponse {
    pub message: String,
    pub reservation: ReservationView,
}

// ======================= HEALTH =======================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub timezone: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::civil_time::testing::civil_at;
    use crate::domain::reservation::Reservation;

    #[test]
    fn reservation_view_uses_civil_time_and_camel_case() {
        let (civil, _) = civil_at("2030-06-01", "08:00");
        let provider = ProviderProfile {
            id: Uuid::new_v4(),
            name: "Sparks & Co".into(),
            service_type: ServiceType::Electrician,
        };
        let customer = CustomerProfile {
            id: Uuid::new_v4(),
            name: "Meera".into(),
            email: "meera@example.com".into(),
        };
        let slot = Slot {
            id: Uuid::new_v4(),
            provider_id: provider.id,
            start_time: civil.parse_date_time("2030-06-02", "10:00").unwrap(),
            end_time: civil.parse_date_time("2030-06-02", "10:30").unwrap(),
            price: Price::from_minor(50_000).unwrap(),
            status: SlotStatus::Booked,
        };
        let details = ReservationDetails {
            reservation: Reservation::new(
                slot.id,
                customer.id,
                ReservationStatus::Confirmed,
                civil.now_utc(),
            ),
            slot,
            provider,
            customer,
        };

        let json = serde_json::to_value(ReservationView::render(&details, &civil)).unwrap();
        assert_eq!(json["status"], "confirmed");
        assert_eq!(json["bookingTime"], "2030-06-01 08:00:00");
        assert_eq!(json["slot"]["startTime"], "2030-06-02 10:00");
        assert_eq!(json["slot"]["endTime"], "2030-06-02 10:30");
        assert_eq!(json["slot"]["price"], 500.0);
        assert_eq!(json["slot"]["provider"]["serviceType"], "Electrician");
        assert_eq!(json["customer"]["email"], "meera@example.com");
    }

    #[test]
    fn register_request_uses_camel_case_fields() {
        let request: RegisterRequest = serde_json::from_str(
            r#"{"name":"A","email":"a@b.co","password":"x","role":"provider","serviceType":"CarWasher"}"#,
        )
        .unwrap();
        assert_eq!(request.role, Some(Role::Provider));
        assert_eq!(request.service_type, Some(ServiceType::CarWasher));
    }

    #[test]
    fn status_request_rejects_unknown_status() {
        assert!(serde_json::from_str::<UpdateReservationStatusRequest>(r#"{"status":"done"}"#).is_err());
    }
}
