//! Flat row shapes returned by the SQL queries and their conversion into
//! domain types. Enums are stored as text and parsed on the way out.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::reservation::{Reservation, ReservationDetails, ReservationStatus};
use crate::domain::slot::{Price, ProviderSlot, Slot, SlotListing, SlotStatus};
use crate::domain::user::{Account, CustomerProfile, ProviderProfile, Role, ServiceType, User};

fn corrupt(what: &str, err: DomainError) -> DomainError {
    DomainError::Internal(format!("corrupt {what} row: {err}"))
}

fn provider_profile(
    id: Uuid,
    name: String,
    service_type: Option<String>,
) -> Result<ProviderProfile, DomainError> {
    let service_type = service_type
        .ok_or_else(|| DomainError::Internal(format!("provider {id} has no service type")))?
        .parse::<ServiceType>()
        .map_err(|e| corrupt("provider", e))?;
    Ok(ProviderProfile {
        id,
        name,
        service_type,
    })
}

#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub service_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = DomainError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row.role.parse::<Role>().map_err(|e| corrupt("user", e))?;
        let service_type = row
            .service_type
            .as_deref()
            .map(str::parse::<ServiceType>)
            .transpose()
            .map_err(|e| corrupt("user", e))?;
        let account = Account::from_parts(role, service_type).map_err(|e| corrupt("user", e))?;
        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            account,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct SlotRow {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub price_minor: i64,
    pub status: String,
}

impl TryFrom<SlotRow> for Slot {
    type Error = DomainError;

    fn try_from(row: SlotRow) -> Result<Self, Self::Error> {
        Ok(Slot {
            id: row.id,
            provider_id: row.provider_id,
            start_time: row.start_time,
            end_time: row.end_time,
            price: Price::from_minor(row.price_minor).map_err(|e| corrupt("slot", e))?,
            status: row
                .status
                .parse::<SlotStatus>()
                .map_err(|e| corrupt("slot", e))?,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct SlotListingRow {
    #[sqlx(flatten)]
    pub slot: SlotRow,
    pub provider_name: String,
    pub provider_service_type: Option<String>,
    pub has_active_reservation: bool,
}

impl TryFrom<SlotListingRow> for SlotListing {
    type Error = DomainError;

    fn try_from(row: SlotListingRow) -> Result<Self, Self::Error> {
        let provider = provider_profile(
            row.slot.provider_id,
            row.provider_name,
            row.provider_service_type,
        )?;
        Ok(SlotListing {
            slot: Slot::try_from(row.slot)?,
            provider,
            has_active_reservation: row.has_active_reservation,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct ProviderSlotRow {
    #[sqlx(flatten)]
    pub slot: SlotRow,
    pub reservation_id: Option<Uuid>,
    pub reservation_status: Option<String>,
    pub booking_time: Option<DateTime<Utc>>,
    pub customer_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
}

impl TryFrom<ProviderSlotRow> for ProviderSlot {
    type Error = DomainError;

    fn try_from(row: ProviderSlotRow) -> Result<Self, Self::Error> {
        let slot = Slot::try_from(row.slot)?;
        let reservation = match (
            row.reservation_id,
            row.reservation_status,
            row.booking_time,
            row.customer_id,
            row.customer_name,
            row.customer_email,
        ) {
            (Some(id), Some(status), Some(booking_time), Some(customer_id), Some(name), Some(email)) => {
                let reservation = Reservation {
                    id,
                    slot_id: slot.id,
                    customer_id,
                    status: status
                        .parse::<ReservationStatus>()
                        .map_err(|e| corrupt("reservation", e))?,
                    booking_time,
                };
                let customer = CustomerProfile {
                    id: customer_id,
                    name,
                    email,
                };
                Some((reservation, customer))
            }
            _ => None,
        };
        Ok(ProviderSlot { slot, reservation })
    }
}

#[derive(Debug, FromRow)]
pub struct ReservationRow {
    pub id: Uuid,
    pub slot_id: Uuid,
    pub customer_id: Uuid,
    pub status: String,
    pub booking_time: DateTime<Utc>,
}

impl TryFrom<ReservationRow> for Reservation {
    type Error = DomainError;

    fn try_from(row: ReservationRow) -> Result<Self, Self::Error> {
        Ok(Reservation {
            id: row.id,
            slot_id: row.slot_id,
            customer_id: row.customer_id,
            status: row
                .status
                .parse::<ReservationStatus>()
                .map_err(|e| corrupt("reservation", e))?,
            booking_time: row.booking_time,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct ReservationDetailsRow {
    #[sqlx(flatten)]
    pub reservation: ReservationRow,
    pub provider_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub price_minor: i64,
    pub slot_status: String,
    pub provider_name: String,
    pub provider_service_type: Option<String>,
    pub customer_name: String,
    pub customer_email: String,
}

impl TryFrom<ReservationDetailsRow> for ReservationDetails {
    type Error = DomainError;

    fn try_from(row: ReservationDetailsRow) -> Result<Self, Self::Error> {
        let reservation = Reservation::try_from(row.reservation)?;
        let slot = Slot::try_from(SlotRow {
            id: reservation.slot_id,
            provider_id: row.provider_id,
            start_time: row.start_time,
            end_time: row.end_time,
            price_minor: row.price_minor,
            status: row.slot_status,
        })?;
        let provider = provider_profile(row.provider_id, row.provider_name, row.provider_service_type)?;
        let customer = CustomerProfile {
            id: reservation.customer_id,
            name: row.customer_name,
            email: row.customer_email,
        };
        Ok(ReservationDetails {
            reservation,
            slot,
            provider,
            customer,
        })
    }
}
