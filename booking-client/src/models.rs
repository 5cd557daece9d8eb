use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Provider,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceType {
    Electrician,
    Carpentry,
    CarWasher,
    Plumbing,
    ApplianceRepair,
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServiceType::Electrician => "Electrician",
            ServiceType::Carpentry => "Carpentry",
            ServiceType::CarWasher => "CarWasher",
            ServiceType::Plumbing => "Plumbing",
            ServiceType::ApplianceRepair => "ApplianceRepair",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    Available,
    Booked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Cancelled => "cancelled",
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_type: Option<ServiceType>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSlotsRequest {
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub slot_duration_minutes: i64,
    pub price: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub service_type: Option<ServiceType>,
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}> [{:?}]", self.name, self.email, self.role)?;
        if let Some(kind) = self.service_type {
            write!(f, " {kind}")?;
        }
        write!(f, " id={}", self.id)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeResponse {
    pub user: User,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub start_time: String,
    pub end_time: String,
    pub price: f64,
    pub status: SlotStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSlotsResponse {
    pub message: String,
    pub count: u64,
    pub slots: Vec<Slot>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableSlot {
    pub id: Uuid,
    pub start_time: String,
    pub end_time: String,
    pub price: f64,
    pub provider_id: Uuid,
    pub provider_name: String,
    pub service_type: ServiceType,
}

impl fmt::Display for AvailableSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} - {}  {:.2}  {} ({})",
            self.id, self.start_time, self.end_time, self.price, self.provider_name, self.service_type
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomerSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSummary {
    pub id: Uuid,
    pub name: String,
    pub service_type: ServiceType,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotReservation {
    pub id: Uuid,
    pub status: ReservationStatus,
    pub booking_time: String,
    pub customer: CustomerSummary,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSlot {
    pub id: Uuid,
    pub start_time: String,
    pub end_time: String,
    pub price: f64,
    pub status: SlotStatus,
    pub reservation: Option<SlotReservation>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationSlot {
    pub id: Uuid,
    pub start_time: String,
    pub end_time: String,
    pub price: f64,
    pub provider: ProviderSummary,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: Uuid,
    pub status: ReservationStatus,
    pub booking_time: String,
    pub slot: ReservationSlot,
    pub customer: CustomerSummary,
}

impl fmt::Display for Reservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {} - {} with {} for {} (booked {})",
            self.id,
            self.status,
            self.slot.start_time,
            self.slot.end_time,
            self.slot.provider.name,
            self.customer.name,
            self.booking_time
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReservationResponse {
    pub message: String,
    pub reservation: Reservation,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Health {
    pub status: String,
    pub timestamp: String,
    pub timezone: String,
}
