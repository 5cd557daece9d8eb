//! Typed HTTP client for the booking service.

use async_trait::async_trait;
use uuid::Uuid;

mod error;
mod http_client;
pub mod models;

pub use error::BookingClientError;
pub use http_client::{BookingClientHttp, DEFAULT_TOKEN_FILE};
pub use models::*;

/// Every operation the booking service exposes, one method per endpoint.
#[async_trait(?Send)]
pub trait BookingClientTrait {
    async fn register(&mut self, request: RegisterRequest) -> Result<User, BookingClientError>;
    async fn login(&mut self, email: String, password: String)
    -> Result<User, BookingClientError>;
    async fn me(&self) -> Result<User, BookingClientError>;
    async fn logout(&mut self) -> Result<String, BookingClientError>;

    async fn create_slots(
        &self,
        request: CreateSlotsRequest,
    ) -> Result<CreateSlotsResponse, BookingClientError>;
    async fn provider_slots(&self) -> Result<Vec<ProviderSlot>, BookingClientError>;
    async fn available_slots(
        &self,
        date: &str,
        service_type: ServiceType,
    ) -> Result<Vec<AvailableSlot>, BookingClientError>;
    async fn get_slot(&self, id: Uuid) -> Result<AvailableSlot, BookingClientError>;
    async fn delete_slot(&self, id: Uuid) -> Result<String, BookingClientError>;

    async fn book(&self, slot_id: Uuid) -> Result<ReservationResponse, BookingClientError>;
    async fn customer_reservations(&self) -> Result<Vec<Reservation>, BookingClientError>;
    async fn provider_reservations(&self) -> Result<Vec<Reservation>, BookingClientError>;
    async fn update_reservation_status(
        &self,
        id: Uuid,
        status: ReservationStatus,
    ) -> Result<ReservationResponse, BookingClientError>;
    async fn cancel_reservation(&self, id: Uuid)
    -> Result<ReservationResponse, BookingClientError>;
    async fn confirm_reservation(
        &self,
        id: Uuid,
    ) -> Result<ReservationResponse, BookingClientError>;

    async fn health(&self) -> Result<Health, BookingClientError>;
}
