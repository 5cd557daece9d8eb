use crate::application::auth_service::AuthService;
use crate::application::reservation_service::ReservationService;
use crate::application::slot_service::SlotService;
use crate::data::reservation_repository::PostgresReservationRepository;
use crate::data::slot_repository::PostgresSlotRepository;
use crate::data::user_repository::PostgresUserRepository;

pub mod auth;
pub mod reservation;
pub mod slot;

pub type AppAuthService = AuthService<PostgresUserRepository>;
pub type AppSlotService = SlotService<PostgresSlotRepository, PostgresUserRepository>;
pub type AppReservationService = ReservationService<
    PostgresReservationRepository,
    PostgresSlotRepository,
    PostgresUserRepository,
>;
