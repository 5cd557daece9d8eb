pub mod auth_service;
pub mod civil_time;
pub mod reservation_service;
pub mod slot_service;
