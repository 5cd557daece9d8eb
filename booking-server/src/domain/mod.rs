pub mod error;
pub mod reservation;
pub mod slot;
pub mod user;
