#[cfg(test)]
pub mod memory;
pub mod reservation_repository;
pub mod rows;
#[cfg(test)]
pub mod seed;
pub mod slot_repository;
pub mod user_repository;
