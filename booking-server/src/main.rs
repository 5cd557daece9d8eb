mod application;
mod data;
mod domain;
mod infrastructure;
mod presentation;
mod server;

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use application::auth_service::AuthService;
use application::civil_time::CivilTime;
use application::reservation_service::ReservationService;
use application::slot_service::SlotService;
use data::reservation_repository::PostgresReservationRepository;
use data::slot_repository::PostgresSlotRepository;
use data::user_repository::PostgresUserRepository;
use infrastructure::config::AppConfig;
use infrastructure::database::{create_pool, run_migrations};
use infrastructure::logging::init_logging;
use infrastructure::security::JwtKeys;
use server::{AppState, start_rest_server};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let pool = create_pool(&config.database_url)
        .await
        .context("failed to connect to database")?;
    run_migrations(&pool)
        .await
        .context("failed to run migrations")?;

    let civil = Arc::new(CivilTime::system(config.civil_offset));
    info!(
        timezone = %civil.offset_label(),
        initial_status = %config.initial_status,
        "civil time configured"
    );

    let user_repo = Arc::new(PostgresUserRepository::new(pool.clone()));
    let slot_repo = Arc::new(PostgresSlotRepository::new(pool.clone()));
    let reservation_repo = Arc::new(PostgresReservationRepository::new(pool.clone()));

    let state = AppState {
        auth: Arc::new(AuthService::new(
            Arc::clone(&user_repo),
            JwtKeys::new(config.jwt_secret.clone(), config.jwt_ttl_hours),
        )),
        slots: Arc::new(SlotService::new(
            Arc::clone(&slot_repo),
            Arc::clone(&user_repo),
            Arc::clone(&civil),
        )),
        reservations: Arc::new(ReservationService::new(
            reservation_repo,
            slot_repo,
            user_repo,
            Arc::clone(&civil),
            config.initial_status,
        )),
        civil,
    };

    start_rest_server(config, state).await
}
