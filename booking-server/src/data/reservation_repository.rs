use crate::data::rows::{ReservationDetailsRow, ReservationRow};
use crate::data::slot_repository::{claim_slot, release_slot};
use crate::domain::error::DomainError;
use crate::domain::reservation::{Reservation, ReservationDetails, ReservationStatus};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{error, info};
use uuid::Uuid;

#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Claims the slot and records the reservation as one unit. Fails with a
    /// conflict when the slot is no longer available at `booking_time`.
    async fn book(&self, reservation: Reservation) -> Result<Reservation, DomainError>;
    async fn find_details(&self, id: Uuid) -> Result<Option<ReservationDetails>, DomainError>;
    /// Newest booking first.
    async fn list_for_customer(&self, customer_id: Uuid)
    -> Result<Vec<ReservationDetails>, DomainError>;
    /// Newest booking first.
    async fn list_for_provider(&self, provider_id: Uuid)
    -> Result<Vec<ReservationDetails>, DomainError>;
    /// Applies a status change under the reservation's row lock. Cancelling an
    /// active reservation frees its slot in the same unit.
    async fn transition(
        &self,
        id: Uuid,
        next: ReservationStatus,
    ) -> Result<Reservation, DomainError>;
}

#[derive(Clone)]
pub struct PostgresReservationRepository {
    pool: PgPool,
}

impl PostgresReservationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const DETAILS_SELECT: &str = r#"
    SELECT r.id, r.slot_id, r.customer_id, r.status, r.booking_time,
           s.provider_id, s.start_time, s.end_time, s.price_minor,
           s.status AS slot_status,
           p.name AS provider_name,
           p.service_type AS provider_service_type,
           c.name AS customer_name,
           c.email AS customer_email
    FROM reservations r
    JOIN slots s ON s.id = r.slot_id
    JOIN users p ON p.id = s.provider_id
    JOIN users c ON c.id = r.customer_id
"#;

fn is_active_slot_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.constraint())
        .map(|c| c.contains("reservations_active_slot"))
        == Some(true)
}

#[async_trait]
impl ReservationRepository for PostgresReservationRepository {
    async fn book(&self, reservation: Reservation) -> Result<Reservation, DomainError> {
        let mut tx = self.pool.begin().await?;

        if !claim_slot(&mut *tx, reservation.slot_id, reservation.booking_time).await? {
            info!(slot_id = %reservation.slot_id, "slot claim lost");
            return Err(DomainError::conflict("slot is no longer available for booking"));
        }

        sqlx::query(
            r#"
            INSERT INTO reservations (id, slot_id, customer_id, status, booking_time)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(reservation.id)
        .bind(reservation.slot_id)
        .bind(reservation.customer_id)
        .bind(reservation.status.as_str())
        .bind(reservation.booking_time)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_active_slot_violation(&e) {
                DomainError::conflict("slot is already booked")
            } else {
                error!("failed to create reservation: {}", e);
                DomainError::Internal(format!("database error: {}", e))
            }
        })?;

        tx.commit().await?;

        info!(
            reservation_id = %reservation.id,
            slot_id = %reservation.slot_id,
            customer_id = %reservation.customer_id,
            status = %reservation.status,
            "reservation created"
        );
        Ok(reservation)
    }

    async fn find_details(&self, id: Uuid) -> Result<Option<ReservationDetails>, DomainError> {
        let row = sqlx::query_as::<_, ReservationDetailsRow>(&format!(
            "{DETAILS_SELECT} WHERE r.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("db error find_details {}: {}", id, e);
            DomainError::Internal(e.to_string())
        })?;

        row.map(ReservationDetails::try_from).transpose()
    }

    async fn list_for_customer(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<ReservationDetails>, DomainError> {
        sqlx::query_as::<_, ReservationDetailsRow>(&format!(
            "{DETAILS_SELECT} WHERE r.customer_id = $1 ORDER BY r.booking_time DESC"
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("db error while fetching reservations of {}: {}", customer_id, e);
            DomainError::Internal(e.to_string())
        })?
        .into_iter()
        .map(ReservationDetails::try_from)
        .collect()
    }

    async fn list_for_provider(
        &self,
        provider_id: Uuid,
    ) -> Result<Vec<ReservationDetails>, DomainError> {
        sqlx::query_as::<_, ReservationDetailsRow>(&format!(
            "{DETAILS_SELECT} WHERE s.provider_id = $1 ORDER BY r.booking_time DESC"
        ))
        .bind(provider_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("db error while fetching reservations for {}: {}", provider_id, e);
            DomainError::Internal(e.to_string())
        })?
        .into_iter()
        .map(ReservationDetails::try_from)
        .collect()
    }

    async fn transition(
        &self,
        id: Uuid,
        next: ReservationStatus,
    ) -> Result<Reservation, DomainError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, ReservationRow>(
            r#"
            SELECT id, slot_id, customer_id, status, booking_time
            FROM reservations WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .map(Reservation::try_from)
        .transpose()?
        .ok_or(DomainError::ReservationNotFound(id))?;

        let status = current.status.transition_to(next)?;
        if status == current.status {
            return Ok(current);
        }

        sqlx::query("UPDATE reservations SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                error!("failed to update reservation {}: {}", id, e);
                DomainError::Internal(e.to_string())
            })?;

        if !status.is_active() && current.status.is_active() {
            release_slot(&mut *tx, current.slot_id).await?;
        }

        tx.commit().await?;

        info!(
            reservation_id = %id,
            from = %current.status,
            to = %status,
            "reservation status updated"
        );
        Ok(Reservation { status, ..current })
    }
}
