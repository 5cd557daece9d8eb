use crate::data::rows::{ProviderSlotRow, SlotListingRow, SlotRow};
use crate::domain::error::DomainError;
use crate::domain::slot::{
    Price, ProviderSlot, Slot, SlotCandidate, SlotListing, SlotStatus, reconcile_with_existing,
};
use crate::domain::user::ServiceType;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::{error, info, warn};
use uuid::Uuid;

#[async_trait]
pub trait SlotRepository: Send + Sync {
    /// Persists the candidates for one provider. Time-identical slots that
    /// already exist are skipped; a partial overlap rejects the whole batch.
    /// Returns the number of rows actually created.
    async fn insert_many(
        &self,
        provider_id: Uuid,
        candidates: &[SlotCandidate],
        price: Price,
    ) -> Result<u64, DomainError>;
    async fn find_listing(&self, id: Uuid) -> Result<Option<SlotListing>, DomainError>;
    async fn find_by_provider(&self, provider_id: Uuid) -> Result<Vec<ProviderSlot>, DomainError>;
    /// Slots of `provider_id` starting in `[from, to)`, by start time.
    async fn find_in_window(
        &self,
        provider_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Slot>, DomainError>;
    /// Bookable slots starting in `[from, to]` offered for `service_type`.
    async fn find_available(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        service_type: ServiceType,
    ) -> Result<Vec<SlotListing>, DomainError>;
    /// Removes the slot and its cancelled reservations. Fails with a conflict
    /// while an active reservation holds it.
    async fn delete(&self, id: Uuid, provider_id: Uuid) -> Result<(), DomainError>;
}

#[derive(Clone)]
pub struct PostgresSlotRepository {
    pool: PgPool,
}

impl PostgresSlotRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const LISTING_SELECT: &str = r#"
    SELECT s.id, s.provider_id, s.start_time, s.end_time, s.price_minor, s.status,
           p.name AS provider_name,
           p.service_type AS provider_service_type,
           EXISTS (
               SELECT 1 FROM reservations r
               WHERE r.slot_id = s.id AND r.status <> 'cancelled'
           ) AS has_active_reservation
    FROM slots s
    JOIN users p ON p.id = s.provider_id
"#;

/// Compare-and-set `available -> booked`. Only future slots can be claimed.
/// Returns false when another booking got there first.
pub(crate) async fn claim_slot(
    conn: &mut PgConnection,
    slot_id: Uuid,
    now: DateTime<Utc>,
) -> Result<bool, DomainError> {
    let claimed = sqlx::query(
        r#"
        UPDATE slots
        SET status = $2
        WHERE id = $1 AND status = $3 AND start_time > $4
        "#,
    )
    .bind(slot_id)
    .bind(SlotStatus::Booked.as_str())
    .bind(SlotStatus::Available.as_str())
    .bind(now)
    .execute(conn)
    .await
    .map_err(|e| {
        error!("failed to claim slot {}: {}", slot_id, e);
        DomainError::Internal(e.to_string())
    })?;

    Ok(claimed.rows_affected() == 1)
}

pub(crate) async fn release_slot(conn: &mut PgConnection, slot_id: Uuid) -> Result<(), DomainError> {
    sqlx::query("UPDATE slots SET status = $2 WHERE id = $1")
        .bind(slot_id)
        .bind(SlotStatus::Available.as_str())
        .execute(conn)
        .await
        .map_err(|e| {
            error!("failed to release slot {}: {}", slot_id, e);
            DomainError::Internal(e.to_string())
        })?;
    Ok(())
}

#[async_trait]
impl SlotRepository for PostgresSlotRepository {
    async fn insert_many(
        &self,
        provider_id: Uuid,
        candidates: &[SlotCandidate],
        price: Price,
    ) -> Result<u64, DomainError> {
        let (Some(first), Some(last)) = (candidates.first(), candidates.last()) else {
            return Ok(0);
        };

        let mut tx = self.pool.begin().await?;

        // one generation per provider at a time
        sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(provider_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(DomainError::UserNotFound(provider_id))?;

        let existing = sqlx::query_as::<_, SlotRow>(
            r#"
            SELECT id, provider_id, start_time, end_time, price_minor, status
            FROM slots
            WHERE provider_id = $1 AND start_time < $3 AND end_time > $2
            "#,
        )
        .bind(provider_id)
        .bind(first.start_time)
        .bind(last.end_time)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| {
            error!("failed to load existing slots for {}: {}", provider_id, e);
            DomainError::Internal(e.to_string())
        })?
        .into_iter()
        .map(Slot::try_from)
        .collect::<Result<Vec<_>, _>>()?;

        let fresh = reconcile_with_existing(candidates, &existing)?;

        let mut created = 0;
        for candidate in fresh {
            let slot = candidate.into_slot(provider_id, price);
            let result = sqlx::query(
                r#"
                INSERT INTO slots (id, provider_id, start_time, end_time, price_minor, status)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (provider_id, start_time) DO NOTHING
                "#,
            )
            .bind(slot.id)
            .bind(slot.provider_id)
            .bind(slot.start_time)
            .bind(slot.end_time)
            .bind(slot.price.minor())
            .bind(slot.status.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                error!("failed to insert slot for {}: {}", provider_id, e);
                DomainError::Internal(e.to_string())
            })?;
            created += result.rows_affected();
        }

        tx.commit().await?;

        info!(
            provider_id = %provider_id,
            requested = candidates.len(),
            created,
            "slots generated"
        );
        Ok(created)
    }

    async fn find_listing(&self, id: Uuid) -> Result<Option<SlotListing>, DomainError> {
        let row = sqlx::query_as::<_, SlotListingRow>(&format!("{LISTING_SELECT} WHERE s.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("db error find_listing {}: {}", id, e);
                DomainError::Internal(e.to_string())
            })?;

        row.map(SlotListing::try_from).transpose()
    }

    async fn find_by_provider(&self, provider_id: Uuid) -> Result<Vec<ProviderSlot>, DomainError> {
        sqlx::query_as::<_, ProviderSlotRow>(
            r#"
            SELECT s.id, s.provider_id, s.start_time, s.end_time, s.price_minor, s.status,
                   r.id AS reservation_id,
                   r.status AS reservation_status,
                   r.booking_time,
                   c.id AS customer_id,
                   c.name AS customer_name,
                   c.email AS customer_email
            FROM slots s
            LEFT JOIN reservations r ON r.slot_id = s.id AND r.status <> 'cancelled'
            LEFT JOIN users c ON c.id = r.customer_id
            WHERE s.provider_id = $1
            ORDER BY s.start_time ASC
            "#,
        )
        .bind(provider_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("db error while fetching slots of {}: {}", provider_id, e);
            DomainError::Internal(e.to_string())
        })?
        .into_iter()
        .map(ProviderSlot::try_from)
        .collect()
    }

    async fn find_in_window(
        &self,
        provider_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Slot>, DomainError> {
        sqlx::query_as::<_, SlotRow>(
            r#"
            SELECT id, provider_id, start_time, end_time, price_minor, status
            FROM slots
            WHERE provider_id = $1 AND start_time >= $2 AND start_time < $3
            ORDER BY start_time ASC
            "#,
        )
        .bind(provider_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("db error while fetching slot window of {}: {}", provider_id, e);
            DomainError::Internal(e.to_string())
        })?
        .into_iter()
        .map(Slot::try_from)
        .collect()
    }

    async fn find_available(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        service_type: ServiceType,
    ) -> Result<Vec<SlotListing>, DomainError> {
        sqlx::query_as::<_, SlotListingRow>(&format!(
            r#"{LISTING_SELECT}
            WHERE p.service_type = $1
              AND s.start_time >= $2
              AND s.start_time <= $3
              AND s.status = $4
            ORDER BY s.start_time ASC
            "#
        ))
        .bind(service_type.as_str())
        .bind(from)
        .bind(to)
        .bind(SlotStatus::Available.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("db error while searching {} slots: {}", service_type, e);
            DomainError::Internal(e.to_string())
        })?
        .into_iter()
        .map(SlotListing::try_from)
        .filter(|listing| listing.as_ref().map_or(true, SlotListing::is_bookable))
        .collect()
    }

    async fn delete(&self, id: Uuid, provider_id: Uuid) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await?;

        let owner: Option<Uuid> =
            sqlx::query_scalar("SELECT provider_id FROM slots WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        match owner {
            None => return Err(DomainError::SlotNotFound(id)),
            Some(owner) if owner != provider_id => {
                warn!(slot_id = %id, provider_id = %provider_id, "delete of foreign slot refused");
                return Err(DomainError::forbidden(
                    "you do not have permission to delete this slot",
                ));
            }
            Some(_) => {}
        }

        let active: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM reservations WHERE slot_id = $1 AND status <> 'cancelled')",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if active {
            return Err(DomainError::conflict(
                "cannot delete slot: it has an active reservation",
            ));
        }

        sqlx::query("DELETE FROM reservations WHERE slot_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM slots WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(slot_id = %id, provider_id = %provider_id, "slot deleted");
        Ok(())
    }
}
