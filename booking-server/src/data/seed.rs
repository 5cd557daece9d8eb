//! Rows for the PostgreSQL repository tests.

use chrono::{DateTime, Duration, DurationRound, Utc};
use sqlx::PgPool;

use crate::data::slot_repository::{PostgresSlotRepository, SlotRepository};
use crate::data::user_repository::{PostgresUserRepository, UserRepository};
use crate::domain::slot::{Price, Slot, SlotCandidate};
use crate::domain::user::{Account, ServiceType, User};

pub async fn provider(pool: &PgPool) -> User {
    PostgresUserRepository::new(pool.clone())
        .create(User::new(
            "Volt Works".into(),
            "volt@example.com".into(),
            "hash".into(),
            Account::Provider {
                service_type: ServiceType::Electrician,
            },
        ))
        .await
        .unwrap()
}

pub async fn customer(pool: &PgPool, email: &str) -> User {
    PostgresUserRepository::new(pool.clone())
        .create(User::new(
            "Nisha".into(),
            email.into(),
            "hash".into(),
            Account::Customer,
        ))
        .await
        .unwrap()
}

/// Whole minutes, so values survive the round trip through `timestamptz`.
pub fn tomorrow_at(hour: i64) -> DateTime<Utc> {
    let now = Utc::now().duration_trunc(Duration::minutes(1)).unwrap();
    now + Duration::days(1) + Duration::hours(hour)
}

/// One 30 minute slot starting a day from now.
pub async fn future_slot(pool: &PgPool, provider: &User) -> Slot {
    let repo = PostgresSlotRepository::new(pool.clone());
    let start = tomorrow_at(0);
    let candidate = SlotCandidate {
        start_time: start,
        end_time: start + Duration::minutes(30),
    };
    let created = repo
        .insert_many(provider.id, &[candidate], Price::from_minor(25_000).unwrap())
        .await
        .unwrap();
    assert_eq!(created, 1);
    repo.find_in_window(provider.id, candidate.start_time, candidate.end_time)
        .await
        .unwrap()
        .remove(0)
}
