use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::reservation::Reservation;
use crate::domain::user::{CustomerProfile, ProviderProfile};

pub const MIN_SLOT_MINUTES: i64 = 30;
pub const MAX_SLOT_MINUTES: i64 = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    Available,
    Booked,
}

impl SlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotStatus::Available => "available",
            SlotStatus::Booked => "booked",
        }
    }
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SlotStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(SlotStatus::Available),
            "booked" => Ok(SlotStatus::Booked),
            other => Err(DomainError::invalid_format(format!(
                "unknown slot status: {other}"
            ))),
        }
    }
}

/// Non-negative amount in minor currency units (paise).
///
/// On the wire a price is a plain JSON number with at most two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Price(i64);

impl Price {
    pub fn from_minor(minor: i64) -> Result<Self, DomainError> {
        if minor < 0 {
            return Err(DomainError::validation("price cannot be negative"));
        }
        Ok(Self(minor))
    }

    pub fn from_major(amount: f64) -> Result<Self, DomainError> {
        if !amount.is_finite() {
            return Err(DomainError::invalid_format("price must be a finite number"));
        }
        if amount < 0.0 {
            return Err(DomainError::validation("price cannot be negative"));
        }
        let scaled = amount * 100.0;
        let minor = scaled.round();
        if (scaled - minor).abs() > 1e-6 {
            return Err(DomainError::validation(
                "price can have at most two decimal places",
            ));
        }
        if minor > i64::MAX as f64 {
            return Err(DomainError::validation("price is too large"));
        }
        Ok(Self(minor as i64))
    }

    pub fn minor(&self) -> i64 {
        self.0
    }

    pub fn as_major(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_major())
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = f64::deserialize(deserializer)?;
        Price::from_major(amount).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub price: Price,
    pub status: SlotStatus,
}

impl Slot {
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start_time < end && start < self.end_time
    }
}

/// A slot produced by the generator that has not been persisted yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotCandidate {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl SlotCandidate {
    pub fn into_slot(self, provider_id: Uuid, price: Price) -> Slot {
        Slot {
            id: Uuid::new_v4(),
            provider_id,
            start_time: self.start_time,
            end_time: self.end_time,
            price,
            status: SlotStatus::Available,
        }
    }
}

pub fn validate_duration(minutes: i64) -> Result<Duration, DomainError> {
    if minutes < MIN_SLOT_MINUTES {
        return Err(DomainError::validation(format!(
            "slot duration must be at least {MIN_SLOT_MINUTES} minutes"
        )));
    }
    if minutes > MAX_SLOT_MINUTES {
        return Err(DomainError::validation(format!(
            "slot duration cannot exceed {MAX_SLOT_MINUTES} minutes"
        )));
    }
    Ok(Duration::minutes(minutes))
}

/// Splits `[window_start, window_end)` into back-to-back intervals of
/// `duration`. A trailing remainder shorter than `duration` is dropped.
pub fn plan_slots(
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    duration: Duration,
) -> Vec<SlotCandidate> {
    let mut candidates = Vec::new();
    if duration <= Duration::zero() {
        return candidates;
    }

    let mut cursor = window_start;
    while cursor < window_end {
        let end = cursor + duration;
        if end > window_end {
            break;
        }
        candidates.push(SlotCandidate {
            start_time: cursor,
            end_time: end,
        });
        cursor = end;
    }
    candidates
}

/// Drops candidates that already exist with identical bounds and fails if any
/// remaining candidate overlaps an existing slot of the same provider.
pub fn reconcile_with_existing(
    candidates: &[SlotCandidate],
    existing: &[Slot],
) -> Result<Vec<SlotCandidate>, DomainError> {
    let mut fresh = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let identical = existing.iter().any(|slot| {
            slot.start_time == candidate.start_time && slot.end_time == candidate.end_time
        });
        if identical {
            continue;
        }
        if let Some(clash) = existing
            .iter()
            .find(|slot| slot.overlaps(candidate.start_time, candidate.end_time))
        {
            return Err(DomainError::conflict(format!(
                "requested schedule overlaps existing slot {}",
                clash.id
            )));
        }
        fresh.push(*candidate);
    }
    Ok(fresh)
}

/// A slot together with the provider offering it, as shown to customers.
#[derive(Debug, Clone)]
pub struct SlotListing {
    pub slot: Slot,
    pub provider: ProviderProfile,
    pub has_active_reservation: bool,
}

impl SlotListing {
    pub fn is_bookable(&self) -> bool {
        self.slot.status == SlotStatus::Available && !self.has_active_reservation
    }
}

/// A provider's own slot with its active reservation, if any.
#[derive(Debug, Clone)]
pub struct ProviderSlot {
    pub slot: Slot,
    pub reservation: Option<(Reservation, CustomerProfile)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 5, 1, hour, minute, 0).unwrap()
    }

    #[test]
    fn discards_trailing_partial_interval() {
        let slots = plan_slots(at(9, 0), at(10, 15), Duration::minutes(30));
        assert_eq!(
            slots,
            vec![
                SlotCandidate {
                    start_time: at(9, 0),
                    end_time: at(9, 30)
                },
                SlotCandidate {
                    start_time: at(9, 30),
                    end_time: at(10, 0)
                },
            ]
        );
    }

    #[test]
    fn emits_floor_of_window_over_duration() {
        let slots = plan_slots(at(8, 0), at(17, 50), Duration::minutes(45));
        assert_eq!(slots.len(), (9 * 60 + 50) / 45);
        assert!(slots.windows(2).all(|w| w[0].end_time == w[1].start_time));
        assert!(slots.iter().all(|s| s.end_time <= at(17, 50)));
    }

    #[test]
    fn window_shorter_than_duration_yields_nothing() {
        assert!(plan_slots(at(9, 0), at(9, 20), Duration::minutes(30)).is_empty());
    }

    #[test]
    fn duration_bounds_are_inclusive() {
        assert!(validate_duration(29).is_err());
        assert!(validate_duration(30).is_ok());
        assert!(validate_duration(45).is_ok());
        assert!(validate_duration(240).is_ok());
        assert!(validate_duration(241).is_err());
    }

    #[test]
    fn price_accepts_two_decimals_only() {
        assert_eq!(Price::from_major(499.99).unwrap().minor(), 49_999);
        assert_eq!(Price::from_major(0.0).unwrap().minor(), 0);
        assert!(matches!(
            Price::from_major(-1.0),
            Err(DomainError::Validation(_))
        ));
        assert!(Price::from_major(10.005).is_err());
        assert!(Price::from_major(f64::NAN).is_err());
    }

    #[test]
    fn price_serializes_as_major_units() {
        let price = Price::from_minor(12_550).unwrap();
        assert_eq!(serde_json::to_string(&price).unwrap(), "125.5");
        let back: Price = serde_json::from_str("125.5").unwrap();
        assert_eq!(back, price);
    }

    #[test]
    fn reconcile_skips_identical_and_rejects_partial_overlap() {
        let provider = Uuid::new_v4();
        let price = Price::from_minor(100).unwrap();
        let existing = vec![
            SlotCandidate {
                start_time: at(9, 0),
                end_time: at(9, 30),
            }
            .into_slot(provider, price),
        ];

        let candidates = plan_slots(at(9, 0), at(10, 0), Duration::minutes(30));
        let fresh = reconcile_with_existing(&candidates, &existing).unwrap();
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].start_time, at(9, 30));

        let shifted = plan_slots(at(9, 15), at(10, 15), Duration::minutes(60));
        assert!(matches!(
            reconcile_with_existing(&shifted, &existing),
            Err(DomainError::Conflict(_))
        ));
    }
}
