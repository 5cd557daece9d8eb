use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::slot::Slot;
use crate::domain::user::{CustomerProfile, ProviderProfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Cancelled => "cancelled",
        }
    }

    /// An active reservation holds its slot.
    pub fn is_active(&self) -> bool {
        !matches!(self, ReservationStatus::Cancelled)
    }

    /// Asking for the current status is accepted as a no-op.
    pub fn can_transition_to(&self, next: ReservationStatus) -> bool {
        use ReservationStatus::*;
        matches!(
            (self, next),
            (Pending, Pending)
                | (Confirmed, Confirmed)
                | (Cancelled, Cancelled)
                | (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Cancelled)
        )
    }

    pub fn transition_to(&self, next: ReservationStatus) -> Result<ReservationStatus, DomainError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(DomainError::InvalidTransition {
                from: *self,
                to: next,
            })
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReservationStatus::Pending),
            "confirmed" => Ok(ReservationStatus::Confirmed),
            "cancelled" => Ok(ReservationStatus::Cancelled),
            other => Err(DomainError::invalid_format(format!(
                "status must be one of: pending, confirmed, cancelled (got {other})"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reservation {
    pub id: Uuid,
    pub slot_id: Uuid,
    pub customer_id: Uuid,
    pub status: ReservationStatus,
    pub booking_time: DateTime<Utc>,
}

impl Reservation {
    pub fn new(
        slot_id: Uuid,
        customer_id: Uuid,
        status: ReservationStatus,
        booking_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            slot_id,
            customer_id,
            status,
            booking_time,
        }
    }
}

/// A reservation joined with everything a response needs to render it.
#[derive(Debug, Clone)]
pub struct ReservationDetails {
    pub reservation: Reservation,
    pub slot: Slot,
    pub provider: ProviderProfile,
    pub customer: CustomerProfile,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ReservationStatus::*;

    #[test]
    fn allowed_transitions() {
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Confirmed));
    }

    #[test]
    fn cancelled_is_terminal() {
        for next in [Pending, Confirmed] {
            let err = Cancelled.transition_to(next).unwrap_err();
            assert!(matches!(
                err,
                DomainError::InvalidTransition { from: Cancelled, .. }
            ));
        }
    }

    #[test]
    fn confirmed_cannot_go_back_to_pending() {
        assert!(!Confirmed.can_transition_to(Pending));
    }

    #[test]
    fn parses_wire_names() {
        assert_eq!("cancelled".parse::<ReservationStatus>().unwrap(), Cancelled);
        assert!("CANCELLED".parse::<ReservationStatus>().is_err());
        assert!(Confirmed.is_active());
        assert!(!Cancelled.is_active());
    }
}
