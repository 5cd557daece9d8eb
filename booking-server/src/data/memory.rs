//! In-process store used by the service tests. Every mutation happens under a
//! single lock, which gives the same claim semantics as the SQL transactions.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::data::reservation_repository::ReservationRepository;
use crate::data::slot_repository::SlotRepository;
use crate::data::user_repository::UserRepository;
use crate::domain::error::DomainError;
use crate::domain::reservation::{Reservation, ReservationDetails, ReservationStatus};
use crate::domain::slot::{
    Price, ProviderSlot, Slot, SlotCandidate, SlotListing, SlotStatus, reconcile_with_existing,
};
use crate::domain::user::{ServiceType, User};

#[derive(Default)]
struct State {
    users: HashMap<Uuid, User>,
    slots: HashMap<Uuid, Slot>,
    reservations: Vec<Reservation>,
}

impl State {
    fn active_reservation(&self, slot_id: Uuid) -> Option<&Reservation> {
        self.reservations
            .iter()
            .find(|r| r.slot_id == slot_id && r.status.is_active())
    }

    fn listing(&self, slot: &Slot) -> Result<SlotListing, DomainError> {
        let provider = self
            .users
            .get(&slot.provider_id)
            .and_then(User::provider_profile)
            .ok_or_else(|| DomainError::Internal(format!("slot {} has no provider", slot.id)))?;
        Ok(SlotListing {
            slot: slot.clone(),
            provider,
            has_active_reservation: self.active_reservation(slot.id).is_some(),
        })
    }

    fn details(&self, reservation: &Reservation) -> Result<ReservationDetails, DomainError> {
        let missing = || DomainError::Internal(format!("dangling reservation {}", reservation.id));
        let slot = self.slots.get(&reservation.slot_id).ok_or_else(missing)?;
        let provider = self
            .users
            .get(&slot.provider_id)
            .and_then(User::provider_profile)
            .ok_or_else(missing)?;
        let customer = self
            .users
            .get(&reservation.customer_id)
            .map(User::customer_profile)
            .ok_or_else(missing)?;
        Ok(ReservationDetails {
            reservation: reservation.clone(),
            slot: slot.clone(),
            provider,
            customer,
        })
    }

    fn details_where(
        &self,
        keep: impl Fn(&Reservation, &Slot) -> bool,
    ) -> Result<Vec<ReservationDetails>, DomainError> {
        let mut out = self
            .reservations
            .iter()
            .filter(|r| self.slots.get(&r.slot_id).is_some_and(|s| keep(r, s)))
            .map(|r| self.details(r))
            .collect::<Result<Vec<_>, _>>()?;
        out.sort_by(|a, b| b.reservation.booking_time.cmp(&a.reservation.booking_time));
        Ok(out)
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn slot(&self, id: Uuid) -> Option<Slot> {
        self.lock().slots.get(&id).cloned()
    }

    pub fn slot_count(&self) -> usize {
        self.lock().slots.len()
    }

    pub fn reservations_for_slot(&self, slot_id: Uuid) -> Vec<Reservation> {
        self.lock()
            .reservations
            .iter()
            .filter(|r| r.slot_id == slot_id)
            .cloned()
            .collect()
    }

    /// Inserts a slot directly, bypassing generation rules.
    pub fn put_slot(&self, slot: Slot) {
        self.lock().slots.insert(slot.id, slot);
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(&self, user: User) -> Result<User, DomainError> {
        let mut state = self.lock();
        if state.users.values().any(|u| u.email == user.email) {
            return Err(DomainError::UserAlreadyExists(user.email));
        }
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        Ok(self.lock().users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        Ok(self.lock().users.get(&id).cloned())
    }
}

#[async_trait]
impl SlotRepository for InMemoryStore {
    async fn insert_many(
        &self,
        provider_id: Uuid,
        candidates: &[SlotCandidate],
        price: Price,
    ) -> Result<u64, DomainError> {
        let mut state = self.lock();
        if !state.users.contains_key(&provider_id) {
            return Err(DomainError::UserNotFound(provider_id));
        }
        let existing: Vec<Slot> = state
            .slots
            .values()
            .filter(|s| s.provider_id == provider_id)
            .cloned()
            .collect();
        let fresh = reconcile_with_existing(candidates, &existing)?;
        let created = fresh.len() as u64;
        for candidate in fresh {
            let slot = candidate.into_slot(provider_id, price);
            state.slots.insert(slot.id, slot);
        }
        Ok(created)
    }

    async fn find_listing(&self, id: Uuid) -> Result<Option<SlotListing>, DomainError> {
        let state = self.lock();
        state.slots.get(&id).map(|slot| state.listing(slot)).transpose()
    }

    async fn find_by_provider(&self, provider_id: Uuid) -> Result<Vec<ProviderSlot>, DomainError> {
        let state = self.lock();
        let mut slots: Vec<ProviderSlot> = state
            .slots
            .values()
            .filter(|s| s.provider_id == provider_id)
            .map(|slot| ProviderSlot {
                slot: slot.clone(),
                reservation: state.active_reservation(slot.id).and_then(|r| {
                    state
                        .users
                        .get(&r.customer_id)
                        .map(|c| (r.clone(), c.customer_profile()))
                }),
            })
            .collect();
        slots.sort_by_key(|p| p.slot.start_time);
        Ok(slots)
    }

    async fn find_in_window(
        &self,
        provider_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Slot>, DomainError> {
        let mut slots: Vec<Slot> = self
            .lock()
            .slots
            .values()
            .filter(|s| s.provider_id == provider_id && s.start_time >= from && s.start_time < to)
            .cloned()
            .collect();
        slots.sort_by_key(|s| s.start_time);
        Ok(slots)
    }

    async fn find_available(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        service_type: ServiceType,
    ) -> Result<Vec<SlotListing>, DomainError> {
        let state = self.lock();
        let mut listings = Vec::new();
        for slot in state.slots.values() {
            if slot.start_time < from || slot.start_time > to {
                continue;
            }
            let listing = state.listing(slot)?;
            if listing.provider.service_type == service_type && listing.is_bookable() {
                listings.push(listing);
            }
        }
        listings.sort_by_key(|l| l.slot.start_time);
        Ok(listings)
    }

    async fn delete(&self, id: Uuid, provider_id: Uuid) -> Result<(), DomainError> {
        let mut state = self.lock();
        let slot = state.slots.get(&id).ok_or(DomainError::SlotNotFound(id))?;
        if slot.provider_id != provider_id {
            return Err(DomainError::forbidden(
                "you do not have permission to delete this slot",
            ));
        }
        if state.active_reservation(id).is_some() {
            return Err(DomainError::conflict(
                "cannot delete slot: it has an active reservation",
            ));
        }
        state.reservations.retain(|r| r.slot_id != id);
        state.slots.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl ReservationRepository for InMemoryStore {
    async fn book(&self, reservation: Reservation) -> Result<Reservation, DomainError> {
        let mut state = self.lock();
        let claimable = state.slots.get(&reservation.slot_id).is_some_and(|s| {
            s.status == SlotStatus::Available && s.start_time > reservation.booking_time
        });
        if !claimable {
            return Err(DomainError::conflict("slot is no longer available for booking"));
        }
        if state.active_reservation(reservation.slot_id).is_some() {
            return Err(DomainError::conflict("slot is already booked"));
        }
        if let Some(slot) = state.slots.get_mut(&reservation.slot_id) {
            slot.status = SlotStatus::Booked;
        }
        state.reservations.push(reservation.clone());
        Ok(reservation)
    }

    async fn find_details(&self, id: Uuid) -> Result<Option<ReservationDetails>, DomainError> {
        let state = self.lock();
        state
            .reservations
            .iter()
            .find(|r| r.id == id)
            .map(|r| state.details(r))
            .transpose()
    }

    async fn list_for_customer(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<ReservationDetails>, DomainError> {
        self.lock()
            .details_where(|r, _| r.customer_id == customer_id)
    }

    async fn list_for_provider(
        &self,
        provider_id: Uuid,
    ) -> Result<Vec<ReservationDetails>, DomainError> {
        self.lock()
            .details_where(|_, s| s.provider_id == provider_id)
    }

    async fn transition(
        &self,
        id: Uuid,
        next: ReservationStatus,
    ) -> Result<Reservation, DomainError> {
        let mut state = self.lock();
        let reservation = state
            .reservations
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(DomainError::ReservationNotFound(id))?;
        let previous = reservation.status;
        reservation.status = previous.transition_to(next)?;
        let updated = reservation.clone();

        if previous.is_active() && !updated.status.is_active() {
            if let Some(slot) = state.slots.get_mut(&updated.slot_id) {
                slot.status = SlotStatus::Available;
            }
        }
        Ok(updated)
    }
}
