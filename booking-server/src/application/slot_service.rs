use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::application::civil_time::CivilTime;
use crate::data::slot_repository::SlotRepository;
use crate::data::user_repository::UserRepository;
use crate::domain::error::DomainError;
use crate::domain::slot::{Price, plan_slots, validate_duration};
use crate::domain::user::{Role, ServiceType, User};
use crate::presentation::dto::{
    AvailableSlotView, CreateSlotsRequest, CreateSlotsResponse, ProviderSlotView, SlotView,
};

#[derive(Clone)]
pub struct SlotService<S, U>
where
    S: SlotRepository + 'static,
    U: UserRepository + 'static,
{
    slots: Arc<S>,
    users: Arc<U>,
    civil: Arc<CivilTime>,
}

impl<S, U> SlotService<S, U>
where
    S: SlotRepository + 'static,
    U: UserRepository + 'static,
{
    pub fn new(slots: Arc<S>, users: Arc<U>, civil: Arc<CivilTime>) -> Self {
        Self {
            slots,
            users,
            civil,
        }
    }

    async fn require_provider(&self, user_id: Uuid) -> Result<User, DomainError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(DomainError::UserNotFound(user_id))?;
        if user.role() != Role::Provider {
            return Err(DomainError::forbidden("user is not a provider"));
        }
        Ok(user)
    }

    /// Cuts the requested window into fixed-length slots and persists them.
    #[instrument(skip(self, request), fields(date = %request.date))]
    pub async fn generate(
        &self,
        provider_id: Uuid,
        request: &CreateSlotsRequest,
    ) -> Result<CreateSlotsResponse, DomainError> {
        self.require_provider(provider_id).await?;
        let civil = &self.civil;

        if civil.is_past(&request.date)? {
            return Err(DomainError::validation("cannot create slots for past dates"));
        }
        civil.parse_time(&request.start_time)?;
        civil.parse_time(&request.end_time)?;
        if civil.is_today(&request.date)?
            && civil.is_time_slot_past(&request.date, &request.start_time)?
        {
            return Err(DomainError::validation(
                "start time cannot be in the past for today's date",
            ));
        }

        let window_start = civil.parse_date_time(&request.date, &request.start_time)?;
        let window_end = civil.parse_date_time(&request.date, &request.end_time)?;
        if window_end <= window_start {
            return Err(DomainError::validation("end time must be after start time"));
        }

        let duration = validate_duration(request.slot_duration_minutes)?;
        let price = Price::from_major(request.price)?;

        let candidates = plan_slots(window_start, window_end, duration);
        if candidates.is_empty() {
            return Err(DomainError::NoSlotsGenerated);
        }

        let created = self
            .slots
            .insert_many(provider_id, &candidates, price)
            .await?;
        let slots = self
            .slots
            .find_in_window(provider_id, window_start, window_end)
            .await?;

        info!(provider_id = %provider_id, created, "slot schedule applied");

        Ok(CreateSlotsResponse {
            message: format!(
                "{created} slots created successfully for {}.",
                request.date
            ),
            count: created,
            slots: slots
                .iter()
                .map(|slot| SlotView::render(slot, civil))
                .collect(),
        })
    }

    pub async fn provider_slots(
        &self,
        provider_id: Uuid,
    ) -> Result<Vec<ProviderSlotView>, DomainError> {
        self.require_provider(provider_id).await?;
        let slots = self.slots.find_by_provider(provider_id).await?;
        Ok(slots
            .iter()
            .map(|entry| ProviderSlotView::render(entry, &self.civil))
            .collect())
    }

    pub async fn available_slots(
        &self,
        date: &str,
        service_type: &str,
    ) -> Result<Vec<AvailableSlotView>, DomainError> {
        if self.civil.is_past(date)? {
            return Err(DomainError::validation(
                "cannot search for slots in past dates",
            ));
        }
        let service_type: ServiceType = service_type.parse()?;
        let from = self.civil.start_of_day(date)?;
        let to = self.civil.end_of_day(date)?;

        let listings = self.slots.find_available(from, to, service_type).await?;
        Ok(listings
            .iter()
            .map(|listing| AvailableSlotView::render(listing, &self.civil))
            .collect())
    }

    /// Returns the slot only while it can still be booked.
    pub async fn bookable_slot(&self, slot_id: Uuid) -> Result<AvailableSlotView, DomainError> {
        let listing = self
            .slots
            .find_listing(slot_id)
            .await?
            .ok_or(DomainError::SlotNotFound(slot_id))?;
        if !listing.is_bookable() {
            return Err(DomainError::forbidden(
                "slot is already booked or unavailable",
            ));
        }
        Ok(AvailableSlotView::render(&listing, &self.civil))
    }

    #[instrument(skip(self))]
    pub async fn delete_slot(&self, slot_id: Uuid, provider_id: Uuid) -> Result<(), DomainError> {
        self.slots.delete(slot_id, provider_id).await
    }
}
