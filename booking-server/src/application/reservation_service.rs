use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::application::civil_time::CivilTime;
use crate::data::reservation_repository::ReservationRepository;
use crate::data::slot_repository::SlotRepository;
use crate::data::user_repository::UserRepository;
use crate::domain::error::DomainError;
use crate::domain::reservation::{Reservation, ReservationDetails, ReservationStatus};
use crate::domain::user::{Role, User};
use crate::presentation::dto::{ReservationResponse, ReservationView};

#[derive(Clone)]
pub struct ReservationService<R, S, U>
where
    R: ReservationRepository + 'static,
    S: SlotRepository + 'static,
    U: UserRepository + 'static,
{
    reservations: Arc<R>,
    slots: Arc<S>,
    users: Arc<U>,
    civil: Arc<CivilTime>,
    initial_status: ReservationStatus,
}

impl<R, S, U> ReservationService<R, S, U>
where
    R: ReservationRepository + 'static,
    S: SlotRepository + 'static,
    U: UserRepository + 'static,
{
    pub fn new(
        reservations: Arc<R>,
        slots: Arc<S>,
        users: Arc<U>,
        civil: Arc<CivilTime>,
        initial_status: ReservationStatus,
    ) -> Self {
        Self {
            reservations,
            slots,
            users,
            civil,
            initial_status,
        }
    }

    async fn require_role(&self, user_id: Uuid, role: Role) -> Result<User, DomainError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(DomainError::UserNotFound(user_id))?;
        if user.role() != role {
            return Err(DomainError::forbidden(format!("user is not a {role}")));
        }
        Ok(user)
    }

    async fn details(&self, id: Uuid) -> Result<ReservationDetails, DomainError> {
        self.reservations
            .find_details(id)
            .await?
            .ok_or(DomainError::ReservationNotFound(id))
    }

    /// Books a slot for a customer. The store claims the slot atomically, so
    /// the checks here only produce early, descriptive failures.
    #[instrument(skip(self))]
    pub async fn create_reservation(
        &self,
        slot_id: Uuid,
        customer_id: Uuid,
    ) -> Result<ReservationResponse, DomainError> {
        let listing = self
            .slots
            .find_listing(slot_id)
            .await?
            .ok_or(DomainError::SlotNotFound(slot_id))?;
        if !listing.is_bookable() {
            return Err(DomainError::conflict("slot is already booked or unavailable"));
        }

        let now = self.civil.now_utc();
        if listing.slot.start_time <= now {
            return Err(DomainError::conflict("cannot book a slot in the past"));
        }

        self.require_role(customer_id, Role::Customer).await?;

        let reservation = self
            .reservations
            .book(Reservation::new(slot_id, customer_id, self.initial_status, now))
            .await?;
        info!(
            reservation_id = %reservation.id,
            slot_id = %slot_id,
            status = %reservation.status,
            "reservation created"
        );

        let details = self.details(reservation.id).await?;
        Ok(ReservationResponse {
            message: "Reservation created successfully.".to_string(),
            reservation: ReservationView::render(&details, &self.civil),
        })
    }

    /// Moves a reservation through its lifecycle on behalf of either owner.
    /// Confirmation belongs to the provider.
    #[instrument(skip(self))]
    pub async fn update_reservation_status(
        &self,
        reservation_id: Uuid,
        next: ReservationStatus,
        acting_user_id: Uuid,
        acting_role: Role,
    ) -> Result<ReservationResponse, DomainError> {
        let current = self.details(reservation_id).await?;
        let owns = match acting_role {
            Role::Customer => current.reservation.customer_id == acting_user_id,
            Role::Provider => current.slot.provider_id == acting_user_id,
        };
        if !owns {
            return Err(DomainError::forbidden(
                "you do not have permission to update this reservation",
            ));
        }
        if acting_role == Role::Customer && next == ReservationStatus::Confirmed {
            return Err(DomainError::forbidden(
                "only the provider can confirm a reservation",
            ));
        }

        let updated = self.reservations.transition(reservation_id, next).await?;
        info!(
            reservation_id = %reservation_id,
            from = %current.reservation.status,
            to = %updated.status,
            "reservation status updated"
        );

        let details = self.details(reservation_id).await?;
        Ok(ReservationResponse {
            message: format!("Reservation {} successfully.", updated.status),
            reservation: ReservationView::render(&details, &self.civil),
        })
    }

    pub async fn cancel_reservation(
        &self,
        reservation_id: Uuid,
        customer_id: Uuid,
    ) -> Result<ReservationResponse, DomainError> {
        self.update_reservation_status(
            reservation_id,
            ReservationStatus::Cancelled,
            customer_id,
            Role::Customer,
        )
        .await
    }

    pub async fn confirm_reservation(
        &self,
        reservation_id: Uuid,
        provider_id: Uuid,
    ) -> Result<ReservationResponse, DomainError> {
        self.update_reservation_status(
            reservation_id,
            ReservationStatus::Confirmed,
            provider_id,
            Role::Provider,
        )
        .await
    }

    pub async fn get_customer_reservations(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<ReservationView>, DomainError> {
        self.require_role(customer_id, Role::Customer).await?;
        let list = self.reservations.list_for_customer(customer_id).await?;
        Ok(self.render_all(&list))
    }

    pub async fn get_provider_reservations(
        &self,
        provider_id: Uuid,
    ) -> Result<Vec<ReservationView>, DomainError> {
        self.require_role(provider_id, Role::Provider).await?;
        let list = self.reservations.list_for_provider(provider_id).await?;
        Ok(self.render_all(&list))
    }

    fn render_all(&self, list: &[ReservationDetails]) -> Vec<ReservationView> {
        list.iter()
            .map(|details| ReservationView::render(details, &self.civil))
            .collect()
    }
}
