use actix_web::{HttpRequest, HttpResponse, Scope, get, post, put, web};
use tracing::info;
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::user::Role;
use crate::presentation::dto::{CreateReservationRequest, UpdateReservationStatusRequest};
use crate::presentation::handlers::AppReservationService;
use crate::presentation::utils::{AuthenticatedUser, request_id};

pub fn scope() -> Scope {
    web::scope("/reservation")
        .service(create_reservation)
        .service(customer_reservations)
        .service(provider_reservations)
        .service(update_status)
        .service(cancel)
        .service(confirm)
}

#[post("")]
async fn create_reservation(
    req: HttpRequest,
    user: AuthenticatedUser,
    reservations: web::Data<AppReservationService>,
    payload: web::Json<CreateReservationRequest>,
) -> Result<HttpResponse, DomainError> {
    user.require_role(Role::Customer)?;
    let response = reservations
        .create_reservation(payload.slot_id, user.id)
        .await?;

    info!(
        request_id = %request_id(&req),
        customer_id = %user.id,
        customer = %user.name,
        reservation_id = %response.reservation.id,
        "slot booked"
    );

    Ok(HttpResponse::Created().json(response))
}

#[get("/customer")]
async fn customer_reservations(
    user: AuthenticatedUser,
    reservations: web::Data<AppReservationService>,
) -> Result<HttpResponse, DomainError> {
    user.require_role(Role::Customer)?;
    let list = reservations.get_customer_reservations(user.id).await?;
    Ok(HttpResponse::Ok().json(list))
}

#[get("/provider")]
async fn provider_reservations(
    user: AuthenticatedUser,
    reservations: web::Data<AppReservationService>,
) -> Result<HttpResponse, DomainError> {
    user.require_role(Role::Provider)?;
    let list = reservations.get_provider_reservations(user.id).await?;
    Ok(HttpResponse::Ok().json(list))
}

#[put("/{id}/status")]
async fn update_status(
    req: HttpRequest,
    user: AuthenticatedUser,
    reservations: web::Data<AppReservationService>,
    path: web::Path<Uuid>,
    payload: web::Json<UpdateReservationStatusRequest>,
) -> Result<HttpResponse, DomainError> {
    let reservation_id = path.into_inner();
    let response = reservations
        .update_reservation_status(reservation_id, payload.status, user.id, user.role)
        .await?;

    info!(
        request_id = %request_id(&req),
        user_id = %user.id,
        reservation_id = %reservation_id,
        status = %response.reservation.status,
        "reservation status changed"
    );

    Ok(HttpResponse::Ok().json(response))
}

#[put("/{id}/cancel")]
async fn cancel(
    req: HttpRequest,
    user: AuthenticatedUser,
    reservations: web::Data<AppReservationService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    user.require_role(Role::Customer)?;
    let reservation_id = path.into_inner();
    let response = reservations
        .cancel_reservation(reservation_id, user.id)
        .await?;

    info!(
        request_id = %request_id(&req),
        customer_id = %user.id,
        reservation_id = %reservation_id,
        "reservation cancelled"
    );

    Ok(HttpResponse::Ok().json(response))
}

#[put("/{id}/confirm")]
async fn confirm(
    req: HttpRequest,
    user: AuthenticatedUser,
    reservations: web::Data<AppReservationService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    user.require_role(Role::Provider)?;
    let reservation_id = path.into_inner();
    let response = reservations
        .confirm_reservation(reservation_id, user.id)
        .await?;

    info!(
        request_id = %request_id(&req),
        provider_id = %user.id,
        reservation_id = %reservation_id,
        "reservation confirmed"
    );

    Ok(HttpResponse::Ok().json(response))
}
