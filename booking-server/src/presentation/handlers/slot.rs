use actix_web::{HttpRequest, HttpResponse, Scope, delete, get, post, web};
use tracing::info;
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::user::Role;
use crate::presentation::dto::{AvailableSlotsQuery, CreateSlotsRequest, MessageResponse};
use crate::presentation::handlers::AppSlotService;
use crate::presentation::utils::{AuthenticatedUser, request_id};

/// Literal paths are registered ahead of `/{id}` so they are matched first.
pub fn scope() -> Scope {
    web::scope("/slot")
        .service(create_slots)
        .service(available_slots)
        .service(provider_slots)
        .service(get_slot)
        .service(delete_slot)
}

#[post("")]
async fn create_slots(
    req: HttpRequest,
    user: AuthenticatedUser,
    slots: web::Data<AppSlotService>,
    payload: web::Json<CreateSlotsRequest>,
) -> Result<HttpResponse, DomainError> {
    user.require_role(Role::Provider)?;
    let response = slots.generate(user.id, &payload).await?;

    info!(
        request_id = %request_id(&req),
        provider_id = %user.id,
        provider = %user.name,
        count = response.count,
        "slots generated"
    );

    Ok(HttpResponse::Created().json(response))
}

#[get("/available")]
async fn available_slots(
    slots: web::Data<AppSlotService>,
    query: web::Query<AvailableSlotsQuery>,
) -> Result<HttpResponse, DomainError> {
    let query = query.into_inner();
    let (Some(date), Some(service_type)) = (query.date, query.service_type) else {
        return Err(DomainError::invalid_format(
            "date and serviceType query parameters are required",
        ));
    };
    let found = slots.available_slots(&date, &service_type).await?;
    Ok(HttpResponse::Ok().json(found))
}

#[get("/provider")]
async fn provider_slots(
    user: AuthenticatedUser,
    slots: web::Data<AppSlotService>,
) -> Result<HttpResponse, DomainError> {
    user.require_role(Role::Provider)?;
    let listing = slots.provider_slots(user.id).await?;
    Ok(HttpResponse::Ok().json(listing))
}

#[get("/{id}")]
async fn get_slot(
    slots: web::Data<AppSlotService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let slot = slots.bookable_slot(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(slot))
}

#[delete("/{id}")]
async fn delete_slot(
    req: HttpRequest,
    user: AuthenticatedUser,
    slots: web::Data<AppSlotService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    user.require_role(Role::Provider)?;
    let slot_id = path.into_inner();
    slots.delete_slot(slot_id, user.id).await?;

    info!(
        request_id = %request_id(&req),
        provider_id = %user.id,
        slot_id = %slot_id,
        "slot deleted"
    );

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Slot deleted successfully.".to_string(),
    }))
}
