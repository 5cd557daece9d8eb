use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::reservation::ReservationStatus;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("invalid format: {0}")]
    InvalidFormat(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("no slots could be created with the provided parameters")]
    NoSlotsGenerated,
    #[error("user not found: {0}")]
    UserNotFound(Uuid),
    #[error("user already exists: {0}")]
    UserAlreadyExists(String),
    #[error("slot not found: {0}")]
    SlotNotFound(Uuid),
    #[error("reservation not found: {0}")]
    ReservationNotFound(Uuid),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("reservation cannot move from {from} to {to}")]
    InvalidTransition {
        from: ReservationStatus,
        to: ReservationStatus,
    },
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn invalid_format(message: impl Into<String>) -> Self {
        DomainError::InvalidFormat(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        DomainError::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        DomainError::Conflict(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        DomainError::Forbidden(message.into())
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::Internal(format!("database error: {}", err))
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl ResponseError for DomainError {
    fn status_code(&self) -> StatusCode {
        match self {
            DomainError::InvalidFormat(_) => StatusCode::BAD_REQUEST,
            DomainError::Validation(_) | DomainError::NoSlotsGenerated => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            DomainError::UserNotFound(_)
            | DomainError::SlotNotFound(_)
            | DomainError::ReservationNotFound(_) => StatusCode::NOT_FOUND,
            DomainError::UserAlreadyExists(_)
            | DomainError::Conflict(_)
            | DomainError::InvalidTransition { .. } => StatusCode::CONFLICT,
            DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
            DomainError::Unauthorized => StatusCode::UNAUTHORIZED,
            DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // store failures are logged where they happen; clients get a generic message
        let message = match self {
            DomainError::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        };
        let details = match self {
            DomainError::UserNotFound(resource)
            | DomainError::SlotNotFound(resource)
            | DomainError::ReservationNotFound(resource) => Some(json!({ "resource": resource })),
            DomainError::InvalidTransition { from, to } => {
                Some(json!({ "from": from, "to": to }))
            }
            _ => None,
        };
        let body = ErrorBody {
            error: message.as_str(),
            details,
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn maps_taxonomy_to_status_codes() {
        let cases = [
            (DomainError::invalid_format("bad date"), StatusCode::BAD_REQUEST),
            (DomainError::validation("bad price"), StatusCode::UNPROCESSABLE_ENTITY),
            (DomainError::NoSlotsGenerated, StatusCode::UNPROCESSABLE_ENTITY),
            (DomainError::SlotNotFound(Uuid::nil()), StatusCode::NOT_FOUND),
            (DomainError::conflict("booked"), StatusCode::CONFLICT),
            (
                DomainError::InvalidTransition {
                    from: ReservationStatus::Cancelled,
                    to: ReservationStatus::Confirmed,
                },
                StatusCode::CONFLICT,
            ),
            (DomainError::forbidden("not yours"), StatusCode::FORBIDDEN),
            (DomainError::Unauthorized, StatusCode::UNAUTHORIZED),
            (
                DomainError::Internal("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.status_code(), expected, "{err}");
        }
    }

    #[actix_web::test]
    async fn internal_errors_hide_details_from_clients() {
        let response = DomainError::Internal("connection refused".into()).error_response();
        let body = to_bytes(response.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(value["error"], "internal server error");
        assert!(value.get("details").is_none());
    }

    #[actix_web::test]
    async fn not_found_errors_carry_the_resource_id() {
        let id = Uuid::new_v4();
        let response = DomainError::ReservationNotFound(id).error_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(response.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["details"]["resource"], id.to_string());
    }
}
