use reqwest::{Response, StatusCode};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BookingClientError {
    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Token storage error: {0}")]
    TokenStorage(#[from] std::io::Error),
    #[error("Not logged in")]
    NotLoggedIn,
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Server error ({status}): {message}")]
    Api { status: u16, message: String },
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl BookingClientError {
    pub async fn from_http_response(resp: Response) -> Self {
        let status = resp.status();
        match resp.text().await {
            Ok(body) => Self::from_parts(status, &body),
            Err(err) => Self::RequestError(err),
        }
    }

    fn from_parts(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .map(|b| b.error)
            .unwrap_or_else(|_| body.trim().to_string());
        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized(message),
            StatusCode::FORBIDDEN => Self::Forbidden(message),
            StatusCode::NOT_FOUND => Self::NotFound(message),
            StatusCode::CONFLICT => Self::Conflict(message),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                Self::InvalidRequest(message)
            }
            other => Self::Api {
                status: other.as_u16(),
                message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_status_and_error_body() {
        let err = BookingClientError::from_parts(
            StatusCode::CONFLICT,
            r#"{"error":"slot is already booked"}"#,
        );
        assert!(matches!(err, BookingClientError::Conflict(ref m) if m == "slot is already booked"));

        let err = BookingClientError::from_parts(StatusCode::UNPROCESSABLE_ENTITY, "{}");
        assert!(matches!(err, BookingClientError::InvalidRequest(_)));

        let err = BookingClientError::from_parts(StatusCode::BAD_GATEWAY, "upstream down");
        assert!(matches!(
            err,
            BookingClientError::Api { status: 502, ref message } if message == "upstream down"
        ));
    }
}
