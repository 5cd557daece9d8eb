use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use crate::BookingClientTrait;
use crate::error::BookingClientError;
use crate::models::*;

pub const DEFAULT_TOKEN_FILE: &str = ".booking_token";

/// HTTP client keeping its bearer token in a file so separate CLI runs share
/// one session.
#[derive(Clone)]
pub struct BookingClientHttp {
    client: Arc<Client>,
    base_url: String,
    token: Option<String>,
    token_path: PathBuf,
}

impl BookingClientHttp {
    pub fn connect(endpoint: &str) -> Result<Self, BookingClientError> {
        Ok(Self {
            client: Arc::new(Client::builder().build()?),
            base_url: endpoint.trim_end_matches('/').to_string(),
            token: None,
            token_path: PathBuf::from(DEFAULT_TOKEN_FILE),
        })
    }

    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = path.into();
        self
    }

    pub fn set_token(&mut self, token: String) -> Result<(), BookingClientError> {
        fs::write(&self.token_path, &token)?;
        self.token = Some(token);
        Ok(())
    }

    pub fn clear_token(&mut self) -> Result<(), BookingClientError> {
        self.token = None;
        match fs::remove_file(&self.token_path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// The in-memory token, falling back to the token file.
    pub fn token(&self) -> Option<String> {
        match &self.token {
            Some(t) if !t.is_empty() => Some(t.clone()),
            _ => fs::read_to_string(&self.token_path)
                .ok()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, req: RequestBuilder) -> Result<RequestBuilder, BookingClientError> {
        let token = self.token().ok_or(BookingClientError::NotLoggedIn)?;
        let value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| BookingClientError::NotLoggedIn)?;
        Ok(req.header(AUTHORIZATION, value))
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, BookingClientError> {
        let resp = req.send().await?;
        debug!(status = resp.status().as_u16(), url = %resp.url(), "response received");
        if resp.status().is_success() {
            Ok(resp.json().await?)
        } else {
            Err(BookingClientError::from_http_response(resp).await)
        }
    }

    async fn store_session(&mut self, req: RequestBuilder) -> Result<User, BookingClientError> {
        let auth: AuthResponse = self.send(req).await?;
        self.set_token(auth.token)?;
        Ok(auth.user)
    }
}

#[async_trait(?Send)]
impl BookingClientTrait for BookingClientHttp {
    async fn register(&mut self, request: RegisterRequest) -> Result<User, BookingClientError> {
        let req = self.client.post(self.url("/auth/register")).json(&request);
        self.store_session(req).await
    }

    async fn login(&mut self, email: String, password: String) -> Result<User, BookingClientError> {
        let req = self
            .client
            .post(self.url("/auth/login"))
            .json(&serde_json::json!({ "email": email, "password": password }));
        self.store_session(req).await
    }

    async fn me(&self) -> Result<User, BookingClientError> {
        let req = self.authorized(self.client.get(self.url("/auth/me")))?;
        let me: MeResponse = self.send(req).await?;
        Ok(me.user)
    }

    async fn logout(&mut self) -> Result<String, BookingClientError> {
        let mut req = self.client.post(self.url("/auth/logout"));
        if self.token().is_some() {
            req = self.authorized(req)?;
        }
        let result: Result<MessageResponse, _> = self.send(req).await;
        self.clear_token()?;
        // the local credential is gone either way
        Ok(result
            .map(|r| r.message)
            .unwrap_or_else(|_| "Logged out successfully".to_string()))
    }

    async fn create_slots(
        &self,
        request: CreateSlotsRequest,
    ) -> Result<CreateSlotsResponse, BookingClientError> {
        let req = self.authorized(self.client.post(self.url("/slot")).json(&request))?;
        self.send(req).await
    }

    async fn provider_slots(&self) -> Result<Vec<ProviderSlot>, BookingClientError> {
        let req = self.authorized(self.client.get(self.url("/slot/provider")))?;
        self.send(req).await
    }

    async fn available_slots(
        &self,
        date: &str,
        service_type: ServiceType,
    ) -> Result<Vec<AvailableSlot>, BookingClientError> {
        let service_type = service_type.to_string();
        let req = self
            .client
            .get(self.url("/slot/available"))
            .query(&[("date", date), ("serviceType", service_type.as_str())]);
        self.send(req).await
    }

    async fn get_slot(&self, id: Uuid) -> Result<AvailableSlot, BookingClientError> {
        self.send(self.client.get(self.url(&format!("/slot/{id}"))))
            .await
    }

    async fn delete_slot(&self, id: Uuid) -> Result<String, BookingClientError> {
        let req = self.authorized(self.client.delete(self.url(&format!("/slot/{id}"))))?;
        let resp: MessageResponse = self.send(req).await?;
        Ok(resp.message)
    }

    async fn book(&self, slot_id: Uuid) -> Result<ReservationResponse, BookingClientError> {
        let req = self.authorized(
            self.client
                .post(self.url("/reservation"))
                .json(&serde_json::json!({ "slotId": slot_id })),
        )?;
        self.send(req).await
    }

    async fn customer_reservations(&self) -> Result<Vec<Reservation>, BookingClientError> {
        let req = self.authorized(self.client.get(self.url("/reservation/customer")))?;
        self.send(req).await
    }

    async fn provider_reservations(&self) -> Result<Vec<Reservation>, BookingClientError> {
        let req = self.authorized(self.client.get(self.url("/reservation/provider")))?;
        self.send(req).await
    }

    async fn update_reservation_status(
        &self,
        id: Uuid,
        status: ReservationStatus,
    ) -> Result<ReservationResponse, BookingClientError> {
        let req = self.authorized(
            self.client
                .put(self.url(&format!("/reservation/{id}/status")))
                .json(&serde_json::json!({ "status": status })),
        )?;
        self.send(req).await
    }

    async fn cancel_reservation(
        &self,
        id: Uuid,
    ) -> Result<ReservationResponse, BookingClientError> {
        let req =
            self.authorized(self.client.put(self.url(&format!("/reservation/{id}/cancel"))))?;
        self.send(req).await
    }

    async fn confirm_reservation(
        &self,
        id: Uuid,
    ) -> Result<ReservationResponse, BookingClientError> {
        let req =
            self.authorized(self.client.put(self.url(&format!("/reservation/{id}/confirm"))))?;
        self.send(req).await
    }

    async fn health(&self) -> Result<Health, BookingClientError> {
        self.send(self.client.get(self.url("/health"))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_token_path() -> PathBuf {
        std::env::temp_dir().join(format!("booking-token-{}", Uuid::new_v4()))
    }

    #[test]
    fn token_survives_across_clients() {
        let path = temp_token_path();
        let mut first = BookingClientHttp::connect("http://localhost:8080/")
            .unwrap()
            .with_token_path(&path);
        assert!(first.token().is_none());
        first.set_token("abc.def.ghi".into()).unwrap();

        let second = BookingClientHttp::connect("http://localhost:8080")
            .unwrap()
            .with_token_path(&path);
        assert_eq!(second.token().as_deref(), Some("abc.def.ghi"));

        first.clear_token().unwrap();
        assert!(second.token().is_none());
        first.clear_token().unwrap();
    }

    #[test]
    fn protected_calls_need_a_session() {
        let client = BookingClientHttp::connect("http://localhost:8080")
            .unwrap()
            .with_token_path(temp_token_path());
        let req = client.client.get(client.url("/auth/me"));
        assert!(matches!(
            client.authorized(req),
            Err(BookingClientError::NotLoggedIn)
        ));
        assert_eq!(client.url("/slot"), "http://localhost:8080/slot");
    }
}
