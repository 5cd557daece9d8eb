use std::sync::Arc;

use actix_cors::Cors;
use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::{App, HttpResponse, HttpServer, Responder, web};
use tracing::info;

use crate::application::civil_time::CivilTime;
use crate::domain::error::DomainError;
use crate::infrastructure::config::AppConfig;
use crate::presentation::dto::HealthResponse;
use crate::presentation::handlers::{self, AppAuthService, AppReservationService, AppSlotService};
use crate::presentation::middleware::{JwtAuthMiddleware, RequestIdMiddleware, TimingMiddleware};

/// Everything the HTTP workers share.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AppAuthService>,
    pub slots: Arc<AppSlotService>,
    pub reservations: Arc<AppReservationService>,
    pub civil: Arc<CivilTime>,
}

pub async fn start_rest_server(config: AppConfig, state: AppState) -> anyhow::Result<()> {
    let bind_address = (config.host.clone(), config.port);
    info!(
        host = %bind_address.0,
        port = bind_address.1,
        timezone = %state.civil.offset_label(),
        "HTTP server starting"
    );

    HttpServer::new(move || {
        App::new()
            .wrap(build_cors(&config))
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("Referrer-Policy", "no-referrer"))
                    .add(("Permissions-Policy", "geolocation=()"))
                    .add(("Cross-Origin-Opener-Policy", "same-origin")),
            )
            .wrap(JwtAuthMiddleware::new(state.auth.keys().clone()))
            .wrap(TimingMiddleware)
            .wrap(RequestIdMiddleware)
            .wrap(Logger::default())
            .app_data(web::Data::from(state.auth.clone()))
            .app_data(web::Data::from(state.slots.clone()))
            .app_data(web::Data::from(state.reservations.clone()))
            .app_data(web::Data::from(state.civil.clone()))
            .app_data(json_config())
            .app_data(query_config())
            .app_data(path_config())
            .route("/health", web::get().to(health))
            .service(handlers::auth::scope())
            .service(handlers::slot::scope())
            .service(handlers::reservation::scope())
    })
    .bind(bind_address)?
    .run()
    .await
    .map_err(anyhow::Error::new)?;

    Ok(())
}

fn build_cors(config: &AppConfig) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
        .allowed_headers(vec![
            actix_web::http::header::CONTENT_TYPE,
            actix_web::http::header::AUTHORIZATION,
        ])
        .expose_headers(vec!["x-request-id"])
        .supports_credentials()
        .max_age(3600);

    for origin in &config.cors_origins {
        cors = if origin == "*" {
            cors.allow_any_origin()
        } else {
            cors.allowed_origin(origin)
        };
    }

    cors
}

// Extractor failures use the same error body as the services.

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _| DomainError::invalid_format(err.to_string()).into())
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _| DomainError::invalid_format(err.to_string()).into())
}

fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|err, _| DomainError::invalid_format(err.to_string()).into())
}

async fn health(civil: web::Data<CivilTime>) -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        timestamp: civil.format_seconds(civil.now_utc()),
        timezone: civil.offset_label(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::civil_time::testing::civil_at;
    use actix_web::http::StatusCode;
    use actix_web::test;

    #[actix_web::test]
    async fn health_reports_civil_time() {
        let (civil, _) = civil_at("2030-04-05", "10:15");
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(civil))
                .route("/health", web::get().to(health)),
        )
        .await;

        let body: serde_json::Value =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri("/health").to_request())
                .await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["timestamp"], "2030-04-05 10:15:00");
        assert_eq!(body["timezone"], "+05:30");
    }

    #[actix_web::test]
    async fn malformed_json_uses_the_error_body() {
        async fn echo(body: web::Json<serde_json::Value>) -> HttpResponse {
            HttpResponse::Ok().json(body.into_inner())
        }
        let app = test::init_service(
            App::new()
                .app_data(json_config())
                .route("/echo", web::post().to(echo)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/echo")
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().is_some());
    }
}
