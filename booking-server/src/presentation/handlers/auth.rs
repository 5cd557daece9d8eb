use actix_web::{HttpRequest, HttpResponse, Scope, get, post, web};
use tracing::info;

use crate::domain::error::DomainError;
use crate::presentation::dto::{
    AuthResponse, LoginRequest, MeResponse, MessageResponse, RegisterRequest, UserView,
};
use crate::presentation::handlers::AppAuthService;
use crate::presentation::utils::{AuthenticatedUser, request_id};

pub fn scope() -> Scope {
    web::scope("/auth")
        .service(register)
        .service(login)
        .service(me)
        .service(logout)
}

#[post("/register")]
async fn register(
    req: HttpRequest,
    service: web::Data<AppAuthService>,
    payload: web::Json<RegisterRequest>,
) -> Result<HttpResponse, DomainError> {
    let (user, token) = service.register(payload.into_inner()).await?;

    info!(
        request_id = %request_id(&req),
        user_id = %user.id,
        role = %user.role(),
        "user registered"
    );

    Ok(HttpResponse::Created().json(AuthResponse {
        user: UserView::from(&user),
        token,
        token_type: "Bearer".to_string(),
        expires_in: service.keys().ttl_seconds(),
    }))
}

#[post("/login")]
async fn login(
    req: HttpRequest,
    service: web::Data<AppAuthService>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, DomainError> {
    let (user, token) = service.login(&payload.email, &payload.password).await?;

    info!(request_id = %request_id(&req), user_id = %user.id, "user logged in");

    Ok(HttpResponse::Ok().json(AuthResponse {
        user: UserView::from(&user),
        token,
        token_type: "Bearer".to_string(),
        expires_in: service.keys().ttl_seconds(),
    }))
}

#[get("/me")]
async fn me(
    user: AuthenticatedUser,
    service: web::Data<AppAuthService>,
) -> Result<HttpResponse, DomainError> {
    let user = service.get_user(user.id).await?;
    Ok(HttpResponse::Ok().json(MeResponse {
        user: UserView::from(&user),
    }))
}

/// Tokens are stateless, so logging out only tells the client to drop its
/// credential. It always succeeds.
#[post("/logout")]
async fn logout(req: HttpRequest, user: Option<AuthenticatedUser>) -> HttpResponse {
    if let Some(user) = user {
        info!(request_id = %request_id(&req), user_id = %user.id, "user logged out");
    }
    HttpResponse::Ok().json(MessageResponse {
        message: "Logged out successfully".to_string(),
    })
}
