use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpMessage, HttpRequest};
use futures_util::future::{Ready, ready};
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::user::Role;
use crate::presentation::middleware::RequestId;

/// The caller resolved from a bearer token by the auth middleware.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
}

impl AuthenticatedUser {
    pub fn require_role(&self, role: Role) -> Result<(), DomainError> {
        if self.role != role {
            return Err(DomainError::forbidden(format!(
                "this action requires the {role} role"
            )));
        }
        Ok(())
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = DomainError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthenticatedUser>() {
            Some(user) => ready(Ok(user.clone())),
            None => ready(Err(DomainError::Unauthorized)),
        }
    }
}

pub fn request_id(req: &HttpRequest) -> String {
    req.extensions()
        .get::<RequestId>()
        .map(|rid| rid.0.clone())
        .unwrap_or_else(|| "unknown".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[actix_web::test]
    async fn missing_user_is_unauthorized() {
        let req = TestRequest::default().to_http_request();
        let err = AuthenticatedUser::extract(&req).await.unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized));
    }

    #[actix_web::test]
    async fn attached_user_is_extracted() {
        let req = TestRequest::default().to_http_request();
        let id = Uuid::new_v4();
        req.extensions_mut().insert(AuthenticatedUser {
            id,
            name: "Asha".into(),
            role: Role::Provider,
        });
        let user = AuthenticatedUser::extract(&req).await.unwrap();
        assert_eq!(user.id, id);
        assert!(user.require_role(Role::Provider).is_ok());
        assert!(matches!(
            user.require_role(Role::Customer),
            Err(DomainError::Forbidden(_))
        ));
    }
}
