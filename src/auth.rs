use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Json, State},
    http::request::Parts,
    routing::post,
    Router,
};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{errors::ServiceError, ApiResponse};

/// Lifetime of an issued session token.
const SESSION_TTL_HOURS: i64 = 12;

/// Shared-password authentication gate.
///
/// A successful login issues an opaque session token; every API operation
/// requires one via the [`AuthenticatedUser`] extractor. This is a
/// request-scoped capability rather than a global logged-in flag.
pub struct AuthService {
    admin_password: String,
    sessions: DashMap<String, DateTime<Utc>>,
}

impl AuthService {
    pub fn new(admin_password: String) -> Self {
        Self {
            admin_password,
            sessions: DashMap::new(),
        }
    }

    /// Exchanges the shared password for a session token.
    #[instrument(skip(self, password))]
    pub fn login(&self, password: &str) -> Result<String, ServiceError> {
        if password != self.admin_password {
            warn!("Login attempt with invalid password");
            return Err(ServiceError::Unauthorized("Invalid password".to_string()));
        }

        let token = Uuid::new_v4().to_string();
        self.sessions.insert(token.clone(), Utc::now());
        info!("Session issued");
        Ok(token)
    }

    /// Revokes a session token. Returns whether the token was known.
    pub fn logout(&self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }

    /// Capability check: does `token` name a live session?
    pub fn is_authenticated(&self, token: &str) -> bool {
        match self.sessions.get(token) {
            Some(issued_at) => {
                if Utc::now() - *issued_at > Duration::hours(SESSION_TTL_HOURS) {
                    drop(issued_at);
                    self.sessions.remove(token);
                    false
                } else {
                    true
                }
            }
            None => false,
        }
    }
}

/// Extractor proving the request carries a valid session token.
///
/// Handlers take this as an argument; requests without a valid
/// `Authorization: Bearer <token>` header are rejected before the core
/// operation runs.
pub struct AuthenticatedUser {
    pub token: String,
}

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth = parts
            .extensions
            .get::<Arc<AuthService>>()
            .cloned()
            .ok_or_else(|| {
                ServiceError::InternalError("AuthService missing from request extensions".into())
            })?;

        let header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                ServiceError::Unauthorized("Missing authorization header".to_string())
            })?;

        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            ServiceError::Unauthorized("Authorization header must be a bearer token".to_string())
        })?;

        if !auth.is_authenticated(token) {
            return Err(ServiceError::Unauthorized(
                "Invalid or expired session".to_string(),
            ));
        }

        Ok(AuthenticatedUser {
            token: token.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

async fn login(
    State(auth): State<Arc<AuthService>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ServiceError> {
    let token = auth.login(&request.password)?;
    Ok(Json(ApiResponse::success(LoginResponse { token })))
}

async fn logout(
    State(auth): State<Arc<AuthService>>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<()>>, ServiceError> {
    auth.logout(&user.token);
    Ok(Json(ApiResponse::success(())))
}

pub fn auth_routes() -> Router<Arc<AuthService>> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_issues_distinct_tokens_for_correct_password() {
        let auth = AuthService::new("hunter2".to_string());

        let a = auth.login("hunter2").expect("login");
        let b = auth.login("hunter2").expect("login");
        assert_ne!(a, b);
        assert!(auth.is_authenticated(&a));
        assert!(auth.is_authenticated(&b));
    }

    #[test]
    fn wrong_password_is_unauthorized() {
        let auth = AuthService::new("hunter2".to_string());
        assert!(matches!(
            auth.login("letmein"),
            Err(ServiceError::Unauthorized(_))
        ));
    }

    #[test]
    fn logout_revokes_the_session() {
        let auth = AuthService::new("hunter2".to_string());
        let token = auth.login("hunter2").expect("login");

        assert!(auth.logout(&token));
        assert!(!auth.is_authenticated(&token));
        assert!(!auth.logout(&token));
    }
}
