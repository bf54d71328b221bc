use chrono::{DateTime, Utc};
use rocket::Request;
use rocket::State;
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};

use crate::auth::{AuthError, AuthResult, AuthState};
use crate::models::Role;

/// Authenticated requester, reconstructed from the session cookie on every
/// request. Handlers that prefer a redirect over a 401 take
/// `Option<SessionUser>` instead of the bare guard.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub username: String,
    pub email: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

impl SessionUser {
    pub fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for SessionUser {
    type Error = AuthError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match extract_session_user(request).await {
            Ok(user) => Outcome::Success(user),
            Err(err) => Outcome::Error((err.status(), err)),
        }
    }
}

/// Admin-only gate: same as [`SessionUser`] plus an exhaustive role check.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub SessionUser);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for RequireAdmin {
    type Error = AuthError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match SessionUser::from_request(request).await {
            Outcome::Success(user) => match user.role {
                Role::Admin => Outcome::Success(RequireAdmin(user)),
                Role::User => Outcome::Error((Status::Forbidden, AuthError::Forbidden)),
            },
            Outcome::Error(err) => Outcome::Error(err),
            Outcome::Forward(_) => {
                Outcome::Error((Status::Unauthorized, AuthError::Unauthorized))
            }
        }
    }
}

async fn extract_session_user(request: &Request<'_>) -> AuthResult<SessionUser> {
    let state = request
        .guard::<&State<AuthState>>()
        .await
        .succeeded()
        .ok_or_else(|| AuthError::Config("AuthState missing from managed state".into()))?;

    let cookie = request
        .cookies()
        .get(&state.config.session_cookie_name)
        .ok_or(AuthError::Unauthorized)?;

    let session = state.sessions.load(cookie.value(), Utc::now()).await?;

    if !session.authenticated {
        return Err(AuthError::Unauthorized);
    }

    Ok(SessionUser {
        username: session.username,
        email: session.email,
        role: session.role,
        expires_at: session.expires_at,
    })
}
