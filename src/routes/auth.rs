//! Auth extractor — resolves the caller from a bearer token or session cookie.

use axum::extract::FromRef;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, CookieJar};

use crate::error::ApiError;
use crate::ids::EntityId;
use crate::state::AppState;

pub(crate) const COOKIE_NAME: &str = "session_token";

/// Authenticated user resolved by the identity provider.
/// Use as a handler parameter to require authentication.
#[derive(Debug)]
pub struct AuthUser {
    pub user_id: EntityId,
}

impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(token) = request_token(parts) else {
            return Err(ApiError::Unauthenticated);
        };

        let app_state = AppState::from_ref(state);
        let user_id = app_state
            .identity
            .resolve(&token)
            .await?
            .ok_or(ApiError::Unauthenticated)?;

        Ok(Self { user_id })
    }
}

/// Bearer token from `Authorization`, falling back to the session cookie.
pub(crate) fn request_token(parts: &Parts) -> Option<String> {
    let bearer = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_owned());
    }

    let jar = CookieJar::from_headers(&parts.headers);
    jar.get(COOKIE_NAME)
        .map(Cookie::value)
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
