//! Authenticated caller extractor.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use super::error::{AuthError, AuthResult};

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Authenticated user.
///
/// Use this in handlers that act on behalf of a user:
///
/// ```ignore
/// async fn handler(user: AuthUser) -> impl IntoResponse {
///     format!("Hello, {}!", user.id)
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    /// User ID.
    pub id: Uuid,
}

impl AuthUser {
    fn from_parts(parts: &Parts) -> AuthResult<Self> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or(AuthError::MissingUserHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidUserHeader)?;

        let id = raw
            .trim()
            .parse()
            .map_err(|_| AuthError::InvalidUserHeader)?;

        Ok(Self { id })
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_parts(parts)
    }
}
