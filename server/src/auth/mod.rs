//! Caller Identity
//!
//! Authentication is owned by the platform in front of this service; it
//! forwards the authenticated user in the `X-User-Id` header.

mod error;
mod middleware;

pub use error::{AuthError, AuthResult};
pub use middleware::{AuthUser, USER_ID_HEADER};
