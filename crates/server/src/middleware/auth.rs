//! Actor extractors for the trusted identity boundary.
//!
//! Credential checks happen upstream: the gateway authenticates the caller
//! and forwards the identity as `x-actor-id` / `x-actor-role` headers. This
//! service trusts those headers and performs no verification of its own.
//!
//! # Example
//!
//! ```rust,ignore
//! async fn protected_handler(
//!     AuthenticatedActor(actor): AuthenticatedActor,
//! ) -> impl IntoResponse {
//!     format!("Hello, {}!", actor.id)
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use pixelpress_core::{Actor, Role, UserId};

use crate::error::AppError;

/// Header carrying the authenticated user id (uuid).
pub const ACTOR_ID_HEADER: &str = "x-actor-id";
/// Header carrying the authenticated role (`client`, `moderator`, `admin`).
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// Extractor that requires an authenticated actor.
pub struct AuthenticatedActor(pub Actor);

/// Extractor that requires a privileged (moderator/admin) actor.
pub struct RequirePrivileged(pub Actor);

fn actor_from_parts(parts: &Parts) -> Result<Actor, AppError> {
    let id = parts
        .headers
        .get(ACTOR_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_string()))?;
    let role = parts
        .headers
        .get(ACTOR_ROLE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_string()))?;

    let id: UserId = id
        .parse()
        .map_err(|_| AppError::Unauthorized("invalid actor identity".to_string()))?;
    let role: Role = role
        .parse()
        .map_err(|_| AppError::Unauthorized("invalid actor role".to_string()))?;

    Ok(Actor::new(id, role))
}

impl<S> FromRequestParts<S> for AuthenticatedActor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        actor_from_parts(parts).map(Self)
    }
}

impl<S> FromRequestParts<S> for RequirePrivileged
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let actor = actor_from_parts(parts)?;
        if !actor.is_privileged() {
            return Err(AppError::Forbidden(
                "operator access required".to_string(),
            ));
        }
        Ok(Self(actor))
    }
}
