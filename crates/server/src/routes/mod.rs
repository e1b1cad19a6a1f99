//! Route handlers and router assembly.

pub mod invoice;
pub mod orders;
pub mod policy;

use axum::Router;

use crate::state::AppState;

/// Assemble the `/api/v1` surface.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/v1/pricing-rules", policy::routes())
        .nest("/api/v1/orders", orders::routes())
}
