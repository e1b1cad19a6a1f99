//! Invoice route handler.

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use tracing::instrument;

use pixelpress_core::OrderId;

use crate::db::{OrderRepository, ProfileDirectory};
use crate::error::AppError;
use crate::middleware::AuthenticatedActor;
use crate::services::invoice::UNKNOWN_BUYER;
use crate::state::AppState;

/// Render an order's invoice as a PDF.
///
/// Issuable only for an `Accepted` order; nothing is persisted - every
/// request re-renders.
#[instrument(skip(_actor, state))]
pub async fn render(
    AuthenticatedActor(_actor): AuthenticatedActor,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<impl IntoResponse, AppError> {
    let order = OrderRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    if !order.status.invoice_issuable() {
        return Err(AppError::State(
            "no invoice available for this order".to_string(),
        ));
    }

    // A missing profile never fails the render; the invoice shows a
    // sentinel buyer name instead.
    let buyer = ProfileDirectory::new(state.pool())
        .display_name(order.created_by)
        .await?
        .unwrap_or_else(|| UNKNOWN_BUYER.to_string());

    let bytes = state.renderer().render(&order, &buyer).await?;

    tracing::info!(order_id = %order.id, size = bytes.len(), "Invoice rendered");

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("inline; filename=invoice-{}.pdf", order.id),
        ),
    ];

    Ok((headers, bytes))
}
