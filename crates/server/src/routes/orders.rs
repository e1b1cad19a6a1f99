//! Order route handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use pixelpress_core::{Order, OrderId, OrderStatus};

use crate::db::{OrderCounts, OrderRepository};
use crate::error::AppError;
use crate::middleware::{AuthenticatedActor, RequirePrivileged};
use crate::services::checkout::{self, NewOrderRequest};
use crate::state::AppState;

use super::invoice;

/// Orders router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create).get(list_all))
        .route("/mine", get(list_mine))
        .route("/dashboard", get(dashboard))
        .route("/dashboard/mine", get(my_dashboard))
        .route("/{id}/status", put(update_status))
        .route("/{id}/invoice", get(invoice::render))
}

// =============================================================================
// Response Types
// =============================================================================

#[derive(Debug, Serialize)]
struct OrderResponse {
    success: bool,
    message: String,
    order: Order,
}

#[derive(Debug, Serialize)]
struct OrdersResponse {
    success: bool,
    message: String,
    orders: Vec<Order>,
}

#[derive(Debug, Serialize)]
struct DashboardResponse {
    success: bool,
    message: String,
    data: OrderCounts,
}

/// Status transition request body.
#[derive(Debug, Deserialize)]
pub struct StatusInput {
    pub status: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Place a new order.
#[instrument(skip(actor, state, request))]
async fn create(
    AuthenticatedActor(actor): AuthenticatedActor,
    State(state): State<AppState>,
    Json(request): Json<NewOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), AppError> {
    let order = checkout::place_order(state.pool(), request, actor).await?;

    tracing::info!(
        order_id = %order.id,
        final_price = %order.final_price,
        "Order placed"
    );

    Ok((
        StatusCode::CREATED,
        Json(OrderResponse {
            success: true,
            message: "Order placed successfully".to_string(),
            order,
        }),
    ))
}

/// List the caller's own orders, newest first.
#[instrument(skip(actor, state))]
async fn list_mine(
    AuthenticatedActor(actor): AuthenticatedActor,
    State(state): State<AppState>,
) -> Result<Json<OrdersResponse>, AppError> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(actor.id)
        .await?;

    Ok(Json(OrdersResponse {
        success: true,
        message: "User orders fetched successfully".to_string(),
        orders,
    }))
}

/// List every order. Privileged.
#[instrument(skip(_actor, state))]
async fn list_all(
    RequirePrivileged(_actor): RequirePrivileged,
    State(state): State<AppState>,
) -> Result<Json<OrdersResponse>, AppError> {
    let orders = OrderRepository::new(state.pool()).list_all().await?;

    Ok(Json(OrdersResponse {
        success: true,
        message: "Orders fetched successfully".to_string(),
        orders,
    }))
}

/// Transition an order out of `Pending`. Privileged.
#[instrument(skip(actor, state))]
async fn update_status(
    RequirePrivileged(actor): RequirePrivileged,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(input): Json<StatusInput>,
) -> Result<Json<OrderResponse>, AppError> {
    let target: OrderStatus = input
        .status
        .parse()
        .map_err(|_| AppError::Validation(format!("unknown status: {}", input.status)))?;

    if !OrderStatus::Pending.can_transition_to(target) {
        return Err(AppError::State(format!(
            "an order cannot be transitioned to {target}"
        )));
    }

    let repo = OrderRepository::new(state.pool());

    // Compare-and-swap on Pending; on a miss, disambiguate between a missing
    // order and one already settled.
    let Some(order) = repo.transition(id, target, actor.id).await? else {
        return match repo.get(id).await? {
            Some(existing) => Err(AppError::State(format!(
                "cannot transition a {} order",
                existing.status
            ))),
            None => Err(AppError::NotFound("Order not found".to_string())),
        };
    };

    tracing::info!(order_id = %order.id, status = %order.status, "Order status updated");

    Ok(Json(OrderResponse {
        success: true,
        message: "Order status updated successfully".to_string(),
        order,
    }))
}

/// Global status counts. Privileged.
#[instrument(skip(_actor, state))]
async fn dashboard(
    RequirePrivileged(_actor): RequirePrivileged,
    State(state): State<AppState>,
) -> Result<Json<DashboardResponse>, AppError> {
    let data = OrderRepository::new(state.pool()).aggregate_counts().await?;

    Ok(Json(DashboardResponse {
        success: true,
        message: "Dashboard data fetched successfully".to_string(),
        data,
    }))
}

/// Status counts over the caller's own orders.
#[instrument(skip(actor, state))]
async fn my_dashboard(
    AuthenticatedActor(actor): AuthenticatedActor,
    State(state): State<AppState>,
) -> Result<Json<DashboardResponse>, AppError> {
    let data = OrderRepository::new(state.pool())
        .aggregate_counts_for_user(actor.id)
        .await?;

    Ok(Json(DashboardResponse {
        success: true,
        message: "Dashboard data fetched successfully".to_string(),
        data,
    }))
}
