//! Order placement.
//!
//! The checkout path is server-authoritative: unit prices come from the
//! catalog, totals come from the price calculator under the stored policy,
//! and any totals the caller declares are compared against the computed
//! figures - a mismatch rejects the order rather than correcting either
//! side. Nothing is persisted unless every step succeeds.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;

use pixelpress_core::{
    Actor, CartLine, CartTotals, Order, OrderError, OrderId, OrderLine, OrderStatus,
    PaymentDeclaration, ProductId, price_cart, price_line, validate_payments,
};

use crate::db::{CatalogRepository, OrderRepository, PolicyRepository};
use crate::error::AppError;

/// One requested cart line. Quantities arrive as signed integers so a
/// negative value can be reported as a validation failure instead of a
/// deserialization error.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderLine {
    pub product_id: ProductId,
    pub quantity: i64,
    pub photo_count: i64,
}

/// The order-creation request body.
///
/// `sub_total` / `discounted_amount` / `final_price` are optional echoes of
/// the client's own arithmetic; when present they must match the
/// server-computed totals exactly.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderRequest {
    #[serde(default)]
    pub order_items: Vec<NewOrderLine>,
    #[serde(default)]
    pub payment_details: Vec<PaymentDeclaration>,
    pub sub_total: Option<Decimal>,
    pub discounted_amount: Option<Decimal>,
    pub final_price: Option<Decimal>,
}

/// Place an order: snapshot the catalog, price the cart under the active
/// policy, verify the caller's declared totals and payments, and persist in
/// `Pending`.
///
/// # Errors
///
/// Returns [`AppError::Validation`] for an empty cart, missing payments,
/// unknown/inactive products, or bad quantities; [`AppError::NotFound`] when
/// no pricing policy exists (checkout fails closed); [`AppError::State`] for
/// declared-total or payment-sum mismatches; [`AppError::Database`] on
/// storage failure.
pub async fn place_order(
    pool: &PgPool,
    request: NewOrderRequest,
    actor: Actor,
) -> Result<Order, AppError> {
    if request.order_items.is_empty() {
        return Err(OrderError::EmptyCart.into());
    }
    if request.payment_details.is_empty() {
        return Err(OrderError::NoPayment.into());
    }

    // Checkout fails closed when no policy has been configured.
    let record = PolicyRepository::new(pool)
        .get_active()
        .await?
        .ok_or_else(|| AppError::NotFound("no pricing rules configured".to_string()))?;
    let policy = &record.policy;

    let catalog = CatalogRepository::new(pool);
    let mut cart_lines = Vec::with_capacity(request.order_items.len());
    let mut order_lines = Vec::with_capacity(request.order_items.len());

    for item in &request.order_items {
        let quantity = u32::try_from(item.quantity)
            .ok()
            .filter(|q| *q >= 1)
            .ok_or_else(|| AppError::Validation("line quantity must be at least 1".to_string()))?;
        let photo_count = u32::try_from(item.photo_count).map_err(|_| {
            AppError::Validation("photoCount cannot be negative".to_string())
        })?;

        let product = catalog
            .get(item.product_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("product {} not found", item.product_id)))?;
        if !product.active {
            return Err(AppError::Validation(format!(
                "product {} is not available",
                product.name
            )));
        }

        let cart_line = CartLine {
            unit_price: product.base_price,
            quantity,
            photo_count,
        };
        let line_total = price_line(&cart_line, policy)?;

        order_lines.push(OrderLine {
            product_id: product.id,
            name: product.name,
            unit_price: product.base_price,
            quantity,
            photo_count,
            line_total,
        });
        cart_lines.push(cart_line);
    }

    let totals = price_cart(&cart_lines, policy)?;
    verify_declared_totals(&request, &totals)?;
    validate_payments(&request.payment_details, totals.final_price)?;

    let now = Utc::now();
    let order = Order {
        id: OrderId::generate(),
        lines: order_lines,
        sub_total: totals.sub_total,
        discounted_amount: totals.discounted_amount,
        final_price: totals.final_price,
        status: OrderStatus::Pending,
        payments: request.payment_details,
        policy_version: record.version,
        created_by: actor.id,
        updated_by: None,
        created_at: now,
        updated_at: now,
    };

    OrderRepository::new(pool).insert(&order).await?;

    Ok(order)
}

/// Compare caller-declared totals against the computed ones.
///
/// Money is never silently corrected to the caller's figure: any declared
/// total that disagrees with the calculator rejects the order.
fn verify_declared_totals(request: &NewOrderRequest, computed: &CartTotals) -> Result<(), AppError> {
    let checks = [
        ("subTotal", request.sub_total, computed.sub_total),
        (
            "discountedAmount",
            request.discounted_amount,
            computed.discounted_amount,
        ),
        ("finalPrice", request.final_price, computed.final_price),
    ];

    for (field, declared, expected) in checks {
        if let Some(declared) = declared {
            if declared != expected {
                return Err(AppError::State(format!(
                    "declared {field} ({declared}) does not match the computed value ({expected})"
                )));
            }
        }
    }

    Ok(())
}
