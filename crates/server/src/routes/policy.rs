//! Pricing policy route handlers.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use pixelpress_core::{DiscountTier, PricingPolicy};

use crate::db::{CatalogRepository, PolicyRecord, PolicyRepository};
use crate::error::AppError;
use crate::middleware::{AuthenticatedActor, RequirePrivileged};
use crate::state::AppState;

/// Pricing policy router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(fetch).post(create).put(replace))
        .route("/unified", get(unified))
}

// =============================================================================
// Request / Response Types
// =============================================================================

/// One discount tier as submitted. Fields are optional so missing ones can
/// be reported as a validation failure rather than a deserialization error.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierInput {
    pub min_qty: Option<i64>,
    pub max_qty: Option<i64>,
    pub discount_percentage: Option<Decimal>,
}

/// Pricing policy create/replace request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyInput {
    pub default_photo_count: Option<i64>,
    pub extra_photo_price: Option<Decimal>,
    #[serde(default)]
    pub discount_rules: Vec<TierInput>,
    pub max_qty_per_order: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PolicyResponse {
    success: bool,
    message: String,
    pricing_rules: PolicyRecord,
}

/// Validate the submitted policy and lower it into the domain type.
fn parse_policy(input: PolicyInput) -> Result<PricingPolicy, AppError> {
    let (Some(default_photo_count), Some(extra_photo_price)) =
        (input.default_photo_count, input.extra_photo_price)
    else {
        return Err(AppError::Validation(
            "defaultPhotoCount and extraPhotoPrice are required".to_string(),
        ));
    };

    let default_photo_count = u32::try_from(default_photo_count).map_err(|_| {
        AppError::Validation("defaultPhotoCount cannot be negative".to_string())
    })?;

    let mut discount_tiers = Vec::with_capacity(input.discount_rules.len());
    for rule in input.discount_rules {
        let (Some(min_qty), Some(max_qty), Some(discount_percent)) =
            (rule.min_qty, rule.max_qty, rule.discount_percentage)
        else {
            return Err(AppError::Validation(
                "Invalid discount rule structure".to_string(),
            ));
        };

        if min_qty > max_qty {
            return Err(AppError::Validation(
                "minQty cannot be greater than maxQty".to_string(),
            ));
        }

        let (Ok(min_qty), Ok(max_qty)) = (u32::try_from(min_qty), u32::try_from(max_qty)) else {
            return Err(AppError::Validation(
                "discount rule quantities cannot be negative".to_string(),
            ));
        };

        discount_tiers.push(DiscountTier {
            min_qty,
            max_qty,
            discount_percent,
        });
    }

    let max_qty_per_order = input
        .max_qty_per_order
        .map(u32::try_from)
        .transpose()
        .map_err(|_| AppError::Validation("maxQtyPerOrder cannot be negative".to_string()))?;

    let policy = PricingPolicy {
        default_photo_count,
        extra_photo_price,
        discount_tiers,
        max_qty_per_order,
    };
    policy.validate()?;

    Ok(policy)
}

// =============================================================================
// Handlers
// =============================================================================

/// Create the initial pricing policy. Privileged.
#[instrument(skip(actor, state, input))]
async fn create(
    RequirePrivileged(actor): RequirePrivileged,
    State(state): State<AppState>,
    Json(input): Json<PolicyInput>,
) -> Result<(StatusCode, Json<PolicyResponse>), AppError> {
    let policy = parse_policy(input)?;
    let record = PolicyRepository::new(state.pool())
        .create(&policy, actor.id)
        .await?;

    tracing::info!(version = record.version, "Pricing rules created");

    Ok((
        StatusCode::CREATED,
        Json(PolicyResponse {
            success: true,
            message: "Pricing rules created successfully".to_string(),
            pricing_rules: record,
        }),
    ))
}

/// Replace the active pricing policy. Privileged.
#[instrument(skip(actor, state, input))]
async fn replace(
    RequirePrivileged(actor): RequirePrivileged,
    State(state): State<AppState>,
    Json(input): Json<PolicyInput>,
) -> Result<Json<PolicyResponse>, AppError> {
    let policy = parse_policy(input)?;
    let record = PolicyRepository::new(state.pool())
        .replace(&policy, actor.id)
        .await?;

    tracing::info!(version = record.version, "Pricing rules updated");

    Ok(Json(PolicyResponse {
        success: true,
        message: "Pricing rules updated successfully".to_string(),
        pricing_rules: record,
    }))
}

/// Fetch the active pricing policy.
#[instrument(skip(state))]
async fn fetch(
    AuthenticatedActor(_actor): AuthenticatedActor,
    State(state): State<AppState>,
) -> Result<Json<PolicyResponse>, AppError> {
    let record = PolicyRepository::new(state.pool())
        .get_active()
        .await?
        .ok_or_else(|| AppError::NotFound("no pricing rules configured".to_string()))?;

    Ok(Json(PolicyResponse {
        success: true,
        message: "Pricing rules fetched successfully".to_string(),
        pricing_rules: record,
    }))
}

// =============================================================================
// Unified View
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CategoryView {
    name: String,
    base_price: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UnifiedTier {
    min_quantity: u32,
    max_quantity: u32,
    discount_percent: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UnifiedRules {
    max_default_photos: u32,
    extra_photo_price: Decimal,
    discounts: Vec<UnifiedTier>,
    max_quantity: Option<u32>,
    custom_quote_message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UnifiedView {
    categories: Vec<CategoryView>,
    pricing_rules: UnifiedRules,
}

#[derive(Debug, Serialize)]
struct UnifiedResponse {
    success: bool,
    data: UnifiedView,
}

/// Read-optimized projection for client-side cart building: the active
/// policy's photo pricing and tiers, plus the active product catalog.
/// Public - no actor required.
#[instrument(skip(state))]
async fn unified(State(state): State<AppState>) -> Result<Json<UnifiedResponse>, AppError> {
    let record = PolicyRepository::new(state.pool())
        .get_active()
        .await?
        .ok_or_else(|| AppError::NotFound("no pricing rules configured".to_string()))?;

    let products = CatalogRepository::new(state.pool()).list_active().await?;

    let policy = record.policy;
    let data = UnifiedView {
        categories: products
            .into_iter()
            .map(|p| CategoryView {
                name: p.name,
                base_price: p.base_price,
            })
            .collect(),
        pricing_rules: UnifiedRules {
            max_default_photos: policy.default_photo_count,
            extra_photo_price: policy.extra_photo_price,
            discounts: policy
                .discount_tiers
                .into_iter()
                .map(|t| UnifiedTier {
                    min_quantity: t.min_qty,
                    max_quantity: t.max_qty,
                    discount_percent: t.discount_percent,
                })
                .collect(),
            max_quantity: policy.max_qty_per_order,
            custom_quote_message: "Contact for custom quote".to_string(),
        },
    };

    Ok(Json(UnifiedResponse {
        success: true,
        data,
    }))
}
