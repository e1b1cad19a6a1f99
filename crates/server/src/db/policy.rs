//! Pricing policy repository.
//!
//! The policy is a singleton: the table has a fixed singleton key, and
//! creation is an atomic create-if-absent (`ON CONFLICT DO NOTHING`), so two
//! concurrent creations cannot both commit. Replacement bumps `version`;
//! orders snapshot the version they were priced under.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use pixelpress_core::{DiscountTier, PricingPolicy, UserId};

use super::RepositoryError;

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` pricing policy queries.
#[derive(Debug, sqlx::FromRow)]
struct PolicyRow {
    default_photo_count: i64,
    extra_photo_price: Decimal,
    discount_tiers: Json<Vec<DiscountTier>>,
    max_qty_per_order: Option<i64>,
    version: i32,
    created_by: Option<Uuid>,
    updated_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PolicyRow> for PolicyRecord {
    type Error = RepositoryError;

    fn try_from(row: PolicyRow) -> Result<Self, Self::Error> {
        let default_photo_count = u32::try_from(row.default_photo_count).map_err(|_| {
            RepositoryError::DataCorruption("defaultPhotoCount out of range".to_string())
        })?;
        let max_qty_per_order = row
            .max_qty_per_order
            .map(u32::try_from)
            .transpose()
            .map_err(|_| {
                RepositoryError::DataCorruption("maxQtyPerOrder out of range".to_string())
            })?;

        Ok(Self {
            policy: PricingPolicy {
                default_photo_count,
                extra_photo_price: row.extra_photo_price,
                discount_tiers: row.discount_tiers.0,
                max_qty_per_order,
            },
            version: row.version,
            created_by: row.created_by.map(UserId::new),
            updated_by: row.updated_by.map(UserId::new),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// The stored pricing policy with its version and audit metadata.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRecord {
    #[serde(flatten)]
    pub policy: PricingPolicy,
    pub version: i32,
    pub created_by: Option<UserId>,
    pub updated_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Repository
// =============================================================================

const RETURNING: &str = "default_photo_count, extra_photo_price, discount_tiers, \
                         max_qty_per_order, version, created_by, updated_by, \
                         created_at, updated_at";

/// Repository for pricing policy database operations.
pub struct PolicyRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PolicyRepository<'a> {
    /// Create a new pricing policy repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store the initial pricing policy.
    ///
    /// The insert targets the fixed singleton key, so a concurrent creation
    /// loses the race at the storage layer rather than in application code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a policy already exists, or
    /// `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        policy: &PricingPolicy,
        actor: UserId,
    ) -> Result<PolicyRecord, RepositoryError> {
        let sql = format!(
            "INSERT INTO pricing_policy \
                 (singleton, default_photo_count, extra_photo_price, discount_tiers, \
                  max_qty_per_order, created_by) \
             VALUES (TRUE, $1, $2, $3, $4, $5) \
             ON CONFLICT (singleton) DO NOTHING \
             RETURNING {RETURNING}"
        );

        let row = sqlx::query_as::<_, PolicyRow>(&sql)
            .bind(i64::from(policy.default_photo_count))
            .bind(policy.extra_photo_price)
            .bind(Json(&policy.discount_tiers))
            .bind(policy.max_qty_per_order.map(i64::from))
            .bind(actor.as_uuid())
            .fetch_optional(self.pool)
            .await?;

        row.map_or_else(
            || {
                Err(RepositoryError::Conflict(
                    "Pricing rules already exist. Please update instead.".to_string(),
                ))
            },
            TryInto::try_into,
        )
    }

    /// Replace the active pricing policy, bumping its version.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no policy exists yet, or
    /// `RepositoryError::Database` if the query fails.
    pub async fn replace(
        &self,
        policy: &PricingPolicy,
        actor: UserId,
    ) -> Result<PolicyRecord, RepositoryError> {
        let sql = format!(
            "UPDATE pricing_policy \
             SET default_photo_count = $1, extra_photo_price = $2, discount_tiers = $3, \
                 max_qty_per_order = $4, updated_by = $5, \
                 version = version + 1, updated_at = NOW() \
             WHERE singleton \
             RETURNING {RETURNING}"
        );

        let row = sqlx::query_as::<_, PolicyRow>(&sql)
            .bind(i64::from(policy.default_photo_count))
            .bind(policy.extra_photo_price)
            .bind(Json(&policy.discount_tiers))
            .bind(policy.max_qty_per_order.map(i64::from))
            .bind(actor.as_uuid())
            .fetch_optional(self.pool)
            .await?;

        row.map_or(Err(RepositoryError::NotFound), TryInto::try_into)
    }

    /// Fetch the active pricing policy, if one has been created.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if the stored data is invalid.
    pub async fn get_active(&self) -> Result<Option<PolicyRecord>, RepositoryError> {
        let sql = format!("SELECT {RETURNING} FROM pricing_policy WHERE singleton");

        let row = sqlx::query_as::<_, PolicyRow>(&sql)
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }
}
