//! Order repository.
//!
//! One row per order; lines and payment declarations are embedded as JSONB
//! since they have no lifecycle of their own. Status transitions are
//! compare-and-swap updates so two concurrent operators cannot move the same
//! order to different terminal states.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use pixelpress_core::{Order, OrderId, OrderLine, OrderStatus, PaymentDeclaration, UserId};

use super::RepositoryError;

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` order queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    lines: Json<Vec<OrderLine>>,
    sub_total: Decimal,
    discounted_amount: Decimal,
    final_price: Decimal,
    status: String,
    payments: Json<Vec<PaymentDeclaration>>,
    policy_version: i32,
    created_by: Uuid,
    updated_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status: OrderStatus = row.status.parse().map_err(|_| {
            RepositoryError::DataCorruption(format!("invalid order status: {}", row.status))
        })?;

        Ok(Self {
            id: OrderId::new(row.id),
            lines: row.lines.0,
            sub_total: row.sub_total,
            discounted_amount: row.discounted_amount,
            final_price: row.final_price,
            status,
            payments: row.payments.0,
            policy_version: row.policy_version,
            created_by: UserId::new(row.created_by),
            updated_by: row.updated_by.map(UserId::new),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Internal row type for the status-count aggregation.
#[derive(Debug, sqlx::FromRow)]
struct CountsRow {
    total: i64,
    pending: i64,
    accepted: i64,
    cancelled: i64,
}

/// Order counts by status, recomputed on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderCounts {
    #[serde(rename = "totalOrders")]
    pub total: i64,
    #[serde(rename = "pendingOrders")]
    pub pending: i64,
    #[serde(rename = "acceptedOrders")]
    pub accepted: i64,
    #[serde(rename = "cancelledOrders")]
    pub cancelled: i64,
}

impl From<CountsRow> for OrderCounts {
    fn from(row: CountsRow) -> Self {
        Self {
            total: row.total,
            pending: row.pending,
            accepted: row.accepted,
            cancelled: row.cancelled,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

const COLUMNS: &str = "id, lines, sub_total, discounted_amount, final_price, status, \
                       payments, policy_version, created_by, updated_by, \
                       created_at, updated_at";

const COUNTS: &str = "COUNT(*) AS total, \
                      COUNT(*) FILTER (WHERE status = 'Pending') AS pending, \
                      COUNT(*) FILTER (WHERE status = 'Accepted') AS accepted, \
                      COUNT(*) FILTER (WHERE status = 'Cancelled') AS cancelled";

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Persist a freshly assembled order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(&self, order: &Order) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO orders \
                 (id, lines, sub_total, discounted_amount, final_price, status, \
                  payments, policy_version, created_by, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(order.id.as_uuid())
        .bind(Json(&order.lines))
        .bind(order.sub_total)
        .bind(order.discounted_amount)
        .bind(order.final_price)
        .bind(order.status.to_string())
        .bind(Json(&order.payments))
        .bind(order.policy_version)
        .bind(order.created_by.as_uuid())
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Fetch one order by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if the stored data is invalid.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let sql = format!("SELECT {COLUMNS} FROM orders WHERE id = $1");

        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// List a purchaser's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if the stored data is invalid.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM orders WHERE created_by = $1 ORDER BY created_at DESC"
        );

        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(user_id.as_uuid())
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// List every order, newest first. Privileged read path.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if the stored data is invalid.
    pub async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let sql = format!("SELECT {COLUMNS} FROM orders ORDER BY created_at DESC");

        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Transition an order out of `Pending`.
    ///
    /// Compare-and-swap: the update only applies while the order is still
    /// `Pending`, so concurrent transitions cannot both succeed. Returns the
    /// updated order, or `None` when the CAS found no pending row (missing
    /// order or one already in a terminal state - the caller disambiguates).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if the stored data is invalid.
    pub async fn transition(
        &self,
        id: OrderId,
        target: OrderStatus,
        actor: UserId,
    ) -> Result<Option<Order>, RepositoryError> {
        let sql = format!(
            "UPDATE orders \
             SET status = $2, updated_by = $3, updated_at = NOW() \
             WHERE id = $1 AND status = 'Pending' \
             RETURNING {COLUMNS}"
        );

        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id.as_uuid())
            .bind(target.to_string())
            .bind(actor.as_uuid())
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Status counts over the whole order collection.
    ///
    /// Recomputed per call with a single filtered-count scan; fine at
    /// moderate volume. A high-volume deployment would maintain these
    /// incrementally on each transition instead.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn aggregate_counts(&self) -> Result<OrderCounts, RepositoryError> {
        let sql = format!("SELECT {COUNTS} FROM orders");

        let row = sqlx::query_as::<_, CountsRow>(&sql)
            .fetch_one(self.pool)
            .await?;

        Ok(row.into())
    }

    /// Status counts scoped to one purchaser's orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn aggregate_counts_for_user(
        &self,
        user_id: UserId,
    ) -> Result<OrderCounts, RepositoryError> {
        let sql = format!("SELECT {COUNTS} FROM orders WHERE created_by = $1");

        let row = sqlx::query_as::<_, CountsRow>(&sql)
            .bind(user_id.as_uuid())
            .fetch_one(self.pool)
            .await?;

        Ok(row.into())
    }
}
