//! Buyer profile directory.
//!
//! Profiles are owned by an external service; invoices only need the
//! buyer's display name, and a missing profile is never fatal - the invoice
//! falls back to a sentinel value.

use sqlx::PgPool;

use pixelpress_core::UserId;

use super::RepositoryError;

/// Read-only directory of buyer display names.
pub struct ProfileDirectory<'a> {
    pool: &'a PgPool,
}

impl<'a> ProfileDirectory<'a> {
    /// Create a new profile directory.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Look up a buyer's display name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn display_name(&self, user_id: UserId) -> Result<Option<String>, RepositoryError> {
        let name = sqlx::query_scalar::<_, String>(
            "SELECT display_name FROM client_profiles WHERE user_id = $1",
        )
        .bind(user_id.as_uuid())
        .fetch_optional(self.pool)
        .await?;

        Ok(name)
    }
}
