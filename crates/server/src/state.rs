//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::services::invoice::InvoiceRenderer;

/// Application state shared across all handlers.
///
/// Cheap to clone; the inner data is reference-counted.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    renderer: InvoiceRenderer,
}

impl AppState {
    /// Build the shared state from loaded configuration and a ready pool.
    #[must_use]
    pub fn new(config: ServerConfig, pool: PgPool) -> Self {
        let renderer = InvoiceRenderer::new(config.invoice.clone());
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                renderer,
            }),
        }
    }

    /// Server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// The bounded invoice renderer.
    #[must_use]
    pub fn renderer(&self) -> &InvoiceRenderer {
        &self.inner.renderer
    }
}
