//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string
//!
//! ## Optional
//! - `SERVER_HOST` - Bind address (default: 127.0.0.1)
//! - `SERVER_PORT` - Listen port (default: 5000)
//! - `CHROME_PATH` - Explicit path to the Chromium binary used for invoice
//!   conversion (default: discovered on `PATH`)
//! - `INVOICE_MAX_CONCURRENT_RENDERS` - Render pool size (default: 2)
//! - `INVOICE_RENDER_TIMEOUT_SECS` - Per-render timeout (default: 30)
//! - `INVOICE_PAGE_WIDTH_MM` / `INVOICE_PAGE_HEIGHT_MM` - Page size
//!   (default: 148 x 210, A5 portrait)
//! - `INVOICE_MARGIN_VERTICAL_MM` / `INVOICE_MARGIN_HORIZONTAL_MM` - Page
//!   margins (default: 15 / 10)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` / `SENTRY_TRACES_SAMPLE_RATE` - Sentry sampling

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const MM_PER_INCH: f64 = 25.4;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Invoice rendering configuration
    pub invoice: InvoiceConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Invoice rendering configuration.
///
/// The conversion step drives a headless Chromium instance, which can block
/// for hundreds of milliseconds; it runs behind a bounded pool sized by
/// `max_concurrent_renders`.
#[derive(Debug, Clone)]
pub struct InvoiceConfig {
    /// Explicit path to the Chromium binary, if not discoverable on `PATH`.
    pub chrome_path: Option<PathBuf>,
    /// How many renders may run at once.
    pub max_concurrent_renders: usize,
    /// Per-render timeout.
    pub render_timeout: Duration,
    /// Target page geometry.
    pub page: PageSettings,
}

/// Page geometry for the rendered invoice, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSettings {
    pub width_mm: f64,
    pub height_mm: f64,
    pub margin_vertical_mm: f64,
    pub margin_horizontal_mm: f64,
}

impl PageSettings {
    /// A5 portrait with 15 mm top/bottom and 10 mm left/right margins.
    #[must_use]
    pub const fn a5() -> Self {
        Self {
            width_mm: 148.0,
            height_mm: 210.0,
            margin_vertical_mm: 15.0,
            margin_horizontal_mm: 10.0,
        }
    }

    /// Page width in inches (the unit the conversion engine expects).
    #[must_use]
    pub fn width_in(&self) -> f64 {
        self.width_mm / MM_PER_INCH
    }

    /// Page height in inches.
    #[must_use]
    pub fn height_in(&self) -> f64 {
        self.height_mm / MM_PER_INCH
    }

    /// Top/bottom margin in inches.
    #[must_use]
    pub fn margin_vertical_in(&self) -> f64 {
        self.margin_vertical_mm / MM_PER_INCH
    }

    /// Left/right margin in inches.
    #[must_use]
    pub fn margin_horizontal_in(&self) -> f64 {
        self.margin_horizontal_mm / MM_PER_INCH
    }
}

impl ServerConfig {
    /// Load the configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required variable is missing or a value
    /// fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = SecretString::from(get_required_env("DATABASE_URL")?);

        let host = get_env_or_default("SERVER_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("SERVER_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("SERVER_PORT", "5000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("SERVER_PORT".to_string(), e.to_string()))?;

        let invoice = InvoiceConfig::from_env()?;

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            database_url,
            host,
            port,
            invoice,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl InvoiceConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let chrome_path = get_optional_env("CHROME_PATH").map(PathBuf::from);

        let max_concurrent_renders = get_env_or_default("INVOICE_MAX_CONCURRENT_RENDERS", "2")
            .parse::<usize>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("INVOICE_MAX_CONCURRENT_RENDERS".to_string(), e.to_string())
            })?;
        if max_concurrent_renders == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "INVOICE_MAX_CONCURRENT_RENDERS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let render_timeout_secs = get_env_or_default("INVOICE_RENDER_TIMEOUT_SECS", "30")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("INVOICE_RENDER_TIMEOUT_SECS".to_string(), e.to_string())
            })?;

        let defaults = PageSettings::a5();
        let page = PageSettings {
            width_mm: parse_mm("INVOICE_PAGE_WIDTH_MM", defaults.width_mm)?,
            height_mm: parse_mm("INVOICE_PAGE_HEIGHT_MM", defaults.height_mm)?,
            margin_vertical_mm: parse_mm("INVOICE_MARGIN_VERTICAL_MM", defaults.margin_vertical_mm)?,
            margin_horizontal_mm: parse_mm(
                "INVOICE_MARGIN_HORIZONTAL_MM",
                defaults.margin_horizontal_mm,
            )?,
        };

        Ok(Self {
            chrome_path,
            max_concurrent_renders,
            render_timeout: Duration::from_secs(render_timeout_secs),
            page,
        })
    }
}

fn parse_mm(key: &str, default: f64) -> Result<f64, ConfigError> {
    match get_optional_env(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<f64>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable, falling back to a default.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a5_defaults_match_print_layout() {
        let page = PageSettings::a5();
        assert_eq!(page.width_mm, 148.0);
        assert_eq!(page.height_mm, 210.0);
        assert_eq!(page.margin_vertical_mm, 15.0);
        assert_eq!(page.margin_horizontal_mm, 10.0);
    }

    #[test]
    fn millimetres_convert_to_inches() {
        let page = PageSettings::a5();
        assert!((page.width_in() - 5.826).abs() < 0.01);
        assert!((page.height_in() - 8.267).abs() < 0.01);
        assert!((page.margin_vertical_in() - 0.590).abs() < 0.01);
        assert!((page.margin_horizontal_in() - 0.393).abs() < 0.01);
    }

    #[test]
    fn config_error_display_names_the_variable() {
        let err = ConfigError::MissingEnvVar("DATABASE_URL".to_string());
        assert_eq!(err.to_string(), "Missing environment variable: DATABASE_URL");
    }
}
