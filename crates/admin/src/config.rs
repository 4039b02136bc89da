//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `ADMIN_BASE_URL` - Public URL for the admin API (default: `http://{host}:{port}`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`
//! - `LOG_FORMAT` - `json` for structured logs, anything else for text
//!
//! ## Optional (category tree)
//! - `CATEGORY_PAGE_SIZE` - Default list page size (default: 10)
//! - `CATEGORY_MAX_PAGE_SIZE` - Largest accepted page size (default: 100)
//! - `CATEGORY_SLUG_RETRIES` - Slug re-resolutions after a unique index race (default: 3)
//! - `CATEGORY_CYCLE_CHECK` - `deep` or `shallow` (default: deep)
//! - `CATEGORY_CASCADE_PATHS` - Rewrite descendant paths on rename/move (default: false)
//!
//! ## Optional (TLS)
//! - `ADMIN_TLS_CERT` - PEM-encoded certificate chain
//! - `ADMIN_TLS_KEY` - PEM-encoded private key

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

use crate::services::categories::{CycleCheck, TreePolicy};

const DEFAULT_PAGE_SIZE: i64 = 10;
const DEFAULT_MAX_PAGE_SIZE: i64 = 100;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the admin API
    pub base_url: String,
    /// Category tree behaviour
    pub categories: CategoryConfig,
    /// Emit JSON logs instead of text
    pub json_logs: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
    /// TLS configuration for HTTPS (optional)
    pub tls: Option<TlsConfig>,
}

/// Category service configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryConfig {
    /// Page size used when a list request does not specify one.
    pub default_page_size: i64,
    /// Largest page size a list request may ask for.
    pub max_page_size: i64,
    /// Tree mutation policy.
    pub policy: TreePolicy,
}

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            policy: TreePolicy::default(),
        }
    }
}

impl CategoryConfig {
    /// Load category configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(|key| std::env::var(key).ok())
    }

    fn from_source(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let default_page_size: i64 = parse_or(&get, "CATEGORY_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        let max_page_size: i64 = parse_or(&get, "CATEGORY_MAX_PAGE_SIZE", DEFAULT_MAX_PAGE_SIZE)?;
        let slug_retries: u32 = parse_or(
            &get,
            "CATEGORY_SLUG_RETRIES",
            TreePolicy::DEFAULT_SLUG_RETRIES,
        )?;
        let cycle_check: CycleCheck = parse_or(&get, "CATEGORY_CYCLE_CHECK", CycleCheck::Deep)?;
        let cascade_paths: bool = parse_or(&get, "CATEGORY_CASCADE_PATHS", false)?;

        if default_page_size < 1 {
            return Err(ConfigError::InvalidEnvVar(
                "CATEGORY_PAGE_SIZE".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        if max_page_size < default_page_size {
            return Err(ConfigError::InvalidEnvVar(
                "CATEGORY_MAX_PAGE_SIZE".to_string(),
                format!("must be at least CATEGORY_PAGE_SIZE ({default_page_size})"),
            ));
        }

        Ok(Self {
            default_page_size,
            max_page_size,
            policy: TreePolicy {
                cycle_check,
                cascade_paths,
                slug_retries,
            },
        })
    }
}

/// TLS configuration for HTTPS.
#[derive(Clone)]
pub struct TlsConfig {
    /// PEM-encoded certificate chain
    pub cert_pem: String,
    /// PEM-encoded private key
    pub key_pem: SecretString,
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("cert_pem", &"[CERTIFICATE]")
            .field("key_pem", &"[REDACTED]")
            .finish()
    }
}

impl TlsConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let cert_pem = get_optional_env("ADMIN_TLS_CERT");
        let key_pem = get_optional_env("ADMIN_TLS_KEY");

        match (cert_pem, key_pem) {
            (Some(cert), Some(key)) => Ok(Some(Self {
                cert_pem: cert,
                key_pem: SecretString::from(key),
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "ADMIN_TLS_*".to_string(),
                "Both ADMIN_TLS_CERT and ADMIN_TLS_KEY must be set together".to_string(),
            )),
        }
    }
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("ADMIN_DATABASE_URL")?;
        let host = get_env_or_default("ADMIN_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("ADMIN_PORT", "3001")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_PORT".to_string(), e.to_string()))?;
        let base_url = get_optional_env("ADMIN_BASE_URL")
            .unwrap_or_else(|| format!("http://{}", SocketAddr::new(host, port)));
        validate_base_url(&base_url)?;

        let categories = CategoryConfig::from_env()?;
        let json_logs = get_optional_env("LOG_FORMAT").is_some_and(|f| f == "json");
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let tls = TlsConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            categories,
            json_logs,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
            tls,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Returns the category tree configuration.
    #[must_use]
    pub const fn categories(&self) -> &CategoryConfig {
        &self.categories
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an optional variable, falling back to `default` when unset or blank.
fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        _ => Ok(default),
    }
}

/// Reject base URLs that are not absolute http(s) URLs.
fn validate_base_url(base_url: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(base_url)
        .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_BASE_URL".to_string(), e.to_string()))?;

    if matches!(parsed.scheme(), "http" | "https") {
        Ok(())
    } else {
        Err(ConfigError::InvalidEnvVar(
            "ADMIN_BASE_URL".to_string(),
            format!("unsupported scheme '{}'", parsed.scheme()),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn source(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_category_config_defaults() {
        let config = CategoryConfig::from_source(source(&[])).unwrap();
        assert_eq!(config, CategoryConfig::default());
        assert_eq!(config.default_page_size, 10);
        assert_eq!(config.max_page_size, 100);
        assert_eq!(config.policy.cycle_check, CycleCheck::Deep);
        assert!(!config.policy.cascade_paths);
        assert_eq!(config.policy.slug_retries, 3);
    }

    #[test]
    fn test_category_config_overrides() {
        let config = CategoryConfig::from_source(source(&[
            ("CATEGORY_PAGE_SIZE", "25"),
            ("CATEGORY_MAX_PAGE_SIZE", "50"),
            ("CATEGORY_SLUG_RETRIES", "0"),
            ("CATEGORY_CYCLE_CHECK", "shallow"),
            ("CATEGORY_CASCADE_PATHS", "true"),
        ]))
        .unwrap();

        assert_eq!(config.default_page_size, 25);
        assert_eq!(config.max_page_size, 50);
        assert_eq!(config.policy.slug_retries, 0);
        assert_eq!(config.policy.cycle_check, CycleCheck::Shallow);
        assert!(config.policy.cascade_paths);
    }

    #[test]
    fn test_category_config_blank_uses_default() {
        let config =
            CategoryConfig::from_source(source(&[("CATEGORY_CYCLE_CHECK", "  ")])).unwrap();
        assert_eq!(config.policy.cycle_check, CycleCheck::Deep);
    }

    #[test]
    fn test_category_config_rejects_garbage() {
        let err = CategoryConfig::from_source(source(&[("CATEGORY_CYCLE_CHECK", "sideways")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "CATEGORY_CYCLE_CHECK"));

        let err =
            CategoryConfig::from_source(source(&[("CATEGORY_PAGE_SIZE", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_category_config_max_below_default_rejected() {
        let err = CategoryConfig::from_source(source(&[
            ("CATEGORY_PAGE_SIZE", "20"),
            ("CATEGORY_MAX_PAGE_SIZE", "10"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "CATEGORY_MAX_PAGE_SIZE"));
    }

    #[test]
    fn test_validate_base_url() {
        assert!(validate_base_url("http://localhost:3001").is_ok());
        assert!(validate_base_url("https://admin.example.com").is_ok());
        assert!(validate_base_url("ftp://admin.example.com").is_err());
        assert!(validate_base_url("not a url").is_err());
    }

    #[test]
    fn test_socket_addr() {
        let config = AdminConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3001,
            base_url: "http://localhost:3001".to_string(),
            categories: CategoryConfig::default(),
            json_logs: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
            tls: None,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3001);
        assert_eq!(config.database_url.expose_secret(), "postgres://localhost/test");
    }

    #[test]
    fn test_tls_config_debug_redacts_key() {
        let config = TlsConfig {
            cert_pem: "-----BEGIN CERTIFICATE-----".to_string(),
            key_pem: SecretString::from("super_secret_private_key"),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_private_key"));
    }
}
