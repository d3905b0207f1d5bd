//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` (or `RESTOCK_DATABASE_URL`) - `PostgreSQL` connection string
//! - `BASE_PUBLIC_URL` - Public URL of this app; Shopify delivers webhooks here
//! - `SHOPIFY_API_KEY` - Shopify app client ID
//! - `SHOPIFY_API_SECRET` - Shopify app client secret
//!
//! ## Optional
//! - `RESTOCK_HOST` - Bind address (default: 127.0.0.1)
//! - `RESTOCK_PORT` - Listen port (default: 8000)
//! - `SHOPIFY_API_VERSION` - Admin API version (default: 2024-01)
//! - `WA_PHONE_NUMBER_ID` - WhatsApp Business phone number ID
//! - `WA_ACCESS_TOKEN` - WhatsApp Cloud API bearer token
//! - `WA_API_BASE` - Graph API base URL (default: <https://graph.facebook.com/v18.0>)
//! - `INVENTORY_PRECHECK` - Reject subscriptions for in-stock products (default: false)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//!
//! The WhatsApp variables are optional so the server can boot (and accept
//! subscriptions) before the Meta app review grants API access; sends fail
//! with a logged diagnostic until both are present.

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

/// Default Graph API base. The version segment is part of the send URL, so
/// bumping it is a config change, not a code change.
pub const DEFAULT_WA_API_BASE: &str = "https://graph.facebook.com/v18.0";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Top-level server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for this app (webhook callback target)
    pub base_url: String,
    /// Shopify Admin API configuration
    pub shopify: ShopifyConfig,
    /// WhatsApp Cloud API configuration
    pub whatsapp: WhatsAppConfig,
    /// Reject subscriptions for products that currently have stock
    pub inventory_precheck: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

/// Shopify Admin API configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct ShopifyConfig {
    /// Shopify app client ID
    pub api_key: String,
    /// Shopify app client secret
    pub api_secret: SecretString,
    /// Admin API version (e.g., 2024-01)
    pub api_version: String,
}

impl std::fmt::Debug for ShopifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyConfig")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .finish()
    }
}

/// WhatsApp Cloud API configuration.
///
/// Implements `Debug` manually to redact the bearer token.
#[derive(Clone)]
pub struct WhatsAppConfig {
    /// WhatsApp Business phone number ID (the sender, not a phone number)
    pub phone_number_id: Option<String>,
    /// Cloud API bearer token
    pub access_token: Option<SecretString>,
    /// Graph API base URL, overridable for tests
    pub api_base: String,
}

impl std::fmt::Debug for WhatsAppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhatsAppConfig")
            .field("phone_number_id", &self.phone_number_id)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl ServerConfig {
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

        let database_url = get_database_url("RESTOCK_DATABASE_URL")?;
        let host = get_env_or_default("RESTOCK_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("RESTOCK_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("RESTOCK_PORT", "8000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("RESTOCK_PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env("BASE_PUBLIC_URL")?
            .trim_end_matches('/')
            .to_string();

        let inventory_precheck = parse_bool(&get_env_or_default("INVENTORY_PRECHECK", "false"))
            .ok_or_else(|| {
                ConfigError::InvalidEnvVar(
                    "INVENTORY_PRECHECK".to_string(),
                    "expected true or false".to_string(),
                )
            })?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            shopify: ShopifyConfig::from_env()?,
            whatsapp: WhatsAppConfig::from_env(),
            inventory_precheck,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl ShopifyConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: get_required_env("SHOPIFY_API_KEY")?,
            api_secret: get_required_secret("SHOPIFY_API_SECRET")?,
            api_version: get_env_or_default("SHOPIFY_API_VERSION", "2024-01"),
        })
    }
}

impl WhatsAppConfig {
    fn from_env() -> Self {
        Self {
            phone_number_id: get_optional_env("WA_PHONE_NUMBER_ID"),
            access_token: get_optional_env("WA_ACCESS_TOKEN").map(SecretString::from),
            api_base: get_env_or_default("WA_API_BASE", DEFAULT_WA_API_BASE)
                .trim_end_matches('/')
                .to_string(),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

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

/// Parse a boolean flag value. Returns `None` for unrecognized input.
fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_accepts_common_forms() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("yes"), Some(true));
        assert_eq!(parse_bool("false"), Some(false));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool(""), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_shopify_config_debug_redacts_secret() {
        let config = ShopifyConfig {
            api_key: "key".to_string(),
            api_secret: SecretString::from("hunter2"),
            api_version: "2024-01".to_string(),
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_whatsapp_config_debug_redacts_token() {
        let config = WhatsAppConfig {
            phone_number_id: Some("123456".to_string()),
            access_token: Some(SecretString::from("wa-token")),
            api_base: DEFAULT_WA_API_BASE.to_string(),
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("wa-token"));
    }
}
