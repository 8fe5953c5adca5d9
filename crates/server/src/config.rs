//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SUMMIT_DATABASE_URL` - `PostgreSQL` connection string
//! - `SUMMIT_BASE_URL` - Public URL of the server
//! - `SUMMIT_IDENTITY_ENDPOINT` - Base URL of the identity provider API
//! - `SUMMIT_IDENTITY_API_TOKEN` - Server-to-provider API token
//!
//! ## Optional
//! - `SUMMIT_HOST` - Bind address (default: 127.0.0.1)
//! - `SUMMIT_PORT` - Listen port (default: 3000)
//! - `SUMMIT_IDENTITY_COOKIE` - Provider session cookie name (default: `summit_session`)
//! - `SUMMIT_IDENTITY_SIGN_IN_URL` - Hosted sign-in URL (default: `<endpoint>/sign-in`)
//! - `SUMMIT_SESSION_CACHE_TTL_SECONDS` - Staleness window of cached session
//!   resolution (default: 120)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Tracing sample rate (default: 0.1)

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_API_TOKEN_LENGTH: usize = 16;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Summit server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the server
    pub base_url: String,
    /// Identity provider configuration
    pub identity: IdentityConfig,
    /// Staleness window of the cached session-resolution entry point
    pub session_cache_ttl: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate
    pub sentry_sample_rate: f32,
    /// Sentry tracing sample rate
    pub sentry_traces_sample_rate: f32,
}

/// Identity provider configuration.
///
/// Implements `Debug` manually to redact the API token.
#[derive(Clone)]
pub struct IdentityConfig {
    /// Base URL of the provider API
    pub endpoint: String,
    /// Server-to-provider API token (never the member's credential)
    pub api_token: SecretString,
    /// Name of the provider's session cookie on inbound requests
    pub cookie_name: String,
    /// Hosted sign-in URL members are sent to
    pub sign_in_url: String,
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("endpoint", &self.endpoint)
            .field("api_token", &"[REDACTED]")
            .field("cookie_name", &self.cookie_name)
            .field("sign_in_url", &self.sign_in_url)
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
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the provider API token fails placeholder/length validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let database_url = SecretString::from(required("SUMMIT_DATABASE_URL")?);

        let host: IpAddr = optional("SUMMIT_HOST")
            .unwrap_or_else(|| "127.0.0.1".to_owned())
            .parse()
            .map_err(|e| invalid("SUMMIT_HOST", &e))?;
        let port: u16 = optional("SUMMIT_PORT")
            .unwrap_or_else(|| "3000".to_owned())
            .parse()
            .map_err(|e| invalid("SUMMIT_PORT", &e))?;

        let base_url = required("SUMMIT_BASE_URL")?;
        Url::parse(&base_url).map_err(|e| invalid("SUMMIT_BASE_URL", &e))?;

        let endpoint = required("SUMMIT_IDENTITY_ENDPOINT")?;
        Url::parse(&endpoint).map_err(|e| invalid("SUMMIT_IDENTITY_ENDPOINT", &e))?;

        let api_token = required("SUMMIT_IDENTITY_API_TOKEN")?;
        validate_secret("SUMMIT_IDENTITY_API_TOKEN", &api_token)?;

        let cookie_name =
            optional("SUMMIT_IDENTITY_COOKIE").unwrap_or_else(|| "summit_session".to_owned());
        let sign_in_url = optional("SUMMIT_IDENTITY_SIGN_IN_URL")
            .unwrap_or_else(|| format!("{}/sign-in", endpoint.trim_end_matches('/')));

        let cache_ttl_seconds: u64 = optional("SUMMIT_SESSION_CACHE_TTL_SECONDS")
            .unwrap_or_else(|| "120".to_owned())
            .parse()
            .map_err(|e| invalid("SUMMIT_SESSION_CACHE_TTL_SECONDS", &e))?;

        let sentry_sample_rate: f32 = optional("SENTRY_SAMPLE_RATE")
            .unwrap_or_else(|| "1.0".to_owned())
            .parse()
            .map_err(|e| invalid("SENTRY_SAMPLE_RATE", &e))?;
        let sentry_traces_sample_rate: f32 = optional("SENTRY_TRACES_SAMPLE_RATE")
            .unwrap_or_else(|| "0.1".to_owned())
            .parse()
            .map_err(|e| invalid("SENTRY_TRACES_SAMPLE_RATE", &e))?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            identity: IdentityConfig {
                endpoint,
                api_token: SecretString::from(api_token),
                cookie_name,
                sign_in_url,
            },
            session_cache_ttl: Duration::from_secs(cache_ttl_seconds),
            sentry_dsn: optional("SENTRY_DSN"),
            sentry_environment: optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Socket address to bind the server to.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn required(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_owned()))
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

fn invalid(name: &str, err: &impl std::fmt::Display) -> ConfigError {
    ConfigError::InvalidEnvVar(name.to_owned(), err.to_string())
}

/// Reject placeholder-looking or too-short secrets.
fn validate_secret(name: &str, value: &str) -> Result<(), ConfigError> {
    if value.len() < MIN_API_TOKEN_LENGTH {
        return Err(ConfigError::InsecureSecret(
            name.to_owned(),
            format!("must be at least {MIN_API_TOKEN_LENGTH} characters"),
        ));
    }

    let lowered = value.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS
        .iter()
        .find(|pattern| lowered.contains(*pattern))
    {
        return Err(ConfigError::InsecureSecret(
            name.to_owned(),
            format!("looks like a placeholder (contains {pattern:?})"),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_secret_accepts_real_tokens() {
        assert!(validate_secret("TOKEN", "sk_live_9f8a7b6c5d4e3f2a1b0c").is_ok());
    }

    #[test]
    fn test_validate_secret_rejects_short_values() {
        let err = validate_secret("TOKEN", "abc123").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(..)));
    }

    #[test]
    fn test_validate_secret_rejects_placeholders() {
        for value in [
            "your-api-token-here-123",
            "CHANGEME-please-now-000",
            "example-token-1234567890",
        ] {
            assert!(
                validate_secret("TOKEN", value).is_err(),
                "{value} should be rejected"
            );
        }
    }

    #[test]
    fn test_identity_config_debug_redacts_token() {
        let config = IdentityConfig {
            endpoint: "https://id.example.com".to_owned(),
            api_token: SecretString::from("sk_live_9f8a7b6c5d4e3f2a"),
            cookie_name: "summit_session".to_owned(),
            sign_in_url: "https://id.example.com/sign-in".to_owned(),
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("sk_live"));
    }
}
