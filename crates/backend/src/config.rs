//! Backend configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `FIREBASE_API_KEY` - Web API key of the Firebase project
//! - `FIREBASE_PROJECT_ID` - Firebase project ID
//!
//! ## Optional
//! - `FIREBASE_STORAGE_BUCKET` - Storage bucket (default: `<project>.firebasestorage.app`)
//! - `SKYDECK_ADMIN_EMAILS` - Comma-separated administrator allow-list
//! - `SKYDECK_ROLE_RETRIES` - Extra role lookups after a miss (default: 2)
//! - `SKYDECK_ROLE_RETRY_DELAY_MS` - Delay between role lookups (default: 500)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::services::roles::{AdminAllowList, RoleResolverConfig};

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "insert",
    "put-your",
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

/// Backend configuration.
#[derive(Debug, Clone)]
pub struct SkydeckConfig {
    /// Firebase project access
    pub firebase: FirebaseConfig,
    /// Administrator allow-list
    pub admin_emails: AdminAllowList,
    /// Role lookup retry policy
    pub role_resolver: RoleResolverConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Firebase project configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct FirebaseConfig {
    /// Web API key
    pub api_key: SecretString,
    /// Project ID
    pub project_id: String,
    /// Storage bucket name
    pub storage_bucket: String,
}

impl std::fmt::Debug for FirebaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseConfig")
            .field("api_key", &"[REDACTED]")
            .field("project_id", &self.project_id)
            .field("storage_bucket", &self.storage_bucket)
            .finish()
    }
}

impl SkydeckConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid, or
    /// if the API key looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`from_env`](Self::from_env).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingEnvVar(key.to_owned()))
        };

        let api_key = SecretString::from(required("FIREBASE_API_KEY")?);
        validate_api_key(&api_key, "FIREBASE_API_KEY")?;
        let project_id = required("FIREBASE_PROJECT_ID")?;
        let storage_bucket = lookup("FIREBASE_STORAGE_BUCKET")
            .unwrap_or_else(|| format!("{project_id}.firebasestorage.app"));

        let admin_emails = AdminAllowList::parse(
            lookup("SKYDECK_ADMIN_EMAILS").as_deref().unwrap_or_default(),
        )
        .map_err(|e| ConfigError::InvalidEnvVar("SKYDECK_ADMIN_EMAILS".to_owned(), e))?;

        let defaults = RoleResolverConfig::default();
        let retries = parse_or(
            "SKYDECK_ROLE_RETRIES",
            lookup("SKYDECK_ROLE_RETRIES"),
            defaults.retries,
        )?;
        let delay_ms = parse_or(
            "SKYDECK_ROLE_RETRY_DELAY_MS",
            lookup("SKYDECK_ROLE_RETRY_DELAY_MS"),
            u64::try_from(defaults.retry_delay.as_millis()).unwrap_or(u64::MAX),
        )?;

        Ok(Self {
            firebase: FirebaseConfig {
                api_key,
                project_id,
                storage_bucket,
            },
            admin_emails,
            role_resolver: RoleResolverConfig {
                retries,
                retry_delay: Duration::from_millis(delay_ms),
            },
            sentry_dsn: lookup("SENTRY_DSN"),
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
        })
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.map_or(Ok(default), |value| {
        value
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string()))
    })
}

/// Reject API keys that were obviously never filled in.
fn validate_api_key(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.expose_secret().to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_owned(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    Ok(())
}
