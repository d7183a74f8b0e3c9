//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `IDENTITY_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `COGNITO_REGION` - AWS region of the user pool (falls back to `AWS_REGION`)
//! - `COGNITO_USER_POOL_ID` - Cognito user pool ID
//! - `COGNITO_CLIENT_ID` - App client ID used for `USER_PASSWORD_AUTH`
//! - `COGNITO_GROUP_USER` - Group customers are added to
//! - `COGNITO_GROUP_ADMIN` - Group admin users are added to
//! - `COGNITO_PASSWORD_SUFFIX` - Suffix appended to the CPF to form the permanent password
//! - `COGNITO_TEMP_PASSWORD_SUFFIX` - Suffix appended to the CPF to form the temporary password
//!
//! ## Optional
//! - `IDENTITY_HOST` - Bind address (default: 127.0.0.1)
//! - `IDENTITY_PORT` - Listen port (default: 3210)
//! - `IDENTITY_CALL_TIMEOUT_SECS` - Per-request deadline forwarded to Cognito and `PostgreSQL`, 1 to 3600 (default: 10)
//! - `COGNITO_ANONYMOUS_USERNAME` - Guest identity username (default: unknown-user)
//! - `COGNITO_ANONYMOUS_PASSWORD` - Guest identity password (default: unknown-user)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use customer_identity_core::AccountKind;

const MIN_PASSWORD_SUFFIX_LENGTH: usize = 6;

/// Longest accepted per-request deadline.
pub const MAX_CALL_TIMEOUT_SECS: u64 = 3600;

const DEFAULT_ANONYMOUS_IDENTITY: &str = "unknown-user";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
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

/// Identity service configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Deadline applied to each request and forwarded to both capabilities
    pub call_timeout: Duration,
    /// Cognito user pool configuration
    pub cognito: CognitoConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate
    pub sentry_sample_rate: f32,
    /// Sentry transaction sample rate
    pub sentry_traces_sample_rate: f32,
}

/// Cognito user pool configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct CognitoConfig {
    /// AWS region of the user pool
    pub region: String,
    /// User pool ID
    pub user_pool_id: String,
    /// App client ID
    pub client_id: String,
    /// Group customers are registered under
    pub group_user: String,
    /// Group admin users are registered under
    pub group_admin: String,
    /// Appended to the CPF to form the permanent password
    pub password_suffix: SecretString,
    /// Appended to the CPF to form the temporary password
    pub temp_password_suffix: SecretString,
    /// Guest identity username
    pub anonymous_username: String,
    /// Guest identity password
    pub anonymous_password: SecretString,
}

impl CognitoConfig {
    /// Group an account of the given kind is registered under.
    #[must_use]
    pub fn group_for(&self, kind: AccountKind) -> &str {
        match kind {
            AccountKind::Customer => &self.group_user,
            AccountKind::AdminUser => &self.group_admin,
        }
    }
}

impl std::fmt::Debug for CognitoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CognitoConfig")
            .field("region", &self.region)
            .field("user_pool_id", &self.user_pool_id)
            .field("client_id", &self.client_id)
            .field("group_user", &self.group_user)
            .field("group_admin", &self.group_admin)
            .field("password_suffix", &"[REDACTED]")
            .field("temp_password_suffix", &"[REDACTED]")
            .field("anonymous_username", &self.anonymous_username)
            .field("anonymous_password", &"[REDACTED]")
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
    /// if password suffixes fail validation (length, placeholder detection).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(&EnvLookup)
    }

    fn from_lookup(env: &impl Lookup) -> Result<Self, ConfigError> {
        let database_url = get_database_url(env, "IDENTITY_DATABASE_URL")?;
        let host = get_env_or_default(env, "IDENTITY_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("IDENTITY_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default(env, "IDENTITY_PORT", "3210")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("IDENTITY_PORT".to_string(), e.to_string()))?;
        let call_timeout = get_call_timeout(env)?;

        let cognito = CognitoConfig::from_lookup(env)?;

        Ok(Self {
            database_url,
            host,
            port,
            call_timeout,
            cognito,
            sentry_dsn: env.get("SENTRY_DSN"),
            sentry_environment: env.get("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get_rate(env, "SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: get_rate(env, "SENTRY_TRACES_SAMPLE_RATE", 0.0)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl CognitoConfig {
    fn from_lookup(env: &impl Lookup) -> Result<Self, ConfigError> {
        let region = env
            .get("COGNITO_REGION")
            .or_else(|| env.get("AWS_REGION"))
            .ok_or_else(|| ConfigError::MissingEnvVar("COGNITO_REGION".to_string()))?;

        Ok(Self {
            region,
            user_pool_id: get_required_env(env, "COGNITO_USER_POOL_ID")?,
            client_id: get_required_env(env, "COGNITO_CLIENT_ID")?,
            group_user: get_required_env(env, "COGNITO_GROUP_USER")?,
            group_admin: get_required_env(env, "COGNITO_GROUP_ADMIN")?,
            password_suffix: get_password_suffix(env, "COGNITO_PASSWORD_SUFFIX")?,
            temp_password_suffix: get_password_suffix(env, "COGNITO_TEMP_PASSWORD_SUFFIX")?,
            anonymous_username: get_env_or_default(
                env,
                "COGNITO_ANONYMOUS_USERNAME",
                DEFAULT_ANONYMOUS_IDENTITY,
            ),
            anonymous_password: SecretString::from(get_env_or_default(
                env,
                "COGNITO_ANONYMOUS_PASSWORD",
                DEFAULT_ANONYMOUS_IDENTITY,
            )),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Source of configuration values.
trait Lookup {
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads from the process environment.
struct EnvLookup;

impl Lookup for EnvLookup {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Get a required environment variable.
fn get_required_env(env: &impl Lookup, key: &str) -> Result<String, ConfigError> {
    env.get(key)
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(env: &impl Lookup, key: &str, default: &str) -> String {
    env.get(key).unwrap_or_else(|| default.to_string())
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(env: &impl Lookup, primary_key: &str) -> Result<SecretString, ConfigError> {
    env.get(primary_key)
        .or_else(|| env.get("DATABASE_URL"))
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Load only the database URL, for tools that never talk to Cognito.
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` if neither `IDENTITY_DATABASE_URL`
/// nor `DATABASE_URL` is set.
pub fn database_url_from_env() -> Result<SecretString, ConfigError> {
    let _ = dotenvy::dotenv();
    get_database_url(&EnvLookup, "IDENTITY_DATABASE_URL")
}

/// Parse the per-request deadline, at most [`MAX_CALL_TIMEOUT_SECS`].
fn get_call_timeout(env: &impl Lookup) -> Result<Duration, ConfigError> {
    let key = "IDENTITY_CALL_TIMEOUT_SECS";
    let secs = get_env_or_default(env, key, "10")
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if secs == 0 || secs > MAX_CALL_TIMEOUT_SECS {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be between 1 and {MAX_CALL_TIMEOUT_SECS}, got {secs}"),
        ));
    }
    Ok(Duration::from_secs(secs))
}

/// Parse a sample rate in `[0.0, 1.0]`.
fn get_rate(env: &impl Lookup, key: &str, default: f32) -> Result<f32, ConfigError> {
    let Some(raw) = env.get(key) else {
        return Ok(default);
    };
    let rate = raw
        .parse::<f32>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be between 0.0 and 1.0 (got {rate})"),
        ))
    }
}

/// Validate that a password suffix is long enough and not a placeholder.
fn validate_password_suffix(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_PASSWORD_SUFFIX_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_PASSWORD_SUFFIX_LENGTH,
                value.len()
            ),
        ));
    }

    let lower = value.to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    Ok(())
}

/// Load and validate a password suffix.
fn get_password_suffix(env: &impl Lookup, key: &str) -> Result<SecretString, ConfigError> {
    let secret = SecretString::from(get_required_env(env, key)?);
    validate_password_suffix(&secret, key)?;
    Ok(secret)
}
