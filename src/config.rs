//! Configuration types for dpres-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Repository account credentials
///
/// All four fields are required; [`Config::validate`] rejects a missing or
/// empty value before any network call is made. Used as a nested sub-config
/// within [`Config`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// Account username
    #[serde(default)]
    pub username: String,

    /// Account password
    #[serde(default)]
    pub password: String,

    /// Tenant identifier the account belongs to
    #[serde(default)]
    pub tenant: String,

    /// Base address of the repository service (absolute URL)
    #[serde(default)]
    pub server_address: String,
}

/// Query selection settings (traversal root, result limit, verbosity)
///
/// Groups the caller-facing selection knobs. Used as a nested sub-config
/// within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Folder to traverse (None = repository root)
    #[serde(default)]
    pub folder_reference: Option<String>,

    /// Maximum number of asset records to report (default: 5, must be >= 1)
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Include description and security tag in reported records
    #[serde(default)]
    pub verbose: bool,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            folder_reference: None,
            limit: default_limit(),
            verbose: false,
        }
    }
}

/// Network tuning (request timeout, page size)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Per-request timeout (default: 30 seconds)
    ///
    /// Exceeding it cancels the in-flight request; the timeout is classified
    /// as transient and retried within the retry budget.
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// Number of child records requested per page (default: 50, must be >= 1)
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            request_timeout: default_request_timeout(),
            page_size: default_page_size(),
        }
    }
}

/// Retry configuration for transient failures
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 500 milliseconds)
    #[serde(default = "default_initial_delay", with = "duration_millis_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 30 seconds)
    #[serde(default = "default_max_delay", with = "duration_millis_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

/// Main configuration for the repository client
///
/// Fields are organized into logical sub-configs:
/// - [`credentials`](CredentialsConfig) — account and server address
/// - [`query`](QueryConfig) — traversal root, limit, verbosity
/// - [`network`](NetworkConfig) — timeout and page size
/// - [`retry`](RetryConfig) — backoff budget shared by every remote call
///
/// Sub-config fields are flattened for serialization, so the JSON/TOML
/// format remains flat (no nesting). Construct once at startup, validate,
/// and pass by reference into [`crate::session::Session::open`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Account credentials and server address
    #[serde(flatten)]
    pub credentials: CredentialsConfig,

    /// Traversal root, result limit, and verbosity
    #[serde(flatten)]
    pub query: QueryConfig,

    /// Request timeout and page size
    #[serde(flatten)]
    pub network: NetworkConfig,

    /// Retry budget for transient failures
    #[serde(default)]
    pub retry: RetryConfig,
}

// Convenience accessors — allow call sites to use `config.page_size()` etc.
// without reaching through the sub-config structs.
impl Config {
    /// Base address of the repository service
    pub fn server_address(&self) -> &str {
        &self.credentials.server_address
    }

    /// Child records requested per page
    pub fn page_size(&self) -> usize {
        self.network.page_size
    }

    /// Per-request timeout
    pub fn request_timeout(&self) -> Duration {
        self.network.request_timeout
    }

    /// Check the configuration for missing or out-of-range values
    ///
    /// Returns the first violation as [`Error::Validation`] with the
    /// offending key. Runs entirely locally; callers can rely on no network
    /// I/O having happened when this fails.
    pub fn validate(&self) -> Result<()> {
        if self.credentials.username.trim().is_empty() {
            return Err(Error::validation("username", "username must not be empty"));
        }
        if self.credentials.password.is_empty() {
            return Err(Error::validation("password", "password must not be empty"));
        }
        if self.credentials.tenant.trim().is_empty() {
            return Err(Error::validation("tenant", "tenant must not be empty"));
        }
        if self.credentials.server_address.trim().is_empty() {
            return Err(Error::validation(
                "server_address",
                "server_address must not be empty",
            ));
        }
        if let Err(e) = url::Url::parse(&self.credentials.server_address) {
            return Err(Error::validation(
                "server_address",
                format!("server_address is not an absolute URL: {e}"),
            ));
        }
        if self.query.limit == 0 {
            return Err(Error::validation("limit", "limit must be at least 1"));
        }
        if self.network.page_size == 0 {
            return Err(Error::validation("page_size", "page_size must be at least 1"));
        }
        if self.network.request_timeout.is_zero() {
            return Err(Error::validation(
                "request_timeout",
                "request_timeout must be greater than zero",
            ));
        }
        Ok(())
    }
}

fn default_limit() -> usize {
    5
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_page_size() -> usize {
    50
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> Duration {
    Duration::from_millis(500)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(30)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Duration serialization helper (milliseconds, for sub-second delays)
mod duration_millis_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
