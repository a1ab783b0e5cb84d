//! Centralized server configuration.
//!
//! Loaded via the `config` crate from an optional `bookgate` file in the
//! working directory, overridden by environment variables with `__` as the
//! nesting separator (e.g. `PROVIDER__CLIENT_ID`).
//!
//! See [`ProviderConfig`](bookgate_access::ProviderConfig) for the identity
//! provider settings.

use bookgate_access::{ProviderConfig, RuleConfig};
use serde::Deserialize;

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// PostgreSQL database connection URL. Without it the server keeps
    /// identities and sessions in memory.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Session configuration.
    #[serde(default)]
    pub session: SessionConfig,

    /// Identity provider configuration.
    pub provider: ProviderConfig,

    /// Ordered authorization rules. The built-in catalog table is used when
    /// absent.
    #[serde(default)]
    pub authorization: Option<Vec<RuleConfig>>,
}

fn default_bind_addr() -> String {
    "127.0.0.1:3000".to_string()
}

/// Session-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Session duration in minutes.
    #[serde(default = "default_session_duration_minutes")]
    pub duration_minutes: i64,

    /// Interval between session cleanup runs, in seconds.
    #[serde(default = "default_cleanup_interval_seconds")]
    pub cleanup_interval_seconds: u64,

    /// Whether to set the Secure flag on cookies (requires HTTPS).
    /// Set to false for local HTTP development.
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,
}

/// Longest accepted session lifetime: one year.
pub const MAX_SESSION_DURATION_MINUTES: i64 = 366 * 24 * 60;

fn default_session_duration_minutes() -> i64 {
    60
}

fn default_cleanup_interval_seconds() -> u64 {
    300
}

fn default_secure_cookies() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_minutes: default_session_duration_minutes(),
            cleanup_interval_seconds: default_cleanup_interval_seconds(),
            secure_cookies: default_secure_cookies(),
        }
    }
}

impl SessionConfig {
    /// Checks that the values can be turned into durations and intervals.
    ///
    /// # Errors
    ///
    /// Returns an error if the session lifetime is outside
    /// `1..=MAX_SESSION_DURATION_MINUTES` or the cleanup interval is zero.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if !(1..=MAX_SESSION_DURATION_MINUTES).contains(&self.duration_minutes) {
            return Err(config::ConfigError::Message(format!(
                "session.duration_minutes must be between 1 and {MAX_SESSION_DURATION_MINUTES}, got {}",
                self.duration_minutes
            )));
        }
        if self.cleanup_interval_seconds == 0 {
            return Err(config::ConfigError::Message(
                "session.cleanup_interval_seconds must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl ServerConfig {
    /// Loads configuration from the optional `bookgate` file and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let config: Self = config::Config::builder()
            .add_source(config::File::with_name("bookgate").required(false))
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        config.session.validate()?;
        Ok(config)
    }
}
