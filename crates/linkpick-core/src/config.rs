//! Configuration and settings management
//!
//! Loads resolver settings from config files and environment variables and
//! defines the constants shared by the core.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Number of renditions shown to the user at once.
pub const PAGE_SIZE: usize = 5;

/// Default yt-dlp executable name (resolved through `PATH`).
pub const DEFAULT_YTDLP_PATH: &str = "yt-dlp";
/// Default timeout (seconds) for one extraction query.
pub const DEFAULT_EXTRACTION_TIMEOUT_SECS: u64 = 60;
/// Default number of extraction attempts, the first one included.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
/// Default fixed delay (milliseconds) between extraction attempts.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 2000;
/// Default timeout (seconds) for a single liveness probe.
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 10;
/// Default number of liveness probes in flight at once.
pub const DEFAULT_PROBE_CONCURRENCY: usize = 16;
/// Default idle lifetime (seconds) of a conversation's selection session.
pub const DEFAULT_SESSION_TTL_SECS: u64 = 3600;
/// Default upper bound on tracked conversations.
pub const DEFAULT_SESSION_MAX_CAPACITY: u64 = 10_000;

/// Build the layered configuration source shared by all crates.
///
/// Sources, lowest priority first: `config/default`, `config/{RUN_MODE}`,
/// `config/local`, `APP__`-prefixed environment, bare environment.
///
/// # Errors
///
/// Returns a `ConfigError` if any present source cannot be parsed.
pub fn build_config() -> Result<Config, ConfigError> {
    let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

    Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
        // Not checked into git
        .add_source(File::with_name("config/local").required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        // Environment::default() maps UPPER_SNAKE_CASE to snake_case;
        // empty variables are treated as unset
        .add_source(Environment::default().ignore_empty(true))
        .build()
}

/// Settings for format resolution, liveness probing and session bookkeeping
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ResolverSettings {
    /// Path or name of the yt-dlp executable
    #[serde(default = "default_ytdlp_path")]
    pub ytdlp_path: String,
    /// Timeout for one extraction query, in seconds
    #[serde(default = "default_extraction_timeout_secs")]
    pub extraction_timeout_secs: u64,
    /// Total extraction attempts before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Fixed delay between extraction attempts, in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Timeout for a single HEAD probe, in seconds
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
    /// Maximum number of probes in flight during one filtering pass
    #[serde(default = "default_probe_concurrency")]
    pub probe_concurrency: usize,
    /// Idle lifetime of a conversation entry, in seconds
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
    /// Maximum number of tracked conversations
    #[serde(default = "default_session_max_capacity")]
    pub session_max_capacity: u64,
}

fn default_ytdlp_path() -> String {
    DEFAULT_YTDLP_PATH.to_string()
}

const fn default_extraction_timeout_secs() -> u64 {
    DEFAULT_EXTRACTION_TIMEOUT_SECS
}

const fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

const fn default_retry_delay_ms() -> u64 {
    DEFAULT_RETRY_DELAY_MS
}

const fn default_probe_timeout_secs() -> u64 {
    DEFAULT_PROBE_TIMEOUT_SECS
}

const fn default_probe_concurrency() -> usize {
    DEFAULT_PROBE_CONCURRENCY
}

const fn default_session_ttl_secs() -> u64 {
    DEFAULT_SESSION_TTL_SECS
}

const fn default_session_max_capacity() -> u64 {
    DEFAULT_SESSION_MAX_CAPACITY
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            ytdlp_path: default_ytdlp_path(),
            extraction_timeout_secs: DEFAULT_EXTRACTION_TIMEOUT_SECS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            probe_timeout_secs: DEFAULT_PROBE_TIMEOUT_SECS,
            probe_concurrency: DEFAULT_PROBE_CONCURRENCY,
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            session_max_capacity: DEFAULT_SESSION_MAX_CAPACITY,
        }
    }
}

impl ResolverSettings {
    /// Load settings from config files and the environment.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use linkpick_core::config::ResolverSettings;
    ///
    /// let settings = ResolverSettings::new().expect("Failed to load configuration");
    /// assert!(settings.max_attempts >= 1);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading or deserialization fails.
    pub fn new() -> Result<Self, ConfigError> {
        build_config()?.try_deserialize()
    }

    /// Timeout applied to one extraction query
    #[must_use]
    pub const fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }

    /// Delay between extraction attempts
    #[must_use]
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Timeout applied to one liveness probe
    #[must_use]
    pub const fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    /// Idle lifetime of a conversation entry
    #[must_use]
    pub const fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_policy() {
        let settings = ResolverSettings::default();
        assert_eq!(settings.max_attempts, 3);
        assert_eq!(settings.retry_delay(), Duration::from_secs(2));
        assert_eq!(settings.ytdlp_path, "yt-dlp");
        assert!(settings.probe_timeout() > Duration::ZERO);
        assert!(settings.probe_concurrency > 0);
    }

    #[test]
    fn test_partial_source_falls_back_to_defaults() -> Result<(), ConfigError> {
        let settings: ResolverSettings = Config::builder()
            .set_override("max_attempts", 5)?
            .set_override("ytdlp_path", "/usr/local/bin/yt-dlp")?
            .build()?
            .try_deserialize()?;

        assert_eq!(settings.max_attempts, 5);
        assert_eq!(settings.ytdlp_path, "/usr/local/bin/yt-dlp");
        assert_eq!(settings.retry_delay_ms, DEFAULT_RETRY_DELAY_MS);
        assert_eq!(settings.session_max_capacity, DEFAULT_SESSION_MAX_CAPACITY);
        Ok(())
    }
}
