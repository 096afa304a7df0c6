//! Process-wide runtime settings.

use std::path::PathBuf;
use std::time::Duration;

use platforms_api::client::DEFAULT_TIMEOUT;
use platforms_api::twitch::HelixClient;

use super::bootstrap::DEFAULT_MAPPING_URL;
use super::records::ConfigPaths;

/// Default reconciliation interval.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(30);

/// Run the process diagnostic every this many ticks.
pub const DEFAULT_DIAGNOSTIC_EVERY: u64 = 10;

/// Settings that are fixed for the lifetime of the process.
///
/// The game mapping and exclusions are *not* part of this; they live in the
/// hot-reloadable [`ConfigStore`](super::ConfigStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Directory holding `config.json`, `excluded_processes.json` and
    /// `credentials.toml`.
    pub config_dir: PathBuf,
    /// Directory for rolling log files.
    pub log_dir: PathBuf,
    pub tick_interval: Duration,
    pub diagnostic_every: u64,
    pub request_timeout: Duration,
    pub helix_base_url: String,
    /// Source of the default mapping downloaded by `init`.
    pub mapping_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from("."),
            log_dir: PathBuf::from("logs"),
            tick_interval: DEFAULT_TICK_INTERVAL,
            diagnostic_every: DEFAULT_DIAGNOSTIC_EVERY,
            request_timeout: DEFAULT_TIMEOUT,
            helix_base_url: HelixClient::BASE_URL.to_string(),
            mapping_url: DEFAULT_MAPPING_URL.to_string(),
        }
    }
}

impl AppConfig {
    pub fn paths(&self) -> ConfigPaths {
        ConfigPaths::new(&self.config_dir)
    }

    pub fn with_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = dir.into();
        self
    }

    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = dir.into();
        self
    }

    /// Interval is clamped to at least one second.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval.max(Duration::from_secs(1));
        self
    }

    /// Zero disables the periodic diagnostic.
    pub fn with_diagnostic_every(mut self, every: u64) -> Self {
        self.diagnostic_every = every;
        self
    }

    pub fn with_helix_base_url(mut self, url: impl Into<String>) -> Self {
        self.helix_base_url = url.into();
        self
    }

    pub fn with_mapping_url(mut self, url: impl Into<String>) -> Self {
        self.mapping_url = url.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.tick_interval, Duration::from_secs(30));
        assert_eq!(config.diagnostic_every, 10);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.helix_base_url, "https://api.twitch.tv/helix");
        assert_eq!(config.paths().mapping, PathBuf::from(".").join("config.json"));
    }

    #[test]
    fn test_tick_interval_is_clamped() {
        let config = AppConfig::default().with_tick_interval(Duration::ZERO);
        assert_eq!(config.tick_interval, Duration::from_secs(1));
    }
}
