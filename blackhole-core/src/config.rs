//! Centralized configuration for Blackhole.
//!
//! All tunable parameters and settings are defined here and passed
//! explicitly into the components that need them.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::debrid::RetryPolicy;
use crate::{BlackholeError, Result};

/// Central configuration for all Blackhole components.
#[derive(Debug, Clone, Default)]
pub struct BlackholeConfig {
    pub debrid: DebridConfig,
    pub policy: SubmissionPolicy,
    pub driver: DriverConfig,
}

/// Debrid service connection settings.
#[derive(Debug, Clone)]
pub struct DebridConfig {
    /// Whether the Real-Debrid integration is enabled at all
    pub enabled: bool,
    /// REST API root, e.g. `https://api.real-debrid.com/rest/1.0/`
    pub host: Option<String>,
    /// Bearer token for the API
    pub api_key: Option<String>,
    /// Directory where the service's torrents are mounted locally
    pub mount_torrents_path: Option<PathBuf>,
    /// Timeout for a single HTTP request
    pub request_timeout: Duration,
    /// User agent for HTTP requests
    pub user_agent: &'static str,
    /// Retry behaviour for every API call
    pub retry: RetryPolicy,
}

impl Default for DebridConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: None,
            api_key: None,
            mount_torrents_path: None,
            request_timeout: Duration::from_secs(30),
            user_agent: "blackhole/0.1.0",
            retry: RetryPolicy::default(),
        }
    }
}

/// Per-torrent acceptance policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmissionPolicy {
    /// Reject torrents the service does not already hold in cache
    pub fail_if_not_cached: bool,
    /// Request only the largest media file instead of every media file
    pub only_largest_file: bool,
}

/// Timing of the polling loop that drives one torrent.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Delay between status polls
    pub poll_interval: Duration,
    /// Give up on a torrent that has not completed within this time
    pub wait_for_torrent_timeout: Duration,
    /// Delay between probes of the mount after remote completion
    pub mount_refresh_interval: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            wait_for_torrent_timeout: Duration::from_secs(60),
            mount_refresh_interval: Duration::from_secs(10),
        }
    }
}

impl BlackholeConfig {
    /// Creates configuration with environment variable overrides.
    ///
    /// Values of the form `<some_name>`, left over from a template `.env`
    /// file, are treated as unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !is_placeholder(value));
        let get_bool = |name: &str| get(name).and_then(|value| parse_bool(&value));
        let get_secs = |name: &str| {
            get(name)
                .and_then(|value| value.trim().parse::<u64>().ok())
                .map(Duration::from_secs)
        };

        let mut config = Self::default();

        if let Some(enabled) = get_bool("REALDEBRID_ENABLED") {
            config.debrid.enabled = enabled;
        }
        config.debrid.host = get("REALDEBRID_HOST");
        config.debrid.api_key = get("REALDEBRID_API_KEY");
        config.debrid.mount_torrents_path = get("REALDEBRID_MOUNT_TORRENTS_PATH")
            .or_else(|| get("BLACKHOLE_RD_MOUNT_TORRENTS_PATH"))
            .map(PathBuf::from);

        if let Some(timeout) = get_secs("BLACKHOLE_REQUEST_TIMEOUT") {
            config.debrid.request_timeout = timeout;
        }
        if let Some(attempts) = get("BLACKHOLE_RETRY_ATTEMPTS").and_then(|v| v.parse().ok()) {
            config.debrid.retry.max_attempts = attempts;
        }

        if let Some(fail_if_not_cached) = get_bool("BLACKHOLE_FAIL_IF_NOT_CACHED") {
            config.policy.fail_if_not_cached = fail_if_not_cached;
        }
        if let Some(only_largest_file) = get_bool("BLACKHOLE_ONLY_LARGEST_FILE") {
            config.policy.only_largest_file = only_largest_file;
        }

        if let Some(timeout) = get_secs("BLACKHOLE_WAIT_FOR_TORRENT_TIMEOUT") {
            config.driver.wait_for_torrent_timeout = timeout;
        }
        if let Some(interval) = get_secs("BLACKHOLE_RD_MOUNT_REFRESH_SECONDS") {
            config.driver.mount_refresh_interval = interval;
        }

        config
    }

    /// Checks that every required setting is present.
    ///
    /// Returns one message per problem; an empty list means the configuration
    /// is usable.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if !self.debrid.enabled {
            problems.push("RealDebrid must be enabled.".to_string());
            return problems;
        }

        let required = [
            ("RealDebrid host", self.debrid.host.is_some()),
            ("RealDebrid API key", self.debrid.api_key.is_some()),
            (
                "RealDebrid mount torrents path",
                self.debrid.mount_torrents_path.is_some(),
            ),
        ];
        for (name, present) in required {
            if !present {
                problems.push(format!("{name} is missing. Please check your .env file."));
            }
        }

        problems
    }
}

/// Checks that the mount root exists and already holds at least one torrent
/// directory.
///
/// # Errors
/// - `BlackholeError::Configuration` - Mount root missing or without subdirectories
pub async fn validate_mount(path: &Path) -> Result<()> {
    let unusable = || BlackholeError::Configuration {
        reason: format!(
            "Mount path {} does not exist or has no children.",
            path.display()
        ),
    };

    let mut entries = tokio::fs::read_dir(path).await.map_err(|_| unusable())?;
    while let Ok(Some(entry)) = entries.next_entry().await {
        if entry.file_type().await.is_ok_and(|kind| kind.is_dir()) {
            return Ok(());
        }
    }

    Err(unusable())
}

fn is_placeholder(value: &str) -> bool {
    let inner = value
        .strip_prefix('<')
        .and_then(|rest| rest.strip_suffix('>'));
    inner.is_some_and(|name| {
        !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    })
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_default_config_values() {
        let config = BlackholeConfig::default();

        assert!(config.debrid.enabled);
        assert!(config.debrid.host.is_none());
        assert_eq!(config.debrid.request_timeout, Duration::from_secs(30));
        assert_eq!(config.debrid.retry.max_attempts, 5);
        assert!(!config.policy.fail_if_not_cached);
        assert!(!config.policy.only_largest_file);
        assert_eq!(config.driver.wait_for_torrent_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_from_lookup_reads_settings() {
        let config = BlackholeConfig::from_lookup(lookup_from(&[
            ("REALDEBRID_HOST", "https://api.real-debrid.com/rest/1.0/"),
            ("REALDEBRID_API_KEY", "secret"),
            ("REALDEBRID_MOUNT_TORRENTS_PATH", "/mnt/remote/realdebrid/torrents"),
            ("BLACKHOLE_FAIL_IF_NOT_CACHED", "true"),
            ("BLACKHOLE_ONLY_LARGEST_FILE", "1"),
            ("BLACKHOLE_WAIT_FOR_TORRENT_TIMEOUT", "300"),
            ("BLACKHOLE_RD_MOUNT_REFRESH_SECONDS", "200"),
            ("BLACKHOLE_RETRY_ATTEMPTS", "3"),
        ]));

        assert_eq!(
            config.debrid.host.as_deref(),
            Some("https://api.real-debrid.com/rest/1.0/")
        );
        assert_eq!(config.debrid.api_key.as_deref(), Some("secret"));
        assert_eq!(
            config.debrid.mount_torrents_path,
            Some(PathBuf::from("/mnt/remote/realdebrid/torrents"))
        );
        assert!(config.policy.fail_if_not_cached);
        assert!(config.policy.only_largest_file);
        assert_eq!(config.driver.wait_for_torrent_timeout, Duration::from_secs(300));
        assert_eq!(config.driver.mount_refresh_interval, Duration::from_secs(200));
        assert_eq!(config.debrid.retry.max_attempts, 3);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_mount_path_falls_back_to_blackhole_variable() {
        let config = BlackholeConfig::from_lookup(lookup_from(&[(
            "BLACKHOLE_RD_MOUNT_TORRENTS_PATH",
            "/mnt/rd",
        )]));
        assert_eq!(
            config.debrid.mount_torrents_path,
            Some(PathBuf::from("/mnt/rd"))
        );
    }

    #[test]
    fn test_placeholders_are_unset() {
        let config = BlackholeConfig::from_lookup(lookup_from(&[
            ("REALDEBRID_HOST", "<realdebrid_host>"),
            ("REALDEBRID_API_KEY", "<realdebrid_api_key>"),
        ]));
        assert!(config.debrid.host.is_none());
        assert!(config.debrid.api_key.is_none());

        let problems = config.validate();
        assert_eq!(problems.len(), 3);
        assert!(problems[0].contains("RealDebrid host"));
    }

    #[test]
    fn test_disabled_debrid_is_reported() {
        let config =
            BlackholeConfig::from_lookup(lookup_from(&[("REALDEBRID_ENABLED", "false")]));
        assert!(!config.debrid.enabled);
        assert_eq!(config.validate(), vec!["RealDebrid must be enabled.".to_string()]);
    }

    #[test]
    fn test_placeholder_detection() {
        assert!(is_placeholder("<realdebrid_host>"));
        assert!(!is_placeholder("<>"));
        assert!(!is_placeholder("https://example.com"));
        assert!(!is_placeholder("<Not A Placeholder>"));
    }

    #[tokio::test]
    async fn test_validate_mount() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(validate_mount(temp_dir.path()).await.is_err());

        tokio::fs::create_dir(temp_dir.path().join("Some.Torrent"))
            .await
            .unwrap();
        assert!(validate_mount(temp_dir.path()).await.is_ok());

        assert!(validate_mount(Path::new("/nonexistent/mount")).await.is_err());
    }
}
