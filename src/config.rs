//! Configuration loading and management

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Recognition language; the assistant only speaks one locale
pub const LANGUAGE: &str = "en-US";

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the Unix domain socket for IPC
    pub socket_path: PathBuf,

    /// Directory for runtime data (persisted profile lives here)
    pub data_dir: PathBuf,

    /// Whether the speech-recognition capability is available.
    /// Probed once at startup and never re-checked.
    pub speech_enabled: bool,

    /// Lower bound of the simulated search latency
    pub latency_min: Duration,

    /// Upper bound (exclusive) of the simulated search latency
    pub latency_max: Duration,

    /// How long a capture waits for speech before reporting `no-speech`
    pub no_speech_timeout: Duration,

    /// Drop search results that resolve after a newer query was issued
    pub discard_stale_results: bool,

    /// Recognition language
    pub language: String,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = std::env::temp_dir().join("echo-search");
        Self {
            socket_path: data_dir.join("daemon.sock"),
            data_dir,
            speech_enabled: true,
            latency_min: Duration::from_millis(1000),
            latency_max: Duration::from_millis(2000),
            no_speech_timeout: Duration::from_millis(8000),
            discard_stale_results: false,
            language: LANGUAGE.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> Result<Self> {
        let home = std::env::var("HOME").context("HOME is not set")?;
        let data_dir = match std::env::var("ECHO_SEARCH_DATA_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => PathBuf::from(&home)
                .join(".local")
                .join("share")
                .join("echo-search"),
        };

        let socket_path = match std::env::var("ECHO_SEARCH_SOCKET") {
            Ok(path) => PathBuf::from(path),
            Err(_) => data_dir.join("daemon.sock"),
        };

        let mut config = Self {
            socket_path,
            data_dir,
            ..Self::default()
        };

        if let Ok(value) = std::env::var("ECHO_SEARCH_SPEECH") {
            config.speech_enabled = parse_flag(&value)
                .with_context(|| format!("invalid ECHO_SEARCH_SPEECH: {value}"))?;
        }

        if let Ok(value) = std::env::var("ECHO_SEARCH_LATENCY_MS") {
            let (min, max) = parse_latency_range(&value)
                .with_context(|| format!("invalid ECHO_SEARCH_LATENCY_MS: {value}"))?;
            config.latency_min = min;
            config.latency_max = max;
        }

        if let Ok(value) = std::env::var("ECHO_SEARCH_NO_SPEECH_MS") {
            let ms: u64 = value
                .trim()
                .parse()
                .with_context(|| format!("invalid ECHO_SEARCH_NO_SPEECH_MS: {value}"))?;
            config.no_speech_timeout = Duration::from_millis(ms);
        }

        if let Ok(value) = std::env::var("ECHO_SEARCH_DISCARD_STALE") {
            config.discard_stale_results = parse_flag(&value)
                .with_context(|| format!("invalid ECHO_SEARCH_DISCARD_STALE: {value}"))?;
        }

        Ok(config)
    }

    /// Ensure data directory exists
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("failed to create {}", self.data_dir.display()))?;
        Ok(())
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("expected a boolean, got {other:?}"),
    }
}

/// Parse `min-max` in milliseconds
fn parse_latency_range(value: &str) -> Result<(Duration, Duration)> {
    let (min, max) = value
        .split_once('-')
        .context("expected <min>-<max> in milliseconds")?;
    let min: u64 = min.trim().parse().context("bad lower bound")?;
    let max: u64 = max.trim().parse().context("bad upper bound")?;
    if max < min {
        bail!("upper bound {max} is below lower bound {min}");
    }
    Ok((Duration::from_millis(min), Duration::from_millis(max)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_load() {
        let config = Config::load().unwrap();
        assert!(config.data_dir.to_string_lossy().len() > 0);
        assert_eq!(config.language, "en-US");
    }

    #[test]
    fn test_default_latency_window() {
        let config = Config::default();
        assert_eq!(config.latency_min, Duration::from_millis(1000));
        assert_eq!(config.latency_max, Duration::from_millis(2000));
        assert!(!config.discard_stale_results);
    }

    #[test]
    fn test_parse_latency_range() {
        let (min, max) = parse_latency_range("0-250").unwrap();
        assert_eq!(min, Duration::ZERO);
        assert_eq!(max, Duration::from_millis(250));
        assert!(parse_latency_range("300-100").is_err());
        assert!(parse_latency_range("fast").is_err());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("TRUE").unwrap());
        assert!(!parse_flag("0").unwrap());
        assert!(parse_flag("maybe").is_err());
    }
}
