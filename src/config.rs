//! Runtime configuration for the rater.
//!
//! Values come from the environment (after `.env` is loaded by the CLI) or
//! from a JSON file of the same shape:
//! ```json
//! {
//!   "dataset_dir": "datasets",
//!   "dataset_ttl_secs": 60,
//!   "statistics_ttl_secs": 60,
//!   "summary_ttl_secs": 300,
//!   "log_file_path": "logs/battery_health_rater.log"
//! }
//! ```
//! Keys missing from the file keep their defaults.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_DATASET_DIR: &str = "datasets";
pub const DEFAULT_LOG_FILE_PATH: &str = "logs/battery_health_rater.log";
pub const DEFAULT_DATASET_TTL_SECS: u64 = 60;
pub const DEFAULT_STATISTICS_TTL_SECS: u64 = 60;
pub const DEFAULT_SUMMARY_TTL_SECS: u64 = 300;

#[derive(Debug, Clone, PartialEq)]
pub struct RaterConfig {
    /// Directory scanned for registry exports.
    pub dataset_dir: PathBuf,
    pub dataset_ttl: Duration,
    pub statistics_ttl: Duration,
    pub summary_ttl: Duration,
    pub log_file_path: PathBuf,
}

impl Default for RaterConfig {
    fn default() -> Self {
        Self {
            dataset_dir: PathBuf::from(DEFAULT_DATASET_DIR),
            dataset_ttl: Duration::from_secs(DEFAULT_DATASET_TTL_SECS),
            statistics_ttl: Duration::from_secs(DEFAULT_STATISTICS_TTL_SECS),
            summary_ttl: Duration::from_secs(DEFAULT_SUMMARY_TTL_SECS),
            log_file_path: PathBuf::from(DEFAULT_LOG_FILE_PATH),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    dataset_dir: Option<PathBuf>,
    dataset_ttl_secs: Option<u64>,
    statistics_ttl_secs: Option<u64>,
    summary_ttl_secs: Option<u64>,
    log_file_path: Option<PathBuf>,
}

impl RaterConfig {
    /// Builds the config from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Unset keys fall back
    /// to defaults; a set but non-numeric TTL is an error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let ttl = |key: &str, fallback: Duration| -> Result<Duration> {
            match lookup(key) {
                Some(raw) => {
                    let secs: u64 = raw
                        .trim()
                        .parse()
                        .with_context(|| format!("{key} must be a whole number of seconds, got {raw:?}"))?;
                    Ok(Duration::from_secs(secs))
                }
                None => Ok(fallback),
            }
        };

        Ok(Self {
            dataset_dir: lookup("DATASET_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.dataset_dir),
            dataset_ttl: ttl("DATASET_TTL_SECS", defaults.dataset_ttl)?,
            statistics_ttl: ttl("STATISTICS_TTL_SECS", defaults.statistics_ttl)?,
            summary_ttl: ttl("SUMMARY_TTL_SECS", defaults.summary_ttl)?,
            log_file_path: lookup("LOG_FILE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_file_path),
        })
    }

    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    fn from_json(content: &str) -> Result<Self> {
        let file: ConfigFile = serde_json::from_str(content)?;
        let defaults = Self::default();

        Ok(Self {
            dataset_dir: file.dataset_dir.unwrap_or(defaults.dataset_dir),
            dataset_ttl: file
                .dataset_ttl_secs
                .map_or(defaults.dataset_ttl, Duration::from_secs),
            statistics_ttl: file
                .statistics_ttl_secs
                .map_or(defaults.statistics_ttl, Duration::from_secs),
            summary_ttl: file
                .summary_ttl_secs
                .map_or(defaults.summary_ttl, Duration::from_secs),
            log_file_path: file.log_file_path.unwrap_or(defaults.log_file_path),
        })
    }

    pub fn with_dataset_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dataset_dir = dir.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::env;
    use std::fs;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_env_empty() {
        let config = RaterConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, RaterConfig::default());
        assert_eq!(config.summary_ttl, Duration::from_secs(300));
        assert_eq!(config.dataset_dir, PathBuf::from("datasets"));
    }

    #[test]
    fn test_env_overrides() {
        let config = RaterConfig::from_lookup(lookup(&[
            ("DATASET_DIR", "/data/exports"),
            ("DATASET_TTL_SECS", "120"),
            ("STATISTICS_TTL_SECS", " 30 "),
            ("LOG_FILE_PATH", "/var/log/rater.log"),
        ]))
        .unwrap();

        assert_eq!(config.dataset_dir, PathBuf::from("/data/exports"));
        assert_eq!(config.dataset_ttl, Duration::from_secs(120));
        assert_eq!(config.statistics_ttl, Duration::from_secs(30));
        assert_eq!(config.summary_ttl, Duration::from_secs(300));
        assert_eq!(config.log_file_path, PathBuf::from("/var/log/rater.log"));
    }

    #[test]
    fn test_malformed_ttl_is_error() {
        let err = RaterConfig::from_lookup(lookup(&[("SUMMARY_TTL_SECS", "five minutes")]))
            .unwrap_err();
        assert!(err.to_string().contains("SUMMARY_TTL_SECS"));
    }

    #[test]
    fn test_json_missing_keys_defaulted() {
        let config = RaterConfig::from_json(r#"{"dataset_ttl_secs": 5}"#).unwrap();
        assert_eq!(config.dataset_ttl, Duration::from_secs(5));
        assert_eq!(config.statistics_ttl, Duration::from_secs(60));
        assert_eq!(config.dataset_dir, PathBuf::from("datasets"));
    }

    #[test]
    fn test_load_from_file() {
        let path = env::temp_dir().join("battery_health_rater_test_config.json");
        fs::write(
            &path,
            r#"{"dataset_dir": "exports", "summary_ttl_secs": 600}"#,
        )
        .unwrap();

        let config = RaterConfig::load(&path).unwrap();
        assert_eq!(config.dataset_dir, PathBuf::from("exports"));
        assert_eq!(config.summary_ttl, Duration::from_secs(600));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_rejects_invalid_json() {
        let path = env::temp_dir().join("battery_health_rater_test_bad_config.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(RaterConfig::load(&path).is_err());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_with_dataset_dir() {
        let config = RaterConfig::default().with_dataset_dir("elsewhere");
        assert_eq!(config.dataset_dir, PathBuf::from("elsewhere"));
    }
}
