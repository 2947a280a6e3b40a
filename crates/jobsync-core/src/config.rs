use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderOptions {
    /// Error messages kept for the status; the error count is not capped.
    pub max_error_messages: usize,
    /// Error budget for `too_many_errors`; 0 disables it.
    pub strict_max_errors: usize,
    pub checkpoint_interval_ms: u64,
}

impl RecorderOptions {
    pub fn checkpoint_interval(&self) -> Duration {
        Duration::from_millis(self.checkpoint_interval_ms)
    }
}

impl Default for RecorderOptions {
    fn default() -> Self {
        Self {
            max_error_messages: 20,
            strict_max_errors: 0,
            checkpoint_interval_ms: 5_000,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub workers: usize,
    pub recorder: RecorderOptions,
    pub status_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            recorder: RecorderOptions::default(),
            status_path: None,
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path).context("read jobsync config")?;
        let config = serde_json::from_str(&data).context("parse jobsync config json")?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("create jobsync config directory")?;
        }
        let data = serde_json::to_string_pretty(self).context("serialize jobsync config")?;
        fs::write(path, data).context("write jobsync config")?;
        Ok(())
    }
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    let project =
        ProjectDirs::from("com", "jobsync", "jobsync").context("resolve project dirs")?;
    Ok(project.config_dir().join("config.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_config_loads_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = AppConfig::load(&tmp.path().join("config.json")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.recorder.max_error_messages, 20);
    }

    #[test]
    fn config_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("config.json");
        let config = AppConfig {
            workers: 8,
            recorder: RecorderOptions {
                max_error_messages: 5,
                strict_max_errors: 10,
                checkpoint_interval_ms: 250,
            },
            status_path: Some(tmp.path().join("status.json")),
        };
        config.save(&path).unwrap();
        assert_eq!(AppConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn malformed_config_reports_context() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        let err = AppConfig::load(&path).unwrap_err();
        assert_eq!(err.to_string(), "parse jobsync config json");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, r#"{ "recorder": { "strict_max_errors": 3 } }"#).unwrap();
        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.workers, 4);
        assert_eq!(config.recorder.strict_max_errors, 3);
        assert_eq!(config.recorder.checkpoint_interval(), Duration::from_secs(5));
    }
}
