use crate::errors::{LabError, LabResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const APP_NAME: &str = "prompt-lab";
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_JSON_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_VIDEO_MODEL: &str = "veo-2.0-generate-001";

/// Configuration for prompt-lab
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LabConfig {
    pub api_key: Option<String>,
    pub api_base_url: Option<String>,
    pub json_model: Option<String>,
    pub video_model: Option<String>,
    pub poll_interval_secs: Option<u64>,
    pub expected_polls: Option<u32>,
    pub max_polls: Option<u32>,
    pub max_wait_secs: Option<u64>,
    pub history_limit: Option<usize>,
    pub data_dir: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: Some(DEFAULT_API_BASE_URL.to_string()),
            json_model: Some(DEFAULT_JSON_MODEL.to_string()),
            video_model: Some(DEFAULT_VIDEO_MODEL.to_string()),
            poll_interval_secs: Some(10),
            expected_polls: Some(15),
            max_polls: None,
            max_wait_secs: None,
            history_limit: Some(10),
            data_dir: None,
            log_level: Some("warn".to_string()),
        }
    }
}

impl LabConfig {
    /// Loads configuration from a file if it exists, otherwise returns the default config
    pub fn load_from_file(path: &Path) -> LabResult<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .map_err(|e| LabError::Config(format!("Failed to read config file: {}", e)))?;

            let config: Self = toml::from_str(&content)
                .map_err(|e| LabError::Config(format!("Failed to parse config file: {}", e)))?;

            let merged = Self::default().merge(&config);
            merged.validate()?;
            Ok(merged)
        } else {
            Ok(Self::default())
        }
    }

    /// Saves configuration to a file
    pub fn save_to_file(&self, path: &Path) -> LabResult<()> {
        let content = toml::to_string(self)
            .map_err(|e| LabError::Config(format!("Failed to serialize config: {}", e)))?;

        // Ensure the directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                LabError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        fs::write(path, content)
            .map_err(|e| LabError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Merges this config with another config, preferring values from the other config if present
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            api_key: other.api_key.clone().or_else(|| self.api_key.clone()),
            api_base_url: other
                .api_base_url
                .clone()
                .or_else(|| self.api_base_url.clone()),
            json_model: other.json_model.clone().or_else(|| self.json_model.clone()),
            video_model: other.video_model.clone().or_else(|| self.video_model.clone()),
            poll_interval_secs: other.poll_interval_secs.or(self.poll_interval_secs),
            expected_polls: other.expected_polls.or(self.expected_polls),
            max_polls: other.max_polls.or(self.max_polls),
            max_wait_secs: other.max_wait_secs.or(self.max_wait_secs),
            history_limit: other.history_limit.or(self.history_limit),
            data_dir: other.data_dir.clone().or_else(|| self.data_dir.clone()),
            log_level: other.log_level.clone().or_else(|| self.log_level.clone()),
        }
    }

    /// Rejects zero for settings where zero would spin or never run.
    pub fn validate(&self) -> LabResult<()> {
        let counts = [
            ("poll_interval_secs", self.poll_interval_secs),
            ("expected_polls", self.expected_polls.map(u64::from)),
            ("max_polls", self.max_polls.map(u64::from)),
            ("max_wait_secs", self.max_wait_secs),
            ("history_limit", self.history_limit.map(|n| n as u64)),
        ];
        for (name, value) in counts {
            if value == Some(0) {
                return Err(LabError::Config(format!("{} must be greater than zero", name)));
            }
        }
        Ok(())
    }

    /// Applies environment overrides. `API_KEY` wins over `GEMINI_API_KEY`.
    pub fn with_env_overrides(mut self) -> Self {
        dotenvy::dotenv().ok();

        if let Some(key) = env::var("API_KEY")
            .ok()
            .or_else(|| env::var("GEMINI_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
        {
            self.api_key = Some(key);
        }
        if let Ok(level) = env::var("PROMPT_LAB_LOG") {
            self.log_level = Some(level);
        }
        self
    }

    /// Loads the default config file and applies environment overrides
    pub fn load() -> LabResult<Self> {
        let path = get_default_config_file(APP_NAME)?;
        Ok(Self::load_from_file(&path)?.with_env_overrides())
    }

    pub fn require_api_key(&self) -> LabResult<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            LabError::Config("API_KEY environment variable not set".to_string())
        })
    }

    pub fn api_base_url(&self) -> &str {
        self.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL)
    }

    pub fn json_model(&self) -> &str {
        self.json_model.as_deref().unwrap_or(DEFAULT_JSON_MODEL)
    }

    pub fn video_model(&self) -> &str {
        self.video_model.as_deref().unwrap_or(DEFAULT_VIDEO_MODEL)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.unwrap_or(10))
    }

    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait_secs.map(Duration::from_secs)
    }

    pub fn history_limit(&self) -> usize {
        self.history_limit.unwrap_or(10).max(1)
    }

    /// Directory holding the persisted key-value entries
    pub fn data_dir(&self) -> LabResult<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => get_default_data_dir(APP_NAME),
        }
    }
}

/// Helper function to get default config directory
pub fn get_default_config_dir(app_name: &str) -> LabResult<PathBuf> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| LabError::Config("Could not determine home directory".to_string()))?;

    Ok(home_dir.join(".config").join(app_name))
}

/// Helper function to get default config file path
pub fn get_default_config_file(app_name: &str) -> LabResult<PathBuf> {
    let config_dir = get_default_config_dir(app_name)?;
    Ok(config_dir.join("config.toml"))
}

/// Helper function to get the default data directory (falls back to the config dir)
pub fn get_default_data_dir(app_name: &str) -> LabResult<PathBuf> {
    match dirs::data_dir() {
        Some(dir) => Ok(dir.join(app_name)),
        None => get_default_config_dir(app_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = LabConfig::load_from_file(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, LabConfig::default());
        assert_eq!(config.poll_interval(), Duration::from_secs(10));
        assert_eq!(config.expected_polls, Some(15));
        assert_eq!(config.max_polls, None);
    }

    #[test]
    fn test_partial_file_is_merged_over_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "video_model = \"veo-3\"\nmax_polls = 40\n").unwrap();

        let config = LabConfig::load_from_file(&path).unwrap();
        assert_eq!(config.video_model(), "veo-3");
        assert_eq!(config.max_polls, Some(40));
        assert_eq!(config.json_model(), DEFAULT_JSON_MODEL);
        assert_eq!(config.history_limit(), 10);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = LabConfig {
            api_key: Some("k".to_string()),
            max_wait_secs: Some(600),
            ..LabConfig::default()
        };
        config.save_to_file(&path).unwrap();

        let loaded = LabConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.max_wait(), Some(Duration::from_secs(600)));
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "poll_interval_secs = \"ten\"").unwrap();
        assert!(matches!(
            LabConfig::load_from_file(&path),
            Err(LabError::Config(_))
        ));
    }

    #[test]
    fn test_zero_settings_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        for line in ["poll_interval_secs = 0", "max_polls = 0", "max_wait_secs = 0"] {
            fs::write(&path, line).unwrap();
            match LabConfig::load_from_file(&path) {
                Err(LabError::Config(msg)) => assert!(msg.contains("greater than zero"), "{}", msg),
                other => panic!("{}: expected config error, got {:?}", line, other),
            }
        }
        assert!(LabConfig::default().validate().is_ok());
    }

    #[test]
    fn test_require_api_key() {
        let config = LabConfig::default();
        assert!(config.require_api_key().is_err());
        let config = LabConfig { api_key: Some("abc".into()), ..config };
        assert_eq!(config.require_api_key().unwrap(), "abc");
    }
}
