use dlqr_core::Scope;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for dlqr
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub preview: PreviewConfig,

    #[serde(default)]
    pub sources: SourcesConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Defaults to `rules.db` in the user data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewConfig {
    #[serde(default = "default_debounce_ms")]
    pub validate_debounce_ms: u64,

    #[serde(default)]
    pub default_scope: Scope,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Directory of `<topic>.jsonl` DLQ dumps
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            storage: StorageConfig::default(),
            preview: PreviewConfig::default(),
            sources: SourcesConfig::default(),
        }
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            validate_debounce_ms: default_debounce_ms(),
            default_scope: Scope::Global,
        }
    }
}

impl PreviewConfig {
    pub fn validate_debounce(&self) -> Duration {
        Duration::from_millis(self.validate_debounce_ms)
    }
}

fn default_log_filter() -> String {
    "info".to_string()
}

fn default_debounce_ms() -> u64 {
    500
}

impl Config {
    /// Load config from default location or create default if not found
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load from `path`, writing the defaults there first if it is missing
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let content = toml::to_string_pretty(&config)?;
            std::fs::write(path, content)?;
            Ok(config)
        }
    }

    /// Get config file path
    pub fn config_path() -> PathBuf {
        if let Some(dirs) = directories::ProjectDirs::from("com", "dlqr", "dlqr") {
            dirs.config_dir().join("config.toml")
        } else {
            PathBuf::from("~/.dlqr/config.toml")
        }
    }
}
