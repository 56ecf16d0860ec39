//! Configuration file support for Kaiquest.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/kaiquest/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub dedup: DedupConfig,

    #[serde(default)]
    pub assist: AssistConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Kai deduplication parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DedupConfig {
    /// Similarity at or above which two kai phrases merge
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
        }
    }
}

/// Text-completion collaborator configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AssistConfig {
    /// Master switch; when false every assist feature uses its fallback
    #[serde(default)]
    pub enabled: bool,

    /// Model used for free-form text completions
    #[serde(default = "default_model_text")]
    pub model_text: String,

    /// Model used for JSON-shaped completions
    #[serde(default = "default_model_json")]
    pub model_json: String,
}

impl Default for AssistConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            model_text: default_model_text(),
            model_json: default_model_json(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        PathBuf::from(home).join(".local/share")
    });
    base.join("kaiquest")
}

fn default_similarity_threshold() -> f64 {
    crate::kai::DEFAULT_THRESHOLD
}

fn default_model_text() -> String {
    "flash-lite".into()
}

fn default_model_json() -> String {
    "flash-lite".into()
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            PathBuf::from(home).join(".config")
        });
        base.join("kaiquest").join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let threshold = self.dedup.similarity_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::Config(format!(
                "dedup.similarity_threshold must be within [0.0, 1.0], got {}",
                threshold
            )));
        }
        Ok(())
    }
}
