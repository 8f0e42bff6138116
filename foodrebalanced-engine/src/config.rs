//! Engine configuration.
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Default name of the backing override file.
pub const DEFAULT_FILE_NAME: &str = "food_overrides.json";
/// Namespace written in front of synthesized effect ids.
pub const DEFAULT_NAMESPACE: &str = "minecraft";

/// Runtime configuration for the override engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "EngineConfig::default_config_dir")]
    pub config_dir: PathBuf,
    #[serde(default = "EngineConfig::default_file_name")]
    pub file_name: String,
    #[serde(default = "EngineConfig::default_namespace")]
    pub namespace: String,
    /// Key records by item variant as well as identifier.
    #[serde(default)]
    pub track_variants: bool,
    #[serde(default = "EngineConfig::default_pretty")]
    pub pretty: bool,
}

impl EngineConfig {
    fn default_config_dir() -> PathBuf {
        PathBuf::from("config").join("foodrebalanced")
    }

    fn default_file_name() -> String {
        DEFAULT_FILE_NAME.to_string()
    }

    fn default_namespace() -> String {
        DEFAULT_NAMESPACE.to_string()
    }

    const fn default_pretty() -> bool {
        true
    }

    /// Configuration rooted at `config_dir` with every other field defaulted.
    #[must_use]
    pub fn in_dir(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            ..Self::default()
        }
    }

    /// Parse a configuration document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Full path of the backing override file.
    #[must_use]
    pub fn overrides_path(&self) -> PathBuf {
        self.config_dir.join(&self.file_name)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the file name or namespace is unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let name = self.file_name.trim();
        if name.is_empty() {
            return Err(ConfigError::EmptyFileName);
        }
        if name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(ConfigError::InvalidFileName(self.file_name.clone()));
        }
        if self.namespace.trim().is_empty() {
            return Err(ConfigError::EmptyNamespace);
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            config_dir: Self::default_config_dir(),
            file_name: Self::default_file_name(),
            namespace: Self::default_namespace(),
            track_variants: false,
            pretty: Self::default_pretty(),
        }
    }
}

/// Errors raised when the engine configuration is unusable.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("override file name must not be empty")]
    EmptyFileName,
    #[error("override file name `{0}` must be a plain file name")]
    InvalidFileName(String),
    #[error("effect namespace must not be empty")]
    EmptyNamespace,
}
