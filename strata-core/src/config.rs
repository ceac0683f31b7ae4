use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level Strata configuration, matching `strata.toml`.
///
/// Constructed once at startup and passed by reference into each component;
/// there is no process-global configuration state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrataConfig {
    #[serde(default)]
    pub backend: BackendSection,
    #[serde(default)]
    pub run: RunSection,
    #[serde(default)]
    pub storage: StorageSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSection {
    /// OpenAI-compatible base URL (e.g. a local llama.cpp server).
    pub base_url: String,
    /// Model id; `None` resolves to the first model the server lists.
    pub model: Option<String>,
    /// Timeout per backend call, in seconds.
    pub timeout_seconds: u64,
}

impl Default for BackendSection {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            model: None,
            timeout_seconds: 120,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSection {
    /// Cap on the combined code+doc file list (smoke tests).
    pub max_files: Option<usize>,
    /// Cap on the folder list (smoke tests).
    pub max_folders: Option<usize>,
    /// Skip the method phase entirely.
    #[serde(default)]
    pub skip_methods: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSection {
    /// Base directory for per-app/run summary databases.
    pub base_dir: PathBuf,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("code_summary_results"),
        }
    }
}

impl StrataConfig {
    /// Load and validate a config file. The file must exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::NotFound(path.display().to_string()))?;
        let config: Self =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file if present, else fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "backend.timeout_seconds must be at least 1".to_string(),
            ));
        }
        if self.backend.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "backend.base_url must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────────
