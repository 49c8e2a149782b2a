//! Engine configuration, loadable from TOML.
//!
//! ```toml
//! history_capacity = 10
//! max_nesting_depth = 16
//! default_speed = 1
//! ```
//!
//! Every key is optional; missing keys take the defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default number of checkpoints kept by an undo history.
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// Default limit on nested sub-grid files when loading.
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 16;

/// Errors that can occur while reading a config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Tunables shared by grids and the history decorator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Checkpoints kept by an undo history.
    pub history_capacity: usize,
    /// Maximum depth of nested sub-grid files followed by a load.
    pub max_nesting_depth: usize,
    /// Speed multiplier given to new grids.
    pub default_speed: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            default_speed: 1,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}
