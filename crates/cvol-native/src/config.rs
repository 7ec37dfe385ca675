//! Engine library configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{NativeError, NativeResult};

/// Environment variable naming the engine shared library.
pub const LIBRARY_ENV: &str = "CVOL_OCF_LIBRARY";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeConfig {
    /// Path of the engine shared library.
    #[serde(default = "default_library_path")]
    pub library_path: PathBuf,
}

fn default_library_path() -> PathBuf {
    PathBuf::from("libocf.so")
}

impl Default for NativeConfig {
    fn default() -> Self {
        Self {
            library_path: default_library_path(),
        }
    }
}

impl NativeConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `CVOL_OCF_LIBRARY` | Engine shared library path |
    pub fn from_env() -> Self {
        Self {
            library_path: std::env::var_os(LIBRARY_ENV)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(default_library_path),
        }
    }

    /// Load config from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> NativeResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_yaml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the library path.
    pub fn with_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.library_path = path.into();
        self
    }

    pub fn validate(&self) -> NativeResult<()> {
        if self.library_path.as_os_str().is_empty() {
            return Err(NativeError::Config {
                message: "library_path must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
