//! Configuration loading
//!
//! Crucible runs with built-in defaults; a project may drop a
//! `.crucible.toml` next to its `Cargo.toml` to override the container
//! backend binary or the image naming prefix. The file is discovered by
//! walking up from the current directory, and the directory that holds it
//! (or, failing that, the nearest `Cargo.toml`) becomes the project root
//! that gets bind-mounted into containers.

use crate::error::{CrucibleError, CrucibleResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Project-local configuration file name
pub const CONFIG_FILE: &str = ".crucible.toml";

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Container backend settings
    pub backend: BackendConfig,

    /// Image naming settings
    pub images: ImageConfig,
}

/// Container backend configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Backend binary to invoke (podman-compatible CLI)
    pub binary: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            binary: "podman".to_string(),
        }
    }
}

/// Image naming configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Prefix for image repositories and volume names
    pub prefix: String,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            prefix: "crucible".to_string(),
        }
    }
}

impl Config {
    /// Load configuration for the project containing `start_dir`.
    ///
    /// Missing config file means defaults, never an error.
    pub async fn load(start_dir: &Path) -> CrucibleResult<Self> {
        match find_config_file(start_dir) {
            Some(path) => Self::load_from_file(&path).await,
            None => {
                debug!("No {} found, using defaults", CONFIG_FILE);
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(path: &Path) -> CrucibleResult<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| CrucibleError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| CrucibleError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

/// Find a `.crucible.toml` by walking up from `start_dir`
pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    start_dir
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE))
        .find(|candidate| candidate.is_file())
}

/// Determine the project root to mount into containers.
///
/// The directory holding `.crucible.toml` wins; otherwise the nearest
/// ancestor with a `Cargo.toml`; otherwise `start_dir` itself.
pub fn find_project_root(start_dir: &Path) -> PathBuf {
    if let Some(config) = find_config_file(start_dir) {
        if let Some(dir) = config.parent() {
            return dir.to_path_buf();
        }
    }

    start_dir
        .ancestors()
        .find(|dir| dir.join("Cargo.toml").is_file())
        .unwrap_or(start_dir)
        .to_path_buf()
}
