//! Storage configuration.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

fn default_subdir() -> String {
    "containers".to_string()
}

/// Where a world keeps its container files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// World save root.
    pub root: PathBuf,
    /// Subdirectory under the root holding one `.dat` file per container.
    #[serde(default = "default_subdir")]
    pub subdir: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("saves"),
            subdir: default_subdir(),
        }
    }
}

impl StoreConfig {
    /// Config with the default subdirectory under `root`.
    pub fn rooted_at<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Load the config from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("failed to parse config {}", path.display()))
    }

    /// Directory containing the container files.
    pub fn container_dir(&self) -> PathBuf {
        self.root.join(&self.subdir)
    }
}
