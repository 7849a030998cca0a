//! Loader configuration
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```json
//! { "data_root": "/opt/viewer/data", "cache_budget_bytes": 33554432 }
//! ```

use crate::error::{AssetError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Preview image extensions looked for next to a route file, in priority order
pub const DEFAULT_PREVIEW_EXTENSIONS: [&str; 7] =
    [".png", ".bmp", ".gif", ".tiff", ".tif", ".jpeg", ".jpg"];

/// Placeholder image locations, relative to the data root
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SentinelPaths {
    pub loading: PathBuf,
    pub unknown: PathBuf,
    pub error: PathBuf,
}

impl Default for SentinelPaths {
    fn default() -> Self {
        Self {
            loading: Path::new("Menu").join("loading.png"),
            unknown: Path::new("Menu").join("route_unknown.png"),
            error: Path::new("Menu").join("route_error.png"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Directory the host application ships its data files in
    pub data_root: PathBuf,
    pub sentinels: SentinelPaths,
    pub preview_extensions: Vec<String>,
    /// Memory budget of the decoded image cache
    pub cache_budget_bytes: usize,
    /// Description shown while a route is being parsed
    pub processing_text: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("data"),
            sentinels: SentinelPaths::default(),
            preview_extensions: DEFAULT_PREVIEW_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            cache_budget_bytes: 64 * 1024 * 1024,
            processing_text: "Processing route, please wait...".to_string(),
        }
    }
}

impl LoaderConfig {
    /// Config rooted at `data_root` with every other value defaulted
    pub fn with_data_root(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
            ..Default::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| AssetError::Config(e.to_string()))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn loading_image(&self) -> PathBuf {
        self.data_root.join(&self.sentinels.loading)
    }

    pub fn unknown_image(&self) -> PathBuf {
        self.data_root.join(&self.sentinels.unknown)
    }

    pub fn error_image(&self) -> PathBuf {
        self.data_root.join(&self.sentinels.error)
    }
}
