use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

const CONFIG_FILE: &str = "config.yaml";

/// Settings stored in `.notestore/config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory for attachment blobs, relative to `.notestore/`
    pub storage_dir: PathBuf,
    /// Default tracing filter, used when RUST_LOG is unset
    pub log_filter: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("storage"),
            log_filter: "notestore=warn".to_string(),
        }
    }
}

impl StoreConfig {
    /// Load the config from a store directory. A missing file yields defaults.
    pub fn load(store_dir: &Path) -> Result<Self> {
        let path = store_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&text)?)
    }

    pub fn save(&self, store_dir: &Path) -> Result<()> {
        let text = serde_yaml::to_string(self)?;
        fs::write(store_dir.join(CONFIG_FILE), text)?;
        Ok(())
    }

    /// Absolute blob directory for a store directory.
    pub fn storage_path(&self, store_dir: &Path) -> PathBuf {
        store_dir.join(&self.storage_dir)
    }
}
