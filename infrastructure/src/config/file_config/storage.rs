//! Run storage configuration from TOML (`[storage]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStorageConfig {
    /// One subdirectory per run is created here
    pub artifacts_dir: PathBuf,
}

impl Default for FileStorageConfig {
    fn default() -> Self {
        Self {
            artifacts_dir: PathBuf::from("./artifacts"),
        }
    }
}
