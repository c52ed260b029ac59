//! Configuration file loading for policy-council
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `--config <path>` specified file
//! 2. Project root: `./council.toml`
//! 3. XDG config: `$XDG_CONFIG_HOME/policy-council/config.toml`
//! 4. Environment: `COUNCIL_*`, sections split on `__` (`COUNCIL_LLM__API_KEY`)
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{FileConfig, FileLlmConfig, FileStorageConfig, FileWorkflowConfig};
pub use loader::ConfigLoader;
