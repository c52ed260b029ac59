//! Infrastructure layer for policy-council
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer: the chat completions gateway, the deterministic policy
//! tools, run storage and configuration file loading.

pub mod config;
pub mod openai;
pub mod storage;
pub mod tools;

pub use config::{ConfigLoader, FileConfig, FileLlmConfig, FileStorageConfig, FileWorkflowConfig};
pub use openai::{ChatGateway, ChatGatewayConfig};
pub use storage::{FileRunStore, InMemoryRunStore};
pub use tools::PolicyToolExecutor;
