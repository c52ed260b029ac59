//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use application types where appropriate.

mod llm;
mod storage;
mod workflow;

pub use llm::FileLlmConfig;
pub use storage::FileStorageConfig;
pub use workflow::FileWorkflowConfig;

use council_application::{ConfigValidationError, WorkflowParams};
use serde::{Deserialize, Serialize};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Negotiation, concurrency and gate settings
    pub workflow: FileWorkflowConfig,
    /// Reasoning service endpoint and models
    pub llm: FileLlmConfig,
    /// Where runs are persisted
    pub storage: FileStorageConfig,
}

impl FileConfig {
    /// Validated run parameters from the `[workflow]` and `[llm]` sections
    pub fn workflow_params(&self) -> Result<WorkflowParams, ConfigValidationError> {
        let params = WorkflowParams::default()
            .with_max_rounds(self.workflow.max_rounds)
            .with_convergence_threshold(self.workflow.convergence_threshold)
            .with_memo_concurrency(self.workflow.memo_concurrency)
            .with_batch_concurrency(self.workflow.batch_concurrency)
            .with_seed(self.workflow.seed)
            .with_gate_mode(self.workflow.gate_mode)
            .with_default_model(self.llm.default_profile())
            .with_decider_model(self.llm.decider_profile())
            .with_max_tool_iterations(self.llm.max_tool_iterations);
        params.validate()?;
        Ok(params)
    }
}
