//! Workflow configuration from TOML (`[workflow]` section)
//!
//! Example configuration:
//!
//! ```toml
//! [workflow]
//! max_rounds = 5
//! convergence_threshold = 0.15
//! memo_concurrency = 6
//! batch_concurrency = 3
//! seed = 42
//! gate_mode = "enforcing"
//! ```

use council_application::GateMode;
use serde::{Deserialize, Serialize};

/// Raw workflow configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileWorkflowConfig {
    /// Cap on dispute negotiation rounds
    pub max_rounds: u32,
    /// Early exit once the convergence score reaches `1 - threshold`
    pub convergence_threshold: f64,
    /// In-flight limit for the department memo stage
    pub memo_concurrency: usize,
    /// Default in-flight limit for other concurrent batches
    pub batch_concurrency: usize,
    /// Seed for dispute draws; omitted means OS entropy
    pub seed: Option<u64>,
    /// "enforcing" or "advisory"
    pub gate_mode: GateMode,
}

impl Default for FileWorkflowConfig {
    fn default() -> Self {
        Self {
            max_rounds: 5,
            convergence_threshold: 0.15,
            memo_concurrency: 6,
            batch_concurrency: 3,
            seed: None,
            gate_mode: GateMode::Enforcing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workflow_section_partial() {
        let config: FileWorkflowConfig = toml::from_str("gate_mode = \"advisory\"\nseed = 7").unwrap();
        assert_eq!(config.gate_mode, GateMode::Advisory);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.max_rounds, 5);
    }

    #[test]
    fn test_unknown_gate_mode_rejected() {
        let result: Result<FileWorkflowConfig, _> = toml::from_str("gate_mode = \"lenient\"");
        assert!(result.is_err());
    }
}
