//! Workflow parameters - use case control.
//!
//! [`WorkflowParams`] groups the static parameters that control a council
//! run in [`RunWorkflowUseCase`](crate::use_cases::run_workflow::RunWorkflowUseCase).

use crate::ports::llm_gateway::ModelProfile;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What a failed review gate does to the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GateMode {
    /// A failed gate aborts the run
    #[default]
    Enforcing,
    /// A failed gate is recorded and the run continues
    Advisory,
}

impl GateMode {
    pub fn as_str(&self) -> &str {
        match self {
            GateMode::Enforcing => "enforcing",
            GateMode::Advisory => "advisory",
        }
    }
}

impl std::str::FromStr for GateMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "enforcing" => Ok(GateMode::Enforcing),
            "advisory" => Ok(GateMode::Advisory),
            other => Err(format!("unknown gate mode: {}", other)),
        }
    }
}

/// Invalid workflow parameters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    #[error("max_rounds must be at least 1")]
    ZeroRounds,

    #[error("convergence_threshold must be within [0, 1], got {0}")]
    ThresholdOutOfRange(f64),

    #[error("{0} must be at least 1")]
    ZeroConcurrency(&'static str),
}

/// Council run parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowParams {
    /// Cap on dispute negotiation rounds; the last one settles everything.
    pub max_rounds: u32,
    /// Negotiation stops once the convergence score reaches `1 - threshold`.
    pub convergence_threshold: f64,
    /// In-flight limit for the department memo stage.
    pub memo_concurrency: usize,
    /// Default in-flight limit for other concurrent batches.
    pub batch_concurrency: usize,
    /// Seed for dispute draws; `None` draws from OS entropy.
    pub seed: Option<u64>,
    pub gate_mode: GateMode,
    /// Model used by departments and the office.
    pub default_model: ModelProfile,
    /// Stronger, cooler model used by the decider.
    pub decider_model: ModelProfile,
    /// Tool-call round trips allowed per reasoning request.
    pub max_tool_iterations: usize,
}

impl Default for WorkflowParams {
    fn default() -> Self {
        Self {
            max_rounds: 5,
            convergence_threshold: 0.15,
            memo_concurrency: 6,
            batch_concurrency: 3,
            seed: None,
            gate_mode: GateMode::Enforcing,
            default_model: ModelProfile::new("qwen-plus", 0.7),
            decider_model: ModelProfile::new("qwen-max", 0.3),
            max_tool_iterations: 5,
        }
    }
}

impl WorkflowParams {
    // ==================== Builder Methods ====================

    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn with_convergence_threshold(mut self, threshold: f64) -> Self {
        self.convergence_threshold = threshold;
        self
    }

    pub fn with_memo_concurrency(mut self, limit: usize) -> Self {
        self.memo_concurrency = limit;
        self
    }

    pub fn with_batch_concurrency(mut self, limit: usize) -> Self {
        self.batch_concurrency = limit;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_gate_mode(mut self, mode: GateMode) -> Self {
        self.gate_mode = mode;
        self
    }

    pub fn with_default_model(mut self, model: ModelProfile) -> Self {
        self.default_model = model;
        self
    }

    pub fn with_decider_model(mut self, model: ModelProfile) -> Self {
        self.decider_model = model;
        self
    }

    pub fn with_max_tool_iterations(mut self, max: usize) -> Self {
        self.max_tool_iterations = max;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.max_rounds == 0 {
            return Err(ConfigValidationError::ZeroRounds);
        }
        if !(0.0..=1.0).contains(&self.convergence_threshold) {
            return Err(ConfigValidationError::ThresholdOutOfRange(self.convergence_threshold));
        }
        if self.memo_concurrency == 0 {
            return Err(ConfigValidationError::ZeroConcurrency("memo_concurrency"));
        }
        if self.batch_concurrency == 0 {
            return Err(ConfigValidationError::ZeroConcurrency("batch_concurrency"));
        }
        Ok(())
    }
}
