//! Application layer for policy-council
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{ConfigValidationError, GateMode, WorkflowParams};
pub use ports::{
    llm_gateway::{GatewayError, LlmGateway, LlmSession, ModelProfile},
    progress::{NoProgress, WorkflowProgress},
    run_store::{NoRunStore, RunStore, RunSummary, StoreError},
    tool_executor::{NoToolExecutor, ToolExecutorPort, ToolSchema},
};
pub use use_cases::actor::{Actor, ActorError, CycleOutcome, RoleBehavior};
pub use use_cases::actor_manager::{ActorManager, CycleReport, ManagerError};
pub use use_cases::run_workflow::{RunWorkflowInput, RunWorkflowUseCase, WorkflowError};
pub use use_cases::shared_store::SharedStore;
