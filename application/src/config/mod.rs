//! Application-level configuration.
//!
//! - [`WorkflowParams`] - negotiation, concurrency, gate and model settings
//!   for one council run

pub mod workflow_params;

pub use workflow_params::{ConfigValidationError, GateMode, WorkflowParams};
