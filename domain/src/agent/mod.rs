//! Agent domain module
//!
//! Contains actor identity, lifecycle state, plans, memory, actions and the
//! strict decoding of structured model output.

pub mod action;
pub mod entities;
pub mod plan_parser;
pub mod structured;
pub mod value_objects;

pub use action::{Action, ActionKind, ActionResult};
pub use entities::{
    ActionRecord, AgentMemory, AgentPlan, AgentState, AgentStatus, PlanStep, StepStatus,
};
pub use plan_parser::parse_plan;
pub use structured::{DecisionDraft, GateVerdict, MemoDraft, decode_structured};
pub use value_objects::{AgentId, AgentRole, RoleProfile, StepId};
