//! Domain layer for policy-council
//!
//! This crate contains the council's data model and its deterministic
//! algorithms. It has no dependencies on async runtimes, I/O, or
//! presentation concerns.
//!
//! # Core Concepts
//!
//! ## Actors
//!
//! Six departments, a coordinating office and a decider each run an
//! observe / think / plan / act cycle against one [`SharedState`].
//!
//! ## Disputes
//!
//! Disagreements derived from department memos, settled round by round with
//! a severity-dependent probability that rises until every dispute is
//! resolved ([`dispute::select_for_round`]).
//!
//! ## Dimension negotiation
//!
//! A deterministic alternative: [`NegotiationEngine`] settles numeric and
//! enumerated dimensions of an issue from the negotiators' weight profiles.

pub mod agent;
pub mod core;
pub mod dispute;
pub mod message;
pub mod negotiation;
pub mod policy;
pub mod prompt;
pub mod workflow;

// Re-export commonly used types
pub use agent::{
    Action, ActionKind, ActionRecord, ActionResult, AgentId, AgentMemory, AgentPlan, AgentRole,
    AgentState, AgentStatus, DecisionDraft, GateVerdict, MemoDraft, PlanStep, RoleProfile, StepId,
    StepStatus, decode_structured, parse_plan,
};
pub use self::core::{error::DomainError, string::truncate};
pub use dispute::{
    AggregationOutcome, Dispute, DisputeStatus, NegotiationRound, RoundSelection, Severity,
    aggregate_disputes, convergence_score, is_converged, select_for_round,
};
pub use message::{AgentMessage, MessageId, MessageType};
pub use negotiation::{
    Dimension, DimensionKind, DimensionValue, NegotiationEngine, NegotiationOutcome, Negotiator,
    SettlementStatus,
};
pub use policy::{
    Artifact, Constraints, Decision, GateResult, Issue, Memo, PolicyCard, Position, Urgency,
    render_implementation_plan,
};
pub use prompt::CouncilPromptTemplate;
pub use workflow::{
    DimensionSettlement, Observation, PeerStatus, RunStatus, SharedState, Stage, TraceEvent,
    TraceEventType,
};
