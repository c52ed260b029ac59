//! Policy subject matter: the issue under deliberation and the artifacts the
//! council produces about it.

pub mod entities;
pub mod report;

pub use entities::{
    Artifact, Constraints, Decision, GateResult, Issue, Memo, PolicyCard, Position, Urgency,
};
pub use report::render_implementation_plan;
