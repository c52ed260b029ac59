//! Workflow subdomain: stages, the shared run aggregate and the trace log.

pub mod stage;
pub mod state;
pub mod trace;

pub use stage::{RunStatus, Stage};
pub use state::{DimensionSettlement, Observation, PeerStatus, SharedState};
pub use trace::{TraceEvent, TraceEventType};
