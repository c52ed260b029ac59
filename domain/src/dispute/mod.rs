//! Disputes between departments and their probabilistic resolution.
//!
//! - [`entities`] - Dispute records with a forward-only status
//! - [`aggregation`] - Turning department memos into disputes
//! - [`schedule`] - Round-indexed resolution probabilities and selection

pub mod aggregation;
pub mod entities;
pub mod schedule;

pub use aggregation::{AggregationOutcome, aggregate_disputes};
pub use entities::{Dispute, DisputeStatus, NegotiationRound, Severity};
pub use schedule::{RoundSelection, convergence_score, is_converged, select_for_round};
