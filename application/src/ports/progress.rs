//! Progress notification port
//!
//! Defines the interface for reporting workflow progress.

use council_domain::{Stage, TraceEvent};

/// Callback for progress updates during a council run
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (console, progress bars, ...).
pub trait WorkflowProgress: Send + Sync {
    /// Called for every trace event, in emission order
    fn on_event(&self, event: &TraceEvent);

    /// Called when a stage finishes without aborting the run
    fn on_stage_complete(&self, _stage: Stage) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl WorkflowProgress for NoProgress {
    fn on_event(&self, _event: &TraceEvent) {}
}
