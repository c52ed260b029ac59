//! Port for run persistence.
//!
//! Stores the full [`SharedState`] snapshot of a run, its append-only trace
//! log and the artifacts it produces. Methods are synchronous, matching the
//! small local writes the adapters perform.

use chrono::{DateTime, Utc};
use council_domain::{Artifact, RunStatus, SharedState, Stage, TraceEvent};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from a run store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Listing entry for a stored run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub title: String,
    pub status: RunStatus,
    pub stage: Stage,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&SharedState> for RunSummary {
    fn from(state: &SharedState) -> Self {
        Self {
            run_id: state.run_id.clone(),
            title: state.issue.title.clone(),
            status: state.run_status,
            stage: state.current_stage,
            created_at: state.created_at,
            updated_at: state.updated_at,
        }
    }
}

/// Persistence of runs
pub trait RunStore: Send + Sync {
    /// Persist the full snapshot, replacing any previous one
    fn save_state(&self, state: &SharedState) -> Result<(), StoreError>;

    /// Load the latest snapshot
    fn load_state(&self, run_id: &str) -> Result<SharedState, StoreError>;

    /// Append one trace event
    fn append_trace(&self, run_id: &str, event: &TraceEvent) -> Result<(), StoreError>;

    /// All trace events of a run, in append order
    fn load_trace(&self, run_id: &str) -> Result<Vec<TraceEvent>, StoreError>;

    /// Write an artifact and describe it
    fn save_artifact(
        &self,
        run_id: &str,
        name: &str,
        content: &str,
        kind: &str,
    ) -> Result<Artifact, StoreError>;

    fn load_artifact(&self, run_id: &str, name: &str) -> Result<String, StoreError>;

    /// Stored runs, newest first
    fn list_runs(&self) -> Result<Vec<RunSummary>, StoreError>;

    fn delete_run(&self, run_id: &str) -> Result<(), StoreError>;
}

/// Store that keeps nothing
pub struct NoRunStore;

impl RunStore for NoRunStore {
    fn save_state(&self, _state: &SharedState) -> Result<(), StoreError> {
        Ok(())
    }

    fn load_state(&self, run_id: &str) -> Result<SharedState, StoreError> {
        Err(StoreError::NotFound(run_id.to_string()))
    }

    fn append_trace(&self, _run_id: &str, _event: &TraceEvent) -> Result<(), StoreError> {
        Ok(())
    }

    fn load_trace(&self, run_id: &str) -> Result<Vec<TraceEvent>, StoreError> {
        Err(StoreError::NotFound(run_id.to_string()))
    }

    fn save_artifact(
        &self,
        run_id: &str,
        name: &str,
        content: &str,
        kind: &str,
    ) -> Result<Artifact, StoreError> {
        Ok(Artifact::new(
            name,
            kind,
            format!("{}/{}", run_id, name),
            content.len() as u64,
        ))
    }

    fn load_artifact(&self, run_id: &str, name: &str) -> Result<String, StoreError> {
        Err(StoreError::NotFound(format!("{}/{}", run_id, name)))
    }

    fn list_runs(&self) -> Result<Vec<RunSummary>, StoreError> {
        Ok(Vec::new())
    }

    fn delete_run(&self, run_id: &str) -> Result<(), StoreError> {
        Err(StoreError::NotFound(run_id.to_string()))
    }
}
