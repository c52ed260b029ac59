//! Process-local run store

use super::check_segment;
use council_application::{RunStore, RunSummary, StoreError};
use council_domain::{Artifact, SharedState, TraceEvent};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct StoredRun {
    state: Option<SharedState>,
    trace: Vec<TraceEvent>,
    artifacts: BTreeMap<String, String>,
}

#[derive(Default)]
pub struct InMemoryRunStore {
    runs: Mutex<HashMap<String, StoredRun>>,
}

impl InMemoryRunStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn runs(&self) -> MutexGuard<'_, HashMap<String, StoredRun>> {
        self.runs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RunStore for InMemoryRunStore {
    fn save_state(&self, state: &SharedState) -> Result<(), StoreError> {
        check_segment(&state.run_id)?;
        self.runs().entry(state.run_id.clone()).or_default().state = Some(state.clone());
        Ok(())
    }

    fn load_state(&self, run_id: &str) -> Result<SharedState, StoreError> {
        self.runs()
            .get(run_id)
            .and_then(|run| run.state.clone())
            .ok_or_else(|| StoreError::NotFound(run_id.to_string()))
    }

    fn append_trace(&self, run_id: &str, event: &TraceEvent) -> Result<(), StoreError> {
        check_segment(run_id)?;
        self.runs().entry(run_id.to_string()).or_default().trace.push(event.clone());
        Ok(())
    }

    fn load_trace(&self, run_id: &str) -> Result<Vec<TraceEvent>, StoreError> {
        self.runs()
            .get(run_id)
            .map(|run| run.trace.clone())
            .ok_or_else(|| StoreError::NotFound(run_id.to_string()))
    }

    fn save_artifact(
        &self,
        run_id: &str,
        name: &str,
        content: &str,
        kind: &str,
    ) -> Result<Artifact, StoreError> {
        check_segment(run_id)?;
        check_segment(name)?;
        self.runs()
            .entry(run_id.to_string())
            .or_default()
            .artifacts
            .insert(name.to_string(), content.to_string());
        Ok(Artifact::new(
            name,
            kind,
            format!("memory://{}/{}", run_id, name),
            content.len() as u64,
        ))
    }

    fn load_artifact(&self, run_id: &str, name: &str) -> Result<String, StoreError> {
        self.runs()
            .get(run_id)
            .and_then(|run| run.artifacts.get(name).cloned())
            .ok_or_else(|| StoreError::NotFound(format!("{}/{}", run_id, name)))
    }

    fn list_runs(&self) -> Result<Vec<RunSummary>, StoreError> {
        let mut runs: Vec<RunSummary> = self
            .runs()
            .values()
            .filter_map(|run| run.state.as_ref().map(RunSummary::from))
            .collect();
        runs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(runs)
    }

    fn delete_run(&self, run_id: &str) -> Result<(), StoreError> {
        self.runs()
            .remove(run_id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(run_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_domain::{Constraints, Issue, Stage, TraceEventType};

    #[test]
    fn test_run_lifecycle() {
        let store = InMemoryRunStore::new();
        let state = SharedState::new("run_m", Issue::new("i", "Title", "Desc"), Constraints::default());

        store.save_state(&state).unwrap();
        store
            .append_trace("run_m", &TraceEvent::new(Stage::Init, TraceEventType::StageChange, "start"))
            .unwrap();
        let artifact = store.save_artifact("run_m", "final_decision.json", "{}", "json").unwrap();

        assert_eq!(artifact.path, "memory://run_m/final_decision.json");
        assert_eq!(store.load_state("run_m").unwrap(), state);
        assert_eq!(store.load_trace("run_m").unwrap().len(), 1);
        assert_eq!(store.load_artifact("run_m", "final_decision.json").unwrap(), "{}");
        assert_eq!(store.list_runs().unwrap()[0].title, "Title");

        store.delete_run("run_m").unwrap();
        assert!(store.load_state("run_m").unwrap_err().is_not_found());
        assert!(store.delete_run("run_m").unwrap_err().is_not_found());
    }

    #[test]
    fn test_trace_only_run_is_not_listed() {
        let store = InMemoryRunStore::new();
        store
            .append_trace("run_t", &TraceEvent::new(Stage::Init, TraceEventType::StageChange, "start"))
            .unwrap();
        assert!(store.list_runs().unwrap().is_empty());
        assert!(store.load_state("run_t").unwrap_err().is_not_found());
    }
}
