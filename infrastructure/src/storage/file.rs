//! File-backed run store.
//!
//! Layout under the artifacts root:
//!
//! ```text
//! <root>/<run_id>/state.json     pretty-printed SharedState, rewritten on save
//! <root>/<run_id>/trace.jsonl    one TraceEvent per line, append-only
//! <root>/<run_id>/<artifact>     artifact files (final_decision.json, ...)
//! ```

use super::check_segment;
use council_application::{RunStore, RunSummary, StoreError};
use council_domain::{Artifact, SharedState, TraceEvent};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

const STATE_FILE: &str = "state.json";
const TRACE_FILE: &str = "trace.jsonl";

pub struct FileRunStore {
    root: PathBuf,
    /// Serialises writers so concurrent appends never interleave
    write_lock: Mutex<()>,
}

impl FileRunStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn run_dir(&self, run_id: &str) -> Result<PathBuf, StoreError> {
        check_segment(run_id)?;
        Ok(self.root.join(run_id))
    }

    fn existing_run_dir(&self, run_id: &str) -> Result<PathBuf, StoreError> {
        let dir = self.run_dir(run_id)?;
        if dir.is_dir() {
            Ok(dir)
        } else {
            Err(StoreError::NotFound(run_id.to_string()))
        }
    }

    fn locked(&self) -> std::sync::MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn not_found_as(error: std::io::Error, what: impl Into<String>) -> StoreError {
    if error.kind() == ErrorKind::NotFound {
        StoreError::NotFound(what.into())
    } else {
        StoreError::Io(error)
    }
}

impl RunStore for FileRunStore {
    fn save_state(&self, state: &SharedState) -> Result<(), StoreError> {
        let dir = self.run_dir(&state.run_id)?;
        let json = serde_json::to_string_pretty(state)?;

        let _guard = self.locked();
        fs::create_dir_all(&dir)?;
        // Write then rename so readers never see a torn snapshot
        let tmp = dir.join(format!("{}.tmp", STATE_FILE));
        fs::write(&tmp, json)?;
        fs::rename(&tmp, dir.join(STATE_FILE))?;
        debug!("Saved state for {}", state.run_id);
        Ok(())
    }

    fn load_state(&self, run_id: &str) -> Result<SharedState, StoreError> {
        let path = self.run_dir(run_id)?.join(STATE_FILE);
        let json = fs::read_to_string(&path).map_err(|e| not_found_as(e, run_id))?;
        Ok(serde_json::from_str(&json)?)
    }

    fn append_trace(&self, run_id: &str, event: &TraceEvent) -> Result<(), StoreError> {
        let dir = self.run_dir(run_id)?;
        let line = serde_json::to_string(event)?;

        let _guard = self.locked();
        fs::create_dir_all(&dir)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(TRACE_FILE))?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{}", line)?;
        writer.flush()?;
        Ok(())
    }

    fn load_trace(&self, run_id: &str) -> Result<Vec<TraceEvent>, StoreError> {
        let dir = self.existing_run_dir(run_id)?;
        let file = match File::open(dir.join(TRACE_FILE)) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut events = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(event) => events.push(event),
                Err(e) => warn!("Skipping bad trace line {} of {}: {}", index + 1, run_id, e),
            }
        }
        Ok(events)
    }

    fn save_artifact(
        &self,
        run_id: &str,
        name: &str,
        content: &str,
        kind: &str,
    ) -> Result<Artifact, StoreError> {
        check_segment(name)?;
        let dir = self.run_dir(run_id)?;
        let path = dir.join(name);

        let _guard = self.locked();
        fs::create_dir_all(&dir)?;
        fs::write(&path, content)?;
        debug!("Saved artifact {} for {}", name, run_id);
        Ok(Artifact::new(
            name,
            kind,
            path.to_string_lossy(),
            content.len() as u64,
        ))
    }

    fn load_artifact(&self, run_id: &str, name: &str) -> Result<String, StoreError> {
        check_segment(name)?;
        let path = self.run_dir(run_id)?.join(name);
        fs::read_to_string(&path).map_err(|e| not_found_as(e, format!("{}/{}", run_id, name)))
    }

    fn list_runs(&self) -> Result<Vec<RunSummary>, StoreError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut runs = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let run_id = entry.file_name().to_string_lossy().to_string();
            match self.load_state(&run_id) {
                Ok(state) => runs.push(RunSummary::from(&state)),
                Err(e) => debug!("Skipping {} in run listing: {}", run_id, e),
            }
        }
        runs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(runs)
    }

    fn delete_run(&self, run_id: &str) -> Result<(), StoreError> {
        let dir = self.existing_run_dir(run_id)?;
        let _guard = self.locked();
        fs::remove_dir_all(dir)?;
        Ok(())
    }
}
