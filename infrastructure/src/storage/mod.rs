//! Run persistence adapters
//!
//! - [`FileRunStore`]: one directory per run under the artifacts root
//!   (`state.json`, `trace.jsonl`, artifact files)
//! - [`InMemoryRunStore`]: process-local, for tests and dry runs

mod file;
mod memory;

pub use file::FileRunStore;
pub use memory::InMemoryRunStore;

use council_application::StoreError;

/// Run ids and artifact names become path segments, so only plain names are accepted
fn check_segment(segment: &str) -> Result<(), StoreError> {
    let plain = !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(['/', '\\']);
    if plain {
        Ok(())
    } else {
        Err(StoreError::NotFound(segment.to_string()))
    }
}
