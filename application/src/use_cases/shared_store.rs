//! Synchronized access to the run's [`SharedState`].
//!
//! Every actor cycle, including the concurrent department cycles, reads and
//! writes the run through one [`SharedStore`]. Mutations go through
//! [`SharedStore::update`], which holds the write lock only for the closure;
//! nothing awaits while the lock is held.

use council_domain::SharedState;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Cloneable handle to the run aggregate
#[derive(Clone)]
pub struct SharedStore {
    inner: Arc<RwLock<SharedState>>,
}

impl SharedStore {
    pub fn new(state: SharedState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    /// Run `f` against a read view of the state
    pub async fn read<R>(&self, f: impl FnOnce(&SharedState) -> R) -> R {
        let guard = self.inner.read().await;
        f(&guard)
    }

    /// Run `f` with exclusive access to the state
    pub async fn update<R>(&self, f: impl FnOnce(&mut SharedState) -> R) -> R {
        let mut guard = self.inner.write().await;
        f(&mut guard)
    }

    /// Owned copy of the whole state
    pub async fn snapshot(&self) -> SharedState {
        self.inner.read().await.clone()
    }

    pub async fn run_id(&self) -> String {
        self.inner.read().await.run_id.clone()
    }
}
