/*!
 * Registry of in-flight pipeline runs.
 *
 * Each run gets a `Uuid` and its own cancellation token. The entry lives as
 * long as the returned `RunGuard`; dropping the guard removes it, whatever
 * way the run ended.
 */

use log::debug;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Shared table of active runs.
#[derive(Debug, Clone, Default)]
pub struct RunRegistry {
    runs: Arc<Mutex<HashMap<Uuid, CancellationToken>>>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new run and hand back its guard.
    pub fn register(&self) -> RunGuard {
        let id = Uuid::new_v4();
        let token = CancellationToken::new();
        self.runs.lock().insert(id, token.clone());
        debug!("Registered run {}", id);

        RunGuard {
            id,
            token,
            runs: Arc::clone(&self.runs),
        }
    }

    /// Cancel one run. Returns false if the run is unknown or already finished.
    pub fn cancel(&self, id: &Uuid) -> bool {
        match self.runs.lock().get(id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel every registered run, returning how many were signalled.
    pub fn cancel_all(&self) -> usize {
        let runs = self.runs.lock();
        for token in runs.values() {
            token.cancel();
        }
        runs.len()
    }

    pub fn active_count(&self) -> usize {
        self.runs.lock().len()
    }

    pub fn is_active(&self, id: &Uuid) -> bool {
        self.runs.lock().contains_key(id)
    }
}

/// Handle for one registered run; unregisters on drop.
#[derive(Debug)]
pub struct RunGuard {
    id: Uuid,
    token: CancellationToken,
    runs: Arc<Mutex<HashMap<Uuid, CancellationToken>>>,
}

impl RunGuard {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Token to thread through the pipeline for this run.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.runs.lock().remove(&self.id);
        debug!("Unregistered run {}", self.id);
    }
}
