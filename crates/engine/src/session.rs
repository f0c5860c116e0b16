//! Session: the dataset store plus the script runner, behind one lock.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::EngineError;
use crate::runtime::ScriptRunner;
use crate::store::DatasetStore;

#[derive(Debug, Default)]
pub struct Session {
    store: DatasetStore,
    runner: ScriptRunner,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a CSV file and return the human-readable load message.
    pub fn load_dataset(&mut self, path: &Path, name: Option<&str>) -> Result<String, EngineError> {
        self.store.load(path, name).map(|r| r.to_string())
    }

    pub fn run_script(&mut self, script: &str, persist: Option<&[String]>) -> Result<String, EngineError> {
        self.runner.execute(&mut self.store, script, persist)
    }

    pub fn notes(&self) -> String {
        self.store.notes()
    }

    pub fn store(&self) -> &DatasetStore {
        &self.store
    }
}

/// Shared handle used by every transport. All engine access goes through
/// the mutex, so at most one script runs at a time.
#[derive(Debug, Clone, Default)]
pub struct SharedSession(Arc<Mutex<Session>>);

impl SharedSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the session. A poisoned lock is recovered: no engine operation
    /// leaves the store half-written.
    pub fn lock(&self) -> MutexGuard<'_, Session> {
        self.0.lock().unwrap_or_else(|poisoned| {
            log::warn!("session lock was poisoned; recovering");
            poisoned.into_inner()
        })
    }

    pub fn load_dataset(&self, path: &Path, name: Option<&str>) -> Result<String, EngineError> {
        self.lock().load_dataset(path, name)
    }

    pub fn run_script(&self, script: &str, persist: Option<&[String]>) -> Result<String, EngineError> {
        self.lock().run_script(script, persist)
    }

    pub fn notes(&self) -> String {
        self.lock().notes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_empty_session_notes() {
        let session = SharedSession::new();
        assert_eq!(session.notes(), "");
    }

    #[test]
    fn test_shared_across_threads() {
        let session = SharedSession::new();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let s = session.clone();
                thread::spawn(move || s.run_script(&format!("print({i})"), None).unwrap())
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        // Each run logs a request and an output entry
        assert_eq!(session.lock().store().log_entries().len(), 8);
    }
}
