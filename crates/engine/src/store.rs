//! Dataset store: named frames, default naming and the activity log.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use dataprobe_core::DataFrame;

use crate::error::EngineError;

/// Outcome of a successful load. Displays as the activity log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadResult {
    pub name: String,
    pub rows: usize,
    pub cols: usize,
}

impl fmt::Display for LoadResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Loaded CSV into '{}' ({} rows, {} cols)", self.name, self.rows, self.cols)
    }
}

/// Session state: datasets by name, the default-name counter and the
/// append-only activity log.
#[derive(Debug, Default)]
pub struct DatasetStore {
    datasets: HashMap<String, Arc<DataFrame>>,
    counter: u64,
    log: Vec<String>,
}

impl DatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a CSV file and store it under `name`, or `df_<n>` when no name
    /// is given.
    ///
    /// The counter advances on every call, named or not and even when the
    /// read fails, so generated names are never reused.
    pub fn load(&mut self, path: &Path, name: Option<&str>) -> Result<LoadResult, EngineError> {
        self.counter += 1;
        let name = match name {
            Some(n) => n.to_string(),
            None => format!("df_{}", self.counter),
        };

        let frame = match dataprobe_io::csv::import(path) {
            Ok(frame) => frame,
            Err(e) => {
                log::error!("Error loading CSV {}: {}", path.display(), e);
                return Err(e.into());
            }
        };

        let (rows, cols) = frame.shape();
        self.datasets.insert(name.clone(), Arc::new(frame));
        let result = LoadResult { name, rows, cols };
        self.record(result.to_string());
        log::info!("{}", result);
        Ok(result)
    }

    pub fn get(&self, name: &str) -> Option<Arc<DataFrame>> {
        self.datasets.get(name).cloned()
    }

    /// Insert or overwrite.
    pub fn put(&mut self, name: impl Into<String>, dataset: Arc<DataFrame>) {
        self.datasets.insert(name.into(), dataset);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.datasets.contains_key(name)
    }

    /// Dataset names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.datasets.keys().cloned().collect();
        names.sort();
        names
    }

    /// All `(name, dataset)` pairs. Order is unspecified.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<DataFrame>)> {
        self.datasets.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }

    /// Append an activity log entry.
    pub fn record(&mut self, entry: impl Into<String>) {
        self.log.push(entry.into());
    }

    pub fn log_entries(&self) -> &[String] {
        &self.log
    }

    /// The activity log as one newline-joined blob.
    pub fn notes(&self) -> String {
        self.log.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_csv(dir: &Path, file: &str, body: &str) -> std::path::PathBuf {
        let path = dir.join(file);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_default_names_increment() {
        let dir = tempdir().unwrap();
        let a = write_csv(dir.path(), "a.csv", "x,y\n1,2\n");
        let mut store = DatasetStore::new();

        assert_eq!(store.load(&a, None).unwrap().name, "df_1");
        assert_eq!(store.load(&a, Some("named")).unwrap().name, "named");
        // Counter advanced on the named load too
        assert_eq!(store.load(&a, None).unwrap().name, "df_3");
        assert_eq!(store.names(), vec!["df_1", "df_3", "named"]);
    }

    #[test]
    fn test_load_message_and_log() {
        let dir = tempdir().unwrap();
        let a = write_csv(dir.path(), "a.csv", "x,y,z\n1,2,3\n4,5,6\n");
        let mut store = DatasetStore::new();

        let result = store.load(&a, Some("t")).unwrap();
        assert_eq!(result.to_string(), "Loaded CSV into 't' (2 rows, 3 cols)");
        assert_eq!(store.log_entries(), &["Loaded CSV into 't' (2 rows, 3 cols)".to_string()]);
    }

    #[test]
    fn test_load_overwrites() {
        let dir = tempdir().unwrap();
        let small = write_csv(dir.path(), "s.csv", "x\n1\n");
        let big = write_csv(dir.path(), "b.csv", "x,y\n1,2\n3,4\n5,6\n");
        let mut store = DatasetStore::new();

        store.load(&small, Some("t")).unwrap();
        store.load(&big, Some("t")).unwrap();
        assert_eq!(store.get("t").unwrap().shape(), (3, 2));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_failed_load_leaves_state() {
        let dir = tempdir().unwrap();
        let mut store = DatasetStore::new();

        let err = store.load(&dir.path().join("missing.csv"), None).unwrap_err();
        assert!(matches!(err, EngineError::DataLoad(_)));
        assert!(err.to_string().starts_with("Error loading CSV: file not found"));
        assert!(store.is_empty());
        assert!(store.log_entries().is_empty());

        // The failed call still consumed a number
        let a = write_csv(dir.path(), "a.csv", "x\n1\n");
        assert_eq!(store.load(&a, None).unwrap().name, "df_2");
    }

    #[test]
    fn test_notes_joined() {
        let mut store = DatasetStore::new();
        store.record("one");
        store.record("two");
        assert_eq!(store.notes(), "one\ntwo");
    }
}
