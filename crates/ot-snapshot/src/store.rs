//! The key/value store boundary and shipped implementations.

use crate::error::Result;
use ot_common::{OptionMap, OptionValue};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// The host's persistent key/value configuration store.
pub trait OptionStore {
    fn get(&self, key: &str) -> Option<OptionValue>;
    fn set(&mut self, key: &str, value: OptionValue);
}

/// In-memory store for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, OptionValue>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OptionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<OptionValue> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: OptionValue) {
        self.entries.insert(key.to_string(), value);
    }
}

/// Store backed by a single JSON file.
///
/// Mutations stay in memory until [`JsonStore::persist`] writes the whole
/// file back, temp-then-rename like the snapshot blobs.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    entries: OptionMap,
}

impl JsonStore {
    /// Open a store, loading existing content when the file is present.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => OptionMap::new(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self { path, entries })
    }

    /// Write the full store content back to disk.
    pub fn persist(&self) -> Result<()> {
        let json = serde_json::to_vec_pretty(&self.entries)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OptionStore for JsonStore {
    fn get(&self, key: &str) -> Option<OptionValue> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: OptionValue) {
        self.entries.insert(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store_get_set() {
        let mut store = MemoryStore::new();
        assert!(store.get("missing").is_none());

        store.set("accent", OptionValue::scalar("#fff"));
        assert_eq!(store.get("accent"), Some(OptionValue::scalar("#fff")));

        store.set("accent", OptionValue::scalar("#000"));
        assert_eq!(store.get("accent"), Some(OptionValue::scalar("#000")));
    }

    #[test]
    fn test_json_store_open_missing_file() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::open(dir.path().join("options.json")).unwrap();
        assert!(store.get("anything").is_none());
    }

    #[test]
    fn test_json_store_persist_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("options.json");

        let mut store = JsonStore::open(&path).unwrap();
        let mut map = OptionMap::new();
        map.insert("width".to_string(), OptionValue::scalar("10"));
        store.set("option_tree", OptionValue::Map(map.clone()));
        store.persist().unwrap();

        let reopened = JsonStore::open(&path).unwrap();
        assert_eq!(reopened.get("option_tree"), Some(OptionValue::Map(map)));
    }

    #[test]
    fn test_json_store_rejects_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("options.json");
        fs::write(&path, b"not json").unwrap();
        assert!(JsonStore::open(&path).is_err());
    }
}
