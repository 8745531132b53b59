//! Per-context snapshot files and the context-switch orchestration.

use crate::codec::{SnapshotCodec, WireCodec};
use crate::error::Result;
use crate::schema::{self, SchemaEntry};
use crate::store::OptionStore;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use ot_common::{unslash_deep, ErrorSink, OptionMap, OptionValue, Severity, TracingSink};
use ot_engine::ValidationEngine;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Store key holding the active option map.
pub const OPTIONS_KEY: &str = "option_tree";

/// Store key holding the settings schema.
pub const SETTINGS_KEY: &str = "option_tree_settings";

/// Scope under which validation errors are reported.
const ERROR_SCOPE: &str = "option-tree";

/// One `.cnf` file per context under a fixed root directory.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Snapshot file location for a context.
    pub fn path(&self, context: &str) -> PathBuf {
        self.root.join(format!("{context}.cnf"))
    }

    /// Remove a context's snapshot; an absent file is fine.
    pub fn remove(&self, context: &str) -> Result<()> {
        match fs::remove_file(self.path(context)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Write a payload as base64 text.
    ///
    /// The write goes to a temp file in the same directory and is renamed
    /// into place, so an interrupted write never leaves a half-written
    /// blob that would pass for valid on the next read.
    pub fn write(&self, context: &str, payload: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        let target = self.path(context);
        let tmp = target.with_extension("cnf.tmp");
        let encoded = if payload.is_empty() {
            String::new()
        } else {
            BASE64.encode(payload)
        };
        fs::write(&tmp, encoded)?;
        fs::rename(&tmp, &target)?;
        Ok(())
    }

    /// Read a context's payload. `Ok(None)` when the file is absent or its
    /// content is not valid base64.
    pub fn read(&self, context: &str) -> Result<Option<Vec<u8>>> {
        let text = match fs::read_to_string(self.path(context)) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        match BASE64.decode(text.trim()) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) => {
                debug!(context, %err, "Snapshot is not valid base64");
                Ok(None)
            }
        }
    }
}

/// Persists the outgoing context's options and restores the incoming
/// context's snapshot through the validation engine.
pub struct SnapshotManager<S> {
    store: S,
    snapshots: SnapshotStore,
    codec: Box<dyn SnapshotCodec>,
    engine: ValidationEngine,
    sink: Arc<dyn ErrorSink>,
}

impl<S: OptionStore> SnapshotManager<S> {
    pub fn new(store: S, snapshot_root: impl Into<PathBuf>, engine: ValidationEngine) -> Self {
        Self {
            store,
            snapshots: SnapshotStore::new(snapshot_root),
            codec: Box::new(WireCodec),
            engine,
            sink: Arc::new(TracingSink),
        }
    }

    /// Swap the wire codec.
    pub fn with_codec(mut self, codec: Box<dyn SnapshotCodec>) -> Self {
        self.codec = codec;
        self
    }

    /// Swap the error channel.
    pub fn with_error_sink(mut self, sink: Arc<dyn ErrorSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Handle a context switch: snapshot `outgoing`, then restore and
    /// re-validate `incoming` if a snapshot for it exists.
    ///
    /// File-system failures propagate; a missing or undecodable incoming
    /// snapshot is not an error.
    pub fn on_context_switch(&mut self, outgoing: &str, incoming: &str) -> Result<()> {
        self.snapshot_outgoing(outgoing)?;

        let Some(blob) = self.snapshots.read(incoming)? else {
            debug!(context = incoming, "No snapshot for incoming context");
            return Ok(());
        };
        let Some(mut options) = self.codec.decode(&blob) else {
            debug!(context = incoming, "Snapshot did not decode to an option map");
            return Ok(());
        };

        match self.settings() {
            Some(entries) => self.revalidate(&mut options, &entries),
            None => debug!("Settings schema unavailable; restoring without validation"),
        }

        let restored = options.len();
        self.store.set(OPTIONS_KEY, OptionValue::Map(options));
        info!(context = incoming, options = restored, "Options restored from snapshot");
        Ok(())
    }

    fn snapshot_outgoing(&self, context: &str) -> Result<()> {
        self.snapshots.remove(context)?;
        let payload = match self.store.get(OPTIONS_KEY) {
            Some(OptionValue::Map(map)) if !map.is_empty() => self.codec.encode(&map),
            _ => Vec::new(),
        };
        self.snapshots.write(context, &payload)?;
        info!(context, bytes = payload.len(), "Snapshot written");
        Ok(())
    }

    /// Re-validate every schema-declared field present in the restored
    /// map; fields outside the schema are left untouched.
    fn revalidate(&self, options: &mut OptionMap, entries: &[SchemaEntry]) {
        for entry in entries {
            let Some(value) = options.remove(&entry.id) else {
                continue;
            };
            let value = unslash_deep(value);
            let result = self.engine.validate_tag(value, &entry.kind, &entry.id);
            for error in &result.errors {
                warn!(
                    field = %error.field,
                    code = %error.code,
                    "Invalid value coerced during restore"
                );
                self.sink
                    .report(ERROR_SCOPE, &error.code, &error.message, Severity::Error);
            }
            options.insert(entry.id.clone(), result.value);
        }
    }

    fn settings(&self) -> Option<Vec<SchemaEntry>> {
        let value = self.store.get(SETTINGS_KEY)?;
        schema::parse_settings(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use tempfile::TempDir;

    #[test]
    fn test_snapshot_store_remove_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path());
        store.remove("ghost").unwrap();
        store.remove("ghost").unwrap();
    }

    #[test]
    fn test_snapshot_store_write_read_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path().join("settings"));
        store.write("theme-a", b"payload").unwrap();
        assert_eq!(store.read("theme-a").unwrap(), Some(b"payload".to_vec()));
    }

    #[test]
    fn test_snapshot_store_empty_payload() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path());
        store.write("theme-a", b"").unwrap();
        assert_eq!(store.read("theme-a").unwrap(), Some(Vec::new()));
    }

    #[test]
    fn test_snapshot_store_absent_reads_none() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path());
        assert_eq!(store.read("never-written").unwrap(), None);
    }

    #[test]
    fn test_snapshot_store_invalid_base64_reads_none() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path());
        fs::write(store.path("theme-a"), "!!! not base64 !!!").unwrap();
        assert_eq!(store.read("theme-a").unwrap(), None);
    }

    #[test]
    fn test_snapshot_store_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path());
        store.write("theme-a", b"payload").unwrap();
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["theme-a.cnf".to_string()]);
    }

    #[test]
    fn test_switch_without_incoming_snapshot_keeps_store() {
        let dir = TempDir::new().unwrap();
        let mut store = MemoryStore::new();
        let mut active = OptionMap::new();
        active.insert("accent".to_string(), OptionValue::scalar("#fff"));
        store.set(OPTIONS_KEY, OptionValue::Map(active.clone()));

        let mut manager =
            SnapshotManager::new(store, dir.path(), ValidationEngine::default());
        manager.on_context_switch("theme-a", "theme-b").unwrap();

        assert_eq!(
            manager.store().get(OPTIONS_KEY),
            Some(OptionValue::Map(active))
        );
        assert!(manager.snapshots.path("theme-a").exists());
    }
}
