//! Snapshot and restore of the option map across context switches.
//!
//! When the active context changes, the outgoing context's options are
//! serialized to a per-context blob; if a blob exists for the incoming
//! context it is decoded, each schema-declared field re-validated, and the
//! result written back to the store as the active option map.

pub mod codec;
pub mod error;
pub mod schema;
pub mod snapshot;
pub mod store;

pub use codec::{SnapshotCodec, WireCodec};
pub use error::{Result, SnapshotError};
pub use schema::SchemaEntry;
pub use snapshot::{SnapshotManager, SnapshotStore, OPTIONS_KEY, SETTINGS_KEY};
pub use store::{JsonStore, MemoryStore, OptionStore};
