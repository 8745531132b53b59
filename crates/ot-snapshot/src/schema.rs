//! The settings schema: the authoritative list of fields to validate.

use ot_common::OptionValue;
use serde::{Deserialize, Serialize};

/// One declared field: its id and validation type tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl SchemaEntry {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
        }
    }
}

/// Interpret the store-shaped settings value:
/// `{ settings: [ { id, type }, ... ] }`.
///
/// Returns `None` when the value carries no usable `settings` list; the
/// caller then restores without validation. Entries missing an id or type
/// are skipped, list order is preserved.
pub fn parse_settings(value: &OptionValue) -> Option<Vec<SchemaEntry>> {
    let map = value.as_map()?;
    let list = match map.get("settings")? {
        OptionValue::List(items) => items,
        _ => return None,
    };

    let mut entries = Vec::with_capacity(list.len());
    for item in list {
        let Some(fields) = item.as_map() else { continue };
        let (Some(id), Some(kind)) = (
            fields.get("id").and_then(OptionValue::as_scalar),
            fields.get("type").and_then(OptionValue::as_scalar),
        ) else {
            continue;
        };
        if id.is_empty() {
            continue;
        }
        entries.push(SchemaEntry::new(id, kind));
    }
    Some(entries)
}
