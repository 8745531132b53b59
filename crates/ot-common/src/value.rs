//! Option values: scalar strings and nested composites.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The active option set, keyed by field id.
pub type OptionMap = BTreeMap<String, OptionValue>;

/// A single option value.
///
/// Composite option types store a mapping of named sub-fields; a couple of
/// types (`measurement`, re-indexed `google-fonts`) store a plain sequence.
/// Values nest at most two levels deep in practice (`social-links` holds one
/// mapping per platform). The untagged serde representation keeps stored
/// JSON free of enum noise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Scalar(String),
    List(Vec<OptionValue>),
    Map(OptionMap),
}

impl OptionValue {
    /// Scalar constructor.
    pub fn scalar(value: impl Into<String>) -> Self {
        OptionValue::Scalar(value.into())
    }

    /// The empty scalar, the fallback every all-empty composite collapses to.
    pub fn empty() -> Self {
        OptionValue::Scalar(String::new())
    }

    /// A value counts as set unless it is `""`, `"0"`, or an empty composite.
    pub fn is_truthy(&self) -> bool {
        match self {
            OptionValue::Scalar(s) => !s.is_empty() && s != "0",
            OptionValue::List(items) => !items.is_empty(),
            OptionValue::Map(map) => !map.is_empty(),
        }
    }

    /// True for the zero-length scalar only.
    ///
    /// This is the removal criterion inside composite rules: `""` entries
    /// are dropped, `"0"` entries stay.
    pub fn is_empty_scalar(&self) -> bool {
        matches!(self, OptionValue::Scalar(s) if s.is_empty())
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            OptionValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[OptionValue]> {
        match self {
            OptionValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&OptionMap> {
        match self {
            OptionValue::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Scalar(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Scalar(value)
    }
}

/// Deep scan for at least one truthy leaf.
///
/// Every composite-collapse rule uses this uniformly: a mapping whose
/// entries are all empty (however deeply nested) collapses to the empty
/// scalar rather than surviving as an empty shell.
pub fn any_truthy<'a, I>(values: I) -> bool
where
    I: IntoIterator<Item = &'a OptionValue>,
{
    values.into_iter().any(leaf_truthy)
}

fn leaf_truthy(value: &OptionValue) -> bool {
    match value {
        OptionValue::Scalar(_) => value.is_truthy(),
        OptionValue::List(items) => items.iter().any(leaf_truthy),
        OptionValue::Map(map) => map.values().any(leaf_truthy),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_truthiness() {
        assert!(OptionValue::scalar("#fff").is_truthy());
        assert!(!OptionValue::scalar("").is_truthy());
        assert!(!OptionValue::scalar("0").is_truthy());
        assert!(OptionValue::scalar("0.0").is_truthy());
        assert!(OptionValue::scalar(" ").is_truthy());
    }

    #[test]
    fn test_composite_truthiness() {
        assert!(!OptionValue::Map(OptionMap::new()).is_truthy());
        assert!(!OptionValue::List(Vec::new()).is_truthy());

        let mut map = OptionMap::new();
        map.insert("width".to_string(), OptionValue::scalar(""));
        assert!(OptionValue::Map(map).is_truthy());
    }

    #[test]
    fn test_empty_scalar_check() {
        assert!(OptionValue::scalar("").is_empty_scalar());
        assert!(!OptionValue::scalar("0").is_empty_scalar());
        assert!(!OptionValue::Map(OptionMap::new()).is_empty_scalar());
    }

    #[test]
    fn test_any_truthy_deep() {
        let mut inner = OptionMap::new();
        inner.insert("url".to_string(), OptionValue::scalar(""));
        let mut outer = OptionMap::new();
        outer.insert("twitter".to_string(), OptionValue::Map(inner.clone()));
        assert!(!any_truthy(outer.values()));

        inner.insert("url".to_string(), OptionValue::scalar("https://example.com"));
        outer.insert("twitter".to_string(), OptionValue::Map(inner));
        assert!(any_truthy(outer.values()));
    }

    #[test]
    fn test_serde_untagged_roundtrip() {
        let mut map = OptionMap::new();
        map.insert("width".to_string(), OptionValue::scalar("10"));
        map.insert(
            "pair".to_string(),
            OptionValue::List(vec![OptionValue::scalar("5"), OptionValue::scalar("px")]),
        );
        let value = OptionValue::Map(map);

        let json = serde_json::to_string(&value).unwrap();
        let back: OptionValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }
}
