//! Type-dispatched validation for user-editable option values.
//!
//! The engine takes a value, the declared type of its field, and the field
//! id, and returns a sanitized value plus any advisory errors. One rule per
//! recognized type; unknown types pass through untouched.

pub mod engine;
pub mod option_type;
pub mod sanitize;

pub use engine::{FilterHook, MarkupPolicy, StringRegistry, Validated, ValidationEngine};
pub use option_type::OptionType;
pub use sanitize::{BuiltinSanitizer, Sanitize};
