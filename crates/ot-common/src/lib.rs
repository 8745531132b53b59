//! Shared types for the option snapshot and validation workspace.
//!
//! This crate provides the pieces both sides depend on:
//! - The option value model (scalar strings and nested composites)
//! - Validation error records and the error-reporting channel
//! - Text normalization applied to restored values

pub mod report;
pub mod text;
pub mod value;

pub use report::{ErrorSink, MemorySink, Report, Severity, TracingSink, ValidationError};
pub use text::unslash_deep;
pub use value::{any_truthy, OptionMap, OptionValue};
