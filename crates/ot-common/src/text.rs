//! Text normalization applied to restored values before validation.

use crate::value::OptionValue;

/// Trim surrounding whitespace and remove one level of backslash escaping
/// from every scalar, descending through composites.
///
/// Stored values accumulate escaping on their way through the host's
/// request handling; a restored snapshot carries that escaping and must be
/// unwound before the per-type rules see the raw text.
pub fn unslash_deep(value: OptionValue) -> OptionValue {
    match value {
        OptionValue::Scalar(s) => OptionValue::Scalar(unslash(&s)),
        OptionValue::List(items) => {
            OptionValue::List(items.into_iter().map(unslash_deep).collect())
        }
        OptionValue::Map(map) => OptionValue::Map(
            map.into_iter()
                .map(|(key, value)| (key, unslash_deep(value)))
                .collect(),
        ),
    }
}

/// One level of unescaping: `\x` becomes `x`, `\\` becomes `\`.
/// A trailing lone backslash is dropped.
fn unslash(input: &str) -> String {
    let trimmed = input.trim();
    let mut out = String::with_capacity(trimmed.len());
    let mut chars = trimmed.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}
