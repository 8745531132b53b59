//! The type-dispatched validation engine.
//!
//! `ValidationEngine::validate` normalizes a value against the rule for its
//! declared type. Invalid input never aborts a rule: the offending piece is
//! coerced to its safe fallback (`""`, or `"0"` for numeric sub-fields), an
//! advisory error is recorded, and validation continues.

use crate::option_type::OptionType;
use crate::sanitize::{BuiltinSanitizer, Sanitize};
use once_cell::sync::Lazy;
use ot_common::{any_truthy, OptionMap, OptionValue, ValidationError};
use regex::Regex;
use std::sync::Arc;
use tracing::debug;

/// Accepted hex colorpicker form: `#rgb` or `#rrggbb`, case-insensitive.
static HEX_COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^#([0-9a-f]{3}|[0-9a-f]{6})$").expect("hex color pattern"));

/// Accepted rgba colorpicker form, case-insensitive.
static RGBA_COLOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^rgba\(\s*[0-9]{1,3}\s*,\s*[0-9]{1,3}\s*,\s*[0-9]{1,3}\s*,\s*[0-9.]{1,4}\s*\)")
        .expect("rgba color pattern")
});

/// Whether markup-bearing text fields are filtered.
///
/// Filtering applies only when the acting user lacks the unrestricted
/// markup capability and the installation-wide escape hatch is off.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkupPolicy {
    /// The acting user may store arbitrary markup.
    pub unrestricted_capability: bool,
    /// Installation-wide flag disabling the markup filter entirely.
    pub allow_unfiltered: bool,
}

impl MarkupPolicy {
    /// Policy that filters markup for everyone.
    pub fn restricted() -> Self {
        Self::default()
    }

    /// Policy for an actor allowed to store arbitrary markup.
    pub fn unrestricted() -> Self {
        Self {
            unrestricted_capability: true,
            allow_unfiltered: false,
        }
    }

    fn filters(&self) -> bool {
        !self.unrestricted_capability && !self.allow_unfiltered
    }
}

/// Registry for translatable single-string fields.
pub trait StringRegistry: Send + Sync {
    fn register(&self, id: &str, value: &str);
    fn unregister(&self, id: &str);
}

/// Pre/post processing callback around the per-type rules.
pub type FilterHook = Box<dyn Fn(OptionValue, OptionType, &str) -> OptionValue + Send + Sync>;

/// Result of one validation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validated {
    /// The sanitized (possibly coerced) value.
    pub value: OptionValue,
    /// Advisory errors accumulated across the rule and its sub-validations.
    pub errors: Vec<ValidationError>,
}

impl Validated {
    fn clean(value: OptionValue) -> Self {
        Self {
            value,
            errors: Vec::new(),
        }
    }

    /// True when the rule accepted the value as-is or after sanitization.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validates option values by their declared type.
pub struct ValidationEngine {
    markup: MarkupPolicy,
    sanitizer: Box<dyn Sanitize>,
    registry: Option<Arc<dyn StringRegistry>>,
    pre_hook: Option<FilterHook>,
    post_hook: Option<FilterHook>,
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::new(MarkupPolicy::restricted())
    }
}

impl ValidationEngine {
    pub fn new(markup: MarkupPolicy) -> Self {
        Self {
            markup,
            sanitizer: Box::new(BuiltinSanitizer),
            registry: None,
            pre_hook: None,
            post_hook: None,
        }
    }

    /// Replace the built-in sanitizers with the host's own.
    pub fn with_sanitizer(mut self, sanitizer: Box<dyn Sanitize>) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    /// Attach a translation-string registry.
    pub fn with_registry(mut self, registry: Arc<dyn StringRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Run a callback on every value before its type rule.
    pub fn with_pre_hook(mut self, hook: FilterHook) -> Self {
        self.pre_hook = Some(hook);
        self
    }

    /// Run a callback on every value after its type rule.
    pub fn with_post_hook(mut self, hook: FilterHook) -> Self {
        self.post_hook = Some(hook);
        self
    }

    /// Validate `input` against the rule for `kind`.
    pub fn validate(&self, input: OptionValue, kind: OptionType, field_id: &str) -> Validated {
        self.validate_registered(input, kind, field_id, "")
    }

    /// Validate against a raw schema tag; unknown tags pass through.
    pub fn validate_tag(&self, input: OptionValue, tag: &str, field_id: &str) -> Validated {
        match OptionType::from_name(tag) {
            Some(kind) => self.validate(input, kind, field_id),
            None => {
                if !tag.is_empty() {
                    debug!(tag, field = field_id, "No validation rule for type tag");
                }
                Validated::clean(input)
            }
        }
    }

    /// Validate and maintain the translation-registry entry for
    /// `string_id`.
    ///
    /// Applies only to the single-string text types: a truthy value is
    /// registered under `string_id`, anything else unregisters it. The
    /// registry update happens before the type rule runs.
    pub fn validate_registered(
        &self,
        input: OptionValue,
        kind: OptionType,
        field_id: &str,
        string_id: &str,
    ) -> Validated {
        let mut errors = Vec::new();
        let value = self.validate_inner(input, kind, field_id, string_id, &mut errors);
        Validated { value, errors }
    }

    fn validate_inner(
        &self,
        input: OptionValue,
        kind: OptionType,
        field_id: &str,
        string_id: &str,
        errors: &mut Vec<ValidationError>,
    ) -> OptionValue {
        if !input.is_truthy() || field_id.is_empty() {
            return input;
        }

        let input = match &self.pre_hook {
            Some(hook) => hook(input, kind, field_id),
            None => input,
        };

        if !string_id.is_empty() && kind.is_single_string() {
            if let Some(registry) = &self.registry {
                match input.as_scalar() {
                    Some(text) if input.is_truthy() => registry.register(string_id, text),
                    _ => registry.unregister(string_id),
                }
            }
        }

        let value = self.apply_rule(input, kind, field_id, errors);

        match &self.post_hook {
            Some(hook) => hook(value, kind, field_id),
            None => value,
        }
    }

    fn apply_rule(
        &self,
        input: OptionValue,
        kind: OptionType,
        field_id: &str,
        errors: &mut Vec<ValidationError>,
    ) -> OptionValue {
        match kind {
            OptionType::Background => self.rule_background(input, field_id, errors),
            OptionType::Border => self.rule_border(input, field_id, errors),
            OptionType::BoxShadow => self.rule_box_shadow(input, field_id, errors),
            OptionType::Colorpicker => rule_colorpicker(input, field_id, errors),
            OptionType::ColorpickerOpacity => {
                self.rule_colorpicker_opacity(input, field_id, errors)
            }
            OptionType::Css
            | OptionType::Javascript
            | OptionType::Text
            | OptionType::Textarea
            | OptionType::TextareaSimple => self.rule_markup(input),
            OptionType::Dimension | OptionType::Spacing => {
                self.rule_sides(input, kind, field_id, errors)
            }
            OptionType::GoogleFonts => rule_google_fonts(input),
            OptionType::LinkColor => self.rule_link_color(input, field_id, errors),
            OptionType::Measurement => self.rule_measurement(input),
            OptionType::Typography => self.rule_typography(input, field_id, errors),
            OptionType::Upload => self.rule_upload(input),
            OptionType::Gallery => rule_gallery(input),
            OptionType::SocialLinks => self.rule_social_links(input),
        }
    }

    /// `background-color` and `background-image` re-validate under their
    /// own rules; an all-empty mapping collapses.
    fn rule_background(
        &self,
        input: OptionValue,
        field_id: &str,
        errors: &mut Vec<ValidationError>,
    ) -> OptionValue {
        let mut map = match input {
            OptionValue::Map(map) => map,
            other => return other,
        };
        if let Some(color) = map.remove("background-color") {
            let color = self.validate_inner(color, OptionType::Colorpicker, field_id, "", errors);
            map.insert("background-color".to_string(), color);
        }
        if let Some(image) = map.remove("background-image") {
            let image = self.validate_inner(image, OptionType::Upload, field_id, "", errors);
            map.insert("background-image".to_string(), image);
        }
        collapse_unless_truthy(map)
    }

    fn rule_border(
        &self,
        input: OptionValue,
        field_id: &str,
        errors: &mut Vec<ValidationError>,
    ) -> OptionValue {
        let map = match input {
            OptionValue::Map(map) => map,
            other => return other,
        };
        let mut out = OptionMap::new();
        for (key, value) in map {
            let value = match key.as_str() {
                "width" => coerce_numeric(value, "invalid_border_width", "width", field_id, errors),
                "color" if value.is_truthy() => {
                    self.validate_inner(value, OptionType::Colorpicker, field_id, "", errors)
                }
                _ => value,
            };
            if !value.is_empty_scalar() {
                out.insert(key, value);
            }
        }
        collapse_if_empty(out)
    }

    fn rule_box_shadow(
        &self,
        input: OptionValue,
        field_id: &str,
        errors: &mut Vec<ValidationError>,
    ) -> OptionValue {
        let mut map = match input {
            OptionValue::Map(map) => map,
            other => return other,
        };
        // `inset` is a presence flag, not free text.
        if map.contains_key("inset") {
            map.insert("inset".to_string(), OptionValue::scalar("inset"));
        }
        for key in ["offset-x", "offset-y", "blur-radius", "spread-radius"] {
            if let Some(value) = map.remove(key) {
                let value = self.validate_inner(value, OptionType::Text, field_id, "", errors);
                map.insert(key.to_string(), value);
            }
        }
        if let Some(color) = map.remove("color") {
            let color = self.validate_inner(color, OptionType::Colorpicker, field_id, "", errors);
            map.insert("color".to_string(), color);
        }
        map.retain(|_, value| !value.is_empty_scalar());
        collapse_if_empty(map)
    }

    fn rule_colorpicker_opacity(
        &self,
        input: OptionValue,
        field_id: &str,
        errors: &mut Vec<ValidationError>,
    ) -> OptionValue {
        // Composite input is not a color; drop it without an error.
        if !matches!(input, OptionValue::Scalar(_)) {
            return OptionValue::empty();
        }
        rule_colorpicker(input, field_id, errors)
    }

    fn rule_markup(&self, input: OptionValue) -> OptionValue {
        if !self.markup.filters() {
            return input;
        }
        match input {
            OptionValue::Scalar(text) => {
                OptionValue::Scalar(self.sanitizer.strip_unsafe_markup(&text))
            }
            other => other,
        }
    }

    /// Shared rule for `dimension` and `spacing`: every non-`unit` side
    /// must be numeric, invalid sides are forced to `"0"` and kept.
    fn rule_sides(
        &self,
        input: OptionValue,
        kind: OptionType,
        field_id: &str,
        errors: &mut Vec<ValidationError>,
    ) -> OptionValue {
        let map = match input {
            OptionValue::Map(map) => map,
            other => return other,
        };
        let mut out = OptionMap::new();
        for (key, value) in map {
            let value = if key == "unit" {
                value
            } else {
                let code = format!("invalid_{kind}_{key}");
                coerce_numeric(value, &code, &key, field_id, errors)
            };
            if !value.is_empty_scalar() {
                out.insert(key, value);
            }
        }
        collapse_if_empty(out)
    }

    fn rule_link_color(
        &self,
        input: OptionValue,
        field_id: &str,
        errors: &mut Vec<ValidationError>,
    ) -> OptionValue {
        let map = match input {
            OptionValue::Map(map) => map,
            other => return other,
        };
        let mut out = OptionMap::new();
        for (key, value) in map {
            let value = if value.is_truthy() {
                let sub_id = format!("{field_id}-{key}");
                self.validate_inner(value, OptionType::Colorpicker, &sub_id, "", errors)
            } else {
                value
            };
            out.insert(key, value);
        }
        collapse_unless_truthy(out)
    }

    fn rule_measurement(&self, input: OptionValue) -> OptionValue {
        let mut pair = match input {
            OptionValue::List(pair) => pair,
            other => return other,
        };
        let clean = match pair.first() {
            Some(OptionValue::Scalar(raw)) => Some(self.sanitizer.sanitize_plain_text(raw)),
            _ => None,
        };
        if let Some(clean) = clean {
            pair[0] = OptionValue::Scalar(clean);
        }

        let value_empty = match pair.first() {
            Some(OptionValue::Scalar(s)) => s.is_empty(),
            Some(_) => false,
            None => true,
        };
        let unit_unset = pair.get(1).map_or(true, |unit| !unit.is_truthy());
        if value_empty && unit_unset {
            OptionValue::empty()
        } else {
            OptionValue::List(pair)
        }
    }

    /// Applies only to mappings that carry a `font-color`; everything else
    /// in the mapping is left alone.
    fn rule_typography(
        &self,
        input: OptionValue,
        field_id: &str,
        errors: &mut Vec<ValidationError>,
    ) -> OptionValue {
        let mut map = match input {
            OptionValue::Map(map) => map,
            other => return other,
        };
        match map.remove("font-color") {
            Some(color) => {
                let color =
                    self.validate_inner(color, OptionType::Colorpicker, field_id, "", errors);
                map.insert("font-color".to_string(), color);
                collapse_unless_truthy(map)
            }
            None => OptionValue::Map(map),
        }
    }

    fn rule_upload(&self, input: OptionValue) -> OptionValue {
        let value = match input {
            OptionValue::Scalar(value) => value,
            other => return other,
        };
        // Numeric attachment ids pass through untouched.
        if is_integer_literal(&value) {
            OptionValue::Scalar(value)
        } else {
            OptionValue::Scalar(self.sanitizer.sanitize_url(&value))
        }
    }

    fn rule_social_links(&self, input: OptionValue) -> OptionValue {
        let map = match input {
            OptionValue::Map(map) => map,
            other => return other,
        };
        let mut out = OptionMap::new();
        for (platform, fields) in map {
            let fields = match fields {
                OptionValue::Map(inner) => OptionValue::Map(
                    inner
                        .into_iter()
                        .map(|(name, value)| {
                            let value = match value {
                                OptionValue::Scalar(text) if !text.is_empty() && text != "0" => {
                                    OptionValue::Scalar(self.sanitizer.sanitize_plain_text(&text))
                                }
                                other => other,
                            };
                            (name, value)
                        })
                        .collect(),
                ),
                other => other,
            };
            out.insert(platform, fields);
        }
        collapse_unless_truthy(out)
    }
}

fn rule_colorpicker(
    input: OptionValue,
    field_id: &str,
    errors: &mut Vec<ValidationError>,
) -> OptionValue {
    if let OptionValue::Scalar(value) = &input {
        if HEX_COLOR.is_match(value) || RGBA_COLOR.is_match(value) {
            return input;
        }
    }
    errors.push(ValidationError::new(
        "invalid_hex",
        field_id,
        format!("The {field_id} colorpicker only allows valid hexadecimal or rgba values."),
    ));
    OptionValue::empty()
}

fn rule_google_fonts(input: OptionValue) -> OptionValue {
    let mut map = match input {
        OptionValue::Map(map) => map,
        // Already re-indexed on a previous pass.
        other => return other,
    };
    map.remove("%key%");
    if map.is_empty() {
        OptionValue::empty()
    } else {
        OptionValue::List(map.into_values().collect())
    }
}

fn rule_gallery(input: OptionValue) -> OptionValue {
    match input {
        OptionValue::Scalar(value) => OptionValue::Scalar(value.trim().to_string()),
        other => other,
    }
}

/// Forces a non-numeric sub-field to `"0"`. The key stays present so
/// downstream consumers always find it.
fn coerce_numeric(
    value: OptionValue,
    code: &str,
    key: &str,
    field_id: &str,
    errors: &mut Vec<ValidationError>,
) -> OptionValue {
    let numeric = value.as_scalar().map(is_numeric).unwrap_or(false);
    if value.is_truthy() && !numeric {
        errors.push(ValidationError::new(
            code,
            field_id,
            format!("The {key} input field for {field_id} only allows numeric values."),
        ));
        return OptionValue::scalar("0");
    }
    value
}

fn is_numeric(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty()
        && trimmed
            .parse::<f64>()
            .map(|n| n.is_finite())
            .unwrap_or(false)
}

fn is_integer_literal(value: &str) -> bool {
    value.trim().parse::<i64>().is_ok()
}

/// All-empty composites collapse to the empty scalar, never to an empty
/// mapping.
fn collapse_unless_truthy(map: OptionMap) -> OptionValue {
    if any_truthy(map.values()) {
        OptionValue::Map(map)
    } else {
        OptionValue::empty()
    }
}

fn collapse_if_empty(map: OptionMap) -> OptionValue {
    if map.is_empty() {
        OptionValue::empty()
    } else {
        OptionValue::Map(map)
    }
}
