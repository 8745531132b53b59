//! The closed set of schema type tags the engine recognizes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of a schema field.
///
/// Parsed from the schema's string tag. Tags outside this set have no rule
/// and their values pass through validation unchanged; extension happens at
/// the hook boundary, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OptionType {
    Background,
    Border,
    BoxShadow,
    Colorpicker,
    ColorpickerOpacity,
    Css,
    Javascript,
    Text,
    Textarea,
    TextareaSimple,
    Dimension,
    GoogleFonts,
    LinkColor,
    Measurement,
    Spacing,
    Typography,
    Upload,
    Gallery,
    SocialLinks,
}

impl OptionType {
    /// Parse a schema type tag.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "background" => Some(OptionType::Background),
            "border" => Some(OptionType::Border),
            "box-shadow" => Some(OptionType::BoxShadow),
            "colorpicker" => Some(OptionType::Colorpicker),
            "colorpicker-opacity" => Some(OptionType::ColorpickerOpacity),
            "css" => Some(OptionType::Css),
            "javascript" => Some(OptionType::Javascript),
            "text" => Some(OptionType::Text),
            "textarea" => Some(OptionType::Textarea),
            "textarea-simple" => Some(OptionType::TextareaSimple),
            "dimension" => Some(OptionType::Dimension),
            "google-fonts" => Some(OptionType::GoogleFonts),
            "link-color" => Some(OptionType::LinkColor),
            "measurement" => Some(OptionType::Measurement),
            "spacing" => Some(OptionType::Spacing),
            "typography" => Some(OptionType::Typography),
            "upload" => Some(OptionType::Upload),
            "gallery" => Some(OptionType::Gallery),
            "social-links" => Some(OptionType::SocialLinks),
            _ => None,
        }
    }

    /// The schema tag for this type.
    pub fn name(&self) -> &'static str {
        match self {
            OptionType::Background => "background",
            OptionType::Border => "border",
            OptionType::BoxShadow => "box-shadow",
            OptionType::Colorpicker => "colorpicker",
            OptionType::ColorpickerOpacity => "colorpicker-opacity",
            OptionType::Css => "css",
            OptionType::Javascript => "javascript",
            OptionType::Text => "text",
            OptionType::Textarea => "textarea",
            OptionType::TextareaSimple => "textarea-simple",
            OptionType::Dimension => "dimension",
            OptionType::GoogleFonts => "google-fonts",
            OptionType::LinkColor => "link-color",
            OptionType::Measurement => "measurement",
            OptionType::Spacing => "spacing",
            OptionType::Typography => "typography",
            OptionType::Upload => "upload",
            OptionType::Gallery => "gallery",
            OptionType::SocialLinks => "social-links",
        }
    }

    /// Single-string text types whose values feed the translation registry.
    pub fn is_single_string(&self) -> bool {
        matches!(
            self,
            OptionType::Text | OptionType::Textarea | OptionType::TextareaSimple
        )
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
