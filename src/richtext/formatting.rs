// Run formatting properties
// A RunFormat is one property paired with a value; edits record old/new pairs

use crate::error::{EditError, EditResult};
use crate::richtext::style::{
    BaselineAlignment, Color, FontStyle, FontWeight, RunStyle, TextDecoration,
};
use serde::{Deserialize, Serialize};

/// Formatting property keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunProperty {
    FontFamily,
    FontSize,
    FontWeight,
    FontStyle,
    Decoration,
    Foreground,
    Background,
    Baseline,
}

impl RunProperty {
    pub const ALL: [RunProperty; 8] = [
        RunProperty::FontFamily,
        RunProperty::FontSize,
        RunProperty::FontWeight,
        RunProperty::FontStyle,
        RunProperty::Decoration,
        RunProperty::Foreground,
        RunProperty::Background,
        RunProperty::Baseline,
    ];
}

/// A formatting property with its value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "property", content = "value", rename_all = "snake_case")]
pub enum RunFormat {
    FontFamily(String),
    FontSize(f64),
    FontWeight(FontWeight),
    FontStyle(FontStyle),
    Decoration(TextDecoration),
    Foreground(Color),
    Background(Option<Color>),
    Baseline(BaselineAlignment),
}

impl RunFormat {
    pub fn bold() -> Self {
        RunFormat::FontWeight(FontWeight::Bold)
    }

    pub fn italic() -> Self {
        RunFormat::FontStyle(FontStyle::Italic)
    }

    pub fn underline() -> Self {
        RunFormat::Decoration(TextDecoration::Underline)
    }

    pub fn property(&self) -> RunProperty {
        match self {
            RunFormat::FontFamily(_) => RunProperty::FontFamily,
            RunFormat::FontSize(_) => RunProperty::FontSize,
            RunFormat::FontWeight(_) => RunProperty::FontWeight,
            RunFormat::FontStyle(_) => RunProperty::FontStyle,
            RunFormat::Decoration(_) => RunProperty::Decoration,
            RunFormat::Foreground(_) => RunProperty::Foreground,
            RunFormat::Background(_) => RunProperty::Background,
            RunFormat::Baseline(_) => RunProperty::Baseline,
        }
    }

    /// Current value of `property` on a style
    pub fn read(style: &RunStyle, property: RunProperty) -> RunFormat {
        match property {
            RunProperty::FontFamily => RunFormat::FontFamily(style.font_family.clone()),
            RunProperty::FontSize => RunFormat::FontSize(style.font_size),
            RunProperty::FontWeight => RunFormat::FontWeight(style.font_weight),
            RunProperty::FontStyle => RunFormat::FontStyle(style.font_style),
            RunProperty::Decoration => RunFormat::Decoration(style.decoration),
            RunProperty::Foreground => RunFormat::Foreground(style.foreground),
            RunProperty::Background => RunFormat::Background(style.background),
            RunProperty::Baseline => RunFormat::Baseline(style.baseline),
        }
    }

    pub fn apply_to(&self, style: &mut RunStyle) {
        match self {
            RunFormat::FontFamily(family) => style.font_family = family.clone(),
            RunFormat::FontSize(size) => style.font_size = *size,
            RunFormat::FontWeight(weight) => style.font_weight = *weight,
            RunFormat::FontStyle(font_style) => style.font_style = *font_style,
            RunFormat::Decoration(decoration) => style.decoration = *decoration,
            RunFormat::Foreground(color) => style.foreground = *color,
            RunFormat::Background(color) => style.background = *color,
            RunFormat::Baseline(baseline) => style.baseline = *baseline,
        }
    }

    /// Whether `style` already carries this value
    pub fn is_set_on(&self, style: &RunStyle) -> bool {
        RunFormat::read(style, self.property()) == *self
    }

    /// The "off" value for toggleable properties (bold, italic, underline)
    pub fn toggled_off(&self) -> Option<RunFormat> {
        match self {
            RunFormat::FontWeight(FontWeight::Bold) => Some(RunFormat::FontWeight(FontWeight::Normal)),
            RunFormat::FontStyle(FontStyle::Italic) => Some(RunFormat::FontStyle(FontStyle::Normal)),
            RunFormat::Decoration(TextDecoration::Underline) => {
                Some(RunFormat::Decoration(TextDecoration::None))
            }
            _ => None,
        }
    }

    /// Reject values no run may carry
    pub fn validate(&self) -> EditResult<()> {
        match self {
            RunFormat::FontSize(size) if !size.is_finite() || *size <= 0.0 => Err(
                EditError::UnsupportedFormat(format!("font size {size} must be positive")),
            ),
            RunFormat::FontFamily(family) if family.trim().is_empty() => Err(
                EditError::UnsupportedFormat("font family must not be empty".to_string()),
            ),
            _ => Ok(()),
        }
    }

    /// `(old, new)` pairs for every property where `from` and `to` differ
    pub fn differences(from: &RunStyle, to: &RunStyle) -> Vec<(RunFormat, RunFormat)> {
        RunProperty::ALL
            .iter()
            .map(|p| (RunFormat::read(from, *p), RunFormat::read(to, *p)))
            .filter(|(old, new)| old != new)
            .collect()
    }
}
