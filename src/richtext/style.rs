// Run and paragraph styling
// Plain values owned by each run/paragraph, no shared style instances

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_FONT_FAMILY: &str = "Meiryo";
pub const DEFAULT_FONT_SIZE: f64 = 16.0;
pub const DEFAULT_LINE_HEIGHT: f64 = 18.666;

/// An RGBA colour, written as `#RRGGBB` or `#RRGGBBAA` in config files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const YELLOW: Color = Color::rgb(255, 255, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color { r, g, b, a }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix('#')
            .ok_or_else(|| format!("colour '{s}' must start with '#'"))?;
        if !hex.is_ascii() || !(hex.len() == 6 || hex.len() == 8) {
            return Err(format!("colour '{s}' must be #RRGGBB or #RRGGBBAA"));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| format!("colour '{s}': {e}"))
        };
        let alpha = if hex.len() == 8 { channel(6)? } else { 255 };
        Ok(Color::rgba(channel(0)?, channel(2)?, channel(4)?, alpha))
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextDecoration {
    #[default]
    None,
    Underline,
    Strikethrough,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselineAlignment {
    #[default]
    Baseline,
    Superscript,
    Subscript,
}

/// Character formatting carried by a text run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunStyle {
    pub font_family: String,
    pub font_size: f64,
    pub font_weight: FontWeight,
    pub font_style: FontStyle,
    pub decoration: TextDecoration,
    pub foreground: Color,
    pub background: Option<Color>,
    pub baseline: BaselineAlignment,
}

impl Default for RunStyle {
    fn default() -> Self {
        RunStyle {
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            font_weight: FontWeight::Normal,
            font_style: FontStyle::Normal,
            decoration: TextDecoration::None,
            foreground: Color::BLACK,
            background: None,
            baseline: BaselineAlignment::Baseline,
        }
    }
}

impl RunStyle {
    pub fn bold() -> Self {
        RunStyle {
            font_weight: FontWeight::Bold,
            ..Default::default()
        }
    }

    pub fn italic() -> Self {
        RunStyle {
            font_style: FontStyle::Italic,
            ..Default::default()
        }
    }

    pub fn is_bold(&self) -> bool {
        self.font_weight == FontWeight::Bold
    }

    pub fn is_italic(&self) -> bool {
        self.font_style == FontStyle::Italic
    }

    pub fn is_underlined(&self) -> bool {
        self.decoration == TextDecoration::Underline
    }

    /// Short markers used by the document dump, e.g. `b,i,u`
    pub(crate) fn markers(&self) -> Vec<String> {
        let mut markers = Vec::new();
        if self.is_bold() {
            markers.push("b".to_string());
        }
        if self.is_italic() {
            markers.push("i".to_string());
        }
        match self.decoration {
            TextDecoration::Underline => markers.push("u".to_string()),
            TextDecoration::Strikethrough => markers.push("s".to_string()),
            TextDecoration::None => {}
        }
        match self.baseline {
            BaselineAlignment::Superscript => markers.push("sup".to_string()),
            BaselineAlignment::Subscript => markers.push("sub".to_string()),
            BaselineAlignment::Baseline => {}
        }
        if self.font_family != DEFAULT_FONT_FAMILY {
            markers.push(format!("font={}", self.font_family));
        }
        if self.font_size != DEFAULT_FONT_SIZE {
            markers.push(format!("size={}", self.font_size));
        }
        if self.foreground != Color::BLACK {
            markers.push(format!("fg={}", self.foreground));
        }
        if let Some(background) = self.background {
            markers.push(format!("bg={background}"));
        }
        markers
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

/// Edge sizes for margins and borders
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Thickness {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Thickness {
    pub const fn uniform(value: f64) -> Self {
        Thickness {
            left: value,
            top: value,
            right: value,
            bottom: value,
        }
    }
}

/// Paragraph-level formatting; cloned onto paragraphs created by a split
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParagraphStyle {
    pub alignment: TextAlignment,
    pub line_spacing: f64,
    pub line_height: f64,
    pub margin: Thickness,
    pub border_thickness: Thickness,
    pub border_color: Option<Color>,
    pub background: Option<Color>,
    pub font_family: String,
    pub font_size: f64,
}

impl Default for ParagraphStyle {
    fn default() -> Self {
        ParagraphStyle {
            alignment: TextAlignment::Left,
            line_spacing: 0.0,
            line_height: DEFAULT_LINE_HEIGHT,
            margin: Thickness::default(),
            border_thickness: Thickness::default(),
            border_color: None,
            background: None,
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            font_size: DEFAULT_FONT_SIZE,
        }
    }
}
