//! Styled text runs
//!
//! A [`StyledText`] is the complete, validated input of one layout pass:
//! the characters, their colors, the [`TextStyle`] and the world transform.
//! All precondition checks happen here so that layout itself cannot fail.

use serde::{Deserialize, Serialize};

use super::color::{parse_color_markup, Color, ColorSource};
use crate::config::Config;
use crate::foundation::math::AffineTransform;

/// Result type for styled text construction
pub type TextResult<T> = Result<T, TextError>;

/// Errors raised while building a styled text run
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TextError {
    /// Per-letter colors do not line up with the characters
    #[error("Color run has {colors} colors for {chars} characters")]
    ColorRunMismatch {
        /// Number of logical characters
        chars: usize,
        /// Number of colors supplied
        colors: usize,
    },

    /// A `<RRGGBB>` markup tag is not valid hex
    #[error("Invalid color tag '<{0}>'")]
    InvalidColorTag(String),

    /// A style parameter is out of range
    #[error("Invalid text style: {0}")]
    InvalidStyle(String),
}

/// Layout parameters of a text run
///
/// Bounds of `0.0` mean unbounded on that axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyle {
    /// Break lines ahead of words that would overflow `width`
    pub word_wrap: bool,
    /// Extra horizontal space after each glyph
    pub spacing: f32,
    /// Extra vertical space between lines
    pub line_spacing: f32,
    /// Bounding width, 0 for unbounded
    pub width: f32,
    /// Bounding height, 0 for unbounded
    pub height: f32,
    /// Horizontal scale
    pub scale_x: f32,
    /// Vertical scale
    pub scale_y: f32,
    /// Opacity written to every vertex
    pub alpha: f32,
    /// Base color used when the run is not multicolor
    pub color: Color,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            word_wrap: false,
            spacing: 0.0,
            line_spacing: 0.0,
            width: 0.0,
            height: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            alpha: 1.0,
            color: Color::WHITE,
        }
    }
}

impl Config for TextStyle {}

impl TextStyle {
    /// Enable or disable word wrap
    #[must_use]
    pub fn with_word_wrap(mut self, enabled: bool) -> Self {
        self.word_wrap = enabled;
        self
    }

    /// Set glyph and line spacing
    #[must_use]
    pub fn with_spacing(mut self, spacing: f32, line_spacing: f32) -> Self {
        self.spacing = spacing;
        self.line_spacing = line_spacing;
        self
    }

    /// Set the bounding box (0 for unbounded)
    #[must_use]
    pub fn with_bounds(mut self, width: f32, height: f32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the scale
    #[must_use]
    pub fn with_scale(mut self, scale_x: f32, scale_y: f32) -> Self {
        self.scale_x = scale_x;
        self.scale_y = scale_y;
        self
    }

    /// Set the opacity
    #[must_use]
    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set the base color
    #[must_use]
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Validate ranges
    pub fn validate(&self) -> TextResult<()> {
        let finite = [
            ("spacing", self.spacing),
            ("line_spacing", self.line_spacing),
            ("width", self.width),
            ("height", self.height),
            ("scale_x", self.scale_x),
            ("scale_y", self.scale_y),
            ("alpha", self.alpha),
        ];
        if let Some((name, value)) = finite.iter().find(|(_, value)| !value.is_finite()) {
            return Err(TextError::InvalidStyle(format!("{} must be finite, got {}", name, value)));
        }
        if self.width < 0.0 || self.height < 0.0 {
            return Err(TextError::InvalidStyle(format!(
                "bounds must not be negative, got {}x{}",
                self.width, self.height
            )));
        }
        if self.scale_x <= 0.0 || self.scale_y <= 0.0 {
            return Err(TextError::InvalidStyle(format!(
                "scale must be positive, got ({}, {})",
                self.scale_x, self.scale_y
            )));
        }
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(TextError::InvalidStyle(format!("alpha must be within 0..=1, got {}", self.alpha)));
        }
        Ok(())
    }
}

/// Validated input of one layout pass
#[derive(Debug, Clone, PartialEq)]
pub struct StyledText {
    chars: Vec<char>,
    letter_colors: Option<Vec<Color>>,
    style: TextStyle,
    transform: AffineTransform,
}

impl StyledText {
    /// Plain text drawn in the style's base color
    pub fn new(text: &str, style: TextStyle) -> TextResult<Self> {
        style.validate()?;
        Ok(Self {
            chars: text.chars().collect(),
            letter_colors: None,
            style,
            transform: AffineTransform::IDENTITY,
        })
    }

    /// Multicolor text from `(character, color)` pairs in reading order
    pub fn multicolor<I>(letters: I, style: TextStyle) -> TextResult<Self>
    where
        I: IntoIterator<Item = (char, Color)>,
    {
        style.validate()?;
        let (chars, colors) = letters.into_iter().unzip();
        Ok(Self {
            chars,
            letter_colors: Some(colors),
            style,
            transform: AffineTransform::IDENTITY,
        })
    }

    /// Multicolor text with a separate color table
    ///
    /// The table must hold exactly one color per character.
    pub fn with_letter_colors(text: &str, colors: Vec<Color>, style: TextStyle) -> TextResult<Self> {
        let chars: Vec<char> = text.chars().collect();
        if chars.len() != colors.len() {
            return Err(TextError::ColorRunMismatch {
                chars: chars.len(),
                colors: colors.len(),
            });
        }
        style.validate()?;
        Ok(Self {
            chars,
            letter_colors: Some(colors),
            style,
            transform: AffineTransform::IDENTITY,
        })
    }

    /// Multicolor text from `<RRGGBB>` markup, starting in the base color
    pub fn from_markup(markup: &str, style: TextStyle) -> TextResult<Self> {
        let letters = parse_color_markup(markup, style.color)?;
        Self::multicolor(letters, style)
    }

    /// Set the local-to-world transform
    #[must_use]
    pub fn with_transform(mut self, transform: AffineTransform) -> Self {
        self.transform = transform;
        self
    }

    /// Logical characters
    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// Characters as a string, markup removed
    pub fn plain_text(&self) -> String {
        self.chars.iter().collect()
    }

    /// Layout parameters
    pub fn style(&self) -> &TextStyle {
        &self.style
    }

    /// Local-to-world transform
    pub fn transform(&self) -> &AffineTransform {
        &self.transform
    }

    /// Whether letters carry their own colors
    pub fn is_multicolor(&self) -> bool {
        self.letter_colors.is_some()
    }

    /// Number of logical characters
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Whether there is nothing to lay out
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Characters that can produce a quad (not spaces or newlines)
    ///
    /// Upper bound on the glyph count of a pass over this text.
    pub fn visible_char_count(&self) -> usize {
        self.chars.iter().filter(|&&c| c != ' ' && c != '\n').count()
    }

    /// Resolve the color source for a pass
    pub fn color_source(&self) -> ColorSource<'_> {
        match &self.letter_colors {
            Some(colors) => ColorSource::PerLetter(colors),
            None => ColorSource::Uniform(self.style.color),
        }
    }
}
