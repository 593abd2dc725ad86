//! Text colors and per-letter color runs
//!
//! A run is drawn either in one uniform color or with a color per letter.
//! The choice is resolved once per layout pass into a [`ColorSource`].

use serde::{Deserialize, Serialize};

use super::{TextError, TextResult};

/// 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Color {
    /// White
    pub const WHITE: Self = Self::new(0xFF, 0xFF, 0xFF);
    /// Black
    pub const BLACK: Self = Self::new(0x00, 0x00, 0x00);
    /// Red
    pub const RED: Self = Self::new(0xFF, 0x00, 0x00);
    /// Green
    pub const GREEN: Self = Self::new(0x00, 0xFF, 0x00);
    /// Blue
    pub const BLUE: Self = Self::new(0x00, 0x00, 0xFF);
    /// Yellow
    pub const YELLOW: Self = Self::new(0xFF, 0xFF, 0x00);

    /// Create a color from channels
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Create a color from a packed `0xRRGGBB` value
    pub const fn from_hex(rgb: u32) -> Self {
        Self::new((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
    }

    /// Parse exactly six hex digits (`"FF8800"`)
    pub fn parse_hex(digits: &str) -> Option<Self> {
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        u32::from_str_radix(digits, 16).ok().map(Self::from_hex)
    }

    /// Normalized `[r, g, b]` in `0.0..=1.0`
    pub fn to_rgb_f32(self) -> [f32; 3] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        ]
    }
}

/// Where a layout pass takes each letter's color from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColorSource<'a> {
    /// Every letter uses the run's base color
    Uniform(Color),
    /// One color per logical character, same length as the text
    PerLetter(&'a [Color]),
}

impl ColorSource<'_> {
    /// Color of the character at `index`
    ///
    /// A per-letter table always matches the text length; this is checked
    /// when the styled text is built.
    pub fn color_at(&self, index: usize) -> Color {
        match self {
            Self::Uniform(color) => *color,
            Self::PerLetter(colors) => colors[index],
        }
    }
}

/// Parse `<RRGGBB>` color markup into colored letters
///
/// Each tag switches the color of the characters after it; text before the
/// first tag uses `base`. A `<` that is not followed by six characters and a
/// closing `>` is kept as a literal letter.
///
/// # Example
///
/// ```
/// use bitmap_text::text::{parse_color_markup, Color};
///
/// let letters = parse_color_markup("a<FF0000>b", Color::WHITE).unwrap();
/// assert_eq!(letters, vec![('a', Color::WHITE), ('b', Color::RED)]);
/// ```
pub fn parse_color_markup(markup: &str, base: Color) -> TextResult<Vec<(char, Color)>> {
    const TAG_LEN: usize = 8;

    let chars: Vec<char> = markup.chars().collect();
    let mut letters = Vec::with_capacity(chars.len());
    let mut current = base;
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        if ch == '<' && chars.get(i + TAG_LEN - 1) == Some(&'>') {
            let digits: String = chars[i + 1..i + TAG_LEN - 1].iter().collect();
            current = Color::parse_hex(&digits).ok_or(TextError::InvalidColorTag(digits))?;
            i += TAG_LEN;
            continue;
        }
        letters.push((ch, current));
        i += 1;
    }

    Ok(letters)
}
