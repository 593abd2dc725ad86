//! Word lookahead for wrapping
//!
//! When the layout reaches a word boundary it measures the next word so it
//! can break the line before the word instead of in the middle of it.

use super::font::BitmapFont;

/// Characters that belong to a word
///
/// Punctuation that normally trails a word stays attached to it.
pub fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '_' | '.' | ':' | ';' | ',' | '!')
}

/// Characters at which the layout looks ahead to the next word
pub fn is_boundary_char(ch: char) -> bool {
    !ch.is_alphanumeric() && ch != '_'
}

/// The run of word characters starting at `from`
///
/// Empty when `from` is out of range or not a word character. Scanning
/// stops at the first non-word character.
pub fn next_word(text: &[char], from: usize) -> &[char] {
    let tail = text.get(from..).unwrap_or_default();
    let end = tail.iter().position(|&c| !is_word_char(c)).unwrap_or(tail.len());
    &tail[..end]
}

/// Unscaled width of a word: glyph width plus spacing per character
///
/// Characters without a glyph add nothing.
pub fn measure_width(word: &[char], font: &BitmapFont, spacing: f32) -> f32 {
    word.iter()
        .filter_map(|&c| font.glyph(c))
        .map(|glyph| glyph.width_f32() + spacing)
        .sum()
}

/// Scaled width of the word following the boundary at `index`
///
/// Zero when the upcoming token starts with trailing punctuation rather
/// than a letter, digit or underscore.
pub fn lookahead_width(text: &[char], index: usize, font: &BitmapFont, spacing: f32, scale_x: f32) -> f32 {
    let word = next_word(text, index + 1);
    match word.first() {
        Some(&first) if !is_boundary_char(first) => measure_width(word, font, spacing) * scale_x,
        _ => 0.0,
    }
}
