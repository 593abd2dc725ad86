//! Text layout engine
//!
//! Walks a [`StyledText`] left to right, moving a cursor through local glyph
//! space and deciding for every character whether it is drawn, advances the
//! cursor, breaks the line, or is skipped. Placed glyphs are handed to the
//! [`QuadEmitter`] which appends their vertices to a [`VertexSink`].
//!
//! # Layout Coordinate System
//!
//! - Origin (0, 0) is the top-left of the first line, shifted down by the
//!   font's `padding_top`
//! - +X axis points right
//! - +Y axis points down; each line break moves the cursor down by
//!   `(zero_char_height + line_spacing) * scale_y`
//!
//! Line breaking is a small state machine over [`LineState`]: a newline or
//! a wrap moves to a line-start state, placing or advancing moves to
//! [`LineState::InLine`], and running past the vertical bound ends the pass
//! in [`LineState::BoundsExhausted`].

use std::iter::FusedIterator;
use std::sync::Arc;

use super::color::{Color, ColorSource};
use super::font::{BitmapFont, GlyphMetric};
use super::quad::{QuadEmitter, TextVertex, VertexSink, VERTICES_PER_QUAD};
use super::style::{StyledText, TextStyle};
use super::word::{is_boundary_char, lookahead_width};

/// Divisor of a glyph's width giving the overhang tolerated at the right
/// bound before wrapping or clipping
pub const WRAP_MARGIN_DIVISOR: f32 = 1.5;

/// Line state of the layout cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineState {
    /// Nothing laid out yet
    AtLineStart,
    /// At least one glyph or space on the current line
    InLine,
    /// A newline character started this line
    LineBrokeByNewline,
    /// A wrap started this line
    LineBrokeByWrap,
    /// The vertical bound was passed; nothing more is laid out
    BoundsExhausted,
}

impl LineState {
    /// Whether the pass has ended early
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::BoundsExhausted)
    }

    /// Whether the cursor sits at the start of a line
    pub fn is_line_start(self) -> bool {
        matches!(self, Self::AtLineStart | Self::LineBrokeByNewline | Self::LineBrokeByWrap)
    }
}

/// Cursor position in local glyph space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayoutCursor {
    /// Horizontal position, 0 at every line start
    pub x: f32,
    /// Top of the current line
    pub y: f32,
}

/// A glyph positioned by the layout
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphPlacement {
    /// Logical index of the character in the run
    pub index: usize,
    /// The character
    pub character: char,
    /// Left edge in local space
    pub x: f32,
    /// Top edge in local space
    pub y: f32,
    /// Atlas rectangle
    pub glyph: GlyphMetric,
    /// Resolved letter color
    pub color: Color,
}

/// Decision for one character
#[derive(Debug, Clone, Copy, PartialEq)]
enum Action {
    Place(GlyphMetric),
    Advance(f32),
    Skip,
}

/// Single-pass layout over one styled text
///
/// Yields a [`GlyphPlacement`] for every drawn glyph. The font and text are
/// only read, so independent passes can run on any number of threads.
#[derive(Debug, Clone)]
pub struct GlyphLayout<'a> {
    text: &'a [char],
    style: &'a TextStyle,
    font: &'a BitmapFont,
    colors: ColorSource<'a>,
    next_index: usize,
    cursor: LayoutCursor,
    state: LineState,
    line_height: f32,
    bound_width: f32,
    bound_height: f32,
}

impl<'a> GlyphLayout<'a> {
    /// Start a pass at the top-left of the text
    pub fn new(run: &'a StyledText, font: &'a BitmapFont) -> Self {
        let style = run.style();
        Self {
            text: run.chars(),
            style,
            font,
            colors: run.color_source(),
            next_index: 0,
            cursor: LayoutCursor {
                x: 0.0,
                y: font.padding_top() * style.scale_y,
            },
            state: LineState::AtLineStart,
            line_height: font.zero_char_height(),
            bound_width: style.width * style.scale_x,
            bound_height: style.height * style.scale_y,
        }
    }

    /// Current cursor
    pub fn cursor(&self) -> LayoutCursor {
        self.cursor
    }

    /// Current line state
    pub fn state(&self) -> LineState {
        self.state
    }

    /// Index of the next character to consume
    pub fn position(&self) -> usize {
        self.next_index
    }

    fn step(&mut self, index: usize, ch: char) -> Action {
        if ch == '\n' {
            self.break_line(LineState::LineBrokeByNewline);
            return Action::Skip;
        }

        let glyph = self.font.glyph(ch).copied();
        let char_width = match glyph {
            Some(glyph) => glyph.width_f32(),
            None if ch == ' ' => self.font.zero_char_width(),
            None => {
                log::trace!("No glyph for {:?} at {}, skipped", ch, index);
                return Action::Skip;
            }
        };

        let lookahead = if self.style.word_wrap && is_boundary_char(ch) {
            lookahead_width(self.text, index, self.font, self.style.spacing, self.style.scale_x)
        } else {
            0.0
        };

        if self.should_wrap(char_width, lookahead) {
            self.break_line(LineState::LineBrokeByWrap);
            // The boundary that announced the next word is consumed by the break.
            if self.state.is_terminal() || lookahead > 0.0 {
                return Action::Skip;
            }
        }

        if self.should_clip(char_width) {
            log::trace!("Clipped {:?} at x={}", ch, self.cursor.x);
            return Action::Skip;
        }

        if ch == ' ' {
            return Action::Advance(self.font.zero_char_width() * self.style.scale_x);
        }

        glyph.map_or(Action::Skip, Action::Place)
    }

    // Bounds are compared in scaled space. The wrap margin scales with the
    // glyph, the clip margin does not.
    fn should_wrap(&self, char_width: f32, lookahead: f32) -> bool {
        self.style.word_wrap
            && self.bound_width != 0.0
            && self.cursor.x >= self.bound_width - lookahead - char_width / WRAP_MARGIN_DIVISOR * self.style.scale_x
    }

    fn should_clip(&self, char_width: f32) -> bool {
        !self.style.word_wrap
            && self.bound_width != 0.0
            && self.cursor.x >= self.bound_width - char_width / WRAP_MARGIN_DIVISOR
    }

    fn break_line(&mut self, reason: LineState) {
        let style = self.style;
        self.cursor.x = 0.0;
        self.cursor.y += (self.line_height + style.line_spacing) * style.scale_y;

        self.state = if self.bound_height != 0.0 && self.cursor.y > self.bound_height - self.line_height {
            log::debug!(
                "Vertical bound {} reached at y={} after {} of {} chars",
                self.bound_height,
                self.cursor.y,
                self.next_index,
                self.text.len()
            );
            LineState::BoundsExhausted
        } else {
            reason
        };
    }

    fn advance(&mut self, dx: f32) {
        self.cursor.x += dx;
        self.state = LineState::InLine;
    }
}

impl Iterator for GlyphLayout<'_> {
    type Item = GlyphPlacement;

    fn next(&mut self) -> Option<GlyphPlacement> {
        while !self.state.is_terminal() {
            let index = self.next_index;
            let ch = *self.text.get(index)?;
            self.next_index += 1;

            match self.step(index, ch) {
                Action::Place(glyph) => {
                    let placement = GlyphPlacement {
                        index,
                        character: ch,
                        x: self.cursor.x,
                        y: self.cursor.y,
                        glyph,
                        color: self.colors.color_at(index),
                    };
                    self.advance((glyph.width_f32() + self.style.spacing) * self.style.scale_x);
                    return Some(placement);
                }
                Action::Advance(dx) => self.advance(dx),
                Action::Skip => {}
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.state.is_terminal() {
            return (0, Some(0));
        }
        (0, Some(self.text.len().saturating_sub(self.next_index)))
    }
}

impl FusedIterator for GlyphLayout<'_> {}

/// Lay out `run` and append its quads to `sink`
///
/// Returns the number of glyphs written, which sizes the draw call. A full
/// sink ends the pass early with the quads written so far.
pub fn layout_text<S: VertexSink + ?Sized>(run: &StyledText, font: &BitmapFont, sink: &mut S) -> usize {
    let style = run.style();
    let emitter = QuadEmitter::new(font, *run.transform(), style.scale_x, style.scale_y, style.alpha);
    let mut layout = GlyphLayout::new(run, font);
    let mut glyph_count = 0;

    for placement in layout.by_ref() {
        if !emitter.emit(sink, placement.x, placement.y, &placement.glyph, placement.color) {
            log::warn!(
                "Vertex sink full after {} glyphs, dropping the rest of a {}-char text",
                glyph_count,
                run.len()
            );
            break;
        }
        glyph_count += 1;
    }

    log::debug!(
        "Laid out {} glyphs from {} chars, final state {:?}",
        glyph_count,
        run.len(),
        layout.state()
    );
    glyph_count
}

/// Vertex capacity that always fits a pass over `run`
pub fn required_vertices(run: &StyledText) -> usize {
    run.visible_char_count() * VERTICES_PER_QUAD
}

/// Bounding box for text layout
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextBounds {
    /// Minimum X coordinate
    pub min_x: f32,
    /// Minimum Y coordinate
    pub min_y: f32,
    /// Maximum X coordinate
    pub max_x: f32,
    /// Maximum Y coordinate
    pub max_y: f32,
}

impl TextBounds {
    /// Calculate width of bounding box
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    /// Calculate height of bounding box
    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }
}

/// Extents of the drawn glyphs in local (pre-transform) space
///
/// Zero bounds when nothing would be drawn.
pub fn measure(run: &StyledText, font: &BitmapFont) -> TextBounds {
    let style = run.style();
    GlyphLayout::new(run, font)
        .map(|p| TextBounds {
            min_x: p.x,
            min_y: p.y,
            max_x: p.x + p.glyph.width_f32() * style.scale_x,
            max_y: p.y + p.glyph.height_f32() * style.scale_y,
        })
        .reduce(|acc, b| TextBounds {
            min_x: acc.min_x.min(b.min_x),
            min_y: acc.min_y.min(b.min_y),
            max_x: acc.max_x.max(b.max_x),
            max_y: acc.max_y.max(b.max_y),
        })
        .unwrap_or_default()
}

/// Text layout engine bound to one shared font
///
/// Holds no per-pass state; every call starts a fresh cursor.
#[derive(Debug, Clone)]
pub struct TextLayout {
    font: Arc<BitmapFont>,
}

impl TextLayout {
    /// Create a new text layout engine
    pub fn new(font: Arc<BitmapFont>) -> Self {
        Self { font }
    }

    /// Get the font used by this layout engine
    pub fn font(&self) -> &BitmapFont {
        &self.font
    }

    /// Shared handle to the font
    pub fn shared_font(&self) -> Arc<BitmapFont> {
        Arc::clone(&self.font)
    }

    /// Glyph placements without emitting vertices
    pub fn placements<'a>(&'a self, run: &'a StyledText) -> GlyphLayout<'a> {
        GlyphLayout::new(run, &self.font)
    }

    /// Append quads for `run` to `sink`, returning the glyph count
    pub fn layout<S: VertexSink + ?Sized>(&self, run: &StyledText, sink: &mut S) -> usize {
        layout_text(run, &self.font, sink)
    }

    /// Lay out into a freshly allocated, pre-sized vertex buffer
    pub fn layout_to_vec(&self, run: &StyledText) -> Vec<TextVertex> {
        let mut vertices = Vec::with_capacity(required_vertices(run));
        layout_text(run, &self.font, &mut vertices);
        vertices
    }

    /// Local-space bounds of `run`
    pub fn measure(&self, run: &StyledText) -> TextBounds {
        measure(run, &self.font)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::logging;
    use crate::foundation::math::AffineTransform;
    use crate::text::quad::QuadSlice;
    use crate::text::test_support::fixed_width_font;
    use approx::assert_relative_eq;

    const LETTERS: &str = "abcdefghijklmnopqrstuvwxyz";

    fn font() -> BitmapFont {
        fixed_width_font(LETTERS, 10, 10)
    }

    fn run(text: &str, style: TextStyle) -> StyledText {
        StyledText::new(text, style).unwrap()
    }

    fn placements(text: &StyledText, font: &BitmapFont) -> Vec<GlyphPlacement> {
        GlyphLayout::new(text, font).collect()
    }

    #[test]
    fn test_two_glyphs_side_by_side() {
        let font = font();
        let text = run("ab", TextStyle::default());
        let mut vertices = Vec::new();

        let count = layout_text(&text, &font, &mut vertices);

        assert_eq!(count, 2);
        assert_eq!(vertices.len(), 8);
        assert_eq!(vertices[4].position[0], 10.0);
    }

    #[test]
    fn test_identity_transform_gives_local_corners() {
        let font = font();
        let text = run("ab", TextStyle::default()).with_transform(AffineTransform::IDENTITY);
        let vertices = TextLayout::new(Arc::new(font)).layout_to_vec(&text);

        let expected = [
            [0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0],
            [10.0, 0.0], [20.0, 0.0], [20.0, 10.0], [10.0, 10.0],
        ];
        let positions: Vec<[f32; 2]> = vertices.iter().map(|v| v.position).collect();
        assert_eq!(positions, expected);
    }

    #[test]
    fn test_glyph_count_matches_visible_chars() {
        let font = font();
        for source in ["hello", "a b c", "ab\ncd\n\nef", " lead and trail ", ""] {
            let text = run(source, TextStyle::default());
            let mut vertices = Vec::new();
            let count = layout_text(&text, &font, &mut vertices);

            assert_eq!(count, text.visible_char_count(), "text {:?}", source);
            assert_eq!(vertices.len(), required_vertices(&text));
        }
    }

    #[test]
    fn test_space_advances_without_quad() {
        let font = font().with_zero_char_size(6.0, 10.0);
        let placed = placements(&run("a b", TextStyle::default()), &font);

        assert_eq!(placed.len(), 2);
        assert_eq!(placed[1].character, 'b');
        assert_eq!(placed[1].x, 16.0);
    }

    #[test]
    fn test_newline_resets_cursor() {
        let font = font().with_zero_char_size(10.0, 12.0);
        let style = TextStyle::default().with_spacing(0.0, 3.0).with_scale(1.0, 2.0);
        let placed = placements(&run("ab\ncd", style), &font);

        let c = placed.iter().find(|p| p.character == 'c').unwrap();
        assert_eq!(c.x, 0.0);
        assert_eq!(c.y, (12.0 + 3.0) * 2.0);
        assert!(placed.iter().all(|p| p.character != '\n'));
    }

    #[test]
    fn test_unmapped_glyph_does_not_advance() {
        let font = font();
        let placed = placements(&run("a?b", TextStyle::default()), &font);

        assert_eq!(placed.len(), 2);
        assert_eq!(placed[1].x, 10.0);
        assert_eq!(placed[1].index, 2);
    }

    #[test]
    fn test_spacing_and_scale_advance() {
        let font = font();
        let style = TextStyle::default().with_spacing(2.0, 0.0).with_scale(2.0, 1.0);
        let placed = placements(&run("abc", style), &font);

        let xs: Vec<f32> = placed.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 24.0, 48.0]);
    }

    #[test]
    fn test_padding_top_offsets_first_line() {
        let font = font().with_padding_top(4.0);
        let style = TextStyle::default().with_scale(1.0, 0.5);
        let placed = placements(&run("a", style), &font);

        assert_eq!(placed[0].y, 2.0);
    }

    #[test]
    fn test_word_wraps_before_overflowing_word() {
        logging::init_for_tests();
        let font = font();
        let style = TextStyle::default()
            .with_word_wrap(true)
            .with_spacing(0.0, 2.0)
            .with_bounds(80.0, 0.0);
        let text = run("hello world", style);
        let mut layout = GlyphLayout::new(&text, &font);

        let first_line: Vec<GlyphPlacement> = layout.by_ref().take(5).collect();
        assert!(first_line.iter().all(|p| p.y == 0.0));
        assert_eq!(layout.state(), LineState::InLine);

        let w = layout.next().unwrap();
        assert_eq!(w.character, 'w');
        assert_eq!(w.x, 0.0);
        assert_eq!(w.y, 10.0 + 2.0);

        let rest: Vec<GlyphPlacement> = layout.collect();
        assert_eq!(rest.len(), 4);
        assert!(rest.iter().all(|p| p.y == 12.0));
        assert_eq!(rest.last().unwrap().x, 40.0);
    }

    #[test]
    fn test_wrap_not_taken_when_word_fits() {
        let font = font();
        let style = TextStyle::default().with_word_wrap(true).with_bounds(200.0, 0.0);
        let placed = placements(&run("hello world", style), &font);

        assert!(placed.iter().all(|p| p.y == 0.0));
        assert_eq!(placed[5].x, 60.0);
    }

    #[test]
    fn test_long_word_breaks_per_character() {
        let font = font();
        let style = TextStyle::default().with_word_wrap(true).with_bounds(15.0, 0.0);
        let placed = placements(&run("abcd", style), &font);

        let ys: Vec<f32> = placed.iter().map(|p| p.y).collect();
        assert_eq!(ys, vec![0.0, 10.0, 20.0, 30.0]);
        assert!(placed.iter().all(|p| p.x == 0.0));
    }

    #[test]
    fn test_wrap_applies_at_line_start() {
        let font = font();
        let style = TextStyle::default().with_word_wrap(true).with_bounds(5.0, 0.0);
        let text = run("ab", style);
        let mut layout = GlyphLayout::new(&text, &font);
        assert!(layout.state().is_line_start());

        let placed: Vec<GlyphPlacement> = layout.by_ref().collect();

        let ys: Vec<f32> = placed.iter().map(|p| p.y).collect();
        assert_eq!(ys, vec![10.0, 20.0]);
        assert!(placed.iter().all(|p| p.x == 0.0));
        assert_eq!(layout.state(), LineState::InLine);
    }

    #[test]
    fn test_bounds_follow_scale() {
        let font = font();

        let unscaled = TextStyle::default().with_bounds(50.0, 0.0);
        assert_eq!(placements(&run("abcd", unscaled), &font).len(), 4);

        let wide = TextStyle::default().with_bounds(50.0, 0.0).with_scale(2.0, 1.0);
        let placed = placements(&run("abcd", wide), &font);
        let xs: Vec<f32> = placed.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 20.0, 40.0, 60.0]);

        let tall = TextStyle::default().with_bounds(0.0, 25.0).with_scale(1.0, 2.0);
        let text = run("a\nb\nc", tall);
        let mut layout = GlyphLayout::new(&text, &font);
        let ys: Vec<f32> = layout.by_ref().map(|p| p.y).collect();
        assert_eq!(ys, vec![0.0, 20.0, 40.0]);
        assert_eq!(layout.state(), LineState::InLine);
    }

    #[test]
    fn test_clip_margin_ignores_scale() {
        let font = font();
        // Bound 25 at scale 2 is 50 wide. The third glyph at x=40 stays
        // because 40 < 50 - 10 / 1.5.
        let style = TextStyle::default().with_bounds(25.0, 0.0).with_scale(2.0, 1.0);
        let placed = placements(&run("abcd", style), &font);

        assert_eq!(placed.len(), 3);
    }

    #[test]
    fn test_clip_without_wrap_keeps_line() {
        let font = font();
        let style = TextStyle::default().with_bounds(25.0, 0.0);
        let text = run("abcd\nef", style);
        let placed = placements(&text, &font);

        let chars: String = placed.iter().map(|p| p.character).collect();
        assert_eq!(chars, "abef");
        assert_eq!(placed[1].y, 0.0);
        assert_eq!(placed[2].y, 10.0);
    }

    #[test]
    fn test_cursor_y_never_decreases() {
        let font = font();
        let style = TextStyle::default()
            .with_word_wrap(true)
            .with_spacing(1.0, 1.0)
            .with_bounds(70.0, 0.0);
        let text = run("the quick brown fox jumps\nover the lazy dog again and again", style);
        let mut layout = GlyphLayout::new(&text, &font);
        let mut last_y = layout.cursor().y;

        while let Some(placement) = layout.next() {
            assert!(placement.y >= last_y);
            assert!(layout.cursor().y >= placement.y);
            last_y = layout.cursor().y;
        }
        assert!(last_y > 0.0);
    }

    #[test]
    fn test_vertical_bound_stops_pass() {
        logging::init_for_tests();
        let font = font();
        let source = "a\nb\nc\nd";

        let unbounded = run(source, TextStyle::default());
        let bounded = run(source, TextStyle::default().with_bounds(0.0, 25.0));

        let full = layout_text(&unbounded, &font, &mut Vec::<TextVertex>::new());
        let mut layout = GlyphLayout::new(&bounded, &font);
        let partial = layout.by_ref().count();

        assert_eq!(full, 4);
        assert_eq!(partial, 2);
        assert_eq!(layout.state(), LineState::BoundsExhausted);
        assert!(layout.position() < bounded.len());
        assert_eq!(layout.next(), None);
    }

    #[test]
    fn test_multicolor_vertices_ignore_base_color() {
        let font = font();
        let style = TextStyle::default().with_color(Color::GREEN).with_alpha(0.25);
        let text = StyledText::multicolor([('a', Color::RED), ('b', Color::BLUE)], style).unwrap();
        let mut vertices = Vec::new();

        layout_text(&text, &font, &mut vertices);

        assert!(vertices[..4].iter().all(|v| v.color == [1.0, 0.0, 0.0]));
        assert!(vertices[4..].iter().all(|v| v.color == [0.0, 0.0, 1.0]));
        assert!(vertices.iter().all(|v| v.alpha == 0.25));
    }

    #[test]
    fn test_multicolor_index_survives_skips() {
        let font = font();
        let text = StyledText::from_markup("a <FF0000>?b", TextStyle::default()).unwrap();
        let placed = placements(&text, &font);

        assert_eq!(placed.len(), 2);
        assert_eq!(placed[0].color, Color::WHITE);
        assert_eq!(placed[1].color, Color::RED);
    }

    #[test]
    fn test_full_slice_ends_pass() {
        let font = font();
        let text = run("abc", TextStyle::default());
        let mut storage = [TextVertex::default(); VERTICES_PER_QUAD];
        let mut sink = QuadSlice::new(&mut storage);

        assert_eq!(layout_text(&text, &font, &mut sink), 1);
        assert_eq!(sink.written(), VERTICES_PER_QUAD);
    }

    #[test]
    fn test_transform_applies_after_layout() {
        let font = font();
        let transform = AffineTransform::translation(5.0, 7.0).then(&AffineTransform::scale(2.0, 2.0));
        let text = run("ab", TextStyle::default()).with_transform(transform);
        let mut vertices = Vec::new();

        layout_text(&text, &font, &mut vertices);

        assert_relative_eq!(vertices[4].position[0], 30.0);
        assert_relative_eq!(vertices[4].position[1], 14.0);
        assert_relative_eq!(vertices[6].position[0], 50.0);
        assert_relative_eq!(vertices[6].position[1], 34.0);
    }

    #[test]
    fn test_measure_bounds() {
        let font = font();
        let layout = TextLayout::new(Arc::new(font));

        let bounds = layout.measure(&run("abc\nde", TextStyle::default()));
        assert_eq!(bounds.width(), 30.0);
        assert_eq!(bounds.height(), 20.0);

        assert_eq!(layout.measure(&run("   ", TextStyle::default())), TextBounds::default());
    }

    #[test]
    fn test_shared_font_across_threads() {
        let engine = TextLayout::new(Arc::new(font()));
        let layout = &engine;
        let texts = [
            run("first text", TextStyle::default()),
            run("second\ntext", TextStyle::default()),
        ];

        let counts: Vec<usize> = std::thread::scope(|scope| {
            let handles: Vec<_> = texts
                .iter()
                .map(|text| scope.spawn(move || layout.layout(text, &mut Vec::<TextVertex>::new())))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(counts, vec![9, 10]);
    }
}
