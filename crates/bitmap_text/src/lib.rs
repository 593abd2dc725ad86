//! # Bitmap Text
//!
//! Layout and glyph quad generation for bitmap fonts.
//!
//! ## Features
//!
//! - **Bitmap Fonts**: prebuilt atlas plus per-character rectangles, loaded
//!   from TOML or RON descriptors
//! - **Layout**: word wrap with lookahead, clipping, line and glyph spacing,
//!   vertical bounds, scale
//! - **Multicolor Text**: per-letter colors or `<RRGGBB>` markup
//! - **Batched Output**: textured, colored quads in a single vertex buffer,
//!   transformed by a 2D affine transform
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use bitmap_text::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let font = BitmapFont::new(
//!     AtlasTexture::new(1, 64, 16),
//!     [GlyphMetric::new('h', 0, 0, 8, 16), GlyphMetric::new('i', 8, 0, 4, 16)],
//! )?;
//! let layout = TextLayout::new(Arc::new(font));
//!
//! let text = StyledText::new("hi", TextStyle::default())?
//!     .with_transform(AffineTransform::translation(10.0, 20.0));
//! let mut vertices = Vec::new();
//! let glyphs = layout.layout(&text, &mut vertices);
//!
//! assert_eq!(glyphs, 2);
//! assert_eq!(vertices.len(), 8);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod assets;
pub mod config;
pub mod foundation;
pub mod text;

/// Common imports for crate users
pub mod prelude {
    pub use crate::{
        assets::{AssetError, ImageData},
        config::{Config, ConfigError, ConfigFormat},
        foundation::math::{AffineTransform, Point2},
        text::{
            layout_text, measure, parse_color_markup, required_vertices, AtlasTexture, BitmapFont, Color,
            FontDescriptor, FontError, GlyphLayout, GlyphMetric, GlyphPlacement, LineState, QuadSlice,
            StyledText, TextBatch, TextBounds, TextDrawCall, TextError, TextLayout, TextStyle, TextVertex,
            TextureUploader, VertexSink,
        },
    };
}
