//! Bitmap fonts
//!
//! A [`BitmapFont`] owns an already built atlas texture plus the per-character
//! rectangles inside it. It is loaded once and then shared read-only by every
//! layout pass; nothing here rasterizes glyphs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::assets::{AssetError, ImageData};
use crate::config::{Config, ConfigError};

/// Result type for font operations
pub type FontResult<T> = Result<T, FontError>;

/// Errors that can occur while building or loading a font
#[derive(Debug, thiserror::Error)]
pub enum FontError {
    /// The font descriptor could not be read
    #[error("Failed to read font descriptor: {0}")]
    Config(#[from] ConfigError),

    /// The atlas image could not be decoded
    #[error("Failed to load atlas image: {0}")]
    Image(#[from] AssetError),

    /// The texture collaborator rejected the atlas
    #[error("Failed to upload atlas texture: {0}")]
    Upload(String),

    /// A glyph rectangle does not fit inside the atlas
    #[error("Glyph '{character}' at ({x}, {y}) size {width}x{height} lies outside the {atlas_width}x{atlas_height} atlas")]
    InvalidGlyph {
        /// Offending character
        character: char,
        /// Atlas X of the rectangle
        x: u16,
        /// Atlas Y of the rectangle
        y: u16,
        /// Rectangle width
        width: u16,
        /// Rectangle height
        height: u16,
        /// Atlas width in pixels
        atlas_width: u32,
        /// Atlas height in pixels
        atlas_height: u32,
    },

    /// The atlas has no pixels
    #[error("Atlas texture has zero size: {0}x{1}")]
    InvalidAtlas(u32, u32),
}

/// Rectangle of one character inside the atlas, in atlas pixels
///
/// `atlas_y` counts from the top row of the atlas image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GlyphMetric {
    /// Character this glyph draws
    pub character: char,
    /// Left edge in the atlas
    pub atlas_x: u16,
    /// Top edge in the atlas
    pub atlas_y: u16,
    /// Width in pixels, also the glyph's advance
    pub width: u16,
    /// Height in pixels
    pub height: u16,
}

impl GlyphMetric {
    /// Create a glyph rectangle
    pub const fn new(character: char, atlas_x: u16, atlas_y: u16, width: u16, height: u16) -> Self {
        Self { character, atlas_x, atlas_y, width, height }
    }

    /// Width as a layout float
    pub fn width_f32(&self) -> f32 {
        f32::from(self.width)
    }

    /// Height as a layout float
    pub fn height_f32(&self) -> f32 {
        f32::from(self.height)
    }

    fn fits_in(&self, atlas: &AtlasTexture) -> bool {
        u32::from(self.atlas_x) + u32::from(self.width) <= atlas.width
            && u32::from(self.atlas_y) + u32::from(self.height) <= atlas.height
    }
}

/// Opaque handle to the uploaded atlas texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AtlasTexture {
    /// Backend texture id
    pub id: u32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl AtlasTexture {
    /// Create a texture handle
    pub const fn new(id: u32, width: u32, height: u32) -> Self {
        Self { id, width, height }
    }
}

/// Uploads a decoded atlas image to the GPU
///
/// Implemented by the graphics backend; the font only needs the resulting
/// handle and dimensions.
pub trait TextureUploader {
    /// Create a texture from RGBA8 pixels
    fn upload(&mut self, image: &ImageData) -> FontResult<AtlasTexture>;
}

/// Serializable description of a bitmap font
///
/// ```toml
/// atlas = "mono.png"
/// padding_top = 2.0
///
/// [[glyphs]]
/// character = "A"
/// atlas_x = 0
/// atlas_y = 0
/// width = 8
/// height = 12
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontDescriptor {
    /// Atlas image path, relative to the descriptor file
    pub atlas: PathBuf,
    /// Vertical offset of the first line
    pub padding_top: f32,
    /// Explicit `(width, height)` of the zero char; derived when absent
    pub zero_char_size: Option<(f32, f32)>,
    /// Inward UV inset against atlas bleeding
    pub texture_bleeding_fix: f32,
    /// Outward vertex offset against atlas bleeding
    pub vertex_bleeding_fix: f32,
    /// Glyph rectangles
    pub glyphs: Vec<GlyphMetric>,
}

impl Default for FontDescriptor {
    fn default() -> Self {
        Self {
            atlas: PathBuf::from("atlas.png"),
            padding_top: 0.0,
            zero_char_size: None,
            texture_bleeding_fix: 0.0,
            vertex_bleeding_fix: 0.0,
            glyphs: Vec::new(),
        }
    }
}

impl Config for FontDescriptor {}

/// Bitmap font: atlas texture, glyph table and font-wide layout constants
#[derive(Debug, Clone)]
pub struct BitmapFont {
    texture: AtlasTexture,
    glyphs: HashMap<char, GlyphMetric>,
    zero_char_width: f32,
    zero_char_height: f32,
    padding_top: f32,
    texture_bleeding_fix: f32,
    vertex_bleeding_fix: f32,
}

impl BitmapFont {
    /// Build a font over an uploaded atlas
    ///
    /// Every glyph must lie inside the atlas. The zero char size is taken
    /// from the `'0'` glyph, or from the largest glyph when there is none.
    pub fn new(texture: AtlasTexture, glyphs: impl IntoIterator<Item = GlyphMetric>) -> FontResult<Self> {
        if texture.width == 0 || texture.height == 0 {
            return Err(FontError::InvalidAtlas(texture.width, texture.height));
        }

        let mut table = HashMap::new();
        for glyph in glyphs {
            if !glyph.fits_in(&texture) {
                return Err(FontError::InvalidGlyph {
                    character: glyph.character,
                    x: glyph.atlas_x,
                    y: glyph.atlas_y,
                    width: glyph.width,
                    height: glyph.height,
                    atlas_width: texture.width,
                    atlas_height: texture.height,
                });
            }
            table.insert(glyph.character, glyph);
        }

        let (zero_char_width, zero_char_height) = match table.get(&'0') {
            Some(zero) => (zero.width_f32(), zero.height_f32()),
            None => table.values().fold((0.0f32, 0.0f32), |(w, h), glyph| {
                (w.max(glyph.width_f32()), h.max(glyph.height_f32()))
            }),
        };

        Ok(Self {
            texture,
            glyphs: table,
            zero_char_width,
            zero_char_height,
            padding_top: 0.0,
            texture_bleeding_fix: 0.0,
            vertex_bleeding_fix: 0.0,
        })
    }

    /// Build a font from a descriptor and its uploaded atlas
    pub fn from_descriptor(descriptor: &FontDescriptor, texture: AtlasTexture) -> FontResult<Self> {
        let mut font = Self::new(texture, descriptor.glyphs.iter().copied())?
            .with_padding_top(descriptor.padding_top)
            .with_bleeding_fix(descriptor.texture_bleeding_fix, descriptor.vertex_bleeding_fix);
        if let Some((width, height)) = descriptor.zero_char_size {
            font = font.with_zero_char_size(width, height);
        }
        Ok(font)
    }

    /// Load a descriptor file, decode its atlas image and upload it
    pub fn load<P, U>(descriptor_path: P, uploader: &mut U) -> FontResult<Self>
    where
        P: AsRef<Path>,
        U: TextureUploader + ?Sized,
    {
        let descriptor_path = descriptor_path.as_ref();
        let descriptor = FontDescriptor::load_from_file(descriptor_path)?;

        let atlas_path = descriptor_path
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(&descriptor.atlas);
        let image = ImageData::from_file(&atlas_path)?;
        let texture = uploader.upload(&image)?;

        let font = Self::from_descriptor(&descriptor, texture)?;
        log::info!(
            "Loaded bitmap font {:?}: {} glyphs, atlas {}x{} (texture {})",
            descriptor_path,
            font.glyph_count(),
            texture.width,
            texture.height,
            texture.id
        );
        Ok(font)
    }

    /// Override the zero char size used for spaces and line height
    #[must_use]
    pub fn with_zero_char_size(mut self, width: f32, height: f32) -> Self {
        self.zero_char_width = width;
        self.zero_char_height = height;
        self
    }

    /// Set the offset of the first line
    #[must_use]
    pub fn with_padding_top(mut self, padding_top: f32) -> Self {
        self.padding_top = padding_top;
        self
    }

    /// Set the UV inset and vertex outset epsilons
    #[must_use]
    pub fn with_bleeding_fix(mut self, texture_bleeding_fix: f32, vertex_bleeding_fix: f32) -> Self {
        self.texture_bleeding_fix = texture_bleeding_fix;
        self.vertex_bleeding_fix = vertex_bleeding_fix;
        self
    }

    /// Look up a character; `None` means the font has no glyph for it
    pub fn glyph(&self, character: char) -> Option<&GlyphMetric> {
        self.glyphs.get(&character)
    }

    /// Number of mapped characters
    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    /// Atlas texture handle
    pub fn texture(&self) -> AtlasTexture {
        self.texture
    }

    /// Advance of a space
    pub fn zero_char_width(&self) -> f32 {
        self.zero_char_width
    }

    /// Line height
    pub fn zero_char_height(&self) -> f32 {
        self.zero_char_height
    }

    /// Offset of the first line
    pub fn padding_top(&self) -> f32 {
        self.padding_top
    }

    /// Inward UV inset
    pub fn texture_bleeding_fix(&self) -> f32 {
        self.texture_bleeding_fix
    }

    /// Outward vertex offset
    pub fn vertex_bleeding_fix(&self) -> f32 {
        self.vertex_bleeding_fix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingUploader {
        next_id: u32,
    }

    impl TextureUploader for CountingUploader {
        fn upload(&mut self, image: &ImageData) -> FontResult<AtlasTexture> {
            self.next_id += 1;
            Ok(AtlasTexture::new(self.next_id, image.width, image.height))
        }
    }

    fn atlas() -> AtlasTexture {
        AtlasTexture::new(7, 64, 32)
    }

    #[test]
    fn test_lookup_and_miss() {
        let font = BitmapFont::new(atlas(), [GlyphMetric::new('A', 0, 0, 8, 12)]).unwrap();

        assert_eq!(font.glyph('A'), Some(&GlyphMetric::new('A', 0, 0, 8, 12)));
        assert_eq!(font.glyph('B'), None);
        assert_eq!(font.glyph_count(), 1);
        assert_eq!(font.texture().id, 7);
    }

    #[test]
    fn test_zero_char_from_digit_glyph() {
        let font = BitmapFont::new(
            atlas(),
            [GlyphMetric::new('0', 0, 0, 6, 10), GlyphMetric::new('W', 8, 0, 12, 14)],
        )
        .unwrap();

        assert_eq!(font.zero_char_width(), 6.0);
        assert_eq!(font.zero_char_height(), 10.0);
    }

    #[test]
    fn test_zero_char_falls_back_to_largest() {
        let font = BitmapFont::new(
            atlas(),
            [GlyphMetric::new('i', 0, 0, 3, 10), GlyphMetric::new('W', 8, 0, 12, 9)],
        )
        .unwrap();

        assert_eq!(font.zero_char_width(), 12.0);
        assert_eq!(font.zero_char_height(), 10.0);
    }

    #[test]
    fn test_glyph_outside_atlas_is_rejected() {
        let result = BitmapFont::new(atlas(), [GlyphMetric::new('X', 60, 0, 8, 8)]);
        assert!(matches!(result, Err(FontError::InvalidGlyph { character: 'X', .. })));
    }

    #[test]
    fn test_empty_atlas_is_rejected() {
        let result = BitmapFont::new(AtlasTexture::new(1, 0, 16), []);
        assert!(matches!(result, Err(FontError::InvalidAtlas(0, 16))));
    }

    #[test]
    fn test_descriptor_overrides() {
        let descriptor = FontDescriptor {
            padding_top: 3.0,
            zero_char_size: Some((5.0, 11.0)),
            texture_bleeding_fix: 0.001,
            vertex_bleeding_fix: 0.25,
            glyphs: vec![GlyphMetric::new('0', 0, 0, 6, 10)],
            ..FontDescriptor::default()
        };

        let font = BitmapFont::from_descriptor(&descriptor, atlas()).unwrap();

        assert_eq!(font.padding_top(), 3.0);
        assert_eq!(font.zero_char_width(), 5.0);
        assert_eq!(font.zero_char_height(), 11.0);
        assert_eq!(font.texture_bleeding_fix(), 0.001);
        assert_eq!(font.vertex_bleeding_fix(), 0.25);
    }

    #[test]
    fn test_load_from_descriptor_file() {
        let dir = std::env::temp_dir().join(format!("bitmap_text_font_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        image::RgbaImage::from_pixel(32, 16, image::Rgba([255, 255, 255, 255]))
            .save(dir.join("mono.png"))
            .unwrap();
        let descriptor = FontDescriptor {
            atlas: PathBuf::from("mono.png"),
            glyphs: vec![GlyphMetric::new('a', 0, 0, 8, 16), GlyphMetric::new('b', 8, 0, 8, 16)],
            ..FontDescriptor::default()
        };
        descriptor.save_to_file(dir.join("mono.ron")).unwrap();

        let mut uploader = CountingUploader { next_id: 0 };
        let font = BitmapFont::load(dir.join("mono.ron"), &mut uploader);
        let _ = std::fs::remove_dir_all(&dir);

        let font = font.unwrap();
        assert_eq!(font.texture(), AtlasTexture::new(1, 32, 16));
        assert_eq!(font.glyph_count(), 2);
        assert!(font.glyph('b').is_some());
    }

    #[test]
    fn test_load_missing_descriptor() {
        let mut uploader = CountingUploader { next_id: 0 };
        let result = BitmapFont::load("/nonexistent/font.toml", &mut uploader);
        assert!(matches!(result, Err(FontError::Config(ConfigError::Io(_)))));
        assert_eq!(uploader.next_id, 0);
    }
}
