//! Glyph quad emission
//!
//! Turns one placed glyph into four textured, colored vertices and appends
//! them to a [`VertexSink`]. Vertices are written top-left, top-right,
//! bottom-right, bottom-left.

use bytemuck::{Pod, Zeroable};

use super::color::Color;
use super::font::{BitmapFont, GlyphMetric};
use crate::foundation::math::{AffineTransform, Point2};

/// Vertices written per glyph
pub const VERTICES_PER_QUAD: usize = 4;

/// Triangle indices per glyph
pub const INDICES_PER_QUAD: usize = 6;

/// Vertex record of a text quad
///
/// Layout matches a `vec2 position, vec2 uv, vec3 color, float alpha`
/// vertex input, 32 bytes per vertex.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct TextVertex {
    /// World position
    pub position: [f32; 2],
    /// Atlas texture coordinates (bottom-left origin)
    pub uv: [f32; 2],
    /// Normalized RGB
    pub color: [f32; 3],
    /// Opacity
    pub alpha: f32,
}

/// Destination for emitted quads
pub trait VertexSink {
    /// Append one quad; returns `false` when the sink is full
    fn push_quad(&mut self, quad: [TextVertex; VERTICES_PER_QUAD]) -> bool;
}

impl VertexSink for Vec<TextVertex> {
    fn push_quad(&mut self, quad: [TextVertex; VERTICES_PER_QUAD]) -> bool {
        self.extend_from_slice(&quad);
        true
    }
}

/// Fixed-size sink over a caller-provided vertex slice
///
/// Never reallocates. Size it with [`crate::text::required_vertices`].
#[derive(Debug)]
pub struct QuadSlice<'a> {
    vertices: &'a mut [TextVertex],
    written: usize,
}

impl<'a> QuadSlice<'a> {
    /// Start writing at the beginning of `vertices`
    pub fn new(vertices: &'a mut [TextVertex]) -> Self {
        Self { vertices, written: 0 }
    }

    /// Vertices written so far
    pub fn written(&self) -> usize {
        self.written
    }

    /// Quads that still fit
    pub fn remaining_quads(&self) -> usize {
        (self.vertices.len() - self.written) / VERTICES_PER_QUAD
    }

    /// The written prefix
    pub fn filled(&self) -> &[TextVertex] {
        &self.vertices[..self.written]
    }
}

impl VertexSink for QuadSlice<'_> {
    fn push_quad(&mut self, quad: [TextVertex; VERTICES_PER_QUAD]) -> bool {
        let end = self.written + VERTICES_PER_QUAD;
        match self.vertices.get_mut(self.written..end) {
            Some(slot) => {
                slot.copy_from_slice(&quad);
                self.written = end;
                true
            }
            None => false,
        }
    }
}

/// Builds glyph quads for one layout pass
///
/// Captures the atlas size, bleeding-fix epsilons, scale, opacity and
/// transform once so each glyph only supplies its position and color.
#[derive(Debug, Clone, Copy)]
pub struct QuadEmitter {
    atlas_width: f32,
    atlas_height: f32,
    texture_bleeding_fix: f32,
    vertex_bleeding_fix: f32,
    scale_x: f32,
    scale_y: f32,
    alpha: f32,
    transform: AffineTransform,
}

impl QuadEmitter {
    /// Capture pass-wide parameters
    pub fn new(font: &BitmapFont, transform: AffineTransform, scale_x: f32, scale_y: f32, alpha: f32) -> Self {
        let texture = font.texture();
        Self {
            atlas_width: texture.width as f32,
            atlas_height: texture.height as f32,
            texture_bleeding_fix: font.texture_bleeding_fix(),
            vertex_bleeding_fix: font.vertex_bleeding_fix(),
            scale_x,
            scale_y,
            alpha,
            transform,
        }
    }

    /// Quad for `glyph` with its top-left local corner at `(x, y)`
    pub fn quad(&self, x: f32, y: f32, glyph: &GlyphMetric, color: Color) -> [TextVertex; VERTICES_PER_QUAD] {
        let atlas_x = f32::from(glyph.atlas_x);
        let atlas_y = f32::from(glyph.atlas_y);
        let (tex_w, tex_h) = (self.atlas_width, self.atlas_height);

        // Atlas rows count from the top, texture V from the bottom.
        let u0 = atlas_x / tex_w;
        let v0 = (tex_h - atlas_y) / tex_h;
        let u1 = (atlas_x + glyph.width_f32()) / tex_w;
        let v1 = (tex_h - (atlas_y + glyph.height_f32())) / tex_h;

        let w = glyph.width_f32() * self.scale_x;
        let h = glyph.height_f32() * self.scale_y;

        let tf = self.texture_bleeding_fix;
        let vf = self.vertex_bleeding_fix;
        let rgb = color.to_rgb_f32();

        let corner = |lx: f32, ly: f32, dx: f32, dy: f32, u: f32, v: f32| {
            let p = self.transform.apply(Point2::new(lx, ly));
            TextVertex {
                position: [p.x + dx, p.y + dy],
                uv: [u, v],
                color: rgb,
                alpha: self.alpha,
            }
        };

        [
            corner(x, y, -vf, -vf, u0 + tf, v0 - tf),
            corner(x + w, y, vf, -vf, u1 - tf, v0 - tf),
            corner(x + w, y + h, vf, vf, u1 - tf, v1 + tf),
            corner(x, y + h, -vf, vf, u0 + tf, v1 + tf),
        ]
    }

    /// Build and append a quad; returns whether the sink accepted it
    pub fn emit<S: VertexSink + ?Sized>(&self, sink: &mut S, x: f32, y: f32, glyph: &GlyphMetric, color: Color) -> bool {
        sink.push_quad(self.quad(x, y, glyph, color))
    }
}

/// Triangle indices for `glyph_count` consecutive quads
///
/// Two triangles per quad (0-1-2, 0-2-3), offset by `base_vertex`.
/// Returns `None` when `base_vertex + 4 * glyph_count` overflows `u32`.
pub fn quad_indices(glyph_count: u32, base_vertex: u32) -> Option<Vec<u32>> {
    let per_quad = VERTICES_PER_QUAD as u32;
    let vertex_count = glyph_count.checked_mul(per_quad)?;
    base_vertex.checked_add(vertex_count)?;

    Some(
        (0..glyph_count)
            .flat_map(|quad| {
                let base = base_vertex + quad * per_quad;
                [base, base + 1, base + 2, base, base + 2, base + 3]
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::font::AtlasTexture;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-6;

    fn font_100() -> BitmapFont {
        BitmapFont::new(AtlasTexture::new(1, 100, 50), [GlyphMetric::new('a', 10, 5, 20, 10)]).unwrap()
    }

    fn glyph() -> GlyphMetric {
        GlyphMetric::new('a', 10, 5, 20, 10)
    }

    #[test]
    fn test_vertex_layout_size() {
        assert_eq!(std::mem::size_of::<TextVertex>(), std::mem::size_of::<f32>() * 8);
        let vertices = [TextVertex::default(); 2];
        assert_eq!(bytemuck::cast_slice::<TextVertex, u8>(&vertices).len(), 64);
    }

    #[test]
    fn test_identity_quad_matches_local_corners() {
        let emitter = QuadEmitter::new(&font_100(), AffineTransform::IDENTITY, 1.0, 1.0, 1.0);
        let quad = emitter.quad(3.0, 4.0, &glyph(), Color::WHITE);

        assert_eq!(quad[0].position, [3.0, 4.0]);
        assert_eq!(quad[1].position, [23.0, 4.0]);
        assert_eq!(quad[2].position, [23.0, 14.0]);
        assert_eq!(quad[3].position, [3.0, 14.0]);
    }

    #[test]
    fn test_uvs_flip_atlas_rows() {
        let emitter = QuadEmitter::new(&font_100(), AffineTransform::IDENTITY, 1.0, 1.0, 1.0);
        let quad = emitter.quad(0.0, 0.0, &glyph(), Color::WHITE);

        assert_relative_eq!(quad[0].uv[0], 0.1, epsilon = EPSILON);
        assert_relative_eq!(quad[0].uv[1], 0.9, epsilon = EPSILON);
        assert_relative_eq!(quad[2].uv[0], 0.3, epsilon = EPSILON);
        assert_relative_eq!(quad[2].uv[1], 0.7, epsilon = EPSILON);
        assert_eq!(quad[1].uv, [quad[2].uv[0], quad[0].uv[1]]);
        assert_eq!(quad[3].uv, [quad[0].uv[0], quad[2].uv[1]]);
    }

    #[test]
    fn test_bleeding_fix_directions() {
        let font = font_100().with_bleeding_fix(0.01, 0.5);
        let emitter = QuadEmitter::new(&font, AffineTransform::IDENTITY, 1.0, 1.0, 1.0);
        let quad = emitter.quad(0.0, 0.0, &glyph(), Color::WHITE);

        // Vertices move outward.
        assert_eq!(quad[0].position, [-0.5, -0.5]);
        assert_eq!(quad[1].position, [20.5, -0.5]);
        assert_eq!(quad[2].position, [20.5, 10.5]);
        assert_eq!(quad[3].position, [-0.5, 10.5]);

        // UVs move inward.
        assert_relative_eq!(quad[0].uv[0], 0.11, epsilon = EPSILON);
        assert_relative_eq!(quad[0].uv[1], 0.89, epsilon = EPSILON);
        assert_relative_eq!(quad[2].uv[0], 0.29, epsilon = EPSILON);
        assert_relative_eq!(quad[2].uv[1], 0.71, epsilon = EPSILON);
    }

    #[test]
    fn test_transform_and_scale() {
        let transform = AffineTransform::translation(100.0, 200.0);
        let emitter = QuadEmitter::new(&font_100(), transform, 2.0, 3.0, 0.5);
        let quad = emitter.quad(1.0, 1.0, &glyph(), Color::RED);

        assert_eq!(quad[0].position, [101.0, 201.0]);
        assert_eq!(quad[2].position, [141.0, 231.0]);
        assert!(quad.iter().all(|v| v.color == [1.0, 0.0, 0.0] && v.alpha == 0.5));
    }

    #[test]
    fn test_quad_slice_refuses_when_full() {
        let emitter = QuadEmitter::new(&font_100(), AffineTransform::IDENTITY, 1.0, 1.0, 1.0);
        let mut storage = [TextVertex::default(); 6];
        let mut sink = QuadSlice::new(&mut storage);

        assert_eq!(sink.remaining_quads(), 1);
        assert!(emitter.emit(&mut sink, 0.0, 0.0, &glyph(), Color::WHITE));
        assert!(!emitter.emit(&mut sink, 20.0, 0.0, &glyph(), Color::WHITE));
        assert_eq!(sink.written(), 4);
        assert_eq!(sink.filled()[0].position, [0.0, 0.0]);
    }

    #[test]
    fn test_quad_indices() {
        assert_eq!(quad_indices(2, 0), Some(vec![0, 1, 2, 0, 2, 3, 4, 5, 6, 4, 6, 7]));
        assert_eq!(quad_indices(1, 8), Some(vec![8, 9, 10, 8, 10, 11]));
        assert_eq!(quad_indices(0, 0), Some(Vec::new()));
    }

    #[test]
    fn test_quad_indices_overflow() {
        assert_eq!(quad_indices(u32::MAX / 2, 0), None);
        assert_eq!(quad_indices(1, u32::MAX - 2), None);
        assert_eq!(quad_indices(0, u32::MAX), Some(Vec::new()));

        let last = quad_indices(1, u32::MAX - 4).unwrap();
        assert_eq!(last.iter().max(), Some(&(u32::MAX - 1)));
    }
}
