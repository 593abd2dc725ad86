//! # Text Batch
//!
//! Collects many text runs into one shared vertex buffer so a frame's text
//! can be submitted with as few draw calls as possible.
//!
//! - **TextBatch**: owns the vertex buffer and the list of draw calls
//! - **TextDrawCall**: a contiguous range of quads sampling one atlas
//!
//! Consecutive runs that use the same atlas texture are merged into a single
//! draw call.

use super::font::BitmapFont;
use super::layout::{layout_text, required_vertices};
use super::quad::{quad_indices, TextVertex, INDICES_PER_QUAD, VERTICES_PER_QUAD};
use super::style::StyledText;

/// Result type for batch operations
pub type BatchResult<T> = Result<T, BatchError>;

/// Errors that can occur while preparing a batch for submission
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BatchError {
    /// The batch holds more vertices than 32-bit indices can address
    #[error("Batch has {vertices} vertices, more than 32-bit indices can address")]
    IndexOverflow {
        /// Vertices in the batch
        vertices: usize,
    },
}

/// One draw call: `glyph_count` quads starting at `first_vertex`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextDrawCall {
    /// Atlas texture sampled by every quad in the call
    pub texture_id: u32,
    /// First vertex in the batch buffer
    pub first_vertex: usize,
    /// Number of quads
    pub glyph_count: usize,
}

impl TextDrawCall {
    /// Vertices covered by this call
    pub fn vertex_count(&self) -> usize {
        self.glyph_count * VERTICES_PER_QUAD
    }

    /// First index in the batch index buffer
    pub fn first_index(&self) -> usize {
        self.first_vertex / VERTICES_PER_QUAD * INDICES_PER_QUAD
    }

    /// Indices covered by this call
    pub fn index_count(&self) -> usize {
        self.glyph_count * INDICES_PER_QUAD
    }

    fn end_vertex(&self) -> usize {
        self.first_vertex + self.vertex_count()
    }
}

/// Frame-level accumulator of text quads
#[derive(Debug, Default)]
pub struct TextBatch {
    vertices: Vec<TextVertex>,
    draw_calls: Vec<TextDrawCall>,
}

impl TextBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a batch with room for `glyphs` quads
    pub fn with_capacity(glyphs: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(glyphs * VERTICES_PER_QUAD),
            draw_calls: Vec::new(),
        }
    }

    /// Lay out `run` into the batch, returning its glyph count
    pub fn push(&mut self, run: &StyledText, font: &BitmapFont) -> usize {
        self.vertices.reserve(required_vertices(run));

        let first_vertex = self.vertices.len();
        let glyph_count = layout_text(run, font, &mut self.vertices);
        if glyph_count == 0 {
            return 0;
        }

        let texture_id = font.texture().id;
        match self.draw_calls.last_mut() {
            Some(last) if last.texture_id == texture_id && last.end_vertex() == first_vertex => {
                last.glyph_count += glyph_count;
            }
            _ => self.draw_calls.push(TextDrawCall {
                texture_id,
                first_vertex,
                glyph_count,
            }),
        }
        glyph_count
    }

    /// All vertices, in draw order
    pub fn vertices(&self) -> &[TextVertex] {
        &self.vertices
    }

    /// Vertex data as bytes for buffer upload
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Draw calls, in submission order
    pub fn draw_calls(&self) -> &[TextDrawCall] {
        &self.draw_calls
    }

    /// Total quads in the batch
    pub fn glyph_count(&self) -> usize {
        self.vertices.len() / VERTICES_PER_QUAD
    }

    /// Whether nothing has been drawn
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Triangle indices for every quad in the batch
    pub fn indices(&self) -> BatchResult<Vec<u32>> {
        let overflow = || BatchError::IndexOverflow {
            vertices: self.vertices.len(),
        };
        let glyphs = u32::try_from(self.glyph_count()).map_err(|_| overflow())?;
        quad_indices(glyphs, 0).ok_or_else(overflow)
    }

    /// Drop all content, keeping allocations for the next frame
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.draw_calls.clear();
    }
}
