//! Graphics capability set.
//!
//! Drawing closures scheduled on the affine thread receive a `&mut dyn GraphicsContext`
//! for their window. The interface is deliberately small:
//! - vertex buffers: create / upload / bind / delete
//! - draw calls: solid color, one primitive topology per call
//! - clear
//!
//! Convention:
//! - vertex positions are window pixels (top-left origin, +Y down)
//! - colors are linear premultiplied (`paint::Color`)

mod buffers;
mod canvas;
mod error;
mod recording;

use std::ops::Range;

use crate::paint::Color;

pub use buffers::BufferTable;
pub use canvas::Canvas;
pub use error::GraphicsError;
pub use recording::{GraphicsOp, RecordingGraphics};

/// Handle to a vertex buffer owned by a graphics context.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct BufferId(u32);

impl BufferId {
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Primitive topology for a draw call.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Primitive {
    Triangles,
    TriangleStrip,
    LineStrip,
}

/// Operations a window's graphics context supports.
///
/// Implementations only ever run on the affine thread.
pub trait GraphicsContext {
    /// Drawable size in pixels.
    fn viewport(&self) -> (u32, u32);

    /// Fills the whole target with `color`.
    fn clear(&mut self, color: Color) -> Result<(), GraphicsError>;

    /// Allocates an empty vertex buffer.
    fn create_buffer(&mut self) -> Result<BufferId, GraphicsError>;

    /// Replaces the contents of `buffer`.
    fn upload(&mut self, buffer: BufferId, vertices: &[[f32; 2]]) -> Result<(), GraphicsError>;

    /// Makes `buffer` the source for subsequent draw calls.
    fn bind(&mut self, buffer: BufferId) -> Result<(), GraphicsError>;

    /// Draws `vertices` of the bound buffer with a solid color.
    fn draw(
        &mut self,
        primitive: Primitive,
        color: Color,
        vertices: Range<u32>,
    ) -> Result<(), GraphicsError>;

    /// Releases `buffer`. Unbinds it if it was bound.
    fn delete_buffer(&mut self, buffer: BufferId) -> Result<(), GraphicsError>;
}
