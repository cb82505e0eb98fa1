use crate::paint::Color;

use super::{BufferId, GraphicsContext, GraphicsError, Primitive};

/// Immediate-mode 2D helpers built on the graphics capability set.
///
/// A canvas owns two scratch vertex buffers in one window's graphics context. It holds
/// only buffer ids, so it can live on any thread; every method must be called from a
/// closure running on the affine thread, against the context it was created with.
///
/// ```rust,ignore
/// let canvas = window.draw(|gfx| Canvas::new(gfx))?;
/// window.draw(move |gfx| {
///     canvas.clear(gfx, Color::WHITE)?;
///     canvas.fill_rect(gfx, 100.0, 100.0, 100.0, 100.0, Color::BLACK)
/// })?;
/// ```
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Canvas {
    rect: BufferId,
    line: BufferId,
}

impl Canvas {
    pub fn new(gfx: &mut dyn GraphicsContext) -> Result<Self, GraphicsError> {
        let rect = gfx.create_buffer()?;
        let line = gfx.create_buffer()?;
        Ok(Self { rect, line })
    }

    pub fn clear(&self, gfx: &mut dyn GraphicsContext, color: Color) -> Result<(), GraphicsError> {
        gfx.clear(color)
    }

    /// Fills the axis-aligned rectangle with top-left corner `(x, y)`.
    ///
    /// Negative sizes extend the rectangle up/left of the corner. Empty rectangles draw nothing.
    pub fn fill_rect(
        &self,
        gfx: &mut dyn GraphicsContext,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        color: Color,
    ) -> Result<(), GraphicsError> {
        if w == 0.0 || h == 0.0 {
            return Ok(());
        }

        let verts = [[x, y], [x + w, y], [x, y + h], [x + w, y + h]];
        gfx.upload(self.rect, &verts)?;
        gfx.bind(self.rect)?;
        gfx.draw(Primitive::TriangleStrip, color, 0..4)
    }

    /// Strokes a connected polyline through `points`, `width` pixels wide.
    ///
    /// Each segment becomes a quad; joins are not filled. Fewer than two points, a
    /// non-positive width or only zero-length segments draw nothing.
    pub fn stroke_line(
        &self,
        gfx: &mut dyn GraphicsContext,
        color: Color,
        width: f32,
        points: &[[f32; 2]],
    ) -> Result<(), GraphicsError> {
        if points.len() < 2 || !(width > 0.0) {
            return Ok(());
        }

        let verts = stroke_triangles(points, width * 0.5);
        if verts.is_empty() {
            return Ok(());
        }
        gfx.upload(self.line, &verts)?;
        gfx.bind(self.line)?;
        gfx.draw(Primitive::Triangles, color, 0..verts.len() as u32)
    }

    /// Deletes the canvas buffers.
    pub fn release(self, gfx: &mut dyn GraphicsContext) -> Result<(), GraphicsError> {
        gfx.delete_buffer(self.rect)?;
        gfx.delete_buffer(self.line)
    }
}

fn stroke_triangles(points: &[[f32; 2]], half: f32) -> Vec<[f32; 2]> {
    let mut verts = Vec::with_capacity((points.len() - 1) * 6);
    for pair in points.windows(2) {
        let ([x0, y0], [x1, y1]) = (pair[0], pair[1]);
        let (dx, dy) = (x1 - x0, y1 - y0);
        let len = (dx * dx + dy * dy).sqrt();
        if !(len > 0.0) {
            continue;
        }
        let (nx, ny) = (-dy / len * half, dx / len * half);
        let a = [x0 + nx, y0 + ny];
        let b = [x0 - nx, y0 - ny];
        let c = [x1 + nx, y1 + ny];
        let d = [x1 - nx, y1 - ny];
        verts.extend_from_slice(&[a, b, c, c, b, d]);
    }
    verts
}
