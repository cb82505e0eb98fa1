use std::ops::Range;

use crate::paint::Color;

use super::{BufferId, BufferTable, GraphicsContext, GraphicsError, Primitive};

/// A successfully executed graphics operation.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphicsOp {
    Clear(Color),
    CreateBuffer(BufferId),
    Upload {
        buffer: BufferId,
        vertices: Vec<[f32; 2]>,
    },
    Bind(BufferId),
    Draw {
        buffer: BufferId,
        primitive: Primitive,
        color: Color,
        vertices: Range<u32>,
    },
    DeleteBuffer(BufferId),
}

/// Graphics context that validates and records operations instead of rendering.
///
/// Backs the headless platform; failed operations are not recorded.
#[derive(Debug)]
pub struct RecordingGraphics {
    viewport: (u32, u32),
    buffers: BufferTable<Vec<[f32; 2]>>,
    ops: Vec<GraphicsOp>,
}

impl RecordingGraphics {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            viewport: (width, height),
            buffers: BufferTable::new(),
            ops: Vec::new(),
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    pub fn ops(&self) -> &[GraphicsOp] {
        &self.ops
    }

    /// Returns the operations recorded so far and starts a new recording.
    pub fn take_ops(&mut self) -> Vec<GraphicsOp> {
        std::mem::take(&mut self.ops)
    }

    /// Current contents of `buffer`.
    pub fn vertices(&self, buffer: BufferId) -> Option<&[[f32; 2]]> {
        self.buffers.get(buffer).ok().map(Vec::as_slice)
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }
}

impl GraphicsContext for RecordingGraphics {
    fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    fn clear(&mut self, color: Color) -> Result<(), GraphicsError> {
        self.ops.push(GraphicsOp::Clear(color));
        Ok(())
    }

    fn create_buffer(&mut self) -> Result<BufferId, GraphicsError> {
        let id = self.buffers.insert(Vec::new());
        self.ops.push(GraphicsOp::CreateBuffer(id));
        Ok(id)
    }

    fn upload(&mut self, buffer: BufferId, vertices: &[[f32; 2]]) -> Result<(), GraphicsError> {
        let storage = self.buffers.get_mut(buffer)?;
        storage.clear();
        storage.extend_from_slice(vertices);
        self.buffers.set_len(buffer, vertices.len() as u32)?;

        self.ops.push(GraphicsOp::Upload {
            buffer,
            vertices: vertices.to_vec(),
        });
        Ok(())
    }

    fn bind(&mut self, buffer: BufferId) -> Result<(), GraphicsError> {
        self.buffers.bind(buffer)?;
        self.ops.push(GraphicsOp::Bind(buffer));
        Ok(())
    }

    fn draw(
        &mut self,
        primitive: Primitive,
        color: Color,
        vertices: Range<u32>,
    ) -> Result<(), GraphicsError> {
        let Some((buffer, _)) = self.buffers.bound_for_draw(&vertices)? else {
            return Ok(());
        };

        self.ops.push(GraphicsOp::Draw {
            buffer,
            primitive,
            color,
            vertices,
        });
        Ok(())
    }

    fn delete_buffer(&mut self, buffer: BufferId) -> Result<(), GraphicsError> {
        self.buffers.remove(buffer)?;
        self.ops.push(GraphicsOp::DeleteBuffer(buffer));
        Ok(())
    }
}
