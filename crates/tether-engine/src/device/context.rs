use std::ops::Range;

use crate::gfx::{BufferId, GraphicsContext, GraphicsError, Primitive};
use crate::paint::Color;

use super::gpu::{clear_pass, VertexBuffer};
use super::Gpu;

impl GraphicsContext for Gpu {
    fn viewport(&self) -> (u32, u32) {
        (self.size.width, self.size.height)
    }

    fn clear(&mut self, color: Color) -> Result<(), GraphicsError> {
        self.ensure_frame()?;
        if let Some(frame) = self.frame.as_mut() {
            clear_pass(&self.device, &self.queue, &frame.view, color);
            frame.touched = true;
        }
        Ok(())
    }

    fn create_buffer(&mut self) -> Result<BufferId, GraphicsError> {
        Ok(self.buffers.insert(VertexBuffer {
            raw: None,
            capacity: 0,
        }))
    }

    fn upload(&mut self, buffer: BufferId, vertices: &[[f32; 2]]) -> Result<(), GraphicsError> {
        let bytes: &[u8] = bytemuck::cast_slice(vertices);
        let needed = bytes.len() as u64;

        let storage = self.buffers.get_mut(buffer)?;
        if needed > storage.capacity {
            storage.raw = Some(self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("tether vertex buffer"),
                size: needed,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            storage.capacity = needed;
        }
        if let Some(raw) = storage.raw.as_ref()
            && needed > 0
        {
            self.queue.write_buffer(raw, 0, bytes);
        }

        self.buffers.set_len(buffer, vertices.len() as u32)
    }

    fn bind(&mut self, buffer: BufferId) -> Result<(), GraphicsError> {
        self.buffers.bind(buffer)
    }

    fn draw(
        &mut self,
        primitive: Primitive,
        color: Color,
        vertices: Range<u32>,
    ) -> Result<(), GraphicsError> {
        let Some((id, _)) = self.buffers.bound_for_draw(&vertices)? else {
            return Ok(());
        };

        self.ensure_frame()?;
        self.solid.prepare(&self.device, primitive);
        self.solid.write_params(&self.queue, self.viewport(), color);

        let raw = self.buffers.get(id)?.raw.as_ref();
        let (Some(frame), Some(raw), Some((pipeline, bind_group))) =
            (self.frame.as_mut(), raw, self.solid.get(primitive))
        else {
            return Err(GraphicsError::Backend("draw resources missing".into()));
        };

        let load = if frame.touched {
            wgpu::LoadOp::Load
        } else {
            wgpu::LoadOp::Clear(wgpu::Color::BLACK)
        };
        frame.touched = true;

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("tether draw encoder"),
            });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("tether draw pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            rpass.set_pipeline(pipeline);
            rpass.set_bind_group(0, bind_group, &[]);
            rpass.set_vertex_buffer(0, raw.slice(..));
            rpass.draw(vertices, 0..1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    fn delete_buffer(&mut self, buffer: BufferId) -> Result<(), GraphicsError> {
        let storage = self.buffers.remove(buffer)?;
        if let Some(raw) = storage.raw {
            raw.destroy();
        }
        Ok(())
    }
}
