use std::sync::Arc;

use anyhow::{Context, Result};
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::gfx::{BufferTable, GraphicsError};
use crate::paint::Color;

use super::pipeline::SolidPipelines;
use super::surface::{self, SurfaceErrorAction};
use super::GpuInit;

/// wgpu device, queue and surface for one window.
///
/// Holds an `Arc` of the window so the surface can be `'static`. Implements
/// [`GraphicsContext`](crate::gfx::GraphicsContext); a frame is acquired lazily by the
/// first clear/draw and handed to the compositor by [`present`](Self::present).
pub struct Gpu {
    pub(super) window: Arc<Window>,
    pub(super) surface: wgpu::Surface<'static>,
    pub(super) device: wgpu::Device,
    pub(super) queue: wgpu::Queue,
    pub(super) config: wgpu::SurfaceConfiguration,
    pub(super) size: PhysicalSize<u32>,
    pub(super) solid: SolidPipelines,
    pub(super) buffers: BufferTable<VertexBuffer>,
    pub(super) frame: Option<Frame>,
}

/// GPU storage behind a [`BufferId`](crate::gfx::BufferId). Grows on upload, never shrinks.
pub(super) struct VertexBuffer {
    pub(super) raw: Option<wgpu::Buffer>,
    pub(super) capacity: u64,
}

/// Acquired surface texture awaiting present.
pub(super) struct Frame {
    pub(super) texture: wgpu::SurfaceTexture,
    pub(super) view: wgpu::TextureView,
    /// Something has been rendered into it since acquisition.
    pub(super) touched: bool,
}

impl Gpu {
    pub async fn new(window: Arc<Window>, init: &GpuInit) -> Result<Self> {
        let size = window.inner_size();
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;
        log::debug!("wgpu adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("tether device"),
                required_features: init.required_features,
                required_limits: init.required_limits.clone(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::MemoryUsage,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let caps = surface.get_capabilities(&adapter);
        let format = surface::pick_format(&caps.formats, init.prefer_srgb)
            .context("no supported surface formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode: init.present_mode,
            alpha_mode: surface::pick_alpha_mode(&caps.alpha_modes, init.alpha_mode),
            view_formats: vec![],
            desired_maximum_frame_latency: init.desired_maximum_frame_latency,
        };
        surface.configure(&device, &config);

        let solid = SolidPipelines::new(&device, format);

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            size,
            solid,
            buffers: BufferTable::new(),
            frame: None,
        })
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    /// Reconfigures the surface. A frame acquired at the old size is discarded.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size == self.size {
            return;
        }
        self.frame = None;
        surface::apply_resize(
            &self.surface,
            &self.device,
            &mut self.config,
            &mut self.size,
            new_size,
        );
    }

    /// Presents the current frame. With nothing drawn since the last present, a
    /// black frame is presented.
    pub fn present(&mut self) -> Result<(), GraphicsError> {
        self.ensure_frame()?;
        let Some(frame) = self.frame.take() else {
            return Ok(());
        };
        if !frame.touched {
            clear_pass(&self.device, &self.queue, &frame.view, Color::BLACK);
        }
        self.window.pre_present_notify();
        frame.texture.present();
        Ok(())
    }

    pub(super) fn ensure_frame(&mut self) -> Result<(), GraphicsError> {
        if self.frame.is_some() {
            return Ok(());
        }
        let texture = self.acquire()?;
        let view = texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.frame = Some(Frame {
            texture,
            view,
            touched: false,
        });
        Ok(())
    }

    fn acquire(&mut self) -> Result<wgpu::SurfaceTexture, GraphicsError> {
        if self.size.width == 0 || self.size.height == 0 {
            return Err(GraphicsError::Backend("surface has zero size".into()));
        }

        // One retry after a reconfigure; a second failure is reported.
        let mut last = None;
        for _ in 0..2 {
            let err = match self.surface.get_current_texture() {
                Ok(texture) => return Ok(texture),
                Err(err) => err,
            };
            match surface::classify_error(&self.surface, &self.device, &self.config, self.size, &err) {
                SurfaceErrorAction::Retry => {
                    log::debug!("surface reconfigured after: {err}");
                    last = Some(err);
                }
                SurfaceErrorAction::Skip => {
                    return Err(GraphicsError::Backend(format!("frame skipped: {err}")));
                }
                SurfaceErrorAction::Fatal => {
                    return Err(GraphicsError::Backend(format!("surface failed: {err}")));
                }
            }
        }
        Err(GraphicsError::Backend(match last {
            Some(err) => format!("surface unusable after reconfigure: {err}"),
            None => "surface unusable after reconfigure".into(),
        }))
    }
}

/// Encodes and submits a pass that fills `view` with `color`.
pub(super) fn clear_pass(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    view: &wgpu::TextureView,
    color: Color,
) {
    let [r, g, b, a] = color.clamped().to_array();
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("tether clear encoder"),
    });
    {
        let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("tether clear pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: r as f64,
                        g: g as f64,
                        b: b as f64,
                        a: a as f64,
                    }),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
    }
    queue.submit(std::iter::once(encoder.finish()));
}
