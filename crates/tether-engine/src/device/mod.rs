//! wgpu device layer for native windows.
//!
//! One [`Gpu`] per window: device, queue, configured surface, and a small set of
//! solid-color pipelines implementing [`GraphicsContext`](crate::gfx::GraphicsContext).

mod context;
mod gpu;
mod init;
mod pipeline;
mod surface;

pub use gpu::Gpu;
pub use init::GpuInit;
