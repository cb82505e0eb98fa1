//! Tether engine crate.
//!
//! Confines a native windowing system and its graphics contexts to one OS thread
//! while any number of application threads open windows, draw and consume input.
//!
//! - [`executor`]: thread-affine closure dispatch
//! - [`runtime`]: wiring, poll loop, handles
//! - [`window`]: registry, event translation, window handles
//! - [`native`]: platform seam (headless, winit)
//! - [`gfx`] / [`device`]: graphics capability set and its wgpu implementation

pub mod device;
pub mod executor;
pub mod gfx;
pub mod input;
pub mod native;
pub mod paint;
pub mod runtime;
pub mod window;

pub mod logging;
