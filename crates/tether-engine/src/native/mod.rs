//! Native window/event source seam.
//!
//! The runtime drives a [`NativePlatform`] exclusively from the affine thread. Platforms
//! report input as raw [`NativeEvent`] records using SDL-compatible codes; the window
//! layer translates them into typed events.
//!
//! Implementations:
//! - [`HeadlessPlatform`]: in-memory, scriptable from any thread (tests, CI, demos)
//! - [`WinitPlatform`]: winit event loop + one wgpu surface per window

mod error;
mod headless;
mod record;
mod winit_backend;

pub use error::NativeError;
pub use headless::{HeadlessInjector, HeadlessPlatform, HeadlessProbe};
pub use record::{keycode, mouse_button, window_event, NativeEvent, NativeWindowId};
pub use winit_backend::WinitPlatform;

use crate::gfx::GraphicsContext;

/// Native windowing operations consumed by the runtime.
///
/// Every method is called on the affine thread only.
pub trait NativePlatform {
    /// Starts the windowing subsystem. Called once, before any other method.
    fn initialize(&mut self) -> Result<(), NativeError>;

    /// Creates a window with a drawable surface and returns its identifier.
    ///
    /// Identifiers are unique among live windows.
    fn create_window(
        &mut self,
        title: &str,
        width: u32,
        height: u32,
    ) -> Result<NativeWindowId, NativeError>;

    /// Releases the window. Unknown identifiers are ignored.
    fn destroy_window(&mut self, id: NativeWindowId);

    /// Returns the next pending record, or `None` when nothing is pending.
    fn poll_event(&mut self) -> Option<NativeEvent>;

    /// Presents the window's current frame.
    fn present(&mut self, id: NativeWindowId) -> Result<(), NativeError>;

    /// Diagnostic for the most recent failure, if any.
    fn last_error(&self) -> Option<String>;

    /// Graphics context bound to the window's surface.
    fn graphics(&mut self, id: NativeWindowId) -> Option<&mut dyn GraphicsContext>;
}
