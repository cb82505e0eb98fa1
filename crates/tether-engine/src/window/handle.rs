use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use crossbeam_channel::Receiver;

use crate::gfx::GraphicsContext;
use crate::input::Event;
use crate::native::NativeWindowId;
use crate::runtime::RuntimeHandle;

use super::WindowShared;

/// Client handle to a native window.
///
/// Usable from any thread except the affine thread (its operations dispatch
/// synchronously). Events arrive on [`events`](Self::events) in the order the native
/// layer produced them; the stream ends once the window is closed.
///
/// Dropping a window that was not closed schedules the close asynchronously.
pub struct Window {
    shared: Arc<WindowShared>,
    events: Receiver<Event>,
    runtime: RuntimeHandle,
    closed: AtomicBool,
}

impl Window {
    pub(crate) fn new(shared: Arc<WindowShared>, events: Receiver<Event>, runtime: RuntimeHandle) -> Self {
        Self {
            shared,
            events,
            runtime,
            closed: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn id(&self) -> NativeWindowId {
        self.shared.id()
    }

    pub fn title(&self) -> &str {
        self.shared.title()
    }

    /// Last size reported by the native layer. Already updated when the matching
    /// `Resize` event is received.
    pub fn size(&self) -> (u32, u32) {
        self.shared.size()
    }

    pub fn events(&self) -> &Receiver<Event> {
        &self.events
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Destroys the native window and ends the event stream.
    ///
    /// Events queued before the close can still be received.
    ///
    /// # Panics
    /// If the window was already closed, or if called on the affine thread.
    pub fn close(&self) {
        let id = self.id();
        assert!(
            !self.runtime.is_affine_thread(),
            "cannot close {id} from the affine thread"
        );
        assert!(!self.closed.swap(true, Ordering::AcqRel), "{id} is already closed");

        if self.runtime.dispatch_sync(move |affine| affine.close_window(id)).is_err() {
            // Runtime shutdown already released every window.
            log::debug!("{id}: runtime stopped before close");
        }
    }

    /// Presents the frame drawn since the last present.
    ///
    /// # Panics
    /// If the window is closed.
    pub fn present(&self) -> Result<()> {
        let id = self.live_id("present");
        self.runtime
            .dispatch_sync(move |affine| affine.platform().present(id))
            .context("runtime is not running")?
            .with_context(|| format!("failed to present {id}"))
    }

    /// Runs `f` on the affine thread against this window's graphics context.
    ///
    /// # Panics
    /// If the window is closed.
    pub fn draw<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut dyn GraphicsContext) -> R + Send + 'static,
        R: Send + 'static,
    {
        let id = self.live_id("draw on");
        self.runtime
            .dispatch_sync(move |affine| affine.graphics(id).map(f))
            .context("runtime is not running")?
            .with_context(|| format!("{id} has no graphics context"))
    }

    fn live_id(&self, op: &str) -> NativeWindowId {
        let id = self.id();
        assert!(!self.is_closed(), "cannot {op} closed {id}");
        id
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let id = self.id();
        let scheduled = self.runtime.dispatch_async(move |affine| {
            if affine.close_window(id) {
                log::debug!("{id} closed after its handle was dropped");
            }
        });
        if scheduled.is_err() {
            log::trace!("{id}: handle dropped after runtime shutdown");
        }
    }
}
