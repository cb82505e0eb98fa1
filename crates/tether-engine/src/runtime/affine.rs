use std::sync::Arc;

use crossbeam_channel::Receiver;

use crate::gfx::GraphicsContext;
use crate::input::Event;
use crate::native::{NativeError, NativePlatform, NativeWindowId};
use crate::window::{EventTranslator, WindowRegistry, WindowShared, WindowSlot};

use super::RuntimeConfig;

/// State owned by the affine thread. Every scheduled closure receives `&mut Affine`.
pub struct Affine {
    platform: Box<dyn NativePlatform>,
    registry: WindowRegistry,
    event_capacity: usize,
}

impl Affine {
    pub(crate) fn new(platform: Box<dyn NativePlatform>, config: &RuntimeConfig) -> Self {
        Self {
            platform,
            registry: WindowRegistry::new(),
            event_capacity: config.event_capacity,
        }
    }

    pub fn platform(&mut self) -> &mut dyn NativePlatform {
        self.platform.as_mut()
    }

    pub fn graphics(&mut self, id: NativeWindowId) -> Option<&mut dyn GraphicsContext> {
        self.platform.graphics(id)
    }

    pub fn registry(&self) -> &WindowRegistry {
        &self.registry
    }

    /// Creates a native window and registers its event queue.
    pub(crate) fn open_window(
        &mut self,
        title: &str,
        width: u32,
        height: u32,
    ) -> Result<(Arc<WindowShared>, Receiver<Event>), NativeError> {
        let id = self.platform.create_window(title, width, height)?;

        // The surface may differ from the request (scale factor, window manager).
        let size = self
            .platform
            .graphics(id)
            .map_or((width, height), |gfx| gfx.viewport());

        let (tx, rx) = crossbeam_channel::bounded(self.event_capacity);
        let shared = Arc::new(WindowShared::new(id, title, size));
        self.registry.register(id, WindowSlot::new(shared.clone(), tx));

        log::debug!("opened {id} \"{title}\" {}x{}", size.0, size.1);
        Ok((shared, rx))
    }

    /// Unregisters and destroys `id`, then ends its event stream. Returns `false` if the
    /// window was not open.
    pub(crate) fn close_window(&mut self, id: NativeWindowId) -> bool {
        let Some(slot) = self.registry.unregister(id) else {
            return false;
        };
        self.platform.destroy_window(id);
        drop(slot);
        log::debug!("closed {id}");
        true
    }

    /// Drains every pending native record through the translator, after moving any
    /// backlogged events into queues that have room again. Returns the number of
    /// events accepted.
    pub(crate) fn poll_events(&mut self) -> usize {
        EventTranslator::flush(&self.registry);
        let mut delivered = 0;
        while let Some(record) = self.platform.poll_event() {
            if EventTranslator::deliver(&self.registry, &record) {
                delivered += 1;
            }
        }
        delivered
    }

    /// Closes every window still open.
    pub(crate) fn shutdown(&mut self) {
        let ids = self.registry.ids();
        if !ids.is_empty() {
            log::debug!("closing {} window(s) left open", ids.len());
        }
        for id in ids {
            self.close_window(id);
        }
    }
}
