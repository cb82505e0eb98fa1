use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;

use crate::gfx::{GraphicsContext, GraphicsOp, RecordingGraphics};

use super::{window_event, NativeError, NativePlatform, NativeEvent, NativeWindowId};

/// In-memory native platform.
///
/// Windows are plain records with a [`RecordingGraphics`] context; input arrives through
/// a [`HeadlessInjector`] that any thread may hold. A [`HeadlessProbe`] observes what the
/// runtime did (created/destroyed windows, presented frames) and scripts failures.
pub struct HeadlessPlatform {
    init_failure: Option<String>,
    initialized: bool,
    next_id: u32,
    windows: HashMap<NativeWindowId, RecordingGraphics>,
    inbox: Receiver<NativeEvent>,
    injector: HeadlessInjector,
    probe: HeadlessProbe,
    last_error: Option<String>,
}

/// Feeds native records into a [`HeadlessPlatform`]. Cloneable; usable from any thread.
#[derive(Clone)]
pub struct HeadlessInjector {
    tx: Sender<NativeEvent>,
}

/// Shared view into a [`HeadlessPlatform`]. Cloneable; usable from any thread.
#[derive(Clone, Default)]
pub struct HeadlessProbe {
    state: Arc<Mutex<ProbeState>>,
}

#[derive(Default)]
struct ProbeState {
    initialized: bool,
    titles: HashMap<NativeWindowId, String>,
    open: BTreeSet<NativeWindowId>,
    destroyed: Vec<NativeWindowId>,
    frames: HashMap<NativeWindowId, Vec<Vec<GraphicsOp>>>,
    fail_next_create: Option<String>,
    fail_next_present: Option<String>,
}

impl HeadlessPlatform {
    pub fn new() -> Self {
        let (tx, inbox) = crossbeam_channel::unbounded();
        Self {
            init_failure: None,
            initialized: false,
            next_id: 1,
            windows: HashMap::new(),
            inbox,
            injector: HeadlessInjector { tx },
            probe: HeadlessProbe::default(),
            last_error: None,
        }
    }

    /// Makes `initialize` fail with `msg`.
    pub fn with_init_failure(mut self, msg: impl Into<String>) -> Self {
        self.init_failure = Some(msg.into());
        self
    }

    pub fn injector(&self) -> HeadlessInjector {
        self.injector.clone()
    }

    pub fn probe(&self) -> HeadlessProbe {
        self.probe.clone()
    }

    fn fail(&mut self, msg: String) -> NativeError {
        self.last_error = Some(msg.clone());
        NativeError::new(msg)
    }
}

impl Default for HeadlessPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl NativePlatform for HeadlessPlatform {
    fn initialize(&mut self) -> Result<(), NativeError> {
        if let Some(msg) = self.init_failure.take() {
            return Err(self.fail(msg));
        }
        self.initialized = true;
        self.probe.state.lock().initialized = true;
        Ok(())
    }

    fn create_window(
        &mut self,
        title: &str,
        width: u32,
        height: u32,
    ) -> Result<NativeWindowId, NativeError> {
        debug_assert!(self.initialized, "create_window before initialize");

        let scripted = self.probe.state.lock().fail_next_create.take();
        if let Some(msg) = scripted {
            return Err(self.fail(msg));
        }

        let id = NativeWindowId(self.next_id);
        self.next_id += 1;
        self.windows.insert(id, RecordingGraphics::new(width, height));

        let mut probe = self.probe.state.lock();
        probe.titles.insert(id, title.to_string());
        probe.open.insert(id);
        Ok(id)
    }

    fn destroy_window(&mut self, id: NativeWindowId) {
        if self.windows.remove(&id).is_none() {
            return;
        }
        let mut probe = self.probe.state.lock();
        probe.open.remove(&id);
        probe.destroyed.push(id);
    }

    fn poll_event(&mut self) -> Option<NativeEvent> {
        let record = self.inbox.try_recv().ok()?;

        // The surface follows the window size, as a real backend's would.
        if let NativeEvent::Window { window, kind, data1, data2 } = record
            && (kind == window_event::RESIZED || kind == window_event::SIZE_CHANGED)
            && let Some(gfx) = self.windows.get_mut(&window)
        {
            gfx.resize(data1.max(0) as u32, data2.max(0) as u32);
        }

        Some(record)
    }

    fn present(&mut self, id: NativeWindowId) -> Result<(), NativeError> {
        let scripted = self.probe.state.lock().fail_next_present.take();
        if let Some(msg) = scripted {
            return Err(self.fail(msg));
        }

        let Some(gfx) = self.windows.get_mut(&id) else {
            return Err(self.fail(format!("present: no such window {id}")));
        };
        let frame = gfx.take_ops();
        self.probe.state.lock().frames.entry(id).or_default().push(frame);
        Ok(())
    }

    fn last_error(&self) -> Option<String> {
        self.last_error.clone()
    }

    fn graphics(&mut self, id: NativeWindowId) -> Option<&mut dyn GraphicsContext> {
        self.windows
            .get_mut(&id)
            .map(|g| g as &mut dyn GraphicsContext)
    }
}

impl HeadlessInjector {
    pub fn send(&self, record: NativeEvent) {
        // The platform owns the receiver; once it is gone nobody polls anyway.
        let _ = self.tx.send(record);
    }

    pub fn key(&self, window: NativeWindowId, keycode: u32, pressed: bool) {
        self.send(NativeEvent::Key {
            window,
            keycode,
            pressed,
            repeat: false,
        });
    }

    pub fn window_event(&self, window: NativeWindowId, kind: u8, data1: i32, data2: i32) {
        self.send(NativeEvent::Window {
            window,
            kind,
            data1,
            data2,
        });
    }
}

impl HeadlessProbe {
    pub fn is_initialized(&self) -> bool {
        self.state.lock().initialized
    }

    /// Makes the next `create_window` fail with `msg`.
    pub fn fail_next_create(&self, msg: impl Into<String>) {
        self.state.lock().fail_next_create = Some(msg.into());
    }

    /// Makes the next `present` fail with `msg`.
    pub fn fail_next_present(&self, msg: impl Into<String>) {
        self.state.lock().fail_next_present = Some(msg.into());
    }

    pub fn open_windows(&self) -> Vec<NativeWindowId> {
        self.state.lock().open.iter().copied().collect()
    }

    /// Destroyed windows, in destruction order.
    pub fn destroyed(&self) -> Vec<NativeWindowId> {
        self.state.lock().destroyed.clone()
    }

    pub fn title(&self, id: NativeWindowId) -> Option<String> {
        self.state.lock().titles.get(&id).cloned()
    }

    /// Graphics operations of each presented frame, oldest first.
    pub fn frames(&self, id: NativeWindowId) -> Vec<Vec<GraphicsOp>> {
        self.state.lock().frames.get(&id).cloned().unwrap_or_default()
    }

    pub fn presents(&self, id: NativeWindowId) -> usize {
        self.state.lock().frames.get(&id).map_or(0, Vec::len)
    }
}
