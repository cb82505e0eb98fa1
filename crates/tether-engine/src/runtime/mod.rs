//! Runtime wiring: affine executor + native platform + poll loop.
//!
//! ```text
//! app threads ──dispatch──▶ executor queue ──▶ affine thread (Affine: platform, registry)
//!                                                    │ poll tick
//!                                                    ▼
//! Window::events() ◀── per-window queue ◀── EventTranslator
//! ```
//!
//! Typical use: build a [`Runtime`] on the thread that must own the windowing system,
//! hand [`RuntimeHandle`]s to application threads, then call [`Runtime::run`]; it
//! returns once some thread calls [`RuntimeHandle::stop`].

mod affine;
mod config;
mod poll;

pub use affine::Affine;
pub use config::RuntimeConfig;
pub use poll::PollLoop;

use anyhow::{Context, Result};

use crate::executor::{AffineExecutor, Dispatcher, ExecutorStopped};
use crate::native::{NativeError, NativePlatform};
use crate::window::Window;

/// Owner side of the runtime. Consumed by [`run`](Self::run) on the affine thread.
pub struct Runtime {
    executor: AffineExecutor<Affine>,
    handle: RuntimeHandle,
}

/// Cloneable access to a runtime from any thread.
#[derive(Clone)]
pub struct RuntimeHandle {
    dispatcher: Dispatcher<Affine>,
    config: RuntimeConfig,
}

impl Runtime {
    pub fn new(config: RuntimeConfig) -> Self {
        let executor = AffineExecutor::new();
        let handle = RuntimeHandle {
            dispatcher: executor.dispatcher(),
            config: config.sanitized(),
        };
        Self { executor, handle }
    }

    /// Pins the current thread as the affine thread. `run` must be called on it.
    ///
    /// # Panics
    /// If another thread is already bound.
    pub fn bind(&self) {
        self.executor.bind();
    }

    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    /// Builds the platform with `init`, initializes it and serves dispatched work until
    /// [`RuntimeHandle::stop`] is called.
    ///
    /// On return every window still open has been closed and its event stream ended.
    /// Work queued behind the stop request never runs.
    pub fn run<P, F>(self, init: F) -> Result<()>
    where
        P: NativePlatform + 'static,
        F: FnOnce() -> Result<P, NativeError>,
    {
        let Runtime { executor, handle } = self;
        executor.bind();

        let mut platform = init().context("failed to create native platform")?;
        platform
            .initialize()
            .context("native platform initialization failed")?;

        let mut affine = Affine::new(Box::new(platform), &handle.config);
        let poll = PollLoop::start(
            handle.dispatcher.clone(),
            handle.config.poll_interval,
            |affine: &mut Affine| {
                affine.poll_events();
            },
        );

        log::debug!("runtime started (poll every {:?})", handle.config.poll_interval);
        executor.run(&mut affine);

        poll.stop();
        affine.shutdown();
        log::debug!("runtime stopped");
        Ok(())
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}

impl RuntimeHandle {
    /// Runs `f` on the affine thread and waits for its result.
    ///
    /// # Panics
    /// If called on the affine thread.
    pub fn dispatch_sync<R, F>(&self, f: F) -> Result<R, ExecutorStopped>
    where
        F: FnOnce(&mut Affine) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.dispatcher.dispatch_sync(f)
    }

    /// Schedules `f` on the affine thread without waiting.
    pub fn dispatch_async<F>(&self, f: F) -> Result<(), ExecutorStopped>
    where
        F: FnOnce(&mut Affine) + Send + 'static,
    {
        self.dispatcher.dispatch_async(f)
    }

    /// Whether the current thread is the one the runtime is bound to.
    pub fn is_affine_thread(&self) -> bool {
        self.dispatcher.is_affine_thread()
    }

    /// Makes [`Runtime::run`] return once everything dispatched so far has run.
    pub fn stop(&self) {
        self.dispatcher.stop();
    }

    /// Opens a native window.
    ///
    /// Blocks until the runtime is running.
    pub fn new_window(&self, title: &str, width: u32, height: u32) -> Result<Window> {
        let owned = title.to_string();
        let (shared, events) = self
            .dispatch_sync(move |affine| affine.open_window(&owned, width, height))
            .context("runtime is not running")?
            .with_context(|| format!("failed to create window \"{title}\""))?;
        Ok(Window::new(shared, events, self.clone()))
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::gfx::{Canvas, GraphicsOp, Primitive};
    use crate::input::{Event, Key};
    use crate::native::{keycode, window_event, HeadlessInjector, HeadlessPlatform, HeadlessProbe};
    use crate::paint::Color;

    const RECV: Duration = Duration::from_secs(5);

    struct Harness {
        handle: RuntimeHandle,
        injector: HeadlessInjector,
        probe: HeadlessProbe,
        affine: thread::JoinHandle<Result<()>>,
    }

    impl Harness {
        fn start(platform: HeadlessPlatform) -> Self {
            let config = RuntimeConfig::default()
                .with_poll_interval(Duration::from_millis(2))
                .with_event_capacity(16);
            let runtime = Runtime::new(config);
            let handle = runtime.handle();
            let (injector, probe) = (platform.injector(), platform.probe());
            let affine = thread::spawn(move || runtime.run(move || Ok(platform)));
            Self {
                handle,
                injector,
                probe,
                affine,
            }
        }

        fn finish(self) -> Result<()> {
            self.handle.stop();
            self.affine.join().unwrap()
        }
    }

    // ── lifecycle ─────────────────────────────────────────────────────────

    #[test]
    fn init_failure_is_returned_from_run() {
        let runtime = Runtime::default();
        let handle = runtime.handle();
        let err = runtime
            .run(|| Ok(HeadlessPlatform::new().with_init_failure("no display")))
            .unwrap_err();

        assert!(format!("{err:#}").contains("no display"));
        assert!(handle.dispatch_async(|_| {}).is_err());
    }

    #[test]
    fn stop_returns_from_run_and_later_dispatch_fails() {
        let h = Harness::start(HeadlessPlatform::new());
        let handle = h.handle.clone();
        handle.dispatch_sync(|_| ()).unwrap();
        assert!(h.probe.is_initialized());

        h.finish().unwrap();
        assert!(handle.dispatch_sync(|_| ()).is_err());
        assert!(handle.new_window("late", 1, 1).is_err());
    }

    #[test]
    fn closures_run_on_the_affine_thread() {
        let h = Harness::start(HeadlessPlatform::new());
        let affine_id = h.handle.dispatch_sync(|_| thread::current().id()).unwrap();
        assert_eq!(affine_id, h.affine.thread().id());
        h.finish().unwrap();
    }

    // ── windows ───────────────────────────────────────────────────────────

    #[test]
    fn new_window_opens_a_native_window() {
        let h = Harness::start(HeadlessPlatform::new());
        let window = h.handle.new_window("Test", 640, 480).unwrap();

        assert_eq!(window.title(), "Test");
        assert_eq!(window.size(), (640, 480));
        assert_eq!(h.probe.open_windows(), vec![window.id()]);
        assert_eq!(h.probe.title(window.id()).as_deref(), Some("Test"));

        window.close();
        h.finish().unwrap();
    }

    #[test]
    fn create_failure_surfaces_as_error() {
        let h = Harness::start(HeadlessPlatform::new());
        h.probe.fail_next_create("out of windows");

        let err = h.handle.new_window("Test", 1, 1).err().unwrap();
        assert!(format!("{err:#}").contains("out of windows"));
        assert!(h.probe.open_windows().is_empty());
        h.finish().unwrap();
    }

    #[test]
    fn injected_input_reaches_the_window() {
        let h = Harness::start(HeadlessPlatform::new());
        let window = h.handle.new_window("Test", 640, 480).unwrap();

        h.injector.key(window.id(), 'A' as u32, true);
        h.injector.key(window.id(), 'A' as u32, true);
        h.injector.send(crate::native::NativeEvent::Key {
            window: window.id(),
            keycode: 'A' as u32,
            pressed: true,
            repeat: true,
        });
        h.injector.key(window.id(), keycode::RETURN, false);

        let events = window.events();
        assert_eq!(events.recv_timeout(RECV).unwrap(), Event::KeyDown(Key::Char('A')));
        assert_eq!(events.recv_timeout(RECV).unwrap(), Event::KeyDown(Key::Char('A')));
        assert_eq!(events.recv_timeout(RECV).unwrap(), Event::KeyUp(Key::Enter));

        window.close();
        h.finish().unwrap();
    }

    #[test]
    fn resize_is_visible_with_the_event() {
        let h = Harness::start(HeadlessPlatform::new());
        let window = h.handle.new_window("Test", 640, 480).unwrap();

        h.injector.window_event(window.id(), window_event::RESIZED, 1024, 768);
        assert_eq!(
            window.events().recv_timeout(RECV).unwrap(),
            Event::Resize { width: 1024, height: 768 }
        );
        assert_eq!(window.size(), (1024, 768));

        let viewport = window.draw(|gfx| gfx.viewport()).unwrap();
        assert_eq!(viewport, (1024, 768));

        window.close();
        h.finish().unwrap();
    }

    #[test]
    fn close_request_is_an_event_and_close_ends_the_stream() {
        let h = Harness::start(HeadlessPlatform::new());
        let window = h.handle.new_window("Test", 640, 480).unwrap();

        h.injector.window_event(window.id(), window_event::CLOSE, 0, 0);
        assert_eq!(window.events().recv_timeout(RECV).unwrap(), Event::Close);
        assert!(!window.is_closed());

        window.close();
        assert!(window.is_closed());
        assert!(window.events().recv_timeout(RECV).is_err());
        assert_eq!(h.probe.destroyed(), vec![window.id()]);
        h.finish().unwrap();
    }

    #[test]
    fn windows_do_not_see_each_others_events() {
        let h = Harness::start(HeadlessPlatform::new());
        let a = h.handle.new_window("a", 10, 10).unwrap();
        let b = h.handle.new_window("b", 10, 10).unwrap();
        assert_ne!(a.id(), b.id());

        h.injector.key(b.id(), 'b' as u32, true);
        h.injector.key(a.id(), 'a' as u32, true);

        assert_eq!(a.events().recv_timeout(RECV).unwrap(), Event::KeyDown(Key::Char('a')));
        assert_eq!(b.events().recv_timeout(RECV).unwrap(), Event::KeyDown(Key::Char('b')));
        assert!(a.events().try_recv().is_err());

        a.close();
        b.close();
        h.finish().unwrap();
    }

    #[test]
    fn events_for_a_closed_window_are_dropped() {
        let h = Harness::start(HeadlessPlatform::new());
        let window = h.handle.new_window("Test", 10, 10).unwrap();
        let id = window.id();
        let events = window.events().clone();
        window.close();

        h.injector.key(id, 'a' as u32, true);
        // One more drain after the injection.
        let delivered = h.handle.dispatch_sync(|affine| affine.poll_events()).unwrap();
        assert_eq!(delivered, 0);
        assert!(events.try_recv().is_err());
        h.finish().unwrap();
    }

    #[test]
    #[should_panic(expected = "already closed")]
    fn double_close_panics() {
        let h = Harness::start(HeadlessPlatform::new());
        let window = h.handle.new_window("Test", 10, 10).unwrap();
        window.close();
        window.close();
    }

    #[test]
    #[should_panic(expected = "closed")]
    fn present_after_close_panics() {
        let h = Harness::start(HeadlessPlatform::new());
        let window = h.handle.new_window("Test", 10, 10).unwrap();
        window.close();
        let _ = window.present();
    }

    #[test]
    fn close_on_the_affine_thread_leaves_the_window_open() {
        let h = Harness::start(HeadlessPlatform::new());
        let window = std::sync::Arc::new(h.handle.new_window("Test", 10, 10).unwrap());
        let id = window.id();

        let inner = window.clone();
        let (panicked, closed) = h
            .handle
            .dispatch_sync(move |_| {
                let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| inner.close()));
                (result.is_err(), inner.is_closed())
            })
            .unwrap();
        assert!(panicked);
        assert!(!closed);
        assert!(!window.is_closed());

        // Still open, so the handle's drop releases it.
        drop(window);
        let open = h.handle.dispatch_sync(|affine| affine.registry().len()).unwrap();
        assert_eq!(open, 0);
        assert_eq!(h.probe.destroyed(), vec![id]);
        h.finish().unwrap();
    }

    #[test]
    fn dropping_a_window_closes_it() {
        let h = Harness::start(HeadlessPlatform::new());
        let window = h.handle.new_window("Test", 10, 10).unwrap();
        let id = window.id();
        drop(window);

        // Async close is queued before this closure.
        let open = h.handle.dispatch_sync(|affine| affine.registry().len()).unwrap();
        assert_eq!(open, 0);
        assert_eq!(h.probe.destroyed(), vec![id]);
        h.finish().unwrap();
    }

    #[test]
    fn shutdown_closes_open_windows() {
        let h = Harness::start(HeadlessPlatform::new());
        let window = h.handle.new_window("Test", 10, 10).unwrap();
        let probe = h.probe.clone();

        h.finish().unwrap();

        assert!(window.events().recv_timeout(RECV).is_err());
        assert!(probe.open_windows().is_empty());
        // Close after shutdown is quiet.
        window.close();
    }

    // ── drawing ───────────────────────────────────────────────────────────

    #[test]
    fn draw_and_present_reach_the_platform() {
        let h = Harness::start(HeadlessPlatform::new());
        let window = h.handle.new_window("Test", 640, 480).unwrap();

        window
            .draw(|gfx| -> Result<(), crate::gfx::GraphicsError> {
                let canvas = Canvas::new(gfx)?;
                canvas.clear(gfx, Color::WHITE)?;
                canvas.fill_rect(gfx, 10.0, 10.0, 100.0, 50.0, Color::BLACK)?;
                canvas.release(gfx)
            })
            .unwrap()
            .unwrap();
        window.present().unwrap();
        window.present().unwrap();

        assert_eq!(h.probe.presents(window.id()), 2);
        let frames = h.probe.frames(window.id());
        assert!(frames[0].contains(&GraphicsOp::Clear(Color::WHITE)));
        assert!(frames[0].iter().any(|op| matches!(
            op,
            GraphicsOp::Draw { primitive: Primitive::TriangleStrip, .. }
        )));
        assert!(frames[1].is_empty());

        window.close();
        h.finish().unwrap();
    }

    #[test]
    fn present_failure_is_reported() {
        let h = Harness::start(HeadlessPlatform::new());
        let window = h.handle.new_window("Test", 10, 10).unwrap();
        h.probe.fail_next_present("swap failed");

        let err = window.present().unwrap_err();
        assert!(format!("{err:#}").contains("swap failed"));
        assert!(window.present().is_ok());

        window.close();
        h.finish().unwrap();
    }
}
