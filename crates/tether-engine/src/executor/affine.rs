use std::sync::{Arc, OnceLock};
use std::thread::{self, ThreadId};

use crossbeam_channel::{Receiver, Sender};

use super::ExecutorStopped;

type Job<S> = Box<dyn FnOnce(&mut S) + Send + 'static>;

enum Message<S> {
    Run(Job<S>),
    Stop,
}

/// Owner side of the affine executor.
///
/// Lives on the thread that will become the affine thread. `run` consumes it, so the
/// queue's receiving side disappears together with the run loop: once `run` returns,
/// every dispatch fails with [`ExecutorStopped`] instead of blocking forever.
pub struct AffineExecutor<S> {
    sender: Sender<Message<S>>,
    receiver: Receiver<Message<S>>,
    binding: Arc<OnceLock<ThreadId>>,
}

/// Scheduling side of the affine executor.
///
/// Cheap to clone; usable from any thread.
pub struct Dispatcher<S> {
    sender: Sender<Message<S>>,
    binding: Arc<OnceLock<ThreadId>>,
}

impl<S> Clone for Dispatcher<S> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            binding: self.binding.clone(),
        }
    }
}

impl<S: 'static> AffineExecutor<S> {
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self {
            sender,
            receiver,
            binding: Arc::new(OnceLock::new()),
        }
    }

    /// Pins the current thread as the affine thread.
    ///
    /// Calling again from the same thread is a no-op.
    ///
    /// # Panics
    /// If the executor is already bound to a different thread.
    pub fn bind(&self) {
        let current = thread::current().id();
        let bound = *self.binding.get_or_init(|| current);
        assert_eq!(
            bound, current,
            "affine executor is bound to {bound:?}; it cannot be rebound to {current:?}"
        );
    }

    /// Returns a handle for scheduling work onto the affine thread.
    pub fn dispatcher(&self) -> Dispatcher<S> {
        Dispatcher {
            sender: self.sender.clone(),
            binding: self.binding.clone(),
        }
    }

    /// Executes scheduled closures against `state` until a stop request is dequeued.
    ///
    /// Binds the current thread if nothing is bound yet. Closures queued behind the stop
    /// request are dropped without running. Also returns once every dispatcher is gone.
    ///
    /// # Panics
    /// If called on a thread other than the bound one.
    pub fn run(self, state: &mut S) {
        self.bind();

        let AffineExecutor { sender, receiver, .. } = self;
        drop(sender);

        log::debug!("affine executor running on {:?}", thread::current().id());

        let mut executed: u64 = 0;
        while let Ok(message) = receiver.recv() {
            match message {
                Message::Run(job) => {
                    job(state);
                    executed += 1;
                }
                Message::Stop => break,
            }
        }

        // Dropping a pending sync job drops its reply sender, which wakes the caller.
        let dropped = receiver.try_iter().count();
        log::debug!("affine executor stopped: {executed} closures executed, {dropped} dropped");
    }
}

impl<S: 'static> Default for AffineExecutor<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: 'static> Dispatcher<S> {
    /// Runs `f` on the affine thread and blocks until it has completed.
    ///
    /// Errors raised by `f` travel back through `R`; the executor never inspects them.
    /// Returns [`ExecutorStopped`] if the run loop ended before `f` completed.
    ///
    /// # Panics
    /// If called on the affine thread itself: the closure would queue behind the
    /// closure that is currently waiting for it.
    pub fn dispatch_sync<R, F>(&self, f: F) -> Result<R, ExecutorStopped>
    where
        F: FnOnce(&mut S) -> R + Send + 'static,
        R: Send + 'static,
    {
        assert!(
            !self.is_affine_thread(),
            "dispatch_sync called on the affine thread; nested synchronous dispatch would deadlock"
        );

        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        self.enqueue(Box::new(move |state: &mut S| {
            // The caller may be gone only if it panicked; nothing to report to.
            let _ = done_tx.send(f(state));
        }))?;

        done_rx.recv().map_err(|_| ExecutorStopped)
    }

    /// Schedules `f` on the affine thread and returns immediately.
    ///
    /// `f` runs after everything enqueued before it. Safe to call from the affine thread.
    pub fn dispatch_async<F>(&self, f: F) -> Result<(), ExecutorStopped>
    where
        F: FnOnce(&mut S) + Send + 'static,
    {
        self.enqueue(Box::new(f))
    }

    /// Asks the run loop to return once everything enqueued so far has run.
    ///
    /// Callable from any thread, including the affine thread. Idempotent.
    pub fn stop(&self) {
        if self.sender.send(Message::Stop).is_err() {
            log::trace!("stop requested on an executor that is not running");
        }
    }

    /// Returns `true` when called on the bound affine thread.
    pub fn is_affine_thread(&self) -> bool {
        self.binding.get() == Some(&thread::current().id())
    }

    /// Number of queued messages (closures and stop requests) not yet dequeued.
    pub fn pending(&self) -> usize {
        self.sender.len()
    }

    fn enqueue(&self, job: Job<S>) -> Result<(), ExecutorStopped> {
        self.sender
            .send(Message::Run(job))
            .map_err(|_| ExecutorStopped)
    }
}
