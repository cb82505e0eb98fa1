use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{select, Sender};

use crate::executor::Dispatcher;

/// Ticker thread that schedules a drain onto the affine thread every `interval`.
///
/// At most one drain is queued at a time: ticks that arrive while a drain is still
/// waiting in the executor queue are skipped.
pub struct PollLoop {
    shutdown: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl PollLoop {
    pub fn start<S, F>(dispatcher: Dispatcher<S>, interval: Duration, drain: F) -> Self
    where
        S: 'static,
        F: Fn(&mut S) + Send + Sync + 'static,
    {
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(0);
        let drain = Arc::new(drain);
        let queued = Arc::new(AtomicBool::new(false));

        let thread = thread::Builder::new()
            .name("tether-poll".into())
            .spawn(move || {
                let ticker = crossbeam_channel::tick(interval);
                loop {
                    select! {
                        recv(shutdown_rx) -> _ => break,
                        recv(ticker) -> _ => {
                            if queued.swap(true, Ordering::AcqRel) {
                                continue;
                            }
                            let (queued, drain) = (queued.clone(), drain.clone());
                            let scheduled = dispatcher.dispatch_async(move |state| {
                                queued.store(false, Ordering::Release);
                                drain(state);
                            });
                            if scheduled.is_err() {
                                log::debug!("poll loop: executor stopped");
                                break;
                            }
                        }
                    }
                }
            });

        let thread = match thread {
            Ok(t) => Some(t),
            Err(e) => {
                log::error!("failed to spawn poll thread: {e}");
                None
            }
        };

        Self {
            shutdown: Some(shutdown_tx),
            thread,
        }
    }

    /// Stops the ticker and waits for its thread to exit.
    pub fn stop(mut self) {
        self.shutdown_and_join();
    }

    fn shutdown_and_join(&mut self) {
        // Disconnecting the channel wakes the select.
        drop(self.shutdown.take());
        if let Some(t) = self.thread.take()
            && t.join().is_err()
        {
            log::error!("poll thread panicked");
        }
    }
}

impl Drop for PollLoop {
    fn drop(&mut self) {
        self.shutdown_and_join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::AffineExecutor;
    use std::time::Instant;

    fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(1));
        }
        false
    }

    #[test]
    fn drains_periodically_on_the_affine_thread() {
        let executor = AffineExecutor::<Vec<thread::ThreadId>>::new();
        let dispatcher = executor.dispatcher();
        let affine = thread::spawn(move || {
            let mut seen = Vec::new();
            executor.run(&mut seen);
            (thread::current().id(), seen)
        });

        let poll = PollLoop::start(dispatcher.clone(), Duration::from_millis(1), |seen: &mut Vec<_>| {
            seen.push(thread::current().id());
        });

        let count = || dispatcher.dispatch_sync(|seen: &mut Vec<_>| seen.len()).unwrap();
        assert!(wait_until(|| count() >= 3));

        poll.stop();
        dispatcher.stop();
        let (affine_id, seen) = affine.join().unwrap();
        assert!(seen.iter().all(|id| *id == affine_id));
    }

    #[test]
    fn busy_affine_thread_gets_one_queued_drain() {
        let executor = AffineExecutor::<u32>::new();
        let dispatcher = executor.dispatcher();

        // Not running yet: every tick finds the executor busy.
        let poll = PollLoop::start(dispatcher.clone(), Duration::from_millis(1), |n: &mut u32| *n += 1);
        thread::sleep(Duration::from_millis(30));
        poll.stop();

        assert_eq!(dispatcher.pending(), 1);

        dispatcher.stop();
        let mut drains = 0;
        executor.run(&mut drains);
        assert_eq!(drains, 1);
    }

    #[test]
    fn exits_when_the_executor_is_gone() {
        let executor = AffineExecutor::<()>::new();
        let dispatcher = executor.dispatcher();
        dispatcher.stop();
        executor.run(&mut ());

        let poll = PollLoop::start(dispatcher, Duration::from_millis(1), |_: &mut ()| {});
        let ticker = poll.thread.as_ref().unwrap();
        assert!(wait_until(|| ticker.is_finished()));
        poll.stop();
    }
}
