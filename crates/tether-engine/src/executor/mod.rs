//! Thread-affine command execution.
//!
//! One OS thread is bound as the *affine* thread and owns a piece of state `S`
//! (native window handles, graphics contexts). Every other thread reaches that
//! state by scheduling closures through a [`Dispatcher`]:
//! - `dispatch_sync` blocks until the closure ran and returns its result
//! - `dispatch_async` enqueues and returns immediately
//!
//! Closures run one at a time, in enqueue order, only on the affine thread.

mod affine;
mod error;

pub use affine::{AffineExecutor, Dispatcher};
pub use error::ExecutorStopped;
