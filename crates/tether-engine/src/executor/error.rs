use std::fmt;

/// The executor's run loop has returned; the closure was not (or will never be) executed.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ExecutorStopped;

impl fmt::Display for ExecutorStopped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "affine executor is not running")
    }
}

impl std::error::Error for ExecutorStopped {}
