use std::fmt;
use std::ops::Range;

use super::BufferId;

/// Failure reported by a graphics context operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphicsError {
    /// The buffer was never created or has been deleted.
    UnknownBuffer(BufferId),
    /// A draw call was issued with no buffer bound.
    NoBufferBound,
    /// The requested vertex range exceeds the bound buffer's contents.
    RangeOutOfBounds { range: Range<u32>, len: u32 },
    /// The backend failed (surface lost, device error, ...).
    Backend(String),
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphicsError::UnknownBuffer(id) => write!(f, "unknown vertex buffer #{}", id.raw()),
            GraphicsError::NoBufferBound => write!(f, "draw issued with no vertex buffer bound"),
            GraphicsError::RangeOutOfBounds { range, len } => write!(
                f,
                "vertex range {}..{} exceeds buffer of {len} vertices",
                range.start, range.end
            ),
            GraphicsError::Backend(msg) => write!(f, "graphics backend error: {msg}"),
        }
    }
}

impl std::error::Error for GraphicsError {}
