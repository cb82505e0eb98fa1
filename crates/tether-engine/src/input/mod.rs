//! Typed input vocabulary delivered to application code.
//!
//! Public API is platform-agnostic and does not expose native records or winit types.
//! `window::EventTranslator` produces these from native event records.

mod types;

pub use types::{Event, Key, PointerButton};
