//! Window demultiplexing: registry, event translation, client handles.
//!
//! Native records are polled on the affine thread, translated, and pushed onto the
//! target window's bounded queue. Application threads read the queue through
//! [`Window::events`].

mod handle;
mod registry;
mod translate;

pub use handle::Window;
pub use registry::{WindowRegistry, WindowShared, WindowSlot};
pub use translate::EventTranslator;
