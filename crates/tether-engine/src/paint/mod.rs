//! Color model shared by the graphics capability set and its backends.

mod color;

pub use color::Color;
