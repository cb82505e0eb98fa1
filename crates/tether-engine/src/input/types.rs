use std::fmt;

/// Logical key identifier.
///
/// ASCII letters and digits are carried as the character itself (case preserved).
/// Every other supported key has a named variant; keys outside this set are never
/// delivered.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    /// `a`–`z`, `A`–`Z` or `0`–`9`.
    Char(char),

    Enter,
    Space,

    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,

    LeftShift,
    RightShift,

    Backspace,
    Delete,
}

impl Key {
    /// Maps an ASCII letter or digit to `Key::Char`.
    #[inline]
    pub fn from_ascii(c: char) -> Option<Self> {
        c.is_ascii_alphanumeric().then_some(Key::Char(c))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Char(c) => write!(f, "{c}"),
            named => write!(f, "{named:?}"),
        }
    }
}

/// Pointer (mouse) button identifier.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PointerButton {
    Left,
    Right,
    Middle,
}

/// Events delivered on a window's event queue.
///
/// Positions are window-relative pixels (top-left origin); sizes are pixels.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Event {
    KeyDown(Key),
    KeyUp(Key),

    PointerDown { button: PointerButton, x: i32, y: i32 },
    PointerUp { button: PointerButton, x: i32, y: i32 },
    PointerMove { x: i32, y: i32 },

    /// The user asked to close the window. The window stays open until
    /// `Window::close` is called.
    Close,

    /// The window's drawable size changed. `Window::size` already reports the new size
    /// when this event is received.
    Resize { width: u32, height: u32 },

    FocusGained,
    FocusLost,

    /// Pointer entered the window surface.
    PointerEnter,
    /// Pointer left the window surface.
    PointerLeave,
}
