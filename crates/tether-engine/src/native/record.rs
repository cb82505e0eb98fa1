use std::fmt;

/// Identifier the native layer assigns to a window.
///
/// Small, unique among live windows, and embedded in every window-targeted record.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct NativeWindowId(pub u32);

impl fmt::Display for NativeWindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window#{}", self.0)
    }
}

impl From<u32> for NativeWindowId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Raw input/window-state notification as produced by a native platform.
///
/// Codes are SDL-compatible (see [`keycode`], [`mouse_button`], [`window_event`]).
/// Records carry whatever the platform reports; the translator decides what is modeled.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum NativeEvent {
    Key {
        window: NativeWindowId,
        keycode: u32,
        pressed: bool,
        /// Auto-repeat generated while the key is held.
        repeat: bool,
    },
    MouseButton {
        window: NativeWindowId,
        button: u8,
        pressed: bool,
        x: i32,
        y: i32,
    },
    MouseMotion {
        window: NativeWindowId,
        x: i32,
        y: i32,
    },
    Window {
        window: NativeWindowId,
        kind: u8,
        data1: i32,
        data2: i32,
    },
    /// Any category the runtime does not model (quit, clipboard, device hotplug, ...).
    Other { kind: u32 },
}

impl NativeEvent {
    /// Target window, if the record is window-scoped.
    pub fn window(&self) -> Option<NativeWindowId> {
        match *self {
            NativeEvent::Key { window, .. }
            | NativeEvent::MouseButton { window, .. }
            | NativeEvent::MouseMotion { window, .. }
            | NativeEvent::Window { window, .. } => Some(window),
            NativeEvent::Other { .. } => None,
        }
    }
}

/// Key codes. Printable keys use their ASCII value; others use the scancode mask.
pub mod keycode {
    pub const BACKSPACE: u32 = 0x08;
    pub const TAB: u32 = 0x09;
    pub const RETURN: u32 = 0x0D;
    pub const ESCAPE: u32 = 0x1B;
    pub const SPACE: u32 = 0x20;
    pub const DELETE: u32 = 0x7F;

    pub const SCANCODE_MASK: u32 = 1 << 30;

    pub const F1: u32 = SCANCODE_MASK | 0x3A;
    pub const RIGHT: u32 = SCANCODE_MASK | 0x4F;
    pub const LEFT: u32 = SCANCODE_MASK | 0x50;
    pub const DOWN: u32 = SCANCODE_MASK | 0x51;
    pub const UP: u32 = SCANCODE_MASK | 0x52;
    pub const LCTRL: u32 = SCANCODE_MASK | 0xE0;
    pub const LSHIFT: u32 = SCANCODE_MASK | 0xE1;
    pub const RSHIFT: u32 = SCANCODE_MASK | 0xE5;

    /// Code reported for keys the platform cannot identify.
    pub const UNKNOWN: u32 = 0;
}

/// Mouse button codes.
pub mod mouse_button {
    pub const LEFT: u8 = 1;
    pub const MIDDLE: u8 = 2;
    pub const RIGHT: u8 = 3;
    pub const X1: u8 = 4;
    pub const X2: u8 = 5;
    /// Any button the backend cannot name.
    pub const UNKNOWN: u8 = u8::MAX;
}

/// Window record kinds. `data1`/`data2` carry the new size for `RESIZED`/`SIZE_CHANGED`
/// and the new position for `MOVED`.
pub mod window_event {
    pub const SHOWN: u8 = 1;
    pub const HIDDEN: u8 = 2;
    pub const EXPOSED: u8 = 3;
    pub const MOVED: u8 = 4;
    pub const RESIZED: u8 = 5;
    pub const SIZE_CHANGED: u8 = 6;
    pub const MINIMIZED: u8 = 7;
    pub const MAXIMIZED: u8 = 8;
    pub const RESTORED: u8 = 9;
    pub const ENTER: u8 = 10;
    pub const LEAVE: u8 = 11;
    pub const FOCUS_GAINED: u8 = 12;
    pub const FOCUS_LOST: u8 = 13;
    pub const CLOSE: u8 = 14;
}
