use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowId};

use crate::device::{Gpu, GpuInit};
use crate::gfx::GraphicsContext;

use super::{keycode, mouse_button, window_event, NativeError, NativePlatform, NativeEvent, NativeWindowId};

/// `Other` kind reported once the winit event loop is shutting down.
const QUIT: u32 = 0x100;

/// winit + wgpu native platform.
///
/// The event loop is created by `initialize` on the calling (affine) thread and pumped
/// without blocking whenever the record queue runs dry.
pub struct WinitPlatform {
    gpu_init: GpuInit,
    event_loop: Option<EventLoop<()>>,
    state: PumpState,
}

#[derive(Default)]
struct PumpState {
    windows: HashMap<NativeWindowId, WindowEntry>,
    by_winit: HashMap<WindowId, NativeWindowId>,
    next_id: u32,
    pending: VecDeque<NativeEvent>,
    last_error: Option<String>,
}

struct WindowEntry {
    gpu: Gpu,
    /// Last cursor position; winit reports it only on motion.
    cursor: (i32, i32),
}

impl WinitPlatform {
    pub fn new(gpu_init: GpuInit) -> Self {
        Self {
            gpu_init,
            event_loop: None,
            state: PumpState::default(),
        }
    }

    fn fail(&mut self, msg: String) -> NativeError {
        self.state.last_error = Some(msg.clone());
        NativeError::new(msg)
    }

    fn pump(&mut self) {
        let Some(event_loop) = self.event_loop.as_mut() else {
            return;
        };
        if let PumpStatus::Exit(code) = event_loop.pump_app_events(Some(Duration::ZERO), &mut self.state) {
            log::debug!("winit event loop exited ({code})");
            self.event_loop = None;
        }
    }
}

impl Default for WinitPlatform {
    fn default() -> Self {
        Self::new(GpuInit::default())
    }
}

impl NativePlatform for WinitPlatform {
    fn initialize(&mut self) -> Result<(), NativeError> {
        if self.event_loop.is_some() {
            return Ok(());
        }
        match EventLoop::new() {
            Ok(event_loop) => {
                self.event_loop = Some(event_loop);
                Ok(())
            }
            Err(e) => Err(self.fail(format!("failed to create winit event loop: {e}"))),
        }
    }

    fn create_window(
        &mut self,
        title: &str,
        width: u32,
        height: u32,
    ) -> Result<NativeWindowId, NativeError> {
        let Some(event_loop) = self.event_loop.as_ref() else {
            return Err(self.fail("create_window before initialize".into()));
        };

        let attrs = Window::default_attributes()
            .with_title(title)
            .with_inner_size(PhysicalSize::new(width.max(1), height.max(1)));

        #[allow(deprecated)]
        let created = event_loop.create_window(attrs);
        let window = match created {
            Ok(w) => Arc::new(w),
            Err(e) => return Err(self.fail(format!("failed to create window: {e}"))),
        };

        let gpu = match pollster::block_on(Gpu::new(window.clone(), &self.gpu_init)) {
            Ok(gpu) => gpu,
            Err(e) => return Err(self.fail(format!("GPU initialization failed: {e:#}"))),
        };

        self.state.next_id += 1;
        let id = NativeWindowId(self.state.next_id);
        self.state.by_winit.insert(window.id(), id);
        self.state.windows.insert(
            id,
            WindowEntry {
                gpu,
                cursor: (0, 0),
            },
        );
        log::debug!("winit window {:?} is {id}", window.id());
        Ok(id)
    }

    fn destroy_window(&mut self, id: NativeWindowId) {
        let Some(entry) = self.state.windows.remove(&id) else {
            return;
        };
        self.state.by_winit.remove(&entry.gpu.window().id());
        // Records already queued for the window are dropped by the registry lookup.
    }

    fn poll_event(&mut self) -> Option<NativeEvent> {
        if self.state.pending.is_empty() {
            self.pump();
        }
        self.state.pending.pop_front()
    }

    fn present(&mut self, id: NativeWindowId) -> Result<(), NativeError> {
        let result = match self.state.windows.get_mut(&id) {
            Some(entry) => entry.gpu.present().map_err(|e| e.to_string()),
            None => Err(format!("present: no such window {id}")),
        };
        result.map_err(|msg| self.fail(msg))
    }

    fn last_error(&self) -> Option<String> {
        self.state.last_error.clone()
    }

    fn graphics(&mut self, id: NativeWindowId) -> Option<&mut dyn GraphicsContext> {
        self.state
            .windows
            .get_mut(&id)
            .map(|entry| &mut entry.gpu as &mut dyn GraphicsContext)
    }
}

impl ApplicationHandler for PumpState {
    fn resumed(&mut self, _event_loop: &ActiveEventLoop) {}

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(&window) = self.by_winit.get(&window_id) else {
            return;
        };
        let Some(entry) = self.windows.get_mut(&window) else {
            return;
        };

        let record = match event {
            WindowEvent::CloseRequested => window_record(window, window_event::CLOSE, 0, 0),
            WindowEvent::Resized(size) => {
                entry.gpu.resize(size);
                window_record(window, window_event::RESIZED, clamp_i32(size.width), clamp_i32(size.height))
            }
            WindowEvent::Moved(pos) => window_record(window, window_event::MOVED, pos.x, pos.y),
            WindowEvent::Focused(true) => window_record(window, window_event::FOCUS_GAINED, 0, 0),
            WindowEvent::Focused(false) => window_record(window, window_event::FOCUS_LOST, 0, 0),
            WindowEvent::CursorEntered { .. } => window_record(window, window_event::ENTER, 0, 0),
            WindowEvent::CursorLeft { .. } => window_record(window, window_event::LEAVE, 0, 0),
            WindowEvent::Occluded(true) => window_record(window, window_event::HIDDEN, 0, 0),
            WindowEvent::Occluded(false) => window_record(window, window_event::SHOWN, 0, 0),
            WindowEvent::CursorMoved { position, .. } => {
                entry.cursor = (position.x as i32, position.y as i32);
                NativeEvent::MouseMotion {
                    window,
                    x: entry.cursor.0,
                    y: entry.cursor.1,
                }
            }
            WindowEvent::MouseInput { state, button, .. } => NativeEvent::MouseButton {
                window,
                button: map_button(button),
                pressed: state == ElementState::Pressed,
                x: entry.cursor.0,
                y: entry.cursor.1,
            },
            WindowEvent::KeyboardInput { event, .. } => NativeEvent::Key {
                window,
                keycode: map_key(event.physical_key),
                pressed: event.state == ElementState::Pressed,
                repeat: event.repeat,
            },
            _ => return,
        };
        self.pending.push_back(record);
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.pending.push_back(NativeEvent::Other { kind: QUIT });
    }
}

fn window_record(window: NativeWindowId, kind: u8, data1: i32, data2: i32) -> NativeEvent {
    NativeEvent::Window {
        window,
        kind,
        data1,
        data2,
    }
}

fn clamp_i32(v: u32) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}

fn map_button(button: MouseButton) -> u8 {
    match button {
        MouseButton::Left => mouse_button::LEFT,
        MouseButton::Middle => mouse_button::MIDDLE,
        MouseButton::Right => mouse_button::RIGHT,
        MouseButton::Back => mouse_button::X1,
        MouseButton::Forward => mouse_button::X2,
        MouseButton::Other(_) => mouse_button::UNKNOWN,
    }
}

/// Layout-independent key code: letters and digits as lowercase ASCII, the rest from
/// the named table.
fn map_key(key: PhysicalKey) -> u32 {
    let PhysicalKey::Code(code) = key else {
        return keycode::UNKNOWN;
    };

    const LETTERS: [KeyCode; 26] = [
        KeyCode::KeyA, KeyCode::KeyB, KeyCode::KeyC, KeyCode::KeyD, KeyCode::KeyE,
        KeyCode::KeyF, KeyCode::KeyG, KeyCode::KeyH, KeyCode::KeyI, KeyCode::KeyJ,
        KeyCode::KeyK, KeyCode::KeyL, KeyCode::KeyM, KeyCode::KeyN, KeyCode::KeyO,
        KeyCode::KeyP, KeyCode::KeyQ, KeyCode::KeyR, KeyCode::KeyS, KeyCode::KeyT,
        KeyCode::KeyU, KeyCode::KeyV, KeyCode::KeyW, KeyCode::KeyX, KeyCode::KeyY,
        KeyCode::KeyZ,
    ];
    const DIGITS: [KeyCode; 10] = [
        KeyCode::Digit0, KeyCode::Digit1, KeyCode::Digit2, KeyCode::Digit3, KeyCode::Digit4,
        KeyCode::Digit5, KeyCode::Digit6, KeyCode::Digit7, KeyCode::Digit8, KeyCode::Digit9,
    ];

    if let Some(i) = LETTERS.iter().position(|k| *k == code) {
        return 'a' as u32 + i as u32;
    }
    if let Some(i) = DIGITS.iter().position(|k| *k == code) {
        return '0' as u32 + i as u32;
    }

    match code {
        KeyCode::Enter | KeyCode::NumpadEnter => keycode::RETURN,
        KeyCode::Space => keycode::SPACE,
        KeyCode::Backspace => keycode::BACKSPACE,
        KeyCode::Delete => keycode::DELETE,
        KeyCode::Tab => keycode::TAB,
        KeyCode::Escape => keycode::ESCAPE,
        KeyCode::ArrowUp => keycode::UP,
        KeyCode::ArrowDown => keycode::DOWN,
        KeyCode::ArrowLeft => keycode::LEFT,
        KeyCode::ArrowRight => keycode::RIGHT,
        KeyCode::ShiftLeft => keycode::LSHIFT,
        KeyCode::ShiftRight => keycode::RSHIFT,
        KeyCode::ControlLeft => keycode::LCTRL,
        KeyCode::F1 => keycode::F1,
        _ => keycode::UNKNOWN,
    }
}
