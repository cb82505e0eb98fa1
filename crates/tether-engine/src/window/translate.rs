use crossbeam_channel::TrySendError;

use crate::input::{Event, Key, PointerButton};
use crate::native::{keycode, mouse_button, window_event, NativeEvent};

use super::{WindowRegistry, WindowSlot};

/// Converts native records into typed [`Event`]s and routes them to window queues.
pub struct EventTranslator;

impl EventTranslator {
    /// Typed event for `record`, or `None` when the record is not modeled.
    pub fn translate(record: &NativeEvent) -> Option<Event> {
        match *record {
            NativeEvent::Key { repeat: true, .. } => None,
            NativeEvent::Key { keycode, pressed, .. } => {
                let key = map_key(keycode)?;
                Some(if pressed { Event::KeyDown(key) } else { Event::KeyUp(key) })
            }

            NativeEvent::MouseButton { button, pressed, x, y, .. } => {
                let button = map_button(button)?;
                Some(if pressed {
                    Event::PointerDown { button, x, y }
                } else {
                    Event::PointerUp { button, x, y }
                })
            }

            NativeEvent::MouseMotion { x, y, .. } => Some(Event::PointerMove { x, y }),

            NativeEvent::Window { kind, data1, data2, .. } => match kind {
                window_event::RESIZED | window_event::SIZE_CHANGED => Some(Event::Resize {
                    width: data1.max(0) as u32,
                    height: data2.max(0) as u32,
                }),
                window_event::CLOSE => Some(Event::Close),
                window_event::ENTER => Some(Event::PointerEnter),
                window_event::LEAVE => Some(Event::PointerLeave),
                window_event::FOCUS_GAINED => Some(Event::FocusGained),
                window_event::FOCUS_LOST => Some(Event::FocusLost),
                _ => None,
            },

            NativeEvent::Other { .. } => None,
        }
    }

    /// Routes `record` to its window's queue. Returns whether an event was accepted.
    ///
    /// A resize updates the window's cached size before the event is queued. Never
    /// blocks: when the queue is full the event waits in the window's backlog behind
    /// anything already held there, and consecutive pointer motion collapses into the
    /// latest position.
    pub fn deliver(registry: &WindowRegistry, record: &NativeEvent) -> bool {
        let Some(window) = record.window() else {
            log::trace!("dropping non-window record {record:?}");
            return false;
        };
        let Some(slot) = registry.lookup(window) else {
            log::trace!("dropping record for unknown {window}: {record:?}");
            return false;
        };
        let Some(event) = Self::translate(record) else {
            return false;
        };

        if let Event::Resize { width, height } = event {
            slot.shared().set_size((width, height));
        }

        if !flush_backlog(slot) {
            return hold(slot, event);
        }
        match slot.sender().try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => hold(slot, event),
            Err(TrySendError::Disconnected(event)) => {
                log::trace!("{window}: handle gone, dropping {event:?}");
                false
            }
        }
    }

    /// Moves backlogged events into every window queue that has room again.
    pub fn flush(registry: &WindowRegistry) {
        for slot in registry.slots() {
            flush_backlog(slot);
        }
    }
}

/// Sends as much of the backlog as fits. Returns whether the backlog is now empty.
fn flush_backlog(slot: &WindowSlot) -> bool {
    let mut backlog = slot.backlog();
    while let Some(event) = backlog.pop_front() {
        match slot.sender().try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                backlog.push_front(event);
                return false;
            }
            Err(TrySendError::Disconnected(_)) => {
                backlog.clear();
                return true;
            }
        }
    }
    true
}

fn hold(slot: &WindowSlot, event: Event) -> bool {
    let mut backlog = slot.backlog();
    if matches!(event, Event::PointerMove { .. })
        && let Some(last) = backlog.back_mut()
        && matches!(last, Event::PointerMove { .. })
    {
        *last = event;
        return true;
    }
    if backlog.is_empty() {
        log::warn!("{}: event queue full, holding events until it drains", slot.shared().id());
    }
    backlog.push_back(event);
    true
}

fn map_key(code: u32) -> Option<Key> {
    if let Some(c) = char::from_u32(code).filter(char::is_ascii_alphanumeric) {
        return Key::from_ascii(c);
    }
    match code {
        keycode::RETURN => Some(Key::Enter),
        keycode::SPACE => Some(Key::Space),
        keycode::UP => Some(Key::ArrowUp),
        keycode::DOWN => Some(Key::ArrowDown),
        keycode::LEFT => Some(Key::ArrowLeft),
        keycode::RIGHT => Some(Key::ArrowRight),
        keycode::LSHIFT => Some(Key::LeftShift),
        keycode::RSHIFT => Some(Key::RightShift),
        keycode::BACKSPACE => Some(Key::Backspace),
        keycode::DELETE => Some(Key::Delete),
        _ => None,
    }
}

fn map_button(button: u8) -> Option<PointerButton> {
    match button {
        mouse_button::LEFT => Some(PointerButton::Left),
        mouse_button::MIDDLE => Some(PointerButton::Middle),
        mouse_button::RIGHT => Some(PointerButton::Right),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crossbeam_channel::Receiver;

    use super::*;
    use crate::native::NativeWindowId;
    use crate::window::{WindowShared, WindowSlot};

    const W: NativeWindowId = NativeWindowId(7);

    fn registry_with(ids: &[u32], capacity: usize) -> (WindowRegistry, Vec<Receiver<Event>>) {
        let mut reg = WindowRegistry::new();
        let mut queues = Vec::new();
        for &id in ids {
            let (tx, rx) = crossbeam_channel::bounded(capacity);
            let shared = Arc::new(WindowShared::new(NativeWindowId(id), "t", (640, 480)));
            reg.register(NativeWindowId(id), WindowSlot::new(shared, tx));
            queues.push(rx);
        }
        (reg, queues)
    }

    fn key(keycode: u32, pressed: bool, repeat: bool) -> NativeEvent {
        NativeEvent::Key {
            window: W,
            keycode,
            pressed,
            repeat,
        }
    }

    fn win(kind: u8, data1: i32, data2: i32) -> NativeEvent {
        NativeEvent::Window {
            window: W,
            kind,
            data1,
            data2,
        }
    }

    // ── translate ─────────────────────────────────────────────────────────

    #[test]
    fn letters_and_digits_keep_their_character() {
        for c in ['a', 'z', 'A', 'Z', '0', '9'] {
            assert_eq!(
                EventTranslator::translate(&key(c as u32, true, false)),
                Some(Event::KeyDown(Key::Char(c)))
            );
        }
        assert_eq!(
            EventTranslator::translate(&key('q' as u32, false, false)),
            Some(Event::KeyUp(Key::Char('q')))
        );
    }

    #[test]
    fn named_keys_follow_the_table() {
        let table = [
            (keycode::RETURN, Key::Enter),
            (keycode::SPACE, Key::Space),
            (keycode::UP, Key::ArrowUp),
            (keycode::DOWN, Key::ArrowDown),
            (keycode::LEFT, Key::ArrowLeft),
            (keycode::RIGHT, Key::ArrowRight),
            (keycode::LSHIFT, Key::LeftShift),
            (keycode::RSHIFT, Key::RightShift),
            (keycode::BACKSPACE, Key::Backspace),
            (keycode::DELETE, Key::Delete),
        ];
        for (code, expected) in table {
            assert_eq!(EventTranslator::translate(&key(code, true, false)), Some(Event::KeyDown(expected)));
        }
    }

    #[test]
    fn unmapped_keys_produce_nothing() {
        for code in [keycode::TAB, keycode::ESCAPE, keycode::F1, keycode::LCTRL, keycode::UNKNOWN, '!' as u32] {
            assert_eq!(EventTranslator::translate(&key(code, true, false)), None);
        }
    }

    #[test]
    fn key_repeat_is_suppressed() {
        assert_eq!(EventTranslator::translate(&key('a' as u32, true, true)), None);
        assert_eq!(EventTranslator::translate(&key(keycode::RETURN, false, true)), None);
    }

    #[test]
    fn mouse_buttons_map_left_middle_right() {
        let rec = |button, pressed| NativeEvent::MouseButton {
            window: W,
            button,
            pressed,
            x: 3,
            y: 4,
        };
        assert_eq!(
            EventTranslator::translate(&rec(mouse_button::LEFT, true)),
            Some(Event::PointerDown { button: PointerButton::Left, x: 3, y: 4 })
        );
        assert_eq!(
            EventTranslator::translate(&rec(mouse_button::MIDDLE, false)),
            Some(Event::PointerUp { button: PointerButton::Middle, x: 3, y: 4 })
        );
        assert_eq!(
            EventTranslator::translate(&rec(mouse_button::RIGHT, true)),
            Some(Event::PointerDown { button: PointerButton::Right, x: 3, y: 4 })
        );
        assert_eq!(EventTranslator::translate(&rec(mouse_button::X1, true)), None);
    }

    #[test]
    fn window_kinds() {
        assert_eq!(EventTranslator::translate(&win(window_event::CLOSE, 0, 0)), Some(Event::Close));
        assert_eq!(EventTranslator::translate(&win(window_event::ENTER, 0, 0)), Some(Event::PointerEnter));
        assert_eq!(EventTranslator::translate(&win(window_event::LEAVE, 0, 0)), Some(Event::PointerLeave));
        assert_eq!(EventTranslator::translate(&win(window_event::FOCUS_GAINED, 0, 0)), Some(Event::FocusGained));
        assert_eq!(EventTranslator::translate(&win(window_event::FOCUS_LOST, 0, 0)), Some(Event::FocusLost));
        assert_eq!(
            EventTranslator::translate(&win(window_event::SIZE_CHANGED, -5, 9)),
            Some(Event::Resize { width: 0, height: 9 })
        );
        for kind in [window_event::SHOWN, window_event::MOVED, window_event::MINIMIZED, 200] {
            assert_eq!(EventTranslator::translate(&win(kind, 1, 1)), None);
        }
        assert_eq!(EventTranslator::translate(&NativeEvent::Other { kind: 0x100 }), None);
    }

    // ── deliver ───────────────────────────────────────────────────────────

    #[test]
    fn key_down_reaches_only_its_window() {
        let (reg, queues) = registry_with(&[3, 7, 9], 8);

        assert!(EventTranslator::deliver(&reg, &key('A' as u32, true, false)));

        assert_eq!(queues[1].try_recv().unwrap(), Event::KeyDown(Key::Char('A')));
        assert!(queues[1].try_recv().is_err());
        assert!(queues[0].try_recv().is_err());
        assert!(queues[2].try_recv().is_err());
    }

    #[test]
    fn unrecognized_button_enqueues_nothing() {
        let (reg, queues) = registry_with(&[7], 8);
        let side = NativeEvent::MouseButton {
            window: W,
            button: mouse_button::X2,
            pressed: true,
            x: 0,
            y: 0,
        };

        assert!(!EventTranslator::deliver(&reg, &side));
        assert!(queues[0].try_recv().is_err());
    }

    #[test]
    fn resize_updates_size_before_the_event_is_visible() {
        let (reg, queues) = registry_with(&[7], 8);
        let shared = reg.lookup(W).unwrap().shared().clone();

        for (w, h) in [(800, 600), (0, 0), (i32::MAX, i32::MAX)] {
            EventTranslator::deliver(&reg, &win(window_event::RESIZED, w, h));
            let event = queues[0].try_recv().unwrap();
            assert_eq!(event, Event::Resize { width: w as u32, height: h as u32 });
            assert_eq!(shared.size(), (w as u32, h as u32));
        }
    }

    #[test]
    fn close_enqueues_exactly_one_close() {
        let (reg, queues) = registry_with(&[7], 8);
        assert!(EventTranslator::deliver(&reg, &win(window_event::CLOSE, 0, 0)));

        assert_eq!(queues[0].try_recv().unwrap(), Event::Close);
        assert!(queues[0].try_recv().is_err());
        assert!(reg.lookup(W).is_some());
    }

    #[test]
    fn records_for_unregistered_windows_are_dropped() {
        let (mut reg, queues) = registry_with(&[7], 8);
        let _slot = reg.unregister(W);

        assert!(!EventTranslator::deliver(&reg, &key('a' as u32, true, false)));
        assert!(queues[0].try_recv().is_err());
    }

    #[test]
    fn per_window_order_is_preserved() {
        let (reg, queues) = registry_with(&[7], 8);
        let seq = [
            key('a' as u32, true, false),
            NativeEvent::MouseMotion { window: W, x: 1, y: 2 },
            key('a' as u32, false, false),
        ];
        for r in &seq {
            EventTranslator::deliver(&reg, r);
        }
        let got: Vec<_> = queues[0].try_iter().collect();
        assert_eq!(
            got,
            vec![
                Event::KeyDown(Key::Char('a')),
                Event::PointerMove { x: 1, y: 2 },
                Event::KeyUp(Key::Char('a')),
            ]
        );
    }

    #[test]
    fn full_queue_holds_close_and_resize_in_order() {
        let (reg, queues) = registry_with(&[7], 2);
        let shared = reg.lookup(W).unwrap().shared().clone();
        let motion = |x| NativeEvent::MouseMotion { window: W, x, y: x };

        assert!(EventTranslator::deliver(&reg, &motion(0)));
        assert!(EventTranslator::deliver(&reg, &motion(1)));
        assert!(EventTranslator::deliver(&reg, &win(window_event::RESIZED, 10, 20)));
        assert!(EventTranslator::deliver(&reg, &win(window_event::CLOSE, 0, 0)));

        // Size is current even though the event is still waiting.
        assert_eq!(shared.size(), (10, 20));
        assert_eq!(reg.lookup(W).unwrap().backlog_len(), 2);

        let mut got: Vec<_> = queues[0].try_iter().collect();
        EventTranslator::flush(&reg);
        got.extend(queues[0].try_iter());

        assert_eq!(
            got,
            vec![
                Event::PointerMove { x: 0, y: 0 },
                Event::PointerMove { x: 1, y: 1 },
                Event::Resize { width: 10, height: 20 },
                Event::Close,
            ]
        );
        assert_eq!(reg.lookup(W).unwrap().backlog_len(), 0);
    }

    #[test]
    fn held_pointer_motion_collapses_to_the_latest_position() {
        let (reg, queues) = registry_with(&[7], 1);
        let motion = |x| NativeEvent::MouseMotion { window: W, x, y: 0 };

        EventTranslator::deliver(&reg, &key('a' as u32, true, false));
        for x in 1..=5 {
            assert!(EventTranslator::deliver(&reg, &motion(x)));
        }
        EventTranslator::deliver(&reg, &key('a' as u32, false, false));
        EventTranslator::deliver(&reg, &motion(6));
        EventTranslator::deliver(&reg, &motion(7));

        let mut got = Vec::new();
        while let Ok(event) = queues[0].try_recv() {
            got.push(event);
            EventTranslator::flush(&reg);
        }
        assert_eq!(
            got,
            vec![
                Event::KeyDown(Key::Char('a')),
                Event::PointerMove { x: 5, y: 0 },
                Event::KeyUp(Key::Char('a')),
                Event::PointerMove { x: 7, y: 0 },
            ]
        );
    }

    #[test]
    fn new_events_queue_behind_the_backlog() {
        let (reg, queues) = registry_with(&[7], 1);

        EventTranslator::deliver(&reg, &key('a' as u32, true, false));
        EventTranslator::deliver(&reg, &key('b' as u32, true, false));
        assert_eq!(queues[0].try_recv().unwrap(), Event::KeyDown(Key::Char('a')));

        // Room again, but 'b' is still held and must go first.
        EventTranslator::deliver(&reg, &key('c' as u32, true, false));
        assert_eq!(queues[0].try_recv().unwrap(), Event::KeyDown(Key::Char('b')));
        EventTranslator::flush(&reg);
        assert_eq!(queues[0].try_recv().unwrap(), Event::KeyDown(Key::Char('c')));
    }

    #[test]
    fn backlog_is_discarded_once_the_handle_is_gone() {
        let (reg, mut queues) = registry_with(&[7], 1);

        EventTranslator::deliver(&reg, &key('a' as u32, true, false));
        EventTranslator::deliver(&reg, &key('b' as u32, true, false));
        drop(queues.pop());

        EventTranslator::flush(&reg);
        assert_eq!(reg.lookup(W).unwrap().backlog_len(), 0);
        assert!(!EventTranslator::deliver(&reg, &key('c' as u32, true, false)));
    }
}
