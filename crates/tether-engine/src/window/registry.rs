use std::cell::{RefCell, RefMut};
use std::collections::{HashMap, VecDeque};
use std::marker::PhantomData;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use crossbeam_channel::Sender;
use parking_lot::Mutex;

use crate::input::Event;
use crate::native::NativeWindowId;

/// State shared between a [`Window`](super::Window) handle and its registry slot.
#[derive(Debug)]
pub struct WindowShared {
    id: NativeWindowId,
    title: String,
    /// Written only on the affine thread.
    size: Mutex<(u32, u32)>,
}

impl WindowShared {
    pub fn new(id: NativeWindowId, title: impl Into<String>, size: (u32, u32)) -> Self {
        Self {
            id,
            title: title.into(),
            size: Mutex::new(size),
        }
    }

    #[inline]
    pub fn id(&self) -> NativeWindowId {
        self.id
    }

    #[inline]
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn size(&self) -> (u32, u32) {
        *self.size.lock()
    }

    pub(crate) fn set_size(&self, size: (u32, u32)) {
        *self.size.lock() = size;
    }
}

/// Registry entry: the window's shared state and the producing end of its event queue.
///
/// Events that do not fit the queue wait in a backlog, in order, until the reader
/// catches up.
pub struct WindowSlot {
    shared: Arc<WindowShared>,
    sender: Sender<Event>,
    backlog: RefCell<VecDeque<Event>>,
}

impl WindowSlot {
    pub fn new(shared: Arc<WindowShared>, sender: Sender<Event>) -> Self {
        Self {
            shared,
            sender,
            backlog: RefCell::new(VecDeque::new()),
        }
    }

    pub fn shared(&self) -> &Arc<WindowShared> {
        &self.shared
    }

    pub fn sender(&self) -> &Sender<Event> {
        &self.sender
    }

    /// Number of events held back by a full queue.
    pub fn backlog_len(&self) -> usize {
        self.backlog.borrow().len()
    }

    pub(crate) fn backlog(&self) -> RefMut<'_, VecDeque<Event>> {
        self.backlog.borrow_mut()
    }
}

/// Maps native window ids to their slots.
///
/// Lives on the affine thread. It is neither `Send` nor `Sync`, and debug builds check
/// that every call comes from the thread that created it.
pub struct WindowRegistry {
    slots: HashMap<NativeWindowId, WindowSlot>,
    owner: ThreadId,
    _affine: PhantomData<*const ()>,
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
            owner: thread::current().id(),
            _affine: PhantomData,
        }
    }

    /// # Panics
    /// If `id` is already registered.
    pub fn register(&mut self, id: NativeWindowId, slot: WindowSlot) {
        self.check_thread();
        let previous = self.slots.insert(id, slot);
        assert!(previous.is_none(), "{id} registered twice");
    }

    pub fn lookup(&self, id: NativeWindowId) -> Option<&WindowSlot> {
        self.check_thread();
        self.slots.get(&id)
    }

    /// Removes `id`. Unknown ids are ignored.
    pub fn unregister(&mut self, id: NativeWindowId) -> Option<WindowSlot> {
        self.check_thread();
        self.slots.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> impl Iterator<Item = &WindowSlot> {
        self.check_thread();
        self.slots.values()
    }

    /// Registered ids in ascending order.
    pub fn ids(&self) -> Vec<NativeWindowId> {
        let mut ids: Vec<_> = self.slots.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    #[inline]
    fn check_thread(&self) {
        debug_assert_eq!(
            thread::current().id(),
            self.owner,
            "window registry used off its affine thread"
        );
    }
}

impl Default for WindowRegistry {
    fn default() -> Self {
        Self::new()
    }
}
