use std::collections::HashMap;
use std::ops::Range;

use super::{BufferId, GraphicsError};

/// Buffer bookkeeping shared by graphics backends.
///
/// Allocates ids, tracks the bound buffer, and validates draw ranges. `T` is the
/// backend's per-buffer storage.
#[derive(Debug)]
pub struct BufferTable<T> {
    next: u32,
    entries: HashMap<BufferId, Entry<T>>,
    bound: Option<BufferId>,
}

#[derive(Debug)]
struct Entry<T> {
    len: u32,
    storage: T,
}

impl<T> BufferTable<T> {
    pub fn new() -> Self {
        Self {
            next: 1,
            entries: HashMap::new(),
            bound: None,
        }
    }

    pub fn insert(&mut self, storage: T) -> BufferId {
        let id = BufferId(self.next);
        self.next += 1;
        self.entries.insert(id, Entry { len: 0, storage });
        id
    }

    pub fn get(&self, id: BufferId) -> Result<&T, GraphicsError> {
        self.entries
            .get(&id)
            .map(|e| &e.storage)
            .ok_or(GraphicsError::UnknownBuffer(id))
    }

    pub fn get_mut(&mut self, id: BufferId) -> Result<&mut T, GraphicsError> {
        self.entries
            .get_mut(&id)
            .map(|e| &mut e.storage)
            .ok_or(GraphicsError::UnknownBuffer(id))
    }

    /// Records the vertex count after an upload.
    pub fn set_len(&mut self, id: BufferId, len: u32) -> Result<(), GraphicsError> {
        let entry = self.entries.get_mut(&id).ok_or(GraphicsError::UnknownBuffer(id))?;
        entry.len = len;
        Ok(())
    }

    pub fn bind(&mut self, id: BufferId) -> Result<(), GraphicsError> {
        if !self.entries.contains_key(&id) {
            return Err(GraphicsError::UnknownBuffer(id));
        }
        self.bound = Some(id);
        Ok(())
    }

    pub fn remove(&mut self, id: BufferId) -> Result<T, GraphicsError> {
        let entry = self.entries.remove(&id).ok_or(GraphicsError::UnknownBuffer(id))?;
        if self.bound == Some(id) {
            self.bound = None;
        }
        Ok(entry.storage)
    }

    /// Resolves the bound buffer for a draw over `range`.
    ///
    /// Returns `Ok(None)` for an empty range (nothing to draw).
    pub fn bound_for_draw(
        &self,
        range: &Range<u32>,
    ) -> Result<Option<(BufferId, &T)>, GraphicsError> {
        let id = self.bound.ok_or(GraphicsError::NoBufferBound)?;
        let entry = self.entries.get(&id).ok_or(GraphicsError::UnknownBuffer(id))?;

        if range.start > range.end || range.end > entry.len {
            return Err(GraphicsError::RangeOutOfBounds {
                range: range.clone(),
                len: entry.len,
            });
        }
        if range.is_empty() {
            return Ok(None);
        }
        Ok(Some((id, &entry.storage)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for BufferTable<T> {
    fn default() -> Self {
        Self::new()
    }
}
