//! Fixed-size ring buffer backing a stream's history.
//!
//! Oldest entries are overwritten first once the buffer is full. Positions
//! are logical: `0` is always the oldest retained entry.

pub(crate) struct History<T> {
    slots: Vec<Option<T>>,
    head: usize,
    len: usize,
}

impl<T> History<T> {
    /// `capacity` must be non-zero; [`Stream`](crate::Stream) checks this.
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Append, evicting the oldest entry when full.
    pub(crate) fn push(&mut self, item: T) {
        let capacity = self.capacity();
        if self.len == capacity {
            self.slots[self.head] = Some(item);
            self.head = (self.head + 1) % capacity;
        } else {
            let tail = (self.head + self.len) % capacity;
            self.slots[tail] = Some(item);
            self.len += 1;
        }
    }

    pub(crate) fn get(&self, position: usize) -> Option<&T> {
        if position >= self.len {
            return None;
        }
        self.slots[self.physical(position)].as_ref()
    }

    /// Keep the first `keep` entries, drop everything after them.
    pub(crate) fn truncate(&mut self, keep: usize) {
        for position in keep..self.len {
            let slot = self.physical(position);
            self.slots[slot] = None;
        }
        self.len = self.len.min(keep);
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        (0..self.len).filter_map(move |position| self.get(position))
    }

    fn physical(&self, position: usize) -> usize {
        (self.head + position) % self.capacity()
    }
}
