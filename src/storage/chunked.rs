//! Chunked Growable Array
//!
//! Append-only writer over a linked list of fragments. Appending the last
//! slot of a fragment advances immediately to the next one (reusing an
//! existing link after `rewind`, allocating otherwise), so the write cursor
//! always sits on a slot with room. Only this writer publishes slots;
//! readers follow behind it without locking.

use std::sync::Arc;

use super::fragment::{Fragment, Position};
use crate::error::Channel;

/// Single-writer chunked array for one channel
#[derive(Debug)]
pub struct ChunkedArray<T> {
    head: Arc<Fragment<T>>,
    current: Arc<Fragment<T>>,
    index: usize,
    capacity: usize,
    /// Fragments in use during the current pass
    fragments: usize,
    channel: Channel,
}

impl<T> ChunkedArray<T> {
    /// Create an array whose fragments hold `capacity` values each
    pub fn new(channel: Channel, capacity: usize) -> Self {
        let head = Fragment::new(capacity);
        Self {
            current: Arc::clone(&head),
            head,
            index: 0,
            capacity,
            fragments: 1,
            channel,
        }
    }

    /// Append one value, returning the position it was written to
    pub fn append(&mut self, value: T) -> Position<T> {
        let written = self.position();
        self.current.publish(self.index, value);
        self.index += 1;
        if self.index == self.capacity {
            self.advance();
        }
        written
    }

    /// Append a run that fits in the current fragment
    ///
    /// Callers check `remaining()` first; a run is never split across
    /// fragments.
    pub fn append_run(&mut self, values: &[T]) -> Position<T>
    where
        T: Clone,
    {
        debug_assert!(values.len() <= self.remaining());
        let written = self.position();
        if values.is_empty() {
            return written;
        }
        for (offset, value) in values.iter().enumerate() {
            self.current.publish(self.index + offset, value.clone());
        }
        self.index += values.len();
        if self.index == self.capacity {
            self.advance();
        }
        written
    }

    /// Move to the next fragment, abandoning any free slots in this one
    ///
    /// Returns the new write position.
    pub fn advance(&mut self) -> Position<T> {
        let next = self.current.next_or_link();
        debug_assert!(next.is_empty());
        self.current = next;
        self.index = 0;
        self.fragments += 1;
        tracing::trace!(
            channel = %self.channel,
            fragments = self.fragments,
            "advanced to next fragment"
        );
        self.position()
    }

    /// Rewind to the first fragment so the storage can be refilled
    ///
    /// Fragments no position still references are cleared and their links
    /// followed again. A shared head is left to its holders and replaced, so
    /// positions from the earlier pass keep reading the earlier pass.
    pub fn rewind(&mut self) {
        // Let go of the write fragment so the head can be unshared
        self.current = Fragment::new(0);
        if !Fragment::reclaim(&mut self.head) {
            tracing::trace!(channel = %self.channel, "head still referenced, allocating");
            self.head = Fragment::new(self.capacity);
        }
        self.current = Arc::clone(&self.head);
        self.index = 0;
        self.fragments = 1;
    }

    /// Position of the first slot of this pass
    pub fn start(&self) -> Position<T> {
        Position {
            fragment: Arc::clone(&self.head),
            index: 0,
        }
    }

    /// Current write position
    #[inline]
    pub fn position(&self) -> Position<T> {
        Position {
            fragment: Arc::clone(&self.current),
            index: self.index,
        }
    }

    #[inline]
    pub fn current_fragment(&self) -> &Arc<Fragment<T>> {
        &self.current
    }

    #[inline]
    pub fn current_index(&self) -> usize {
        self.index
    }

    /// Free slots left in the current fragment
    #[inline]
    pub fn remaining(&self) -> usize {
        self.capacity - self.index
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn fragments(&self) -> usize {
        self.fragments
    }

    #[inline]
    pub fn channel(&self) -> Channel {
        self.channel
    }
}
