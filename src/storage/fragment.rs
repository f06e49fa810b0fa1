//! Fragment - one fixed-capacity segment of a chunked array
//!
//! Fragments form a singly-linked list. Each slot and the link to the next
//! fragment are set once and never change while the fragment is shared, so
//! readers never lock: a slot read is one atomic load, and any `Position`
//! into a fragment stays valid for as long as the `Arc` is held.

use std::ops::Range;
use std::sync::{Arc, OnceLock};

/// A fixed-capacity segment of channel storage
#[derive(Debug)]
pub struct Fragment<T> {
    /// Write-once slots, filled front to back by the single writer
    slots: Box<[OnceLock<T>]>,
    /// Next fragment, created lazily when this one fills
    next: OnceLock<Arc<Fragment<T>>>,
}

impl<T> Fragment<T> {
    /// Allocate an empty fragment
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Fragment {
            slots: (0..capacity).map(|_| OnceLock::new()).collect(),
            next: OnceLock::new(),
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots written so far
    pub fn len(&self) -> usize {
        self.slots.iter().take_while(|slot| slot.get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.first().map_or(true, |slot| slot.get().is_none())
    }

    /// The linked successor, if one has been created
    #[inline]
    pub fn next(&self) -> Option<&Arc<Fragment<T>>> {
        self.next.get()
    }

    /// Follow the existing link or allocate and link a new fragment
    pub(crate) fn next_or_link(&self) -> Arc<Fragment<T>> {
        Arc::clone(self.next.get_or_init(|| Fragment::new(self.capacity())))
    }

    /// The value at `index`, if it has been written
    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index)?.get()
    }

    /// Clone a run of written values; `None` if any slot is unwritten
    pub(crate) fn cloned_range(&self, range: Range<usize>) -> Option<Vec<T>>
    where
        T: Clone,
    {
        self.slots
            .get(range)?
            .iter()
            .map(|slot| slot.get().cloned())
            .collect()
    }

    /// Store `value` in an unwritten slot
    #[inline]
    pub(crate) fn publish(&self, index: usize, value: T) {
        let stored = self.slots.get(index).map(|slot| slot.set(value).is_ok());
        debug_assert_eq!(stored, Some(true), "slot {} already written", index);
    }

    fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            slot.take();
        }
    }

    /// Empty a chain for reuse, walking from `head`
    ///
    /// Only fragments no view holds are cleared and kept. The chain is cut in
    /// front of the first shared fragment, which stays with its holders
    /// unchanged. Returns false when `head` itself is shared.
    pub(crate) fn reclaim(head: &mut Arc<Fragment<T>>) -> bool {
        let Some(first) = Arc::get_mut(head) else {
            return false;
        };
        first.clear();
        let mut link = &mut first.next;
        loop {
            let unshared = match link.get_mut() {
                Some(next) => Arc::get_mut(next).is_some(),
                None => break,
            };
            if !unshared {
                link.take();
                break;
            }
            let Some(fragment) = link.get_mut().and_then(Arc::get_mut) else {
                break;
            };
            fragment.clear();
            link = &mut fragment.next;
        }
        true
    }
}

/// A stable `(fragment, slot)` reference into a chunked array
#[derive(Debug)]
pub struct Position<T> {
    pub(crate) fragment: Arc<Fragment<T>>,
    pub(crate) index: usize,
}

// Manual impl: cloning a position never requires `T: Clone`
impl<T> Clone for Position<T> {
    fn clone(&self) -> Self {
        Position {
            fragment: Arc::clone(&self.fragment),
            index: self.index,
        }
    }
}

impl<T> Position<T> {
    #[inline]
    pub fn fragment(&self) -> &Arc<Fragment<T>> {
        &self.fragment
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Read the value stored at this position, if it has been written
    pub fn get(&self) -> Option<T>
    where
        T: Clone,
    {
        self.fragment.get(self.index).cloned()
    }

    /// True if both positions name the same slot of the same fragment
    pub fn same_slot(&self, other: &Position<T>) -> bool {
        Arc::ptr_eq(&self.fragment, &other.fragment) && self.index == other.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_is_created_once() {
        let frag: Arc<Fragment<u8>> = Fragment::new(4);
        assert!(frag.next().is_none());

        let a = frag.next_or_link();
        let b = frag.next_or_link();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.capacity(), 4);
    }

    #[test]
    fn test_position_get() {
        let frag: Arc<Fragment<u8>> = Fragment::new(4);
        frag.publish(0, 7);

        let pos = Position {
            fragment: Arc::clone(&frag),
            index: 0,
        };
        assert_eq!(pos.get(), Some(7));
        assert_eq!(frag.len(), 1);

        let unwritten = Position { fragment: frag, index: 1 };
        assert_eq!(unwritten.get(), None);
    }

    #[test]
    fn test_cloned_range_stops_at_unwritten() {
        let frag: Arc<Fragment<u8>> = Fragment::new(4);
        frag.publish(0, b'a');
        frag.publish(1, b'b');
        assert_eq!(frag.cloned_range(0..2), Some(b"ab".to_vec()));
        assert_eq!(frag.cloned_range(1..3), None);
        assert_eq!(frag.cloned_range(3..6), None);
    }

    #[test]
    fn test_reclaim_unshared_chain() {
        let mut head: Arc<Fragment<u8>> = Fragment::new(2);
        head.publish(0, 1);
        let second = head.next_or_link();
        second.publish(0, 2);
        drop(second);

        assert!(Fragment::reclaim(&mut head));
        assert!(head.is_empty());
        let kept = head.next().cloned().unwrap();
        assert!(kept.is_empty());
    }

    #[test]
    fn test_reclaim_leaves_shared_fragments_alone() {
        let mut head: Arc<Fragment<u8>> = Fragment::new(2);
        head.publish(0, 1);
        let held = head.next_or_link();
        held.publish(0, 2);

        assert!(Fragment::reclaim(&mut head));
        assert!(head.next().is_none());
        assert_eq!(held.get(0), Some(&2));

        let view = Arc::clone(&head);
        assert!(!Fragment::reclaim(&mut head));
        drop(view);
    }
}
