//! Position-ordered queue for scheduled events.

use alloc::collections::VecDeque;
use alloc::vec::Vec;
use cue_ir::Event;

/// Anything that sits at a beat position in a queue.
pub trait Timed {
    /// Beat position used for ordering.
    fn position(&self) -> f64;
}

impl Timed for Event {
    fn position(&self) -> f64 {
        self.position
    }
}

/// A queue of items sorted by position, earliest first.
///
/// Items at equal positions keep their insertion order. Sequence streams are
/// nearly sorted in practice, so `push` is a binary search plus a short
/// shift rather than a re-sort.
#[derive(Clone, Debug)]
pub struct OrderedEventQueue<T = Event> {
    items: VecDeque<T>,
}

impl<T> Default for OrderedEventQueue<T> {
    fn default() -> Self {
        Self { items: VecDeque::new() }
    }
}

impl<T: Timed> OrderedEventQueue<T> {
    /// Create a new empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a queue from an unordered collection, sorting once.
    pub fn from_unsorted(items: impl IntoIterator<Item = T>) -> Self {
        let mut items: Vec<T> = items.into_iter().collect();
        // Stable, so equal positions keep source order
        items.sort_by(|a, b| a.position().total_cmp(&b.position()));
        Self { items: items.into() }
    }

    /// Insert an item after every queued item at the same or earlier position.
    pub fn push(&mut self, item: T) {
        let position = item.position();
        let index = self.items.partition_point(|queued| queued.position() <= position);
        self.items.insert(index, item);
    }

    /// Peek at the earliest item without removing it.
    pub fn peek(&self) -> Option<&T> {
        self.items.front()
    }

    /// Mutable access to the earliest item.
    pub fn peek_mut(&mut self) -> Option<&mut T> {
        self.items.front_mut()
    }

    /// Position of the earliest item.
    pub fn peek_position(&self) -> Option<f64> {
        self.items.front().map(Timed::position)
    }

    /// Remove and return the earliest item.
    pub fn shift(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    /// Make room for `additional` pushes without reallocating.
    pub fn reserve(&mut self, additional: usize) {
        self.items.reserve(additional);
    }

    /// Clear all items.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Returns true if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the number of items in the queue.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Iterate in position order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}
