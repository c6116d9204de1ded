//! EventPool: reusable dispatch wrappers for the cue path.

use cue_ir::Event;
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Handle to a pooled dispatch wrapper. Stale once the slot is released.
    pub struct CueKey;
}

/// An event wrapped with the absolute time it is dispatched at.
#[derive(Clone, Debug, PartialEq)]
pub struct DispatchedEvent {
    pub time: f64,
    pub event: Event,
}

/// Generational pool of dispatch wrappers.
///
/// Released slots are recycled by later acquisitions, so a stream that stays
/// within its capacity never allocates while cueing.
#[derive(Clone, Debug)]
pub struct EventPool {
    slots: SlotMap<CueKey, DispatchedEvent>,
    capacity: usize,
}

impl EventPool {
    /// Create a pool with `capacity` slots reserved up front.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: SlotMap::with_capacity_and_key(capacity),
            capacity,
        }
    }

    /// Wrap an event for dispatch at `time`.
    ///
    /// Grows past the reserved capacity instead of failing.
    pub fn acquire(&mut self, time: f64, event: Event) -> CueKey {
        self.slots.insert(DispatchedEvent { time, event })
    }

    /// Get a wrapper. Returns `None` for a released handle.
    pub fn get(&self, key: CueKey) -> Option<&DispatchedEvent> {
        self.slots.get(key)
    }

    /// Mark a wrapper idle, invalidating `key`.
    pub fn release(&mut self, key: CueKey) -> Option<DispatchedEvent> {
        self.slots.remove(key)
    }

    /// Release every wrapper.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Returns true if no wrapper is in use.
    pub fn is_idle(&self) -> bool {
        self.slots.is_empty()
    }

    /// Count of wrappers in use.
    pub fn in_use(&self) -> usize {
        self.slots.len()
    }

    /// Slots reserved at construction.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_and_release() {
        let mut pool = EventPool::with_capacity(4);
        let key = pool.acquire(0.5, Event::note_off(1.0, 60));
        assert_eq!(pool.in_use(), 1);
        assert_eq!(pool.get(key).unwrap().time, 0.5);

        let released = pool.release(key).unwrap();
        assert_eq!(released.event, Event::note_off(1.0, 60));
        assert!(pool.is_idle());
    }

    #[test]
    fn released_handle_is_stale() {
        let mut pool = EventPool::with_capacity(1);
        let old = pool.acquire(0.0, Event::note_off(0.0, 60));
        pool.release(old);
        let new = pool.acquire(1.0, Event::note_off(1.0, 61));

        assert!(pool.get(old).is_none());
        assert!(pool.release(old).is_none());
        assert_eq!(pool.get(new).unwrap().time, 1.0);
    }

    #[test]
    fn grows_past_capacity() {
        let mut pool = EventPool::with_capacity(2);
        let keys: [CueKey; 3] = core::array::from_fn(|i| pool.acquire(i as f64, Event::note_off(0.0, 60)));
        assert_eq!(pool.in_use(), 3);
        assert_eq!(pool.capacity(), 2);
        for key in keys {
            pool.release(key);
        }
        assert!(pool.is_idle());
    }
}
