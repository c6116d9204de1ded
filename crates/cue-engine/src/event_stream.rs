//! Non-rate, non-param events with note splitting.
//!
//! `note` events are decomposed into a `noteon` at the note position and a
//! `noteoff` at `position + duration`. The split happens when the note is
//! shifted; the noteoff is parked in a second queue and merged back in
//! position order.

use cue_ir::{Event, EventKind, EventPayload};

use crate::event_queue::OrderedEventQueue;

/// The "other events" queue of a stream.
#[derive(Clone, Debug, Default)]
pub struct EventStream {
    queue: OrderedEventQueue,
    noteoffs: OrderedEventQueue,
}

impl EventStream {
    /// Build from a raw sequence, keeping everything except rate and param events.
    pub fn from_sequence<'a>(sequence: impl IntoIterator<Item = &'a Event>) -> Self {
        let queue = OrderedEventQueue::from_unsorted(
            sequence
                .into_iter()
                .filter(|e| !matches!(e.kind(), EventKind::Rate | EventKind::Param))
                .cloned(),
        );
        let mut noteoffs = OrderedEventQueue::new();
        noteoffs.reserve(queue.iter().filter(|e| e.kind() == EventKind::Note).count());
        Self { queue, noteoffs }
    }

    /// Insert an event in position order.
    pub fn push(&mut self, event: Event) {
        if event.kind() == EventKind::Note {
            self.noteoffs.reserve(1);
        }
        self.queue.push(event);
    }

    /// Position of the next event [`shift`](Self::shift) will return.
    pub fn peek_position(&self) -> Option<f64> {
        match (self.queue.peek_position(), self.noteoffs.peek_position()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Remove and return the earliest event, splitting notes.
    ///
    /// A parked noteoff at the same position as the next queued event goes
    /// first, so a retriggered pitch is released before it sounds again. A
    /// note's own noteoff is parked only when the note is shifted, so it
    /// always follows its noteon.
    pub fn shift(&mut self) -> Option<Event> {
        let noteoff_first = match (self.queue.peek_position(), self.noteoffs.peek_position()) {
            (Some(next), Some(off)) => off <= next,
            (None, Some(_)) => true,
            _ => false,
        };
        if noteoff_first {
            return self.noteoffs.shift();
        }

        let event = self.queue.shift()?;
        match event.payload {
            EventPayload::Note { number, velocity, duration } => {
                self.noteoffs.push(Event::note_off(event.position + duration, number));
                Some(Event::note_on(event.position, number, velocity))
            }
            _ => Some(event),
        }
    }

    /// Events still waiting, counting parked noteoffs.
    pub fn len(&self) -> usize {
        self.queue.len() + self.noteoffs.len()
    }

    /// Returns true if nothing is left to shift.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty() && self.noteoffs.is_empty()
    }
}
