//! Beat/time conversion over a lazily built breakpoint cache.
//!
//! Rate events are kept in a pending queue. Breakpoints are computed only as
//! conversions walk past them: each one records the time at which its rate
//! event is reached, found by converting the beat distance from the previous
//! breakpoint through that segment's curve. Rate events at one beat share a
//! single breakpoint, so breakpoint times strictly ascend. Rate events seen
//! so far are remembered so the cache can be rebuilt when an earlier rate
//! event is pushed.

use alloc::vec::Vec;
use cue_ir::{CurveKind, Event, EventPayload, RateSegment};

use crate::clock::Clock;
use crate::event_queue::{OrderedEventQueue, Timed};

/// A rate change at a beat.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RateEvent {
    pub beat: f64,
    pub rate: f64,
    /// How the rate moves from the previous rate event to this one.
    pub curve: CurveKind,
}

impl RateEvent {
    /// The implicit rate in force before any rate event.
    pub const INITIAL: RateEvent = RateEvent { beat: 0.0, rate: 1.0, curve: CurveKind::Step };

    /// Extract the rate fields of an event.
    pub fn from_event(event: &Event) -> Option<Self> {
        match event.payload {
            EventPayload::Rate { rate, curve } => Some(Self { beat: event.position, rate, curve }),
            _ => None,
        }
    }
}

impl Timed for RateEvent {
    fn position(&self) -> f64 {
        self.beat
    }
}

/// The rate events at one beat paired with the time at which they are reached.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RateBreakpoint {
    pub time: f64,
    pub beat: f64,
    /// Rate the incoming segment ends on, from the first event at this beat.
    pub arrival: f64,
    /// Rate in force from this beat on, from the last event at this beat.
    pub rate: f64,
    /// Curve of the incoming segment.
    pub curve: CurveKind,
}

impl RateBreakpoint {
    const SEED: RateBreakpoint = RateBreakpoint {
        time: 0.0,
        beat: RateEvent::INITIAL.beat,
        arrival: RateEvent::INITIAL.rate,
        rate: RateEvent::INITIAL.rate,
        curve: RateEvent::INITIAL.curve,
    };

    /// Segment running from this breakpoint towards `next`.
    fn segment_to(&self, next: Option<&RateBreakpoint>) -> RateSegment {
        match next {
            Some(next) => RateSegment::new(self.rate, next.arrival, next.beat - self.beat, next.curve),
            None => RateSegment::step(self.rate),
        }
    }
}

/// Piecewise tempo curve with a lazily populated breakpoint cache.
#[derive(Clone, Debug)]
pub struct TempoMap {
    /// Never empty; starts with the implicit rate 1 at time 0. Times are
    /// non-decreasing: rate events at one beat share a time.
    breakpoints: Vec<RateBreakpoint>,
    /// Rate events not yet turned into breakpoints.
    pending: OrderedEventQueue<RateEvent>,
    /// Every rate event ever added, in beat order.
    history: Vec<RateEvent>,
}

impl Default for TempoMap {
    fn default() -> Self {
        Self::new()
    }
}

impl TempoMap {
    /// Create a tempo map running at rate 1 forever.
    pub fn new() -> Self {
        let mut breakpoints = Vec::with_capacity(1);
        breakpoints.push(RateBreakpoint::SEED);
        Self {
            breakpoints,
            pending: OrderedEventQueue::new(),
            history: Vec::new(),
        }
    }

    /// Build from a raw sequence, keeping only rate events.
    pub fn from_sequence<'a>(sequence: impl IntoIterator<Item = &'a Event>) -> Self {
        let mut map = Self::new();
        let pending = OrderedEventQueue::from_unsorted(sequence.into_iter().filter_map(RateEvent::from_event));
        map.history = pending.iter().copied().collect();
        map.pending = pending;
        map.breakpoints.reserve(map.history.len());
        map.reseed();
        map
    }

    /// Add a rate event.
    ///
    /// An event at or before the last cached breakpoint invalidates the
    /// cache: it is truncated back to the seed and rebuilt lazily from the
    /// full rate history. Returns `true` when that happened.
    pub fn push(&mut self, event: RateEvent) -> bool {
        let index = self.history.partition_point(|e| e.beat <= event.beat);
        self.history.insert(index, event);
        self.breakpoints.reserve(self.history.len() + 1 - self.breakpoints.len());

        if event.beat <= self.last_breakpoint().beat {
            self.rebuild();
            true
        } else {
            self.pending.push(event);
            false
        }
    }

    /// Drop every cached breakpoint and queue the full history again.
    fn rebuild(&mut self) {
        self.pending = OrderedEventQueue::from_unsorted(self.history.iter().copied());
        self.reseed();
    }

    /// Reset the cache to the seed, folding rate events at beat 0 into it.
    fn reseed(&mut self) {
        self.breakpoints.truncate(1);
        self.breakpoints[0] = RateBreakpoint::SEED;
        while self.pending.peek_position().is_some_and(|beat| beat <= 0.0) {
            if let Some(event) = self.pending.shift() {
                self.breakpoints[0].rate = event.rate;
            }
        }
    }

    /// Breakpoints computed so far.
    pub fn breakpoints(&self) -> &[RateBreakpoint] {
        &self.breakpoints
    }

    /// Number of rate events not yet cached.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn last_breakpoint(&self) -> RateBreakpoint {
        // Seeded in `new`, truncated to 1 at the shortest
        self.breakpoints[self.breakpoints.len() - 1]
    }

    /// Breakpoint at `index`, pulling pending rate events into the cache as needed.
    fn breakpoint(&mut self, index: usize) -> Option<RateBreakpoint> {
        if let Some(bp) = self.breakpoints.get(index) {
            return Some(*bp);
        }
        let event = self.pending.shift()?;
        let mut next = RateBreakpoint {
            time: 0.0,
            beat: event.beat,
            arrival: event.rate,
            rate: event.rate,
            curve: event.curve,
        };
        // The last event at a beat governs from there on
        while self.pending.peek_position() == Some(event.beat) {
            if let Some(same) = self.pending.shift() {
                next.rate = same.rate;
            }
        }
        let last = self.last_breakpoint();
        let time = last.time + last.segment_to(Some(&next)).time_at_beat(event.beat - last.beat);
        let bp = RateBreakpoint { time, ..next };
        self.breakpoints.push(bp);
        Some(bp)
    }

    /// Walk breakpoints while `past` says the position lies beyond the next one.
    ///
    /// Returns the breakpoint in force and the one after it, if any.
    fn locate(
        &mut self,
        past: impl Fn(&RateBreakpoint) -> bool,
    ) -> (RateBreakpoint, Option<RateBreakpoint>) {
        let mut index = 0;
        let mut current = self.breakpoints[0];
        loop {
            match self.breakpoint(index + 1) {
                Some(next) if past(&next) => {
                    current = next;
                    index += 1;
                }
                next => return (current, next),
            }
        }
    }

    /// Time at which `beat` is reached.
    pub fn time_at_beat(&mut self, beat: f64) -> f64 {
        let (current, next) = self.locate(|bp| beat > bp.beat);
        current.time + current.segment_to(next.as_ref()).time_at_beat(beat - current.beat)
    }

    /// Beat reached at `time`.
    pub fn beat_at_time(&mut self, time: f64) -> f64 {
        let (current, next) = self.locate(|bp| time > bp.time);
        current.beat + current.segment_to(next.as_ref()).beat_at_time(time - current.time)
    }

    /// Rate in force at `beat`.
    pub fn rate_at_beat(&mut self, beat: f64) -> f64 {
        let (current, next) = self.locate(|bp| beat > bp.beat);
        current.segment_to(next.as_ref()).rate_at_beat(beat - current.beat)
    }
}

impl Clock for TempoMap {
    fn beat_at_time(&mut self, time: f64) -> f64 {
        TempoMap::beat_at_time(self, time)
    }

    fn time_at_beat(&mut self, beat: f64) -> f64 {
        TempoMap::time_at_beat(self, beat)
    }
}
