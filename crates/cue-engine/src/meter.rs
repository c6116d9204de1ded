//! Bar numbering from meter changes.
//!
//! A bar lasts `numerator * 4 / denominator` beats. Bars are counted from
//! beat 0 in 4/4 until the first meter change; each change applies from its
//! own beat onward, so a change off a bar line starts a fractional bar count.

use alloc::vec::Vec;
use cue_ir::{Event, EventPayload};

/// A meter in force from `beat`, along with the bar count reached there.
#[derive(Clone, Copy, Debug, PartialEq)]
struct MeterSpan {
    beat: f64,
    bar: f64,
    bar_length: f64,
}

/// Beat to bar conversion over a list of meter changes.
#[derive(Clone, Debug)]
pub struct MeterMap {
    /// Ordered by beat. The first span is the implicit 4/4 at beat 0.
    spans: Vec<MeterSpan>,
}

/// Length of a bar in beats.
pub fn bar_length(numerator: u8, denominator: u8) -> f64 {
    f64::from(numerator) * 4.0 / f64::from(denominator)
}

impl Default for MeterMap {
    fn default() -> Self {
        Self::new()
    }
}

impl MeterMap {
    pub fn new() -> Self {
        let mut spans = Vec::with_capacity(1);
        spans.push(MeterSpan { beat: 0.0, bar: 0.0, bar_length: 4.0 });
        Self { spans }
    }

    /// Build from a raw sequence, keeping only meter events.
    pub fn from_sequence<'a>(sequence: impl IntoIterator<Item = &'a Event>) -> Self {
        let mut map = Self::new();
        let mut meters: Vec<&Event> = sequence
            .into_iter()
            .filter(|e| matches!(e.payload, EventPayload::Meter { .. }))
            .collect();
        meters.sort_by(|a, b| a.position.total_cmp(&b.position));
        for event in meters {
            map.push(event);
        }
        map
    }

    /// Apply a meter event. Other events are ignored.
    ///
    /// The change is inserted in beat order and replaces one already at the
    /// same beat. Later changes are kept, with their bar numbers recounted.
    pub fn push(&mut self, event: &Event) {
        let EventPayload::Meter { numerator, denominator } = event.payload else {
            return;
        };
        let beat = event.position.max(0.0);
        let bar_length = bar_length(numerator, denominator);

        let index = self.spans.partition_point(|s| s.beat < beat);
        match self.spans.get_mut(index) {
            Some(span) if span.beat == beat => span.bar_length = bar_length,
            _ => self.spans.insert(index, MeterSpan { beat, bar: 0.0, bar_length }),
        }
        self.recount(index.max(1));
    }

    /// Recompute the bar reached at each span from `from` onward.
    fn recount(&mut self, from: usize) {
        for i in from..self.spans.len() {
            let prev = self.spans[i - 1];
            let span = &mut self.spans[i];
            span.bar = prev.bar + (span.beat - prev.beat) / prev.bar_length;
        }
    }

    /// Number of meters in force over the timeline, counting the initial one.
    pub fn meter_count(&self) -> usize {
        self.spans.len()
    }

    /// Bar number (zero based, fractional) at `beat`.
    pub fn bar_at_beat(&self, beat: f64) -> f64 {
        let index = self.spans.partition_point(|s| s.beat <= beat).max(1) - 1;
        let span = self.spans[index];
        span.bar + (beat - span.beat) / span.bar_length
    }

    /// Beat at which `bar` starts.
    pub fn beat_at_bar(&self, bar: f64) -> f64 {
        let index = self.spans.partition_point(|s| s.bar <= bar).max(1) - 1;
        let span = self.spans[index];
        span.beat + (bar - span.bar) * span.bar_length
    }

    /// Bar length in beats at `beat`.
    pub fn bar_length_at(&self, beat: f64) -> f64 {
        let index = self.spans.partition_point(|s| s.beat <= beat).max(1) - 1;
        self.spans[index].bar_length
    }
}
