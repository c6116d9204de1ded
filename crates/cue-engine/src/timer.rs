//! Cue timers: who asked to be cued, and up to what time.

use alloc::vec::Vec;

use crate::StreamKey;

/// Source of cue callbacks.
///
/// Streams request a cue after every cycle while they are started. When the
/// host fires the timer, every requesting stream is handed over once and the
/// request list is cleared.
pub trait Timer {
    /// Ask to be cued on the next fire. Repeated requests coalesce.
    fn request_cue(&mut self, key: StreamKey);

    /// Withdraw a pending request.
    fn cancel_cue(&mut self, key: StreamKey);

    /// End time of the most recent cue window.
    fn last_cue_time(&self) -> f64;

    /// Drain pending requests into `due` and return the end time of the new
    /// cue window.
    fn fire(&mut self, now: f64, due: &mut Vec<StreamKey>) -> f64;

    /// Make room for `streams` concurrent requests.
    fn reserve(&mut self, streams: usize) {
        let _ = streams;
    }
}

/// A timer that cues a fixed lookahead past the host's current time.
#[derive(Clone, Debug)]
pub struct CueTimer {
    lookahead: f64,
    last_cue_time: f64,
    requests: Vec<StreamKey>,
}

impl CueTimer {
    /// Timer with `lookahead` seconds of cue horizon.
    pub fn new(lookahead: f64) -> Self {
        Self {
            lookahead: lookahead.max(0.0),
            last_cue_time: 0.0,
            requests: Vec::new(),
        }
    }

    pub fn lookahead(&self) -> f64 {
        self.lookahead
    }

    /// Returns true if `key` has a pending request.
    pub fn is_requested(&self, key: StreamKey) -> bool {
        self.requests.contains(&key)
    }
}

impl Default for CueTimer {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl Timer for CueTimer {
    fn request_cue(&mut self, key: StreamKey) {
        if !self.requests.contains(&key) {
            self.requests.push(key);
        }
    }

    fn cancel_cue(&mut self, key: StreamKey) {
        self.requests.retain(|k| *k != key);
    }

    fn last_cue_time(&self) -> f64 {
        self.last_cue_time
    }

    fn fire(&mut self, now: f64, due: &mut Vec<StreamKey>) -> f64 {
        // The horizon never moves backwards
        self.last_cue_time = self.last_cue_time.max(now + self.lookahead);
        due.clear();
        due.extend_from_slice(&self.requests);
        self.requests.clear();
        self.last_cue_time
    }

    fn reserve(&mut self, streams: usize) {
        self.requests.reserve(streams.saturating_sub(self.requests.len()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn keys(n: usize) -> Vec<StreamKey> {
        let mut map: SlotMap<StreamKey, ()> = SlotMap::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    #[test]
    fn fire_drains_requests() {
        let k = keys(2);
        let mut timer = CueTimer::new(0.1);
        timer.request_cue(k[0]);
        timer.request_cue(k[1]);
        timer.request_cue(k[0]);

        let mut due = Vec::new();
        let time = timer.fire(1.0, &mut due);
        assert!((time - 1.1).abs() < 1e-12);
        assert_eq!(due, [k[0], k[1]]);
        assert_eq!(timer.last_cue_time(), time);

        timer.fire(2.0, &mut due);
        assert!(due.is_empty());
    }

    #[test]
    fn cancel_removes_request() {
        let k = keys(2);
        let mut timer = CueTimer::default();
        timer.request_cue(k[0]);
        timer.request_cue(k[1]);
        timer.cancel_cue(k[0]);
        assert!(!timer.is_requested(k[0]));

        let mut due = Vec::new();
        timer.fire(0.0, &mut due);
        assert_eq!(due, [k[1]]);
    }

    #[test]
    fn cue_time_is_monotonic() {
        let mut timer = CueTimer::new(0.5);
        let mut due = Vec::new();
        assert_eq!(timer.fire(2.0, &mut due), 2.5);
        assert_eq!(timer.fire(1.0, &mut due), 2.5);
    }
}
