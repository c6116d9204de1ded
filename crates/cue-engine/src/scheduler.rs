//! CueScheduler: windowed dispatch of a stream's queued events.
//!
//! Each cue covers the window from the end of the previous one up to the
//! new cue time. Events whose absolute time falls before the window end are
//! shifted out of their queues, wrapped in the pool, staged in time order and
//! handed to the target once each. Parameter ramps are looked at one window
//! ahead so the target can start the ramp before its end value is due.

use alloc::vec::Vec;
use cue_ir::{Event, EventPayload};
use tracing::trace;

use crate::event_stream::EventStream;
use crate::params::ParamGroups;
use crate::pool::{CueKey, EventPool};
use crate::target::{CueWindow, Distribute};
use crate::StreamKey;

/// What a single cue did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CueOutcome {
    /// The cue time did not advance past the previous window.
    Underrun,
    /// A window was processed.
    Cued {
        window: CueWindow,
        dispatched: usize,
        /// The window was clipped at the stream's end time.
        ended: bool,
    },
}

/// Per-stream dispatch state.
#[derive(Clone, Debug)]
pub struct CueScheduler {
    pool: EventPool,
    /// `(time, wrapper)` staged for the current window, ascending by time.
    staged: Vec<(f64, CueKey)>,
    /// Ramps handed over a window early, released once their time passes.
    deferred: Vec<CueKey>,
    /// End of the previous window.
    window_start: f64,
}

impl CueScheduler {
    /// Scheduler reserving `pool_capacity` wrappers and `staging_capacity`
    /// staging slots.
    pub fn new(pool_capacity: usize, staging_capacity: usize) -> Self {
        Self {
            pool: EventPool::with_capacity(pool_capacity),
            staged: Vec::with_capacity(staging_capacity),
            deferred: Vec::with_capacity(staging_capacity),
            window_start: 0.0,
        }
    }

    /// Start of the next window.
    pub fn window_start(&self) -> f64 {
        self.window_start
    }

    /// Begin windows at `time`.
    pub fn reset(&mut self, time: f64) {
        self.window_start = time;
    }

    /// Wrappers currently held, counting deferred ramps.
    pub fn in_flight(&self) -> usize {
        self.pool.in_use()
    }

    /// Returns true once every queued event has been handed over and no
    /// early ramp is still waiting for its window.
    pub fn is_drained(&self, events: &EventStream, params: &ParamGroups) -> bool {
        events.is_empty() && params.is_drained() && self.in_flight() == 0
    }

    /// Number of ramps handed over early and not yet released.
    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }

    fn stage(&mut self, time: f64, event: Event) {
        let key = self.pool.acquire(time, event);
        let index = self.staged.partition_point(|(t, _)| *t <= time);
        self.staged.insert(index, (time, key));
    }

    /// Process the window ending at `until`.
    ///
    /// `to_time` maps a local beat to absolute time. When `end` falls inside
    /// the window, the window is clipped there, events at exactly `end` are
    /// still dispatched, and the outcome is flagged as ended.
    #[allow(clippy::too_many_arguments)]
    pub fn cue(
        &mut self,
        until: f64,
        end: Option<f64>,
        events: &mut EventStream,
        params: &mut ParamGroups,
        to_time: &mut dyn FnMut(f64) -> f64,
        target: &mut dyn Distribute,
        stream: StreamKey,
    ) -> CueOutcome {
        let start = self.window_start;
        if until <= start {
            trace!(?stream, start, until, "cue underrun");
            return CueOutcome::Underrun;
        }

        let (until, ended) = match end {
            Some(end) if end <= until => (end.max(start), true),
            _ => (until, false),
        };
        let in_window = |time: f64| time < until || (ended && time <= until);
        // Ramps are pulled at most one window of the same length ahead
        let horizon = until + (until - start);

        let pool = &mut self.pool;
        self.deferred.retain(|key| match pool.get(*key) {
            Some(cue) if in_window(cue.time) => {
                pool.release(*key);
                false
            }
            Some(_) => true,
            None => false,
        });

        while let Some(position) = events.peek_position() {
            let time = to_time(position);
            if !in_window(time) {
                break;
            }
            let Some(event) = events.shift() else { break };
            self.stage(time, event);
        }

        for group in params.iter_mut() {
            while let Some(head) = group.queue.peek_mut() {
                let time = to_time(head.event.position);
                if in_window(time) {
                    let Some(cue) = group.queue.shift() else { break };
                    if !cue.cued_early {
                        self.stage(time, cue.event);
                    }
                    continue;
                }
                if !ended && time < horizon && !head.cued_early && head.event.is_transition() {
                    head.cued_early = true;
                    let event = head.event.clone();
                    self.stage(time, event);
                }
                break;
            }
        }

        let dispatched = self.staged.len();
        for &(time, key) in &self.staged {
            if let Some(cue) = self.pool.get(key) {
                target.distribute(cue.time, &cue.event, stream);
            }
            if in_window(time) {
                self.pool.release(key);
            } else {
                self.deferred.push(key);
            }
        }
        self.staged.clear();

        let window = CueWindow { start, end: until };
        self.window_start = until;
        trace!(?stream, start, end = until, dispatched, "cued");
        CueOutcome::Cued { window, dispatched, ended }
    }

    /// Cancel ramps handed over early that would start after `time`, and
    /// release every deferred wrapper.
    ///
    /// A cancelled ramp is unflagged in its queue so the next start cues it
    /// again at its new time.
    pub fn stop(
        &mut self,
        time: f64,
        params: &mut ParamGroups,
        target: &mut dyn Distribute,
        stream: StreamKey,
    ) {
        for key in self.deferred.drain(..) {
            let Some(cue) = self.pool.release(key) else { continue };
            if cue.time <= time {
                continue;
            }
            let EventPayload::Param { name, .. } = &cue.event.payload else {
                continue;
            };
            target.stop_ramp(time, name, stream);
            if let Some(head) = params.group_mut(name.as_str()).and_then(|g| g.queue.peek_mut()) {
                if head.cued_early && head.event == cue.event {
                    head.cued_early = false;
                }
            }
        }
        self.window_start = self.window_start.max(time);
    }
}
