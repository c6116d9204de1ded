//! Where dispatched events go, and who watches the cue loop.

use cue_ir::{Event, ParamName};

use crate::StreamKey;

/// Receiver of dispatched events.
///
/// Any `FnMut(f64, &Event, StreamKey)` closure is a target.
pub trait Distribute {
    /// Deliver `event` to sound at absolute `time`.
    ///
    /// A `stop` event marks the end of the stream.
    fn distribute(&mut self, time: f64, event: &Event, stream: StreamKey);

    /// Cancel a ramp on `name` that was handed over early and would have
    /// started after `time`.
    fn stop_ramp(&mut self, time: f64, name: &ParamName, stream: StreamKey) {
        let _ = (time, name, stream);
    }
}

impl<F> Distribute for F
where
    F: FnMut(f64, &Event, StreamKey),
{
    fn distribute(&mut self, time: f64, event: &Event, stream: StreamKey) {
        self(time, event, stream)
    }
}

/// A cue window `[start, end)` in absolute time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CueWindow {
    pub start: f64,
    pub end: f64,
}

/// Hooks into the cue loop. Every method defaults to doing nothing.
pub trait CueObserver {
    fn started(&mut self, stream: StreamKey, time: f64) {
        let _ = (stream, time);
    }

    fn stopped(&mut self, stream: StreamKey, time: f64) {
        let _ = (stream, time);
    }

    /// A window was processed, dispatching `dispatched` events.
    fn cued(&mut self, stream: StreamKey, window: CueWindow, dispatched: usize) {
        let _ = (stream, window, dispatched);
    }

    /// A cue arrived at or before the end of the previous window.
    fn underrun(&mut self, stream: StreamKey, time: f64) {
        let _ = (stream, time);
    }

    /// The breakpoint cache was discarded by an out-of-order rate event.
    fn tempo_rebuilt(&mut self, stream: StreamKey) {
        let _ = stream;
    }
}

/// Observer that ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl CueObserver for NoopObserver {}
