//! CueEngine: owns every stream and drives the cue loop.

use alloc::boxed::Box;
use alloc::vec::Vec;
use cue_ir::{Event, EventError, EventPayload};
use slotmap::{SecondaryMap, SlotMap};
use tracing::{debug, warn};

use crate::clock::{Clock, ReferenceClock};
use crate::config::CueConfig;
use crate::error::CueError;
use crate::scheduler::CueOutcome;
use crate::stream::{CueStream, StreamClock, StreamKey, StreamState};
use crate::target::{CueObserver, Distribute, NoopObserver};
use crate::tempo_map::RateEvent;
use crate::timer::{CueTimer, Timer};

type Clocks = SlotMap<StreamKey, StreamClock>;

/// Absolute time at which local `beat` of `key` is reached.
///
/// Walks from the stream up through its ancestors to the root clock.
/// Reject NaN and infinite inputs to the time-taking API.
fn finite(value: f64, field: &'static str) -> Result<f64, CueError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EventError::NonFinite { field }.into())
    }
}

fn time_at_beat<C: Clock>(clocks: &mut Clocks, root: &mut C, key: StreamKey, beat: f64) -> f64 {
    let mut key = key;
    let mut beat = beat;
    while let Some(clock) = clocks.get_mut(key) {
        beat = clock.start_beat + clock.tempo.time_at_beat(beat);
        match clock.parent {
            Some(parent) => key = parent,
            None => break,
        }
    }
    root.time_at_beat(beat)
}

/// Local beat of `key` reached at absolute `time`.
fn beat_at_time<C: Clock>(clocks: &mut Clocks, root: &mut C, key: StreamKey, time: f64) -> f64 {
    let Some(clock) = clocks.get(key) else {
        return root.beat_at_time(time);
    };
    let (parent, start_beat) = (clock.parent, clock.start_beat);
    let parent_beat = match parent {
        Some(parent) => beat_at_time(clocks, root, parent, time),
        None => root.beat_at_time(time),
    };
    match clocks.get_mut(key) {
        Some(clock) => clock.tempo.beat_at_time(parent_beat - start_beat),
        None => parent_beat,
    }
}

/// Owner of all streams, the root clock and the timer.
///
/// Streams are addressed by [`StreamKey`]. Top-level streams run on the root
/// clock; child streams created with [`create`](Self::create) run on their
/// parent's beat space.
pub struct CueEngine<C = ReferenceClock, T = CueTimer> {
    clocks: Clocks,
    streams: SecondaryMap<StreamKey, CueStream>,
    root: C,
    timer: T,
    observer: Box<dyn CueObserver>,
    config: CueConfig,
    /// Streams handed over by the last timer fire.
    due: Vec<StreamKey>,
}

impl Default for CueEngine {
    fn default() -> Self {
        Self::new(ReferenceClock::default(), CueTimer::default())
    }
}

impl<C: Clock, T: Timer> CueEngine<C, T> {
    pub fn new(root: C, timer: T) -> Self {
        Self::with_config(root, timer, CueConfig::default())
    }

    pub fn with_config(root: C, timer: T, config: CueConfig) -> Self {
        Self {
            clocks: SlotMap::with_key(),
            streams: SecondaryMap::new(),
            root,
            timer,
            observer: Box::new(NoopObserver),
            config,
            due: Vec::new(),
        }
    }

    /// Replace the observer.
    pub fn set_observer(&mut self, observer: impl CueObserver + 'static) {
        self.observer = Box::new(observer);
    }

    pub fn config(&self) -> &CueConfig {
        &self.config
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    pub fn root_clock(&self) -> &C {
        &self.root
    }

    pub fn root_clock_mut(&mut self) -> &mut C {
        &mut self.root
    }

    /// Number of live streams, children included.
    pub fn len(&self) -> usize {
        self.clocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clocks.is_empty()
    }

    pub fn contains(&self, key: StreamKey) -> bool {
        self.clocks.contains_key(key)
    }

    /// Parent of a child stream, `None` for top-level streams.
    pub fn parent(&self, key: StreamKey) -> Result<Option<StreamKey>, CueError> {
        self.clocks.get(key).map(|c| c.parent).ok_or(CueError::UnknownStream)
    }

    // === Lifecycle ===

    /// Add a top-level stream that runs on the root clock.
    pub fn add_stream(
        &mut self,
        sequence: &[Event],
        target: impl Distribute + 'static,
    ) -> Result<StreamKey, CueError> {
        self.insert(sequence, Box::new(target), None)
    }

    /// Add a child stream whose beat 0 is anchored in `parent`'s beat space.
    pub fn create(
        &mut self,
        parent: StreamKey,
        sequence: &[Event],
        target: impl Distribute + 'static,
    ) -> Result<StreamKey, CueError> {
        if !self.contains(parent) {
            return Err(CueError::UnknownStream);
        }
        self.insert(sequence, Box::new(target), Some(parent))
    }

    fn insert(
        &mut self,
        sequence: &[Event],
        target: Box<dyn Distribute>,
        parent: Option<StreamKey>,
    ) -> Result<StreamKey, CueError> {
        for event in sequence {
            event.validate()?;
        }
        let key = self.clocks.insert(StreamClock::new(sequence, parent));
        self.streams.insert(key, CueStream::new(sequence, target, &self.config));

        let streams = self.clocks.len();
        self.due.reserve(streams.saturating_sub(self.due.len()));
        self.timer.reserve(streams);
        debug!(?key, ?parent, events = sequence.len(), "stream added");
        Ok(key)
    }

    /// Start cueing a stream from `time`.
    ///
    /// Local beat 0 is anchored at the parent's beat at `time`. A first cue
    /// runs immediately when the timer's horizon is already past `time`.
    pub fn start(&mut self, key: StreamKey, time: f64) -> Result<(), CueError> {
        let state = self.streams.get(key).map(|s| s.state).ok_or(CueError::UnknownStream)?;
        if state == StreamState::Started {
            return Err(CueError::AlreadyStarted);
        }
        let time = finite(time, "time")?;

        let parent = self.clocks.get(key).and_then(|c| c.parent);
        let start_beat = match parent {
            Some(parent) => beat_at_time(&mut self.clocks, &mut self.root, parent, time),
            None => self.root.beat_at_time(time),
        };
        if let Some(clock) = self.clocks.get_mut(key) {
            clock.start_beat = start_beat;
        }
        if let Some(stream) = self.streams.get_mut(key) {
            stream.scheduler.reset(time);
            stream.state = StreamState::Started;
        }
        debug!(?key, time, start_beat, "stream started");
        self.observer.started(key, time);

        let horizon = self.timer.last_cue_time();
        if horizon > time {
            self.cue_stream(key, horizon);
        } else {
            self.timer.request_cue(key);
        }
        Ok(())
    }

    /// Stop a started stream at `time`.
    pub fn stop(&mut self, key: StreamKey, time: f64) -> Result<(), CueError> {
        let state = self.streams.get(key).map(|s| s.state).ok_or(CueError::UnknownStream)?;
        if state == StreamState::Stopped {
            return Err(CueError::NotStarted);
        }
        let time = finite(time, "time")?;
        self.halt(key, time);
        Ok(())
    }

    fn halt(&mut self, key: StreamKey, time: f64) {
        self.timer.cancel_cue(key);
        let Some(stream) = self.streams.get_mut(key) else {
            return;
        };
        stream.scheduler.stop(time, &mut stream.params, stream.target.as_mut(), key);
        stream.target.distribute(time, &Event::stop(time), key);
        stream.state = StreamState::Stopped;
        stream.finished = Some(time);
        debug!(?key, time, "stream stopped");
        self.observer.stopped(key, time);
    }

    /// Remove a stream and every stream created under it, stopping any
    /// that are still started.
    pub fn remove(&mut self, key: StreamKey) -> Result<(), CueError> {
        if !self.contains(key) {
            return Err(CueError::UnknownStream);
        }
        let doomed: Vec<StreamKey> = self
            .clocks
            .keys()
            .filter(|&k| self.descends_from(k, key))
            .collect();
        for &k in &doomed {
            if self.streams.get(k).is_some_and(|s| s.state == StreamState::Started) {
                warn!(key = ?k, "removing a started stream");
                let time = self.timer.last_cue_time();
                self.halt(k, time);
            }
        }
        for k in doomed {
            self.streams.remove(k);
            self.clocks.remove(k);
        }
        debug!(?key, "stream removed");
        Ok(())
    }

    /// Whether `key` is `ancestor` or lies below it.
    fn descends_from(&self, key: StreamKey, ancestor: StreamKey) -> bool {
        let mut current = Some(key);
        while let Some(k) = current {
            if k == ancestor {
                return true;
            }
            current = self.clocks.get(k).and_then(|c| c.parent);
        }
        false
    }

    // === Events ===

    /// Insert an event into a stream.
    ///
    /// Rate events go to the tempo map, param events to their parameter
    /// queue, meter events to both the meter map and the event queue, and
    /// everything else to the event queue.
    pub fn push(&mut self, key: StreamKey, event: Event) -> Result<(), CueError> {
        let (Some(clock), Some(stream)) = (self.clocks.get_mut(key), self.streams.get_mut(key)) else {
            return Err(CueError::UnknownStream);
        };
        event.validate()?;

        match event.payload {
            EventPayload::Rate { .. } => {
                if let Some(rate) = RateEvent::from_event(&event) {
                    if clock.tempo.push(rate) {
                        debug!(?key, beat = rate.beat, "tempo cache rebuilt");
                        self.observer.tempo_rebuilt(key);
                    }
                }
            }
            EventPayload::Param { .. } => stream.params.push(event),
            EventPayload::Meter { .. } => {
                stream.meter.push(&event);
                stream.events.push(event);
            }
            _ => stream.events.push(event),
        }
        Ok(())
    }

    /// End the stream by itself once local `beat` is reached, or never.
    pub fn set_duration(&mut self, key: StreamKey, beats: Option<f64>) -> Result<(), CueError> {
        if let Some(beats) = beats {
            if !beats.is_finite() || beats < 0.0 {
                return Err(EventError::InvalidDuration.into());
            }
        }
        let stream = self.streams.get_mut(key).ok_or(CueError::UnknownStream)?;
        stream.duration = beats;
        Ok(())
    }

    /// Collect the time the stream last stopped, once.
    pub fn take_finished(&mut self, key: StreamKey) -> Result<Option<f64>, CueError> {
        let stream = self.streams.get_mut(key).ok_or(CueError::UnknownStream)?;
        Ok(stream.finished.take())
    }

    pub fn state(&self, key: StreamKey) -> Result<StreamState, CueError> {
        self.streams.get(key).map(|s| s.state).ok_or(CueError::UnknownStream)
    }

    /// Returns true once a stream has handed over every queued event and
    /// holds no ramp cued ahead of its window.
    pub fn is_drained(&self, key: StreamKey) -> Result<bool, CueError> {
        let stream = self.streams.get(key).ok_or(CueError::UnknownStream)?;
        Ok(stream.scheduler.is_drained(&stream.events, &stream.params))
    }

    // === Conversions ===

    /// Local beat of a stream at absolute `time`.
    pub fn beat_at_time(&mut self, key: StreamKey, time: f64) -> Result<f64, CueError> {
        if !self.contains(key) {
            return Err(CueError::UnknownStream);
        }
        let time = finite(time, "time")?;
        Ok(beat_at_time(&mut self.clocks, &mut self.root, key, time))
    }

    /// Absolute time of a stream's local `beat`.
    pub fn time_at_beat(&mut self, key: StreamKey, beat: f64) -> Result<f64, CueError> {
        if !self.contains(key) {
            return Err(CueError::UnknownStream);
        }
        let beat = finite(beat, "beat")?;
        Ok(time_at_beat(&mut self.clocks, &mut self.root, key, beat))
    }

    /// Rate of a stream's own tempo map at local `beat`.
    pub fn rate_at_beat(&mut self, key: StreamKey, beat: f64) -> Result<f64, CueError> {
        let clock = self.clocks.get_mut(key).ok_or(CueError::UnknownStream)?;
        Ok(clock.tempo.rate_at_beat(finite(beat, "beat")?))
    }

    pub fn bar_at_beat(&self, key: StreamKey, beat: f64) -> Result<f64, CueError> {
        let stream = self.streams.get(key).ok_or(CueError::UnknownStream)?;
        Ok(stream.meter.bar_at_beat(finite(beat, "beat")?))
    }

    pub fn beat_at_bar(&self, key: StreamKey, bar: f64) -> Result<f64, CueError> {
        let stream = self.streams.get(key).ok_or(CueError::UnknownStream)?;
        Ok(stream.meter.beat_at_bar(finite(bar, "bar")?))
    }

    // === Cue loop ===

    /// Fire the timer at host time `now` and cue every stream it hands over.
    ///
    /// Returns the end of the new cue window.
    pub fn tick(&mut self, now: f64) -> f64 {
        let mut due = core::mem::take(&mut self.due);
        let until = self.timer.fire(now, &mut due);
        for &key in &due {
            self.cue_stream(key, until);
        }
        due.clear();
        self.due = due;
        until
    }

    fn cue_stream(&mut self, key: StreamKey, until: f64) {
        let outcome = {
            let Self { clocks, streams, root, .. } = self;
            let Some(stream) = streams.get_mut(key) else {
                return;
            };
            if stream.state != StreamState::Started {
                return;
            }
            let end = stream.duration.map(|beats| time_at_beat(clocks, root, key, beats));
            let mut to_time = |beat: f64| time_at_beat(clocks, root, key, beat);
            stream.scheduler.cue(
                until,
                end,
                &mut stream.events,
                &mut stream.params,
                &mut to_time,
                stream.target.as_mut(),
                key,
            )
        };

        match outcome {
            CueOutcome::Underrun => {
                self.observer.underrun(key, until);
                self.timer.request_cue(key);
            }
            CueOutcome::Cued { window, dispatched, ended } => {
                self.observer.cued(key, window, dispatched);
                if ended {
                    debug!(?key, time = window.end, "stream reached its end");
                    self.halt(key, window.end);
                } else {
                    self.timer.request_cue(key);
                }
            }
        }
    }
}
