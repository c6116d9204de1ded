//! Per-stream state owned by the engine.
//!
//! A stream is split in two halves stored in separate maps: its clock (the
//! local tempo map anchored in its parent's beat space) and its dispatch
//! state. The cue loop borrows one stream's dispatch state while walking the
//! clock chain of all its ancestors.

use alloc::boxed::Box;
use cue_ir::Event;
use slotmap::new_key_type;

use crate::config::CueConfig;
use crate::event_stream::EventStream;
use crate::meter::MeterMap;
use crate::params::ParamGroups;
use crate::scheduler::CueScheduler;
use crate::target::Distribute;
use crate::tempo_map::TempoMap;

new_key_type! {
    /// Handle to a stream in a [`CueEngine`](crate::CueEngine).
    pub struct StreamKey;
}

/// Whether a stream is being cued.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StreamState {
    #[default]
    Stopped,
    Started,
}

/// Local beat space of a stream.
#[derive(Clone, Debug)]
pub(crate) struct StreamClock {
    pub tempo: TempoMap,
    /// Parent beat at which local beat 0 sits.
    pub start_beat: f64,
    /// `None` for a top-level stream running on the engine's root clock.
    pub parent: Option<StreamKey>,
}

impl StreamClock {
    pub fn new(sequence: &[Event], parent: Option<StreamKey>) -> Self {
        Self {
            tempo: TempoMap::from_sequence(sequence),
            start_beat: 0.0,
            parent,
        }
    }
}

/// Dispatch side of a stream.
pub(crate) struct CueStream {
    pub events: EventStream,
    pub params: ParamGroups,
    pub meter: MeterMap,
    pub scheduler: CueScheduler,
    pub target: Box<dyn Distribute>,
    pub state: StreamState,
    /// Local beat at which the stream ends by itself.
    pub duration: Option<f64>,
    /// Stop time not yet collected by `take_finished`.
    pub finished: Option<f64>,
}

impl CueStream {
    pub fn new(sequence: &[Event], target: Box<dyn Distribute>, config: &CueConfig) -> Self {
        Self {
            events: EventStream::from_sequence(sequence),
            params: ParamGroups::from_sequence(sequence),
            meter: MeterMap::from_sequence(sequence),
            scheduler: CueScheduler::new(config.pool_capacity, config.staging_capacity),
            target,
            state: StreamState::Stopped,
            duration: None,
            finished: None,
        }
    }
}
