//! Cue scheduling engine for cuestream.
//!
//! Converts between beats and absolute time under tempo curves and drives a
//! look-ahead cue loop that hands every queued event to its stream's target
//! once, in time order, shortly before it is due.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod clock;
mod config;
mod engine;
mod error;
mod event_queue;
mod event_stream;
mod meter;
mod params;
mod pool;
mod scheduler;
mod stream;
mod target;
mod tempo_map;
mod timer;

pub use clock::{Clock, ReferenceClock};
pub use config::{CueConfig, DEFAULT_POOL_CAPACITY, DEFAULT_STAGING_CAPACITY};
pub use engine::CueEngine;
pub use error::CueError;
pub use event_queue::{OrderedEventQueue, Timed};
pub use event_stream::EventStream;
pub use meter::{bar_length, MeterMap};
pub use params::{ParamCue, ParamGroup, ParamGroups};
pub use pool::{CueKey, DispatchedEvent, EventPool};
pub use scheduler::{CueOutcome, CueScheduler};
pub use stream::{StreamKey, StreamState};
pub use target::{CueObserver, CueWindow, Distribute, NoopObserver};
pub use tempo_map::{RateBreakpoint, RateEvent, TempoMap};
pub use timer::{CueTimer, Timer};
