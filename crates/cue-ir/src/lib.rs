//! Core IR types for cuestream.
//!
//! This crate defines the event model shared by sequence sources, the
//! scheduler and distribution targets, together with the closed-form tempo
//! curve math used for beat/time conversion.
//!
//! Designed to be `no_std` compatible with the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod curve;
mod error;
mod event;
mod parse;

pub use curve::{CurveKind, RateSegment};
pub use error::EventError;
pub use event::{
    chord_mode, param_name, ChordMode, Event, EventKind, EventPayload, ParamName, Transform,
    CHORD_MODE_CAPACITY, MAX_TRANSFORMS, PARAM_NAME_CAPACITY,
};
