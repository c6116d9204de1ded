//! Event types for the cue scheduler.

use arrayvec::ArrayVec;

use crate::curve::CurveKind;
use crate::error::EventError;

/// Inline capacity of a parameter name, in bytes.
pub const PARAM_NAME_CAPACITY: usize = 24;

/// Inline capacity of a chord mode, in bytes.
pub const CHORD_MODE_CAPACITY: usize = 8;

/// Maximum transforms carried by a `sequence` event.
pub const MAX_TRANSFORMS: usize = 4;

/// Name of an automated parameter (e.g. `gain`, `frequency`).
pub type ParamName = heapless::String<PARAM_NAME_CAPACITY>;

/// Chord mode symbol (e.g. `∆`, `-7`).
pub type ChordMode = heapless::String<CHORD_MODE_CAPACITY>;

/// A scheduled event.
///
/// `position` is a beat while the event sits in a sequence and becomes an
/// absolute time once it is handed to a distribution target.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    /// Beat (or time, once dispatched) of the event
    pub position: f64,
    /// What the event does
    pub payload: EventPayload,
}

/// What an event does.
#[derive(Clone, Debug, PartialEq)]
pub enum EventPayload {
    // === Clock ===
    /// Change the beat rate, reached through `curve`
    Rate { rate: f64, curve: CurveKind },
    /// Change the time signature
    Meter { numerator: u8, denominator: u8 },

    // === Notes ===
    /// A note with a duration in beats; split into `NoteOn`/`NoteOff` for dispatch
    Note { number: u8, velocity: f32, duration: f64 },
    /// Start a note
    NoteOn { number: u8, velocity: f32 },
    /// Release a note
    NoteOff { number: u8 },

    // === Automation ===
    /// Move a named parameter to `value`, reached through `curve`
    Param { name: ParamName, value: f64, curve: CurveKind },
    /// Global pitch offset
    Pitch { semitones: f64 },
    /// A chord symbol lasting `duration` beats
    Chord { root: u8, mode: ChordMode, duration: f64 },

    // === Composition ===
    /// Play another sequence into `target` for `duration` beats
    Sequence {
        sequence: u32,
        target: u32,
        duration: f64,
        transforms: ArrayVec<Transform, MAX_TRANSFORMS>,
    },

    /// End of stream, emitted by the engine when a stream stops
    Stop,
}

/// A transform applied by the consumer of a `sequence` event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Transform {
    /// Shift note numbers by a number of semitones
    Transpose(f64),
    /// Scale beat positions and durations
    Stretch(f64),
}

/// Event kind, without its fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Rate,
    Meter,
    Note,
    NoteOn,
    NoteOff,
    Param,
    Pitch,
    Chord,
    Sequence,
    Stop,
}

impl EventKind {
    /// Token used in the tuple text format.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Rate => "rate",
            EventKind::Meter => "meter",
            EventKind::Note => "note",
            EventKind::NoteOn => "noteon",
            EventKind::NoteOff => "noteoff",
            EventKind::Param => "param",
            EventKind::Pitch => "pitch",
            EventKind::Chord => "chord",
            EventKind::Sequence => "sequence",
            EventKind::Stop => "stop",
        }
    }
}

impl Event {
    /// Create a new event.
    pub fn new(position: f64, payload: EventPayload) -> Self {
        Self { position, payload }
    }

    /// Create a rate event.
    pub fn rate(position: f64, rate: f64, curve: CurveKind) -> Self {
        Self::new(position, EventPayload::Rate { rate, curve })
    }

    /// Create a meter event.
    pub fn meter(position: f64, numerator: u8, denominator: u8) -> Self {
        Self::new(position, EventPayload::Meter { numerator, denominator })
    }

    /// Create a note event lasting `duration` beats.
    pub fn note(position: f64, number: u8, velocity: f32, duration: f64) -> Self {
        Self::new(position, EventPayload::Note { number, velocity, duration })
    }

    /// Create a note on event.
    pub fn note_on(position: f64, number: u8, velocity: f32) -> Self {
        Self::new(position, EventPayload::NoteOn { number, velocity })
    }

    /// Create a note off event.
    pub fn note_off(position: f64, number: u8) -> Self {
        Self::new(position, EventPayload::NoteOff { number })
    }

    /// Create a parameter event.
    ///
    /// Fails if `name` does not fit in [`PARAM_NAME_CAPACITY`] bytes.
    pub fn param(position: f64, name: &str, value: f64, curve: CurveKind) -> Result<Self, EventError> {
        Ok(Self::new(
            position,
            EventPayload::Param { name: param_name(name)?, value, curve },
        ))
    }

    /// Create the end-of-stream marker.
    pub fn stop(position: f64) -> Self {
        Self::new(position, EventPayload::Stop)
    }

    /// Kind of this event.
    pub fn kind(&self) -> EventKind {
        match self.payload {
            EventPayload::Rate { .. } => EventKind::Rate,
            EventPayload::Meter { .. } => EventKind::Meter,
            EventPayload::Note { .. } => EventKind::Note,
            EventPayload::NoteOn { .. } => EventKind::NoteOn,
            EventPayload::NoteOff { .. } => EventKind::NoteOff,
            EventPayload::Param { .. } => EventKind::Param,
            EventPayload::Pitch { .. } => EventKind::Pitch,
            EventPayload::Chord { .. } => EventKind::Chord,
            EventPayload::Sequence { .. } => EventKind::Sequence,
            EventPayload::Stop => EventKind::Stop,
        }
    }

    /// Whether this is a parameter ramp that must begin before its position.
    pub fn is_transition(&self) -> bool {
        matches!(self.payload, EventPayload::Param { curve, .. } if curve.is_transition())
    }

    /// Check that the event can enter a queue.
    pub fn validate(&self) -> Result<(), EventError> {
        finite("position", self.position)?;
        match &self.payload {
            EventPayload::Rate { rate, .. } => {
                finite("rate", *rate)?;
                if *rate <= 0.0 {
                    return Err(EventError::NonPositiveRate);
                }
                if self.position < 0.0 {
                    return Err(EventError::NegativeRatePosition);
                }
            }
            EventPayload::Meter { numerator, denominator } => {
                if *numerator == 0 || *denominator == 0 {
                    return Err(EventError::InvalidMeter);
                }
            }
            EventPayload::Note { velocity, duration, .. } => {
                finite("velocity", f64::from(*velocity))?;
                duration_in_beats(*duration)?;
            }
            EventPayload::NoteOn { velocity, .. } => finite("velocity", f64::from(*velocity))?,
            EventPayload::NoteOff { .. } => {}
            EventPayload::Param { value, .. } => finite("value", *value)?,
            EventPayload::Pitch { semitones } => finite("semitones", *semitones)?,
            EventPayload::Chord { duration, .. } => duration_in_beats(*duration)?,
            EventPayload::Sequence { duration, transforms, .. } => {
                // Open-ended sequences run until stopped
                if duration.is_nan() || *duration < 0.0 {
                    return Err(EventError::InvalidDuration);
                }
                for transform in transforms {
                    match *transform {
                        Transform::Transpose(n) => finite("transpose", n)?,
                        Transform::Stretch(n) => finite("stretch", n)?,
                    }
                }
            }
            EventPayload::Stop => return Err(EventError::ReservedKind { kind: "stop" }),
        }
        Ok(())
    }
}

/// Build an inline parameter name.
pub fn param_name(name: &str) -> Result<ParamName, EventError> {
    let mut out = ParamName::new();
    out.push_str(name).map_err(|_| EventError::NameTooLong {
        field: "name",
        capacity: PARAM_NAME_CAPACITY,
    })?;
    Ok(out)
}

/// Build an inline chord mode.
pub fn chord_mode(mode: &str) -> Result<ChordMode, EventError> {
    let mut out = ChordMode::new();
    out.push_str(mode).map_err(|_| EventError::NameTooLong {
        field: "mode",
        capacity: CHORD_MODE_CAPACITY,
    })?;
    Ok(out)
}

fn finite(field: &'static str, value: f64) -> Result<(), EventError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(EventError::NonFinite { field })
    }
}

fn duration_in_beats(duration: f64) -> Result<(), EventError> {
    if duration.is_finite() && duration >= 0.0 {
        Ok(())
    } else {
        Err(EventError::InvalidDuration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_match_payloads() {
        assert_eq!(Event::rate(0.0, 2.0, CurveKind::Step).kind(), EventKind::Rate);
        assert_eq!(Event::note(0.0, 60, 1.0, 2.0).kind(), EventKind::Note);
        assert_eq!(Event::stop(1.0).kind().as_str(), "stop");
    }

    #[test]
    fn valid_events_pass() {
        assert!(Event::rate(0.0, 2.0, CurveKind::Step).validate().is_ok());
        assert!(Event::note(1.0, 60, 0.8, 0.0).validate().is_ok());
        assert!(Event::meter(0.0, 3, 4).validate().is_ok());
        assert!(Event::param(0.0, "gain", 0.5, CurveKind::Linear).unwrap().validate().is_ok());
    }

    #[test]
    fn non_positive_rate_rejected() {
        assert_eq!(
            Event::rate(0.0, 0.0, CurveKind::Step).validate(),
            Err(EventError::NonPositiveRate)
        );
        assert_eq!(
            Event::rate(0.0, -1.0, CurveKind::Exponential).validate(),
            Err(EventError::NonPositiveRate)
        );
    }

    #[test]
    fn rate_before_beat_zero_rejected() {
        assert_eq!(
            Event::rate(-1.0, 1.0, CurveKind::Step).validate(),
            Err(EventError::NegativeRatePosition)
        );
    }

    #[test]
    fn note_duration_must_be_resolved() {
        assert_eq!(
            Event::note(0.0, 60, 1.0, f64::NAN).validate(),
            Err(EventError::InvalidDuration)
        );
        assert_eq!(
            Event::note(0.0, 60, 1.0, f64::INFINITY).validate(),
            Err(EventError::InvalidDuration)
        );
        assert_eq!(
            Event::note(0.0, 60, 1.0, -1.0).validate(),
            Err(EventError::InvalidDuration)
        );
    }

    #[test]
    fn non_finite_position_rejected() {
        assert_eq!(
            Event::note_off(f64::NAN, 60).validate(),
            Err(EventError::NonFinite { field: "position" })
        );
    }

    #[test]
    fn open_ended_sequence_is_valid() {
        let event = Event::new(
            0.0,
            EventPayload::Sequence {
                sequence: 1,
                target: 0,
                duration: f64::INFINITY,
                transforms: ArrayVec::new(),
            },
        );
        assert!(event.validate().is_ok());
    }

    #[test]
    fn stop_cannot_be_pushed() {
        assert_eq!(
            Event::stop(0.0).validate(),
            Err(EventError::ReservedKind { kind: "stop" })
        );
    }

    #[test]
    fn long_param_name_rejected() {
        let name = "a_parameter_name_that_is_far_too_long";
        assert!(matches!(
            Event::param(0.0, name, 1.0, CurveKind::Step),
            Err(EventError::NameTooLong { .. })
        ));
    }

    #[test]
    fn only_ramped_params_are_transitions() {
        assert!(Event::param(0.0, "gain", 1.0, CurveKind::Exponential).unwrap().is_transition());
        assert!(!Event::param(0.0, "gain", 1.0, CurveKind::Step).unwrap().is_transition());
        assert!(!Event::rate(0.0, 2.0, CurveKind::Linear).is_transition());
    }
}
