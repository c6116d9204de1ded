//! Text rendition of the event tuple format.
//!
//! One event per line, whitespace separated, in tuple order:
//!
//! ```text
//! 0    rate     2 step
//! 0    note     60 1 2
//! 1.5  param    gain 0.5 linear
//! 4    sequence 3 1 8 transpose:2 stretch:0.5
//! ```

use core::fmt;
use core::str::{FromStr, SplitWhitespace};

use arrayvec::ArrayVec;

use crate::curve::CurveKind;
use crate::error::EventError;
use crate::event::{chord_mode, param_name, Event, EventKind, EventPayload, Transform, MAX_TRANSFORMS};

/// Cursor over the fields of one tuple.
struct Fields<'a> {
    kind: &'static str,
    tokens: SplitWhitespace<'a>,
}

impl<'a> Fields<'a> {
    fn next(&mut self, field: &'static str) -> Result<&'a str, EventError> {
        self.tokens
            .next()
            .ok_or(EventError::MissingField { kind: self.kind, field })
    }

    fn number<T: FromStr>(&mut self, field: &'static str) -> Result<T, EventError> {
        self.next(field)?
            .parse()
            .map_err(|_| EventError::InvalidNumber { field })
    }

    /// Optional trailing curve, defaulting to `Step`.
    fn curve(&mut self) -> Result<CurveKind, EventError> {
        self.tokens.next().map_or(Ok(CurveKind::Step), str::parse)
    }

    fn finish(mut self) -> Result<(), EventError> {
        match self.tokens.next() {
            Some(_) => Err(EventError::TrailingFields),
            None => Ok(()),
        }
    }
}

impl FromStr for Event {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tokens = s.split_whitespace();
        let position = tokens
            .next()
            .ok_or(EventError::MissingField { kind: "event", field: "position" })?
            .parse::<f64>()
            .map_err(|_| EventError::InvalidNumber { field: "position" })?;
        let kind = match tokens.next() {
            Some(token) => parse_kind(token)?,
            None => return Err(EventError::MissingField { kind: "event", field: "kind" }),
        };

        let mut fields = Fields { kind: kind.as_str(), tokens };
        let payload = match kind {
            EventKind::Rate => EventPayload::Rate {
                rate: fields.number("rate")?,
                curve: fields.curve()?,
            },
            EventKind::Meter => EventPayload::Meter {
                numerator: fields.number("numerator")?,
                denominator: fields.number("denominator")?,
            },
            EventKind::Note => EventPayload::Note {
                number: fields.number("number")?,
                velocity: fields.number("velocity")?,
                duration: fields.number("duration")?,
            },
            EventKind::NoteOn => EventPayload::NoteOn {
                number: fields.number("number")?,
                velocity: fields.number("velocity")?,
            },
            EventKind::NoteOff => EventPayload::NoteOff {
                number: fields.number("number")?,
            },
            EventKind::Param => EventPayload::Param {
                name: param_name(fields.next("name")?)?,
                value: fields.number("value")?,
                curve: fields.curve()?,
            },
            EventKind::Pitch => EventPayload::Pitch {
                semitones: fields.number("semitones")?,
            },
            EventKind::Chord => EventPayload::Chord {
                root: fields.number("root")?,
                mode: chord_mode(fields.next("mode")?)?,
                duration: fields.number("duration")?,
            },
            EventKind::Sequence => {
                let sequence = fields.number("sequence")?;
                let target = fields.number("target")?;
                let duration = fields.number("duration")?;
                let mut transforms = ArrayVec::new();
                for token in fields.tokens.by_ref() {
                    transforms
                        .try_push(parse_transform(token)?)
                        .map_err(|_| EventError::TooManyTransforms { max: MAX_TRANSFORMS })?;
                }
                EventPayload::Sequence { sequence, target, duration, transforms }
            }
            EventKind::Stop => EventPayload::Stop,
        };
        fields.finish()?;

        Ok(Event::new(position, payload))
    }
}

fn parse_kind(token: &str) -> Result<EventKind, EventError> {
    Ok(match token {
        "rate" => EventKind::Rate,
        "meter" => EventKind::Meter,
        "note" => EventKind::Note,
        "noteon" => EventKind::NoteOn,
        "noteoff" => EventKind::NoteOff,
        "param" => EventKind::Param,
        "pitch" => EventKind::Pitch,
        "chord" => EventKind::Chord,
        "sequence" => EventKind::Sequence,
        "stop" => EventKind::Stop,
        _ => return Err(EventError::UnknownKind),
    })
}

fn parse_transform(token: &str) -> Result<Transform, EventError> {
    let (name, value) = token.split_once(':').ok_or(EventError::InvalidTransform)?;
    let value: f64 = value.parse().map_err(|_| EventError::InvalidTransform)?;
    match name {
        "transpose" => Ok(Transform::Transpose(value)),
        "stretch" => Ok(Transform::Stretch(value)),
        _ => Err(EventError::InvalidTransform),
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transform::Transpose(n) => write!(f, "transpose:{}", n),
            Transform::Stretch(n) => write!(f, "stretch:{}", n),
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.position, self.kind().as_str())?;
        match &self.payload {
            EventPayload::Rate { rate, curve } => write!(f, " {} {}", rate, curve),
            EventPayload::Meter { numerator, denominator } => {
                write!(f, " {} {}", numerator, denominator)
            }
            EventPayload::Note { number, velocity, duration } => {
                write!(f, " {} {} {}", number, velocity, duration)
            }
            EventPayload::NoteOn { number, velocity } => write!(f, " {} {}", number, velocity),
            EventPayload::NoteOff { number } => write!(f, " {}", number),
            EventPayload::Param { name, value, curve } => {
                write!(f, " {} {} {}", name, value, curve)
            }
            EventPayload::Pitch { semitones } => write!(f, " {}", semitones),
            EventPayload::Chord { root, mode, duration } => {
                write!(f, " {} {} {}", root, mode, duration)
            }
            EventPayload::Sequence { sequence, target, duration, transforms } => {
                write!(f, " {} {} {}", sequence, target, duration)?;
                for transform in transforms {
                    write!(f, " {}", transform)?;
                }
                Ok(())
            }
            EventPayload::Stop => Ok(()),
        }
    }
}
