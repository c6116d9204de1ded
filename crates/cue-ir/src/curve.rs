//! Tempo curves and closed-form beat/time conversion.
//!
//! A tempo segment runs from one rate event to the next. The rate at the
//! start is `r0`, the rate reached at the end is `r1`, and the segment spans
//! `n` beats. The curve attached to the *next* rate event decides how the
//! rate moves between the two:
//!
//! - `Step` holds `r0` for the whole segment.
//! - `Exponential` grows the rate by a constant factor per beat,
//!   `r(b) = r0 * a^b` with `a = (r1 / r0)^(1 / n)`.
//! - `Linear` grows the rate by a constant amount per beat,
//!   `r(b) = r0 + k * b` with `k = (r1 - r0) / n`.
//!
//! Both conversions integrate `dt/db = 1 / r(b)` and are exact inverses of
//! each other.

use core::fmt;
use core::str::FromStr;

use crate::error::EventError;

/// Growth factors whose logarithm falls below this are treated as flat.
const FLAT_EPSILON: f64 = 1e-12;

/// How a value moves from the previous event to this one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CurveKind {
    /// Jump to the new value at the event position.
    #[default]
    Step,
    /// Straight-line transition ending at the event position.
    Linear,
    /// Exponential transition ending at the event position.
    Exponential,
}

impl CurveKind {
    /// Whether the curve describes a ramp that starts before the event.
    pub fn is_transition(self) -> bool {
        matches!(self, CurveKind::Linear | CurveKind::Exponential)
    }

    /// Token used in the tuple text format.
    pub fn as_str(self) -> &'static str {
        match self {
            CurveKind::Step => "step",
            CurveKind::Linear => "linear",
            CurveKind::Exponential => "exponential",
        }
    }
}

impl fmt::Display for CurveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CurveKind {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "step" => Ok(CurveKind::Step),
            "linear" => Ok(CurveKind::Linear),
            "exponential" => Ok(CurveKind::Exponential),
            _ => Err(EventError::UnknownCurve),
        }
    }
}

/// One tempo segment between two rate events.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RateSegment {
    /// Rate at the start of the segment.
    pub r0: f64,
    /// Rate at the end of the segment.
    pub r1: f64,
    /// Beats spanned by the segment.
    pub beats: f64,
    /// Curve of the rate event that ends the segment.
    pub curve: CurveKind,
}

impl RateSegment {
    /// An open-ended segment holding `rate` forever.
    pub const fn step(rate: f64) -> Self {
        Self {
            r0: rate,
            r1: rate,
            beats: f64::INFINITY,
            curve: CurveKind::Step,
        }
    }

    /// A segment from `r0` to `r1` over `beats` beats.
    pub const fn new(r0: f64, r1: f64, beats: f64, curve: CurveKind) -> Self {
        Self { r0, r1, beats, curve }
    }

    /// Time elapsed after `beat` beats into the segment.
    pub fn time_at_beat(&self, beat: f64) -> f64 {
        match self.shape() {
            Shape::Step => beat / self.r0,
            Shape::Exponential(ln_a) => {
                // (1 - a^-b) / (ln(a) * r0)
                -libm::expm1(-beat * ln_a) / (ln_a * self.r0)
            }
            Shape::Linear(k) => {
                let x = k * beat / self.r0;
                if x <= -1.0 {
                    return f64::INFINITY;
                }
                libm::log1p(x) / k
            }
        }
    }

    /// Beats elapsed after `time` into the segment.
    pub fn beat_at_time(&self, time: f64) -> f64 {
        match self.shape() {
            Shape::Step => time * self.r0,
            Shape::Exponential(ln_a) => {
                // -log_a(1 - t * r0 * ln(a))
                let x = -time * self.r0 * ln_a;
                if x <= -1.0 {
                    return f64::INFINITY;
                }
                -libm::log1p(x) / ln_a
            }
            Shape::Linear(k) => self.r0 * libm::expm1(k * time) / k,
        }
    }

    /// Rate reached `beat` beats into the segment.
    pub fn rate_at_beat(&self, beat: f64) -> f64 {
        match self.shape() {
            Shape::Step => self.r0,
            Shape::Exponential(ln_a) => self.r0 * libm::exp(ln_a * beat),
            Shape::Linear(k) => self.r0 + k * beat,
        }
    }

    fn shape(&self) -> Shape {
        let flat = self.r0 == self.r1 || !(self.beats > 0.0) || !self.beats.is_finite();
        if flat {
            return Shape::Step;
        }
        match self.curve {
            CurveKind::Step => Shape::Step,
            CurveKind::Exponential => {
                let ln_a = libm::log(self.r1 / self.r0) / self.beats;
                if ln_a.abs() < FLAT_EPSILON {
                    Shape::Step
                } else {
                    Shape::Exponential(ln_a)
                }
            }
            CurveKind::Linear => {
                let k = (self.r1 - self.r0) / self.beats;
                if (k / self.r0).abs() < FLAT_EPSILON {
                    Shape::Step
                } else {
                    Shape::Linear(k)
                }
            }
        }
    }
}

/// Resolved segment shape with its growth constant.
#[derive(Clone, Copy, Debug)]
enum Shape {
    Step,
    /// Natural log of the per-beat growth factor.
    Exponential(f64),
    /// Rate change per beat.
    Linear(f64),
}
