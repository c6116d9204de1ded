//! Event validation and parse errors.

use thiserror::Error;

/// Why an event was rejected.
///
/// Events are checked when they are built from a sequence or pushed into a
/// stream; a rejected event never reaches a queue.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EventError {
    /// A numeric field is NaN or infinite.
    #[error("field `{field}` must be finite")]
    NonFinite {
        /// Name of the offending field.
        field: &'static str,
    },
    /// Rate events must move time forward.
    #[error("rate must be greater than zero")]
    NonPositiveRate,
    /// Rate events cannot sit before the implicit rate at beat 0.
    #[error("rate events must not be placed before beat 0")]
    NegativeRatePosition,
    /// Note and chord durations must be finite and non-negative.
    #[error("duration must be finite and non-negative")]
    InvalidDuration,
    /// Meter numerator and denominator must both be non-zero.
    #[error("meter must have a non-zero numerator and denominator")]
    InvalidMeter,
    /// `stop` events are emitted by the engine only.
    #[error("`{kind}` events cannot be pushed")]
    ReservedKind {
        /// The reserved kind.
        kind: &'static str,
    },
    /// A parameter name or chord mode exceeds its inline capacity.
    #[error("`{field}` is longer than {capacity} bytes")]
    NameTooLong {
        /// Name of the offending field.
        field: &'static str,
        /// Inline capacity in bytes.
        capacity: usize,
    },
    /// A sequence event carries more transforms than fit inline.
    #[error("too many transforms (max {max})")]
    TooManyTransforms {
        /// Maximum number of transforms.
        max: usize,
    },

    // === Tuple text format ===
    /// A required field is missing from the tuple.
    #[error("`{kind}` event is missing `{field}`")]
    MissingField {
        /// Event kind being parsed.
        kind: &'static str,
        /// Missing field.
        field: &'static str,
    },
    /// The kind token is not one of the known event kinds.
    #[error("unknown event kind")]
    UnknownKind,
    /// The curve token is not `step`, `linear` or `exponential`.
    #[error("unknown curve")]
    UnknownCurve,
    /// A field could not be parsed as a number.
    #[error("field `{field}` is not a valid number")]
    InvalidNumber {
        /// Name of the offending field.
        field: &'static str,
    },
    /// A transform token is not `transpose:<n>` or `stretch:<n>`.
    #[error("invalid transform")]
    InvalidTransform,
    /// Extra tokens follow a complete tuple.
    #[error("unexpected trailing fields")]
    TrailingFields,
}
