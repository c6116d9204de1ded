//! Engine errors.

use cue_ir::EventError;
use thiserror::Error;

/// Why an engine call was refused. A refused call changes nothing.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CueError {
    #[error("no stream with this key")]
    UnknownStream,
    #[error("stream is already started")]
    AlreadyStarted,
    #[error("stream is not started")]
    NotStarted,
    #[error("invalid event: {0}")]
    InvalidEvent(#[from] EventError),
}
