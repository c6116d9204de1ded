//! cuestream: tempo-synchronized cue scheduling for music sequencing.
//!
//! Re-exports the event model and the engine, and reads sequences written
//! one tuple per line.

use thiserror::Error;

pub use cue_engine::*;
pub use cue_ir::*;

/// A sequence line that could not be read.
#[derive(Clone, Debug, PartialEq, Error)]
#[error("line {line}: {source}")]
pub struct SequenceError {
    /// One-based line number.
    pub line: usize,
    #[source]
    pub source: EventError,
}

/// Parse a sequence, one event tuple per line.
///
/// Blank lines and lines starting with `#` are skipped. Every event is
/// validated.
pub fn parse_sequence(text: &str) -> Result<Vec<Event>, SequenceError> {
    let mut events = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let event: Event = line
            .parse()
            .map_err(|source| SequenceError { line: line_no, source })?;
        event
            .validate()
            .map_err(|source| SequenceError { line: line_no, source })?;
        events.push(event);
    }
    Ok(events)
}
