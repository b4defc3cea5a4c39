// Error types for instruments and the composition pipeline.
//
// Grid failures raised while building or querying the composition's grids
// are wrapped rather than re-described, so callers can still match on the
// underlying `GridError`.

use greasy_pidgin_grid::GridError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InstrumentError {
    /// A range query was made with a pitch that is not a finite number.
    #[error("invalid pitch {0}: expected a finite MIDI number")]
    InvalidInput(f64),

    #[error("unknown instrument '{0}'")]
    UnknownInstrumentKey(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompositionError {
    #[error("player {0} has no events to consolidate")]
    EmptyPlayerEventList(usize),

    #[error("overlapping events are not supported")]
    PolyphonyNotSupported,

    #[error("no player at index {0}")]
    UnknownPlayer(usize),

    #[error(transparent)]
    Grid(#[from] GridError),

    #[error(transparent)]
    Instrument(#[from] InstrumentError),
}
