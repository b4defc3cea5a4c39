// Greasy Pidgin music model and quantisation pipeline
//
// Players hold timed note/rest events played on an instrument; a
// `Composition` owns the time, pitch and dynamic grids and snaps each
// player's events onto them, then cleans up what quantisation leaves behind
// (empty rests, grace notes, simultaneous onsets, gaps and overlaps).
//
// Architecture:
// - composition.rs: `Composition`, the per-player pipeline stages and tie
//   detection
// - config.rs: `CompositionConfig`/`PlayerConfig`, loaded from JSON
// - event.rs: `Event` (dual seconds/beats timing) and its `Chord` payload
// - instrument.rs: `Instrument` ranges, transposition, missing notes,
//   octave folding into range
// - palette.rs: The standard orchestral instrument table
// - player.rs: `Player` and its duration policy
// - error.rs: `InstrumentError`, `CompositionError`
//
// The grids themselves live in `greasy_pidgin_grid`.

pub mod composition;
pub mod config;
pub mod error;
pub mod event;
pub mod instrument;
pub mod palette;
pub mod player;

pub use composition::{Composition, ConsolidationOutcome, GRACE_NOTE_TOLERANCE, TieDiagnostic};
pub use config::{CompositionConfig, Meter, PlayerConfig};
pub use error::{CompositionError, InstrumentError};
pub use event::{Chord, Event, REST_DB, REST_PITCH, TieType};
pub use instrument::{Clef, Instrument, RangeOptions, RangeSide};
pub use palette::{standard_instrument, standard_instruments};
pub use player::Player;
