// Greasy Pidgin quantisation grids
//
// Discrete lattices that continuous musical values are snapped onto. One
// generic container does the nearest-value lookup; the specialised grids wrap
// it with the unit conversions of their domain.
//
// Architecture:
// - grid.rs: Generic `Grid<T>` (ordered set, nearest-value quantisation,
//   series/geom/interpolation/rand/fib generators)
// - time_grid.rs: Beat lattices per subdivision, seconds/beats conversion,
//   forward extension
// - pitch_grid.rs: MIDI/Hz pitch sets from equal steps, tuning systems,
//   scales, pitch classes, ranges or note lists
// - dynamic_grid.rs: dB thresholds for a vocabulary of dynamic markings
// - pitch.rs: Note-name parsing (`c4`, `bf3`, `cqs4`, ...)
// - scale.rs: Named scales/modes and equal-division tuning systems
// - error.rs: `GridError`
//
// Nothing here allocates randomness of its own: `Grid::rand` draws from the
// caller's RNG, so seeded callers get reproducible grids.

pub mod dynamic_grid;
pub mod error;
pub mod grid;
pub mod pitch;
pub mod pitch_grid;
pub mod scale;
pub mod time_grid;

pub use dynamic_grid::{DEFAULT_DYNAMICS, DynamicGrid, DynamicLevel};
pub use error::GridError;
pub use grid::{Grid, GridKey, GridValue, Number, ValueKind};
pub use pitch::{PitchSpec, midi2note, note2midi};
pub use pitch_grid::{PitchGrid, PitchGridConfig};
pub use scale::{Scale, TuningSystem};
pub use time_grid::TimeGrid;
