// Pitch quantisation: a finite set of realizable pitches in MIDI space.
//
// Points are MIDI numbers (f64), with the fractional part carrying the
// microtonal offset, so 60.5 is a quarter tone above middle C. A parallel
// grid holds the frequency of every point, computed against a reference pair
// (`ref_freq` Hz sounds at `ref_midi`):
//
//   hz   = ref_freq * 2^((midi - ref_midi) / 12)
//   midi = ref_midi + 12 * log2(hz / ref_freq)
//
// The main constructor builds an equal-step grid from `PitchGridConfig`:
// exactly `min + step * i` for `i` in `[0, ceil((max - min) / step))`, with
// `step = 12 / steps_per_octave`. The upper bound is excluded when it falls
// on a step. Helper constructors build grids from named tuning systems,
// scales (see `scale.rs`), pitch classes, ranges and explicit note lists.
//
// Non-positive frequencies are coerced to their absolute value with a
// warning rather than rejected.

use crate::error::GridError;
use crate::grid::Grid;
use crate::pitch::PitchSpec;
use crate::scale::{Scale, TuningSystem};
use log::warn;
use serde::{Deserialize, Serialize};

const RANGE_EPS: f64 = 1e-9;

/// Parameters of an equal-step pitch grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PitchGridConfig {
    pub steps_per_octave: u32,
    /// Frequency in Hz of `ref_midi`.
    pub ref_freq: f64,
    pub ref_midi: f64,
    pub midi_min: f64,
    pub midi_max: f64,
}

impl Default for PitchGridConfig {
    fn default() -> Self {
        Self {
            steps_per_octave: 12,
            ref_freq: 443.0,
            ref_midi: 69.0,
            midi_min: 0.0,
            midi_max: 130.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PitchGrid {
    name: Option<String>,
    ref_freq: f64,
    ref_midi: f64,
    /// `None` for grids not built from an equal division of the octave.
    steps_per_octave: Option<u32>,
    midi: Grid,
    hz: Grid,
}

impl PitchGrid {
    /// Equal-step grid.
    pub fn new(config: PitchGridConfig) -> Result<Self, GridError> {
        let PitchGridConfig {
            steps_per_octave,
            ref_freq,
            ref_midi,
            midi_min,
            midi_max,
        } = config;
        if steps_per_octave == 0 {
            return Err(GridError::InvalidStep {
                step: 0.0,
                reason: "steps per octave must be positive",
            });
        }
        if !(midi_min.is_finite() && midi_max.is_finite()) || midi_min > midi_max {
            return Err(GridError::InvalidRange {
                low: midi_min,
                high: midi_max,
            });
        }

        let step = 12.0 / f64::from(steps_per_octave);
        let num_steps = ((midi_max - midi_min) / step).ceil() as usize;
        let midi = Grid::series(midi_min, step, num_steps);

        let mut grid = Self::from_midi_grid(midi, None, ref_freq, ref_midi)?;
        grid.steps_per_octave = Some(steps_per_octave);
        Ok(grid)
    }

    /// Equal-step grid for a named tuning system such as `24-tet` or
    /// `quarter-tone`.
    pub fn from_tuning_system(
        name: &str,
        ref_freq: f64,
        ref_midi: f64,
        midi_min: f64,
        midi_max: f64,
    ) -> Result<Self, GridError> {
        let system: TuningSystem = name.parse()?;
        let mut grid = Self::new(PitchGridConfig {
            steps_per_octave: system.steps_per_octave(),
            ref_freq,
            ref_midi,
            midi_min,
            midi_max,
        })?;
        grid.name = Some(name.to_string());
        Ok(grid)
    }

    /// Grid holding exactly the given notes.
    pub fn from_notes(notes: &[PitchSpec], name: Option<&str>) -> Result<Self, GridError> {
        let midi = notes
            .iter()
            .map(PitchSpec::to_midi)
            .collect::<Result<Grid, _>>()?;
        let defaults = PitchGridConfig::default();
        Self::from_midi_grid(midi, name, defaults.ref_freq, defaults.ref_midi)
    }

    /// Every `low + step * i` up to `high` inclusive. Reversed bounds are
    /// swapped.
    pub fn from_range(low: f64, high: f64, step: f64, name: Option<&str>) -> Result<Self, GridError> {
        if !(step.is_finite() && step > 0.0) {
            return Err(GridError::InvalidStep {
                step,
                reason: "pitch range step must be positive",
            });
        }
        if !(low.is_finite() && high.is_finite()) {
            return Err(GridError::InvalidRange { low, high });
        }
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        let count = ((high - low + RANGE_EPS) / step).floor() as usize + 1;
        let midi = Grid::series(low, step, count);
        let defaults = PitchGridConfig::default();
        Self::from_midi_grid(midi, name, defaults.ref_freq, defaults.ref_midi)
    }

    /// Every `root + pc + 12 * k` that lies within `[midi_min, midi_max]`.
    pub fn from_pitch_classes(
        pitch_classes: &[f64],
        root: &PitchSpec,
        midi_min: f64,
        midi_max: f64,
        name: Option<&str>,
    ) -> Result<Self, GridError> {
        if !(midi_min.is_finite() && midi_max.is_finite()) || midi_min > midi_max {
            return Err(GridError::InvalidRange {
                low: midi_min,
                high: midi_max,
            });
        }
        let root = root.to_midi()?;

        let mut midi = Grid::new();
        for &pc in pitch_classes {
            let base = root + pc;
            let first = ((midi_min - base) / 12.0 - RANGE_EPS).ceil() as i64;
            let last = ((midi_max - base) / 12.0 + RANGE_EPS).floor() as i64;
            midi.extend((first..=last).map(|k| base + 12.0 * k as f64));
        }
        let defaults = PitchGridConfig::default();
        Self::from_midi_grid(midi, name, defaults.ref_freq, defaults.ref_midi)
    }

    /// All notes of a named scale or mode between `midi_min` and `midi_max`.
    /// The grid is named after the scale.
    pub fn from_scale(
        scale: &str,
        root: &PitchSpec,
        midi_min: f64,
        midi_max: f64,
    ) -> Result<Self, GridError> {
        let scale: Scale = scale.parse()?;
        Self::from_pitch_classes(scale.intervals(), root, midi_min, midi_max, Some(scale.name()))
    }

    /// Re-tune the grid: same MIDI points, new reference pair.
    pub fn with_reference(self, ref_freq: f64, ref_midi: f64) -> Result<Self, GridError> {
        let steps = self.steps_per_octave;
        let mut grid = Self::from_midi_grid(self.midi, self.name.as_deref(), ref_freq, ref_midi)?;
        grid.steps_per_octave = steps;
        Ok(grid)
    }

    fn from_midi_grid(
        midi: Grid,
        name: Option<&str>,
        ref_freq: f64,
        ref_midi: f64,
    ) -> Result<Self, GridError> {
        if !(ref_freq.is_finite() && ref_freq > 0.0) {
            return Err(GridError::InvalidStep {
                step: ref_freq,
                reason: "reference frequency must be positive",
            });
        }
        let hz = midi
            .iter()
            .map(|m| ref_freq * 2f64.powf((m - ref_midi) / 12.0))
            .collect();
        Ok(PitchGrid {
            name: name.map(str::to_string),
            ref_freq,
            ref_midi,
            steps_per_octave: None,
            midi,
            hz,
        })
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn ref_freq(&self) -> f64 {
        self.ref_freq
    }

    pub fn ref_midi(&self) -> f64 {
        self.ref_midi
    }

    pub fn steps_per_octave(&self) -> Option<u32> {
        self.steps_per_octave
    }

    /// Size of one step in semitones, for equal-step grids.
    pub fn smallest_microtone(&self) -> Option<f64> {
        self.steps_per_octave.map(|s| 12.0 / f64::from(s))
    }

    pub fn midi_grid(&self) -> &Grid {
        &self.midi
    }

    pub fn hz_grid(&self) -> &Grid {
        &self.hz
    }

    pub fn midi_min(&self) -> Option<f64> {
        self.midi.min()
    }

    pub fn midi_max(&self) -> Option<f64> {
        self.midi.max()
    }

    pub fn len(&self) -> usize {
        self.midi.len()
    }

    pub fn is_empty(&self) -> bool {
        self.midi.is_empty()
    }

    // -----------------------------------------------------------------------
    // Conversion and quantisation
    // -----------------------------------------------------------------------

    /// Fractional MIDI number of a frequency. Zero maps to negative infinity.
    pub fn hz_to_midi(&self, hz: f64) -> f64 {
        let hz = coerce_positive(hz);
        self.ref_midi + 12.0 * (hz / self.ref_freq).log2()
    }

    pub fn midi_to_hz(&self, midi: f64) -> f64 {
        self.ref_freq * 2f64.powf((midi - self.ref_midi) / 12.0)
    }

    /// Nearest realizable frequency, by absolute difference in Hz.
    pub fn quantize_hz(&self, hz: f64) -> Result<f64, GridError> {
        self.hz.quantise(coerce_positive(hz))
    }

    pub fn quantize_midi(&self, midi: f64) -> Result<f64, GridError> {
        self.midi.quantise(midi)
    }
}

fn coerce_positive(hz: f64) -> f64 {
    if hz <= 0.0 {
        warn!("frequency {hz} Hz is not positive; using its absolute value");
        hz.abs()
    } else {
        hz
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;
    use more_asserts::{assert_ge, assert_le};

    #[test]
    fn test_default_grid() {
        let pg = PitchGrid::new(PitchGridConfig::default()).unwrap();
        assert_eq!(pg.len(), 130);
        assert_eq!(pg.midi_min(), Some(0.0));
        assert_eq!(pg.midi_max(), Some(129.0));
        assert!(pg.midi_grid().contains(60.0));
        assert!(!pg.midi_grid().contains(130.0));
        assert_eq!(pg.steps_per_octave(), Some(12));
        assert_eq!(pg.hz_grid().len(), pg.len());
    }

    #[test]
    fn test_quarter_tone_grid() {
        let pg = PitchGrid::new(PitchGridConfig {
            steps_per_octave: 24,
            midi_min: 60.0,
            midi_max: 72.0,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(pg.len(), 24);
        assert_eq!(pg.smallest_microtone(), Some(0.5));
        assert_eq!(pg.quantize_midi(60.3), Ok(60.5));
        assert_eq!(pg.quantize_midi(60.2), Ok(60.0));
    }

    #[test]
    fn test_zero_steps_rejected() {
        let config = PitchGridConfig {
            steps_per_octave: 0,
            ..Default::default()
        };
        assert!(matches!(
            PitchGrid::new(config),
            Err(GridError::InvalidStep { .. })
        ));
    }

    #[test]
    fn test_midi_hz_conversion() {
        let pg = PitchGrid::new(PitchGridConfig::default()).unwrap();
        assert!(approx_eq!(f64, pg.midi_to_hz(69.0), 443.0));
        assert!(approx_eq!(f64, pg.midi_to_hz(81.0), 886.0, epsilon = 1e-9));
        assert!(approx_eq!(f64, pg.hz_to_midi(443.0), 69.0));
        assert!(approx_eq!(f64, pg.hz_to_midi(221.5), 57.0, epsilon = 1e-9));
        for m in [21.0, 60.25, 100.0] {
            assert!(approx_eq!(f64, pg.hz_to_midi(pg.midi_to_hz(m)), m, epsilon = 1e-9));
        }
    }

    #[test]
    fn test_negative_frequency_is_coerced() {
        let pg = PitchGrid::new(PitchGridConfig::default()).unwrap();
        assert!(approx_eq!(f64, pg.hz_to_midi(-443.0), 69.0));
        assert_eq!(pg.hz_to_midi(0.0), f64::NEG_INFINITY);
        assert_eq!(pg.quantize_hz(-443.0), Ok(443.0));
    }

    #[test]
    fn test_quantize_hz() {
        let pg = PitchGrid::new(PitchGridConfig::default()).unwrap();
        assert_eq!(pg.quantize_hz(443.0), Ok(443.0));
        let q = pg.quantize_hz(440.0).unwrap();
        assert!(approx_eq!(f64, q, 443.0));
        let low = pg.quantize_hz(0.001).unwrap();
        assert!(approx_eq!(f64, low, pg.midi_to_hz(0.0), epsilon = 1e-12));
    }

    #[test]
    fn test_from_tuning_system() {
        let pg = PitchGrid::from_tuning_system("24-tet", 440.0, 69.0, 60.0, 72.0).unwrap();
        assert_eq!(pg.steps_per_octave(), Some(24));
        assert_eq!(pg.name(), Some("24-tet"));
        assert!(pg.midi_grid().contains(61.5));
        assert!(matches!(
            PitchGrid::from_tuning_system("19-tet", 440.0, 69.0, 60.0, 72.0),
            Err(GridError::UnknownTuningSystem(_))
        ));
    }

    #[test]
    fn test_from_notes() {
        let notes = vec![PitchSpec::from("c4"), PitchSpec::from(61.5), PitchSpec::from("g4")];
        let pg = PitchGrid::from_notes(&notes, Some("cluster")).unwrap();
        assert_eq!(pg.midi_grid().sorted(), vec![60.0, 61.5, 67.0]);
        assert_eq!(pg.name(), Some("cluster"));
        assert_eq!(pg.steps_per_octave(), None);

        let bad = vec![PitchSpec::from("h2")];
        assert!(matches!(
            PitchGrid::from_notes(&bad, None),
            Err(GridError::InvalidNoteName(_))
        ));
    }

    #[test]
    fn test_from_range_swaps_bounds() {
        let up = PitchGrid::from_range(60.0, 72.0, 1.0, None).unwrap();
        let down = PitchGrid::from_range(72.0, 60.0, 1.0, None).unwrap();
        assert_eq!(up.len(), 13);
        assert_eq!(up.midi_grid(), down.midi_grid());
        assert!(matches!(
            PitchGrid::from_range(60.0, 72.0, 0.0, None),
            Err(GridError::InvalidStep { .. })
        ));
    }

    #[test]
    fn test_rejects_unbounded_ranges() {
        let open_top = PitchGridConfig {
            midi_max: f64::INFINITY,
            ..Default::default()
        };
        assert_eq!(
            PitchGrid::new(open_top),
            Err(GridError::InvalidRange {
                low: 0.0,
                high: f64::INFINITY
            })
        );
        assert!(matches!(
            PitchGrid::from_range(f64::NEG_INFINITY, 60.0, 1.0, None),
            Err(GridError::InvalidRange { .. })
        ));
        assert!(matches!(
            PitchGrid::from_pitch_classes(&[0.0], &PitchSpec::from(60), 0.0, f64::INFINITY, None),
            Err(GridError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_from_pitch_classes() {
        let root = PitchSpec::from("d4");
        let pg = PitchGrid::from_pitch_classes(&[0.0, 7.0], &root, 40.0, 80.0, Some("fifths")).unwrap();
        // d and a in every octave between e2 and gs5
        assert_eq!(
            pg.midi_grid().sorted(),
            vec![45.0, 50.0, 57.0, 62.0, 69.0, 74.0]
        );
        for m in pg.midi_grid().iter() {
            assert_ge!(m, 40.0);
            assert_le!(m, 80.0);
        }
    }

    #[test]
    fn test_from_scale() {
        let pg = PitchGrid::from_scale("major", &PitchSpec::from("c4"), 60.0, 72.0).unwrap();
        assert_eq!(
            pg.midi_grid().sorted(),
            vec![60.0, 62.0, 64.0, 65.0, 67.0, 69.0, 71.0, 72.0]
        );
        assert_eq!(pg.name(), Some("ionian"));
        assert_eq!(pg.quantize_midi(66.0), Ok(65.0));
        assert!(matches!(
            PitchGrid::from_scale("bebop", &PitchSpec::from(60), 60.0, 72.0),
            Err(GridError::UnknownScale(_))
        ));
    }

    #[test]
    fn test_with_reference() {
        let pg = PitchGrid::new(PitchGridConfig::default())
            .unwrap()
            .with_reference(440.0, 69.0)
            .unwrap();
        assert_eq!(pg.quantize_hz(440.0), Ok(440.0));
        assert_eq!(pg.steps_per_octave(), Some(12));
    }

    #[test]
    fn test_config_from_json_uses_defaults() {
        let config: PitchGridConfig = serde_json::from_str(r#"{"steps_per_octave": 36}"#).unwrap();
        assert_eq!(config.steps_per_octave, 36);
        assert_eq!(config.ref_freq, 443.0);
        assert_eq!(config.midi_max, 130.0);
    }
}
