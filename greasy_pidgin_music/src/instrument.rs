// Instrument descriptors: ranges, clefs, capabilities and range forcing.
//
// An `Instrument` is a static value describing what a player can realise.
// Ranges are MIDI numbers. The written range is what appears in the part;
// the sounding range is the written range shifted by
// `transposition_semitones` (negative for instruments that sound lower than
// written, e.g. -2 for a B-flat clarinet).
//
// Missing notes (pitches an instrument cannot produce, typically microtones
// on woodwinds) are stored twice, as written and as sounding MIDI. They are
// kept as exact grid points, so a missing quarter tone at 60.5 does not
// shadow the chromatic 60 or 61.
//
// `in_range` reports *why* a pitch was rejected: `RangeSide` only for range
// failures, `None` for microtone or missing-note rejection. `force_in_range`
// uses that to move a pitch by octaves until it fits.
//
// See also: `palette.rs` for the standard orchestra built from these
// descriptors, `composition.rs` which forces quantised pitches into range.

use crate::error::InstrumentError;
use greasy_pidgin_grid::Grid;
use serde::{Deserialize, Serialize};

/// Maximum octave shifts tried by `force_in_range` before clamping.
const MAX_OCTAVE_SHIFTS: usize = 16;

/// Pitches closer than this to an integer count as chromatic.
const MICROTONE_EPS: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Clef {
    Treble,
    Bass,
    Alto,
    Tenor,
    Percussion,
    /// Treble clef sounding an octave lower (tenor voice, guitar).
    #[serde(rename = "treble-8vb")]
    Treble8vb,
    DoubleTreble,
    DoubleBass,
}

/// Which side of the range a rejected pitch fell on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RangeSide {
    TooLow = 0,
    TooHigh = 1,
}

/// Flags for `in_range` / `force_in_range`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RangeOptions {
    /// Check against the sounding range and sounding missing notes instead
    /// of the written ones.
    pub sounding: bool,
    /// Accept microtones even when the instrument cannot play them.
    pub allow_microtones: bool,
    pub allow_missing_notes: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Instrument {
    pub name: String,
    pub num_systems: u32,
    pub init_clefs: Vec<Clef>,
    pub possible_clefs: Vec<Clef>,
    pub chords_possible: bool,
    pub microtones: bool,
    lowest_written: f64,
    highest_written: f64,
    transposition_semitones: f64,
    missing_written: Grid,
    missing_sounding: Grid,
    /// Written dynamic extremes, quietest first.
    pub written_dynamic_range: (String, String),
    /// Physical loudness extremes in dB, quietest first.
    pub physical_dynamic_range_db: (f64, f64),
    /// General MIDI program number (1-based).
    pub midi_program: u8,
}

impl Instrument {
    /// A non-transposing instrument with the given written range and
    /// otherwise default settings. Reversed bounds are swapped.
    pub fn new(name: impl Into<String>, written_range: (f64, f64)) -> Self {
        let (low, high) = written_range;
        Instrument {
            name: name.into(),
            lowest_written: low.min(high),
            highest_written: low.max(high),
            ..Instrument::default()
        }
    }

    pub fn with_transposition(mut self, semitones: f64) -> Self {
        self.transposition_semitones = semitones;
        self.missing_sounding = self.missing_written.iter().map(|m| m + semitones).collect();
        self
    }

    /// Written pitches the instrument cannot produce.
    pub fn with_missing_notes(mut self, written: &[f64]) -> Self {
        self.missing_written = written.iter().copied().collect();
        self.missing_sounding = written
            .iter()
            .map(|m| m + self.transposition_semitones)
            .collect();
        self
    }

    pub fn with_clefs(mut self, init: &[Clef], possible: &[Clef]) -> Self {
        self.init_clefs = init.to_vec();
        self.possible_clefs = possible.to_vec();
        self
    }

    pub fn with_num_systems(mut self, num_systems: u32) -> Self {
        self.num_systems = num_systems;
        self
    }

    pub fn with_chords(mut self, chords_possible: bool) -> Self {
        self.chords_possible = chords_possible;
        self
    }

    pub fn with_microtones(mut self, microtones: bool) -> Self {
        self.microtones = microtones;
        self
    }

    pub fn with_dynamic_range(mut self, written: (&str, &str), physical_db: (f64, f64)) -> Self {
        self.written_dynamic_range = (written.0.to_string(), written.1.to_string());
        self.physical_dynamic_range_db = physical_db;
        self
    }

    pub fn with_midi_program(mut self, program: u8) -> Self {
        self.midi_program = program;
        self
    }

    // -----------------------------------------------------------------------
    // Range queries
    // -----------------------------------------------------------------------

    pub fn transposition_semitones(&self) -> f64 {
        self.transposition_semitones
    }

    pub fn is_transposing(&self) -> bool {
        self.transposition_semitones != 0.0
    }

    pub fn written_to_sounding(&self, midi: f64) -> f64 {
        midi + self.transposition_semitones
    }

    pub fn sounding_to_written(&self, midi: f64) -> f64 {
        midi - self.transposition_semitones
    }

    /// `(lowest, highest)` written or sounding MIDI.
    pub fn range(&self, sounding: bool) -> (f64, f64) {
        if sounding {
            (
                self.written_to_sounding(self.lowest_written),
                self.written_to_sounding(self.highest_written),
            )
        } else {
            (self.lowest_written, self.highest_written)
        }
    }

    pub fn missing_notes(&self, sounding: bool) -> &Grid {
        if sounding {
            &self.missing_sounding
        } else {
            &self.missing_written
        }
    }

    /// Whether the instrument can play `midi`. On rejection the second value
    /// says which end of the range was exceeded, or is `None` when the pitch
    /// was refused as an unplayable microtone or a missing note.
    pub fn in_range(
        &self,
        midi: f64,
        options: RangeOptions,
    ) -> Result<(bool, Option<RangeSide>), InstrumentError> {
        if !midi.is_finite() {
            return Err(InstrumentError::InvalidInput(midi));
        }

        let is_micro = (midi - midi.round()).abs() > MICROTONE_EPS;
        if is_micro && !(self.microtones || options.allow_microtones) {
            return Ok((false, None));
        }

        if !options.allow_missing_notes && self.missing_notes(options.sounding).contains(midi) {
            return Ok((false, None));
        }

        let (low, high) = self.range(options.sounding);
        if midi < low {
            Ok((false, Some(RangeSide::TooLow)))
        } else if midi > high {
            Ok((false, Some(RangeSide::TooHigh)))
        } else {
            Ok((true, None))
        }
    }

    /// Move `midi` by octaves until it is playable, keeping any microtonal
    /// offset. Pitches rejected for reasons other than range are moved up.
    /// If no octave fits, the last candidate is clamped to the range.
    pub fn force_in_range(&self, midi: f64, options: RangeOptions) -> Result<f64, InstrumentError> {
        let (ok, side) = self.in_range(midi, options)?;
        if ok {
            return Ok(midi);
        }

        let step = match side {
            Some(RangeSide::TooHigh) => -12.0,
            Some(RangeSide::TooLow) | None => 12.0,
        };

        let mut candidate = midi;
        for _ in 0..MAX_OCTAVE_SHIFTS {
            candidate += step;
            if self.in_range(candidate, options)?.0 {
                return Ok(candidate);
            }
        }

        let (low, high) = self.range(options.sounding);
        Ok(candidate.clamp(low, high))
    }
}

impl Default for Instrument {
    fn default() -> Self {
        Instrument {
            name: "dummy".to_string(),
            num_systems: 1,
            init_clefs: vec![Clef::Treble],
            possible_clefs: vec![Clef::Treble, Clef::Bass],
            chords_possible: true,
            microtones: true,
            lowest_written: 0.0,
            highest_written: 127.0,
            transposition_semitones: 0.0,
            missing_written: Grid::new(),
            missing_sounding: Grid::new(),
            written_dynamic_range: ("ppppp".to_string(), "fffff".to_string()),
            physical_dynamic_range_db: (60.0, 100.0),
            midi_program: 1,
        }
    }
}
