// Note-name parsing.
//
// Converts names such as `c4`, `bf3`, `cqs4` or `C-1` into (possibly
// fractional) MIDI numbers. A name is a letter `a`-`g`, an optional
// accidental token, and a signed octave. Accidentals cover the usual sharp
// and flat plus quarter-, sixth- and twelfth-tone inflections:
//
//   s  +1      f  -1
//   qs +1/2    qf -1/2
//   ss +1/3    sf -1/3
//   ts +1/6    tf -1/6
//
// Parsing is case-insensitive and ignores surrounding whitespace. MIDI is
// `12 * (octave + 1) + letter offset + accidental offset`, so `c4` is 60.
//
// `PitchSpec` lets pitch-grid constructors accept either a name or a number.

use crate::error::GridError;
use serde::{Deserialize, Serialize};
use std::fmt;

fn letter_offset(letter: char) -> Option<f64> {
    match letter {
        'c' => Some(0.0),
        'd' => Some(2.0),
        'e' => Some(4.0),
        'f' => Some(5.0),
        'g' => Some(7.0),
        'a' => Some(9.0),
        'b' => Some(11.0),
        _ => None,
    }
}

fn accidental_offset(token: &str) -> Option<f64> {
    match token {
        "" => Some(0.0),
        "s" => Some(1.0),
        "f" => Some(-1.0),
        "qs" => Some(0.5),
        "qf" => Some(-0.5),
        "ss" => Some(1.0 / 3.0),
        "sf" => Some(-1.0 / 3.0),
        "ts" => Some(1.0 / 6.0),
        "tf" => Some(-1.0 / 6.0),
        _ => None,
    }
}

/// Parse a note name into a MIDI number.
pub fn note2midi(note: &str) -> Result<f64, GridError> {
    let invalid = || GridError::InvalidNoteName(note.to_string());
    let name = note.trim().to_lowercase();

    let mut chars = name.chars();
    let letter = chars.next().ok_or_else(invalid)?;
    let base = letter_offset(letter).ok_or_else(invalid)?;

    let rest = chars.as_str();
    let octave_start = rest
        .find(|c: char| c == '-' || c.is_ascii_digit())
        .ok_or_else(invalid)?;
    let (accidental, octave) = rest.split_at(octave_start);

    let offset = accidental_offset(accidental).ok_or_else(invalid)?;
    let octave: i32 = octave.parse().map_err(|_| invalid())?;

    let octave = octave.checked_add(1).ok_or_else(invalid)?;

    Ok(12.0 * f64::from(octave) + base + offset)
}

/// Name of the nearest chromatic pitch, e.g. `cs4` for 61.2. Sharps are
/// used for black keys except E-flat and B-flat.
pub fn midi2note(midi: f64) -> String {
    const NAMES: [&str; 12] = [
        "c", "cs", "d", "ef", "e", "f", "fs", "g", "gs", "a", "bf", "b",
    ];
    let semitone = midi.round() as i64;
    let octave = semitone.div_euclid(12) - 1;
    let pc = semitone.rem_euclid(12) as usize;
    format!("{}{}", NAMES[pc], octave)
}

/// A pitch given either as a MIDI number or as a note name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PitchSpec {
    Midi(f64),
    Name(String),
}

impl PitchSpec {
    pub fn to_midi(&self) -> Result<f64, GridError> {
        match self {
            PitchSpec::Midi(m) => Ok(*m),
            PitchSpec::Name(name) => note2midi(name),
        }
    }
}

impl From<f64> for PitchSpec {
    fn from(value: f64) -> Self {
        PitchSpec::Midi(value)
    }
}

impl From<i32> for PitchSpec {
    fn from(value: i32) -> Self {
        PitchSpec::Midi(f64::from(value))
    }
}

impl From<&str> for PitchSpec {
    fn from(value: &str) -> Self {
        PitchSpec::Name(value.to_string())
    }
}

impl From<String> for PitchSpec {
    fn from(value: String) -> Self {
        PitchSpec::Name(value)
    }
}

impl fmt::Display for PitchSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PitchSpec::Midi(m) => write!(f, "{m}"),
            PitchSpec::Name(name) => f.write_str(name),
        }
    }
}
