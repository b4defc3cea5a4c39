// Named scales, modes and tuning systems.
//
// Pitch-grid construction helpers look scales and tuning systems up by name
// (`PitchGrid::from_scale`, `PitchGrid::from_tuning_system`). Scales are
// defined by their interval pattern above the root in semitones; fractional
// intervals are allowed, which is how the quarter-tone chromatic scale is
// expressed. Tuning systems are equal divisions of the octave.
//
// Names are matched case-insensitively, with `_` and spaces treated as `-`,
// and common aliases (`major`, `minor`, `24-edo`, ...) are accepted.

use crate::error::GridError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

fn normalize(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .replace(['_', ' '], "-")
}

/// A scale or mode, defined by its intervals above the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scale {
    /// C D E F G A B (the major scale)
    Ionian,
    /// D E F G A B C (minor with raised 6th)
    Dorian,
    /// E F G A B C D (half step from 1 to 2)
    Phrygian,
    /// F G A B C D E (raised 4th)
    Lydian,
    /// G A B C D E F (major with lowered 7th)
    Mixolydian,
    /// A B C D E F G (natural minor)
    Aeolian,
    /// B C D E F G A (diminished 5th above the root)
    Locrian,
    HarmonicMinor,
    MelodicMinor,
    WholeTone,
    MajorPentatonic,
    MinorPentatonic,
    Chromatic,
    /// All 24 quarter tones of the octave.
    QuarterToneChromatic,
}

impl Scale {
    pub const ALL: [Scale; 14] = [
        Scale::Ionian,
        Scale::Dorian,
        Scale::Phrygian,
        Scale::Lydian,
        Scale::Mixolydian,
        Scale::Aeolian,
        Scale::Locrian,
        Scale::HarmonicMinor,
        Scale::MelodicMinor,
        Scale::WholeTone,
        Scale::MajorPentatonic,
        Scale::MinorPentatonic,
        Scale::Chromatic,
        Scale::QuarterToneChromatic,
    ];

    /// Semitone intervals above the root, ascending, starting at 0.
    pub fn intervals(self) -> &'static [f64] {
        match self {
            Scale::Ionian => &[0.0, 2.0, 4.0, 5.0, 7.0, 9.0, 11.0],
            Scale::Dorian => &[0.0, 2.0, 3.0, 5.0, 7.0, 9.0, 10.0],
            Scale::Phrygian => &[0.0, 1.0, 3.0, 5.0, 7.0, 8.0, 10.0],
            Scale::Lydian => &[0.0, 2.0, 4.0, 6.0, 7.0, 9.0, 11.0],
            Scale::Mixolydian => &[0.0, 2.0, 4.0, 5.0, 7.0, 9.0, 10.0],
            Scale::Aeolian => &[0.0, 2.0, 3.0, 5.0, 7.0, 8.0, 10.0],
            Scale::Locrian => &[0.0, 1.0, 3.0, 5.0, 6.0, 8.0, 10.0],
            Scale::HarmonicMinor => &[0.0, 2.0, 3.0, 5.0, 7.0, 8.0, 11.0],
            Scale::MelodicMinor => &[0.0, 2.0, 3.0, 5.0, 7.0, 9.0, 11.0],
            Scale::WholeTone => &[0.0, 2.0, 4.0, 6.0, 8.0, 10.0],
            Scale::MajorPentatonic => &[0.0, 2.0, 4.0, 7.0, 9.0],
            Scale::MinorPentatonic => &[0.0, 3.0, 5.0, 7.0, 10.0],
            Scale::Chromatic => &[
                0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0,
            ],
            Scale::QuarterToneChromatic => &[
                0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0, 4.5, 5.0, 5.5, 6.0, 6.5, 7.0, 7.5,
                8.0, 8.5, 9.0, 9.5, 10.0, 10.5, 11.0, 11.5,
            ],
        }
    }

    /// Canonical (kebab-case) name.
    pub fn name(self) -> &'static str {
        match self {
            Scale::Ionian => "ionian",
            Scale::Dorian => "dorian",
            Scale::Phrygian => "phrygian",
            Scale::Lydian => "lydian",
            Scale::Mixolydian => "mixolydian",
            Scale::Aeolian => "aeolian",
            Scale::Locrian => "locrian",
            Scale::HarmonicMinor => "harmonic-minor",
            Scale::MelodicMinor => "melodic-minor",
            Scale::WholeTone => "whole-tone",
            Scale::MajorPentatonic => "major-pentatonic",
            Scale::MinorPentatonic => "minor-pentatonic",
            Scale::Chromatic => "chromatic",
            Scale::QuarterToneChromatic => "quarter-tone-chromatic",
        }
    }

    /// Whether a pitch (relative to the root, any octave) lies in the scale.
    pub fn contains_interval(self, semitones: f64) -> bool {
        let pc = semitones.rem_euclid(12.0);
        self.intervals()
            .iter()
            .any(|&iv| (iv - pc).abs() < 1e-9 || (iv + 12.0 - pc).abs() < 1e-9)
    }
}

impl FromStr for Scale {
    type Err = GridError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let key = normalize(name);
        match key.as_str() {
            "major" => Ok(Scale::Ionian),
            "minor" | "natural-minor" => Ok(Scale::Aeolian),
            _ => Scale::ALL
                .into_iter()
                .find(|s| s.name() == key)
                .ok_or_else(|| GridError::UnknownScale(name.to_string())),
        }
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An equal division of the octave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TuningSystem {
    /// 12 steps: semitones.
    Chromatic,
    /// 24 steps: quarter tones.
    QuarterTone,
    /// 36 steps: sixth tones.
    SixthTone,
    /// 48 steps: eighth tones.
    EighthTone,
    /// 72 steps: twelfth tones.
    TwelfthTone,
}

impl TuningSystem {
    pub const ALL: [TuningSystem; 5] = [
        TuningSystem::Chromatic,
        TuningSystem::QuarterTone,
        TuningSystem::SixthTone,
        TuningSystem::EighthTone,
        TuningSystem::TwelfthTone,
    ];

    pub fn steps_per_octave(self) -> u32 {
        match self {
            TuningSystem::Chromatic => 12,
            TuningSystem::QuarterTone => 24,
            TuningSystem::SixthTone => 36,
            TuningSystem::EighthTone => 48,
            TuningSystem::TwelfthTone => 72,
        }
    }

    /// Size of one step in semitones.
    pub fn step_semitones(self) -> f64 {
        12.0 / f64::from(self.steps_per_octave())
    }
}

impl FromStr for TuningSystem {
    type Err = GridError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let key = normalize(name);
        let by_name = match key.as_str() {
            "chromatic" | "semitone" => Some(TuningSystem::Chromatic),
            "quarter-tone" => Some(TuningSystem::QuarterTone),
            "sixth-tone" => Some(TuningSystem::SixthTone),
            "eighth-tone" => Some(TuningSystem::EighthTone),
            "twelfth-tone" => Some(TuningSystem::TwelfthTone),
            _ => None,
        };
        // "24-tet", "24-edo", "24tet", "24edo"
        let by_steps = || {
            let digits = key
                .strip_suffix("tet")
                .or_else(|| key.strip_suffix("edo"))?
                .trim_end_matches('-');
            let steps: u32 = digits.parse().ok()?;
            TuningSystem::ALL
                .into_iter()
                .find(|t| t.steps_per_octave() == steps)
        };
        by_name
            .or_else(by_steps)
            .ok_or_else(|| GridError::UnknownTuningSystem(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_scale_starts_on_root_and_ascends() {
        for scale in Scale::ALL {
            let iv = scale.intervals();
            assert_eq!(iv[0], 0.0, "{scale} must start on the root");
            assert!(iv.windows(2).all(|w| w[0] < w[1]), "{scale} must ascend");
            assert!(*iv.last().unwrap() < 12.0);
        }
    }

    #[test]
    fn test_scale_names_roundtrip() {
        for scale in Scale::ALL {
            assert_eq!(scale.name().parse::<Scale>(), Ok(scale));
        }
    }

    #[test]
    fn test_scale_aliases() {
        assert_eq!("Major".parse::<Scale>(), Ok(Scale::Ionian));
        assert_eq!("minor".parse::<Scale>(), Ok(Scale::Aeolian));
        assert_eq!("harmonic_minor".parse::<Scale>(), Ok(Scale::HarmonicMinor));
        assert_eq!("Whole Tone".parse::<Scale>(), Ok(Scale::WholeTone));
    }

    #[test]
    fn test_unknown_scale() {
        assert_eq!(
            "bebop-dominant".parse::<Scale>(),
            Err(GridError::UnknownScale("bebop-dominant".to_string()))
        );
    }

    #[test]
    fn test_contains_interval() {
        let dorian = Scale::Dorian;
        assert!(dorian.contains_interval(3.0)); // minor third
        assert!(!dorian.contains_interval(4.0)); // major third
        assert!(dorian.contains_interval(15.0)); // minor third an octave up
        assert!(dorian.contains_interval(-2.0)); // the 7th below
        assert!(Scale::QuarterToneChromatic.contains_interval(6.5));
    }

    #[test]
    fn test_tuning_system_names() {
        assert_eq!("12-tet".parse(), Ok(TuningSystem::Chromatic));
        assert_eq!("24edo".parse(), Ok(TuningSystem::QuarterTone));
        assert_eq!("72-EDO".parse(), Ok(TuningSystem::TwelfthTone));
        assert_eq!("sixth tone".parse(), Ok(TuningSystem::SixthTone));
        assert_eq!(TuningSystem::QuarterTone.step_semitones(), 0.5);
    }

    #[test]
    fn test_unknown_tuning_system() {
        assert_eq!(
            "19-tet".parse::<TuningSystem>(),
            Err(GridError::UnknownTuningSystem("19-tet".to_string()))
        );
        assert!("pythagorean".parse::<TuningSystem>().is_err());
    }
}
