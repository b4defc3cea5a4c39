// Composition configuration.
//
// `CompositionConfig` gathers every parameter the composition's grids are
// built from: duration and tempo for the time grid, the pitch grid's tuning,
// and the dynamic grid's step, headroom and vocabulary. It is loaded from
// JSON via `from_json`; every field has a default, so a config file only
// needs the values it changes (`{}` is a valid config).
//
// Players can be listed by palette instrument key (`PlayerConfig`); see
// `Player::from_config`.

use greasy_pidgin_grid::PitchGridConfig;
use greasy_pidgin_grid::dynamic_grid::{DEFAULT_DYNAMICS, DEFAULT_HEADROOM_DB, DEFAULT_STEP_DB};
use serde::{Deserialize, Serialize};

use crate::player::{
    DEFAULT_MAX_NOTE_DURATION_SEC, DEFAULT_MIN_NOTE_DURATION_SEC, DEFAULT_MIN_REST_DURATION_SEC,
};

/// Time signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meter {
    pub numerator: u32,
    pub denominator: u32,
}

impl Meter {
    /// Bar length in quarter-note beats (4/4 and 8/8 are both 4).
    pub fn beats_per_bar(&self) -> f64 {
        f64::from(self.numerator) * 4.0 / f64::from(self.denominator.max(1))
    }
}

impl Default for Meter {
    fn default() -> Self {
        Meter {
            numerator: 4,
            denominator: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub name: String,
    /// Key into the standard instrument palette.
    pub instrument: String,
    /// Falls back to the composition tempo.
    pub bpm: Option<f64>,
    pub min_note_duration_sec: f64,
    pub max_note_duration_sec: f64,
    pub min_rest_duration_sec: f64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        PlayerConfig {
            name: "player1".to_string(),
            instrument: "computer".to_string(),
            bpm: None,
            min_note_duration_sec: DEFAULT_MIN_NOTE_DURATION_SEC,
            max_note_duration_sec: DEFAULT_MAX_NOTE_DURATION_SEC,
            min_rest_duration_sec: DEFAULT_MIN_REST_DURATION_SEC,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositionConfig {
    pub duration_sec: f64,
    pub bpm: f64,
    /// Beat subdivisions offered by the time grid.
    pub beat_subdivisions: Vec<u32>,
    pub meter: Meter,
    pub pitch_grid: PitchGridConfig,
    pub dynamic_step_db: f64,
    pub headroom_db: f64,
    /// Dynamic markings, quietest first.
    pub dynamics: Vec<String>,
    pub players: Vec<PlayerConfig>,
}

impl Default for CompositionConfig {
    fn default() -> Self {
        CompositionConfig {
            duration_sec: 10.0,
            bpm: 120.0,
            beat_subdivisions: vec![4],
            meter: Meter::default(),
            pitch_grid: PitchGridConfig::default(),
            dynamic_step_db: DEFAULT_STEP_DB,
            headroom_db: DEFAULT_HEADROOM_DB,
            dynamics: DEFAULT_DYNAMICS.iter().map(|d| (*d).to_string()).collect(),
            players: Vec::new(),
        }
    }
}

impl CompositionConfig {
    /// Parse a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_is_default() {
        let config = CompositionConfig::from_json("{}").unwrap();
        assert_eq!(config, CompositionConfig::default());
        assert_eq!(config.beat_subdivisions, vec![4]);
        assert_eq!(config.pitch_grid.ref_freq, 443.0);
        assert_eq!(config.dynamics.len(), 12);
    }

    #[test]
    fn test_partial_json() {
        let json = r#"{
            "bpm": 90,
            "beat_subdivisions": [3, 4],
            "meter": {"numerator": 6, "denominator": 8},
            "pitch_grid": {"steps_per_octave": 24},
            "players": [{"name": "fl", "instrument": "flute"}]
        }"#;
        let config = CompositionConfig::from_json(json).unwrap();
        assert_eq!(config.bpm, 90.0);
        assert_eq!(config.beat_subdivisions, vec![3, 4]);
        assert_eq!(config.meter.beats_per_bar(), 3.0);
        assert_eq!(config.pitch_grid.steps_per_octave, 24);
        assert_eq!(config.pitch_grid.midi_max, 130.0);
        assert_eq!(config.players[0].instrument, "flute");
        assert_eq!(config.players[0].min_rest_duration_sec, 1.0 / 12.0);
        assert_eq!(config.duration_sec, 10.0);
    }

    #[test]
    fn test_roundtrip() {
        let config = CompositionConfig::default();
        let json = config.to_json().unwrap();
        assert_eq!(CompositionConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_rejects_invalid_json() {
        assert!(CompositionConfig::from_json("{ bpm: ").is_err());
        assert!(CompositionConfig::from_json(r#"{"bpm": "fast"}"#).is_err());
    }
}
