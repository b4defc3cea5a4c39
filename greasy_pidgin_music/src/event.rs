// Timed note and rest events.
//
// An `Event` carries its timing twice, in seconds and in beats at the
// event's own tempo. The two are never set independently: `set_seconds`
// re-derives beats and `set_beats` re-derives seconds, and the end time is
// always `start + duration` in both units.
//
// The pitch payload is a `Chord`: a pitch list, a quarter-note duration and
// any ties. A pitch list of exactly `[0]` is a rest. The chord's duration is
// kept separately from the event's beat duration because the pipeline only
// updates it for notes (`sync_chord_duration`).

use serde::{Deserialize, Serialize};

/// The pitch list of a rest is `[REST_PITCH]`.
pub const REST_PITCH: f64 = 0.0;

/// Loudness given to rests.
pub const REST_DB: f64 = -100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TieType {
    Start,
    Continue,
    Stop,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chord {
    pitches: Vec<f64>,
    quarter_duration: f64,
    ties: Vec<TieType>,
}

impl Chord {
    pub fn new(pitches: Vec<f64>, quarter_duration: f64) -> Self {
        Chord {
            pitches,
            quarter_duration,
            ties: Vec::new(),
        }
    }

    pub fn rest(quarter_duration: f64) -> Self {
        Self::new(vec![REST_PITCH], quarter_duration)
    }

    pub fn pitches(&self) -> &[f64] {
        &self.pitches
    }

    pub fn set_pitches(&mut self, pitches: Vec<f64>) {
        self.pitches = pitches;
    }

    pub fn quarter_duration(&self) -> f64 {
        self.quarter_duration
    }

    pub fn set_quarter_duration(&mut self, quarter_duration: f64) {
        self.quarter_duration = quarter_duration;
    }

    pub fn is_rest(&self) -> bool {
        self.pitches == [REST_PITCH]
    }

    pub fn ties(&self) -> &[TieType] {
        &self.ties
    }

    pub fn add_tie(&mut self, tie: TieType) {
        self.ties.push(tie);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    start_sec: f64,
    duration_sec: f64,
    end_sec: f64,
    start_beats: f64,
    duration_beats: f64,
    end_beats: f64,
    pub dynamic_db: f64,
    bpm: f64,
    pub chord: Chord,
}

impl Event {
    /// A note (or rest, if `pitches == [0]`) with raw timing in seconds.
    pub fn new(start_sec: f64, duration_sec: f64, dynamic_db: f64, pitches: Vec<f64>, bpm: f64) -> Self {
        let duration_beats = duration_sec * bpm / 60.0;
        let mut event = Event {
            start_sec: 0.0,
            duration_sec: 0.0,
            end_sec: 0.0,
            start_beats: 0.0,
            duration_beats: 0.0,
            end_beats: 0.0,
            dynamic_db,
            bpm,
            chord: Chord::new(pitches, duration_beats),
        };
        event.set_seconds(start_sec, duration_sec);
        event
    }

    pub fn rest(start_sec: f64, duration_sec: f64, bpm: f64) -> Self {
        Self::new(start_sec, duration_sec, REST_DB, vec![REST_PITCH], bpm)
    }

    /// Set timing in seconds; beats follow.
    pub fn set_seconds(&mut self, start_sec: f64, duration_sec: f64) {
        self.start_sec = start_sec;
        self.duration_sec = duration_sec;
        self.end_sec = start_sec + duration_sec;
        self.start_beats = self.sec_to_beats(start_sec);
        self.duration_beats = self.sec_to_beats(duration_sec);
        self.end_beats = self.sec_to_beats(self.end_sec);
    }

    /// Set timing in beats; seconds follow.
    pub fn set_beats(&mut self, start_beats: f64, duration_beats: f64) {
        self.start_beats = start_beats;
        self.duration_beats = duration_beats;
        self.end_beats = start_beats + duration_beats;
        self.start_sec = self.beats_to_sec(start_beats);
        self.duration_sec = self.beats_to_sec(duration_beats);
        self.end_sec = self.beats_to_sec(self.end_beats);
    }

    /// Copy the beat duration onto the chord, unless this is a rest.
    pub fn sync_chord_duration(&mut self) {
        if !self.is_rest() {
            self.chord.set_quarter_duration(self.duration_beats);
        }
    }

    fn sec_to_beats(&self, sec: f64) -> f64 {
        sec * self.bpm / 60.0
    }

    fn beats_to_sec(&self, beats: f64) -> f64 {
        beats * 60.0 / self.bpm
    }

    pub fn start_sec(&self) -> f64 {
        self.start_sec
    }

    pub fn duration_sec(&self) -> f64 {
        self.duration_sec
    }

    pub fn end_sec(&self) -> f64 {
        self.end_sec
    }

    pub fn start_beats(&self) -> f64 {
        self.start_beats
    }

    pub fn duration_beats(&self) -> f64 {
        self.duration_beats
    }

    pub fn end_beats(&self) -> f64 {
        self.end_beats
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn pitches(&self) -> &[f64] {
        self.chord.pitches()
    }

    pub fn is_rest(&self) -> bool {
        self.chord.is_rest()
    }

    pub fn add_tie(&mut self, tie: TieType) {
        self.chord.add_tie(tie);
    }
}
