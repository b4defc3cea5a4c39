// A player: one instrument, its event list, and its duration policy.
//
// The event list is what the composition pipeline transforms in place. A
// fresh player starts with a single minute-long rest so that a composition
// always has something to quantise; callers replacing the material outright
// use `Player::with_events`.
//
// The three policy values bound what `Composition::consolidate_durations`
// will leave behind: notes shorter than `min_note_duration_sec` are dropped,
// gaps up to `min_rest_duration_sec` are absorbed into the preceding event.

use crate::config::PlayerConfig;
use crate::error::InstrumentError;
use crate::event::Event;
use crate::instrument::Instrument;
use crate::palette;

pub const DEFAULT_MIN_NOTE_DURATION_SEC: f64 = 1.0 / 12.0;
pub const DEFAULT_MAX_NOTE_DURATION_SEC: f64 = 20.0;
pub const DEFAULT_MIN_REST_DURATION_SEC: f64 = 1.0 / 12.0;

/// Length of the rest a new player starts with.
pub const INITIAL_REST_SEC: f64 = 60.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub name: String,
    pub instrument: Instrument,
    pub bpm: f64,
    events: Vec<Event>,
    pub min_note_duration_sec: f64,
    pub max_note_duration_sec: f64,
    pub min_rest_duration_sec: f64,
}

impl Player {
    pub fn new(name: impl Into<String>, instrument: Instrument, bpm: f64) -> Self {
        Self::with_events(name, instrument, bpm, vec![Event::rest(0.0, INITIAL_REST_SEC, bpm)])
    }

    pub fn with_events(
        name: impl Into<String>,
        instrument: Instrument,
        bpm: f64,
        events: Vec<Event>,
    ) -> Self {
        Player {
            name: name.into(),
            instrument,
            bpm,
            events,
            min_note_duration_sec: DEFAULT_MIN_NOTE_DURATION_SEC,
            max_note_duration_sec: DEFAULT_MAX_NOTE_DURATION_SEC,
            min_rest_duration_sec: DEFAULT_MIN_REST_DURATION_SEC,
        }
    }

    /// Build a player from configuration, taking the instrument from the
    /// standard palette. `default_bpm` applies when the config gives none.
    pub fn from_config(config: &PlayerConfig, default_bpm: f64) -> Result<Self, InstrumentError> {
        let instrument = palette::standard_instrument(&config.instrument)?;
        let mut player = Self::new(&config.name, instrument, config.bpm.unwrap_or(default_bpm));
        player.min_note_duration_sec = config.min_note_duration_sec;
        player.max_note_duration_sec = config.max_note_duration_sec;
        player.min_rest_duration_sec = config.min_rest_duration_sec;
        Ok(player)
    }

    /// Append a note at the player's tempo.
    pub fn add_event(&mut self, start_sec: f64, duration_sec: f64, dynamic_db: f64, pitches: Vec<f64>) {
        self.events
            .push(Event::new(start_sec, duration_sec, dynamic_db, pitches, self.bpm));
    }

    pub fn push_event(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut Vec<Event> {
        &mut self.events
    }

    /// Stable sort by start time.
    pub fn sort_events_by_time(&mut self) {
        self.events
            .sort_by(|a, b| a.start_sec().total_cmp(&b.start_sec()));
    }

    pub fn start_times_sec(&self) -> Vec<f64> {
        self.events.iter().map(Event::start_sec).collect()
    }

    pub fn durations_sec(&self) -> Vec<f64> {
        self.events.iter().map(Event::duration_sec).collect()
    }

    pub fn end_times_sec(&self) -> Vec<f64> {
        self.events.iter().map(Event::end_sec).collect()
    }
}
