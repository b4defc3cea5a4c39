// The composition pipeline: snapping player event lists onto the grids.
//
// A `Composition` owns the three grids built from `CompositionConfig` and
// the players whose event lists it transforms in place. Per player, the
// stages run in this order, each relying on what the previous one left:
//
// 1. quantize_event_list_to_beats: sort, grow the time grid to cover every
//    event, snap both ends of every event onto the union grid.
// 2. remove_empty_events: drop rests that quantised to less than the finest
//    grid step. Degenerate notes stay.
// 3. remove_grace_notes: drop anything of (near) zero beat duration.
// 4. remove_simultaneous_events: keep only the first event per millisecond
//    start time.
// 5. consolidate_durations: drop one too-short note, or close every gap
//    between neighbours, either by stretching the earlier event (gap up to
//    the minimum rest) or by inserting a rest.
// 6. consolidate_tied_notes: across all players, report notes that cross a
//    beat boundary and would need a tie.
//
// Stage 5 stops at the first short note it removes and reports it through
// `ConsolidationOutcome::RemovedShortEvent`; callers that want a fully
// consolidated list re-invoke until `Complete`. Stage 6 only reports: no
// ties are written into the chords.
//
// Pitch and dynamic snapping (`quantize_event_list_pitches`,
// `quantize_event_list_dynamics`) are independent of the timing stages and
// can run at any point after them.

use crate::config::CompositionConfig;
use crate::error::CompositionError;
use crate::event::Event;
use crate::instrument::RangeOptions;
use crate::player::Player;
use greasy_pidgin_grid::{DynamicGrid, PitchGrid, TimeGrid};
use log::{debug, info, warn};
use std::collections::BTreeSet;

/// Slack for duration comparisons against grid-derived thresholds.
const DURATION_EPS: f64 = 1e-9;

/// Default tolerance for `remove_grace_notes`.
pub const GRACE_NOTE_TOLERANCE: f64 = 1e-9;

/// Result of one `consolidate_durations` pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsolidationOutcome {
    /// Every gap was closed.
    Complete,
    /// The event at `index` was shorter than the minimum note duration and
    /// was removed; nothing after it was processed.
    RemovedShortEvent { index: usize },
}

/// A note that crosses a beat boundary and would need to be split and tied.
#[derive(Debug, Clone, PartialEq)]
pub struct TieDiagnostic {
    pub player: usize,
    pub event: usize,
    pub start_beat: f64,
    /// First whole beat after the start that the note runs past.
    pub boundary_beat: f64,
    pub at_bar_line: bool,
}

#[derive(Debug, Clone)]
pub struct Composition {
    config: CompositionConfig,
    time_grid: TimeGrid,
    pitch_grid: PitchGrid,
    dynamic_grid: DynamicGrid,
    players: Vec<Player>,
}

impl Composition {
    pub fn new(config: CompositionConfig, players: Option<Vec<Player>>) -> Result<Self, CompositionError> {
        let dynamic_grid = DynamicGrid::new(
            config.dynamic_step_db,
            config.headroom_db,
            config.dynamics.iter().cloned(),
        )?;
        let time_grid = TimeGrid::from_seconds(config.duration_sec, config.bpm, &config.beat_subdivisions)?;
        let pitch_grid = PitchGrid::new(config.pitch_grid.clone())?;

        let players = players.unwrap_or_else(|| {
            warn!("composition created without a player list");
            Vec::new()
        });

        Ok(Composition {
            config,
            time_grid,
            pitch_grid,
            dynamic_grid,
            players,
        })
    }

    /// Build the composition and its players (from the standard palette) out
    /// of one configuration.
    pub fn from_config(config: CompositionConfig) -> Result<Self, CompositionError> {
        let players = config
            .players
            .iter()
            .map(|p| Player::from_config(p, config.bpm))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(config, Some(players))
    }

    pub fn config(&self) -> &CompositionConfig {
        &self.config
    }

    pub fn time_grid(&self) -> &TimeGrid {
        &self.time_grid
    }

    pub fn pitch_grid(&self) -> &PitchGrid {
        &self.pitch_grid
    }

    pub fn dynamic_grid(&self) -> &DynamicGrid {
        &self.dynamic_grid
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, index: usize) -> Result<&Player, CompositionError> {
        self.players
            .get(index)
            .ok_or(CompositionError::UnknownPlayer(index))
    }

    pub fn player_mut(&mut self, index: usize) -> Result<&mut Player, CompositionError> {
        self.players
            .get_mut(index)
            .ok_or(CompositionError::UnknownPlayer(index))
    }

    /// Add a player; returns its index.
    pub fn add_player(&mut self, player: Player) -> usize {
        self.players.push(player);
        self.players.len() - 1
    }

    // -----------------------------------------------------------------------
    // Stage 1: time quantisation
    // -----------------------------------------------------------------------

    /// Snap one event onto the time grid. `None` is logged and skipped.
    pub fn quantize_event(&self, event: Option<&mut Event>) -> Result<(), CompositionError> {
        quantize_event_on(&self.time_grid, event)
    }

    pub fn quantize_event_list_to_beats(&mut self, index: usize) -> Result<(), CompositionError> {
        let player = self
            .players
            .get_mut(index)
            .ok_or(CompositionError::UnknownPlayer(index))?;
        player.sort_events_by_time();

        let beat_sec = self.time_grid.beat_duration_sec();
        let last_beat = player
            .events()
            .iter()
            .map(|e| e.end_sec() / beat_sec)
            .fold(f64::NEG_INFINITY, f64::max);
        if last_beat.is_finite() && last_beat > self.time_grid.duration_beats() {
            debug!(
                "extending time grid from {} to {} beats for player '{}'",
                self.time_grid.duration_beats(),
                last_beat.ceil(),
                player.name
            );
            self.time_grid.extend_to_beat(last_beat.ceil())?;
        }

        for event in player.events_mut().iter_mut() {
            quantize_event_on(&self.time_grid, Some(event))?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Stages 2-4: filtering
    // -----------------------------------------------------------------------

    /// Drop rests shorter than the finest grid step. Durations are measured
    /// in grid beats, whatever the player's own tempo.
    pub fn remove_empty_events(&mut self, index: usize) -> Result<(), CompositionError> {
        let finest = self.time_grid.finest_resolution_beats();
        let beat_sec = self.time_grid.beat_duration_sec();
        let player = self.player_mut(index)?;
        player
            .events_mut()
            .retain(|e| !(e.is_rest() && e.duration_sec() / beat_sec < finest - DURATION_EPS));
        player.sort_events_by_time();
        Ok(())
    }

    /// Drop events whose beat duration is within `tolerance` of zero.
    pub fn remove_grace_notes(&mut self, index: usize, tolerance: f64) -> Result<(), CompositionError> {
        let player = self.player_mut(index)?;
        player
            .events_mut()
            .retain(|e| e.duration_beats().abs() > tolerance);
        player.sort_events_by_time();
        Ok(())
    }

    /// Keep only the first event starting in any given millisecond.
    pub fn remove_simultaneous_events(&mut self, index: usize) -> Result<(), CompositionError> {
        let player = self.player_mut(index)?;
        player.sort_events_by_time();
        let mut seen = BTreeSet::new();
        player
            .events_mut()
            .retain(|e| seen.insert((e.start_sec() * 1000.0).round() as i64));
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Stage 5: duration consolidation
    // -----------------------------------------------------------------------

    /// Raise the player's minimum note duration to the finest grid step.
    pub fn consolidate_min_note_duration(&mut self, index: usize) -> Result<(), CompositionError> {
        let finest = self.time_grid.finest_resolution_sec();
        let player = self.player_mut(index)?;
        if player.min_note_duration_sec < finest {
            player.min_note_duration_sec = finest;
        }
        Ok(())
    }

    pub fn consolidate_durations(
        &mut self,
        index: usize,
        allow_polyphony: bool,
    ) -> Result<ConsolidationOutcome, CompositionError> {
        self.consolidate_min_note_duration(index)?;
        let player = self.player_mut(index)?;
        if player.events().is_empty() {
            return Err(CompositionError::EmptyPlayerEventList(index));
        }
        if allow_polyphony {
            return Err(CompositionError::PolyphonyNotSupported);
        }

        player.sort_events_by_time();
        let starts = player.start_times_sec();
        let ends = player.end_times_sec();
        let min_note = player.min_note_duration_sec;
        let min_rest = player.min_rest_duration_sec;

        let events = player.events_mut();
        let mut rests = Vec::new();
        for i in 0..events.len() - 1 {
            let event = &mut events[i];
            if event.duration_sec() < min_note - DURATION_EPS {
                debug!(
                    "removing event {i} ({} s) shorter than the minimum note duration {min_note} s",
                    event.duration_sec()
                );
                events.remove(i);
                events.extend(rests);
                player.sort_events_by_time();
                return Ok(ConsolidationOutcome::RemovedShortEvent { index: i });
            }

            let gap = starts[i + 1] - ends[i];
            if gap <= min_rest {
                let duration = (event.duration_sec() + gap).max(0.0);
                event.set_seconds(event.start_sec(), duration);
                event.sync_chord_duration();
            } else {
                rests.push(Event::rest(ends[i], gap, event.bpm()));
            }
        }

        events.extend(rests);
        player.sort_events_by_time();
        Ok(ConsolidationOutcome::Complete)
    }

    // -----------------------------------------------------------------------
    // Stage 6: tie detection
    // -----------------------------------------------------------------------

    /// Report every note, in every player, that runs past the next whole
    /// grid beat after its start.
    pub fn consolidate_tied_notes(&mut self) -> Vec<TieDiagnostic> {
        let beats_per_bar = self.config.meter.beats_per_bar();
        let beat_sec = self.time_grid.beat_duration_sec();
        let mut diagnostics = Vec::new();
        for (p, player) in self.players.iter_mut().enumerate() {
            player.sort_events_by_time();
            for (e, event) in player.events().iter().enumerate() {
                if event.is_rest() {
                    continue;
                }
                let start = event.start_sec() / beat_sec;
                let boundary = start.floor() + 1.0;
                if event.duration_sec() / beat_sec <= boundary - start + DURATION_EPS {
                    continue;
                }
                let bar_offset = boundary.rem_euclid(beats_per_bar);
                let at_bar_line =
                    bar_offset < DURATION_EPS || beats_per_bar - bar_offset < DURATION_EPS;
                info!(
                    "player '{}' event {e} at beat {start} crosses beat {boundary}{} and needs a tie",
                    player.name,
                    if at_bar_line { " (bar line)" } else { "" }
                );
                diagnostics.push(TieDiagnostic {
                    player: p,
                    event: e,
                    start_beat: start,
                    boundary_beat: boundary,
                    at_bar_line,
                });
            }
        }
        diagnostics
    }

    // -----------------------------------------------------------------------
    // Pitch and dynamics
    // -----------------------------------------------------------------------

    /// Snap every note's pitches onto the pitch grid, then move them by
    /// octaves into the instrument's sounding range.
    pub fn quantize_event_list_pitches(&mut self, index: usize) -> Result<(), CompositionError> {
        let player = self
            .players
            .get_mut(index)
            .ok_or(CompositionError::UnknownPlayer(index))?;
        let options = RangeOptions {
            sounding: true,
            ..RangeOptions::default()
        };
        let instrument = player.instrument.clone();
        for event in player.events_mut().iter_mut().filter(|e| !e.is_rest()) {
            let pitches = event
                .pitches()
                .iter()
                .map(|&m| -> Result<f64, CompositionError> {
                    let snapped = self.pitch_grid.quantize_midi(m)?;
                    Ok(instrument.force_in_range(snapped, options)?)
                })
                .collect::<Result<Vec<f64>, CompositionError>>()?;
            event.chord.set_pitches(pitches);
        }
        Ok(())
    }

    /// Snap every note's loudness onto the dynamic grid.
    pub fn quantize_event_list_dynamics(&mut self, index: usize) -> Result<(), CompositionError> {
        let player = self
            .players
            .get_mut(index)
            .ok_or(CompositionError::UnknownPlayer(index))?;
        for event in player.events_mut().iter_mut().filter(|e| !e.is_rest()) {
            event.dynamic_db = self.dynamic_grid.quantize_db(event.dynamic_db)?;
        }
        Ok(())
    }

    /// Run stages 1 to 5 once on one player.
    pub fn run_pipeline(&mut self, index: usize) -> Result<ConsolidationOutcome, CompositionError> {
        self.quantize_event_list_to_beats(index)?;
        self.remove_empty_events(index)?;
        self.remove_grace_notes(index, GRACE_NOTE_TOLERANCE)?;
        self.remove_simultaneous_events(index)?;
        self.consolidate_durations(index, false)
    }
}

fn quantize_event_on(time_grid: &TimeGrid, event: Option<&mut Event>) -> Result<(), CompositionError> {
    let Some(event) = event else {
        warn!("asked to quantise a missing event; skipping");
        return Ok(());
    };

    let beat_sec = time_grid.beat_duration_sec();
    let start = time_grid.quantize_beat(event.start_sec() / beat_sec, None)?;
    let end = time_grid.quantize_beat(event.end_sec() / beat_sec, None)?;
    let duration = (end - start).max(0.0);

    if event.bpm() == time_grid.bpm() {
        event.set_beats(start, duration);
    } else {
        event.set_seconds(start * beat_sec, duration * beat_sec);
    }
    event.sync_chord_duration();
    Ok(())
}
