// Time quantisation in beats, with seconds helpers.
//
// A `TimeGrid` holds one sub-grid per beat subdivision `k`, each the lattice
// `{0, 1/k, 2/k, ...}` up to the duration (inclusive, within `LATTICE_EPS`),
// plus the union of all sub-grids. Lattice point `i` is computed as `i / k`
// rather than by repeated addition, so long grids do not drift.
//
// Durations are tracked in both beats and seconds. Beats are the source of
// truth: seconds are always re-derived as `beats * 60 / bpm`, which keeps the
// two consistent through construction and every `extend_to_beat`.
//
// The composition pipeline (`greasy_pidgin_music::composition`) extends the
// grid when raw events run past its end, then snaps event boundaries onto the
// union grid.

use crate::error::GridError;
use crate::grid::Grid;
use log::warn;
use std::collections::BTreeMap;

/// Tolerance for including the final lattice point of a sub-grid.
const LATTICE_EPS: f64 = 1e-9;

/// Durations in beats that differ by more than this are a mismatch.
const DURATION_MISMATCH_EPS: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub struct TimeGrid {
    bpm: f64,
    duration_beats: f64,
    duration_sec: f64,
    subdivisions: Vec<u32>,
    subgrids: BTreeMap<u32, Grid>,
    union: Grid,
}

impl TimeGrid {
    /// Build a grid covering `duration_sec` seconds and/or `duration_beats`
    /// beats. When both are given and disagree, the larger one is used and a
    /// warning is logged. An empty subdivision list means whole beats only.
    pub fn new(
        duration_sec: Option<f64>,
        duration_beats: Option<f64>,
        bpm: f64,
        subdivisions: &[u32],
    ) -> Result<Self, GridError> {
        if !(bpm.is_finite() && bpm > 0.0) {
            return Err(GridError::InvalidStep {
                step: bpm,
                reason: "tempo must be positive",
            });
        }
        for d in duration_sec.iter().chain(duration_beats.iter()) {
            if !d.is_finite() || *d < 0.0 {
                return Err(GridError::InvalidDuration(*d));
            }
        }

        let beats_from_sec = duration_sec.map(|s| s * bpm / 60.0);
        let beats = match (beats_from_sec, duration_beats) {
            (None, None) => return Err(GridError::MissingDuration),
            (Some(b), None) | (None, Some(b)) => b,
            (Some(from_sec), Some(b)) => {
                if (from_sec - b).abs() > DURATION_MISMATCH_EPS {
                    let larger = from_sec.max(b);
                    warn!(
                        "time grid durations disagree at {bpm} bpm \
                         ({from_sec:.6} beats from seconds, {b:.6} beats given); \
                         using {larger:.6} beats"
                    );
                    larger
                } else {
                    b
                }
            }
        };

        let mut unique = Vec::new();
        for &k in subdivisions {
            if k == 0 {
                return Err(GridError::InvalidStep {
                    step: 0.0,
                    reason: "subdivision must be a positive integer",
                });
            }
            if !unique.contains(&k) {
                unique.push(k);
            }
        }
        if unique.is_empty() {
            unique.push(1);
        }

        let mut grid = TimeGrid {
            bpm,
            duration_beats: beats,
            duration_sec: beats * 60.0 / bpm,
            subdivisions: unique,
            subgrids: BTreeMap::new(),
            union: Grid::new(),
        };
        grid.rebuild();
        Ok(grid)
    }

    pub fn from_beats(duration_beats: f64, bpm: f64, subdivisions: &[u32]) -> Result<Self, GridError> {
        Self::new(None, Some(duration_beats), bpm, subdivisions)
    }

    pub fn from_seconds(duration_sec: f64, bpm: f64, subdivisions: &[u32]) -> Result<Self, GridError> {
        Self::new(Some(duration_sec), None, bpm, subdivisions)
    }

    /// Assemble a grid from explicit per-subdivision point sets. The duration
    /// is the largest point of any sub-grid; an empty map gives an empty,
    /// zero-length grid.
    pub fn from_subgrids(subgrids: BTreeMap<u32, Grid>, bpm: f64) -> Result<Self, GridError> {
        if !(bpm.is_finite() && bpm > 0.0) {
            return Err(GridError::InvalidStep {
                step: bpm,
                reason: "tempo must be positive",
            });
        }
        if subgrids.contains_key(&0) {
            return Err(GridError::InvalidStep {
                step: 0.0,
                reason: "subdivision must be a positive integer",
            });
        }

        let mut union = Grid::new();
        for g in subgrids.values() {
            union.extend(g.iter());
        }
        let duration_beats = union.max().unwrap_or(0.0).max(0.0);

        Ok(TimeGrid {
            bpm,
            duration_beats,
            duration_sec: duration_beats * 60.0 / bpm,
            subdivisions: subgrids.keys().copied().collect(),
            subgrids,
            union,
        })
    }

    fn lattice(&self, k: u32) -> Grid {
        let k = f64::from(k);
        let last = ((self.duration_beats + LATTICE_EPS) * k).floor() as usize;
        Grid::fill(last + 1, |i| i as f64 / k)
    }

    fn rebuild(&mut self) {
        let subgrids: BTreeMap<u32, Grid> = self
            .subdivisions
            .iter()
            .map(|&k| (k, self.lattice(k)))
            .collect();
        let mut union = Grid::new();
        for g in subgrids.values() {
            union.extend(g.iter());
        }
        self.subgrids = subgrids;
        self.union = union;
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The union of every sub-grid.
    pub fn grid(&self) -> &Grid {
        &self.union
    }

    pub fn subgrid(&self, subdivision: u32) -> Result<&Grid, GridError> {
        self.subgrids
            .get(&subdivision)
            .ok_or(GridError::UnknownSubdivision(subdivision))
    }

    pub fn subdivisions(&self) -> &[u32] {
        &self.subdivisions
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn duration_beats(&self) -> f64 {
        self.duration_beats
    }

    pub fn duration_sec(&self) -> f64 {
        self.duration_sec
    }

    /// Length of one beat in seconds.
    pub fn beat_duration_sec(&self) -> f64 {
        60.0 / self.bpm
    }

    /// Smallest distance between two adjacent points of the union grid. A
    /// grid with fewer than two points falls back to the finest configured
    /// subdivision.
    pub fn finest_resolution_beats(&self) -> f64 {
        let gap = self
            .union
            .sorted()
            .windows(2)
            .map(|w| w[1] - w[0])
            .fold(f64::INFINITY, f64::min);
        if gap.is_finite() {
            gap
        } else {
            let k = self.subdivisions.iter().copied().max().unwrap_or(1);
            1.0 / f64::from(k)
        }
    }

    pub fn finest_resolution_sec(&self) -> f64 {
        self.beat_to_sec(self.finest_resolution_beats())
    }

    // -----------------------------------------------------------------------
    // Conversion and quantisation
    // -----------------------------------------------------------------------

    pub fn beat_to_sec(&self, beat: f64) -> f64 {
        beat * 60.0 / self.bpm
    }

    pub fn sec_to_beat(&self, sec: f64) -> f64 {
        sec * self.bpm / 60.0
    }

    /// Snap a beat position onto the union grid, or onto one sub-grid.
    pub fn quantize_beat(&self, beat: f64, subdivision: Option<u32>) -> Result<f64, GridError> {
        match subdivision {
            Some(k) => self.subgrid(k)?.quantise(beat),
            None => self.union.quantise(beat),
        }
    }

    /// Snap a time in seconds; the result is in seconds.
    pub fn quantize_sec(&self, sec: f64, subdivision: Option<u32>) -> Result<f64, GridError> {
        let beat = self.quantize_beat(self.sec_to_beat(sec), subdivision)?;
        Ok(self.beat_to_sec(beat))
    }

    /// Grow the grid so that it covers `beat`. Never shrinks; NaN is
    /// ignored and an infinite target fails with `InvalidDuration`.
    pub fn extend_to_beat(&mut self, beat: f64) -> Result<(), GridError> {
        if beat.is_nan() || beat <= self.duration_beats {
            return Ok(());
        }
        if beat.is_infinite() {
            return Err(GridError::InvalidDuration(beat));
        }
        self.duration_beats = beat;
        self.duration_sec = self.beat_to_sec(beat);
        self.rebuild();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;
    use more_asserts::assert_le;

    #[test]
    fn test_beats_only_whole_beats() {
        let tg = TimeGrid::from_beats(4.0, 120.0, &[1]).unwrap();
        assert_eq!(tg.duration_beats(), 4.0);
        assert!(approx_eq!(f64, tg.duration_sec(), 2.0));
        assert_eq!(tg.subdivisions(), &[1]);
        assert_eq!(tg.grid().sorted(), vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_seconds_only() {
        let tg = TimeGrid::from_seconds(3.0, 60.0, &[1]).unwrap();
        assert!(approx_eq!(f64, tg.duration_beats(), 3.0));
        assert_eq!(tg.grid().max(), Some(3.0));
    }

    #[test]
    fn test_both_durations_matching() {
        let tg = TimeGrid::new(Some(2.0), Some(4.0), 120.0, &[1]).unwrap();
        assert!(approx_eq!(f64, tg.duration_sec(), 2.0));
        assert!(approx_eq!(f64, tg.duration_beats(), 4.0));
    }

    #[test]
    fn test_both_durations_mismatch_uses_larger() {
        // 2 s at 60 bpm is 2 beats; 3 beats wins.
        let tg = TimeGrid::new(Some(2.0), Some(3.0), 60.0, &[1]).unwrap();
        assert!(approx_eq!(f64, tg.duration_beats(), 3.0));
        assert!(approx_eq!(f64, tg.duration_sec(), 3.0));
    }

    #[test]
    fn test_requires_a_duration() {
        assert_eq!(
            TimeGrid::new(None, None, 120.0, &[1]),
            Err(GridError::MissingDuration)
        );
    }

    #[test]
    fn test_rejects_bad_tempo_and_subdivision() {
        assert!(matches!(
            TimeGrid::from_beats(4.0, 0.0, &[1]),
            Err(GridError::InvalidStep { .. })
        ));
        assert!(matches!(
            TimeGrid::from_beats(4.0, -10.0, &[1]),
            Err(GridError::InvalidStep { .. })
        ));
        assert!(matches!(
            TimeGrid::from_beats(1.0, 120.0, &[2, 0]),
            Err(GridError::InvalidStep { .. })
        ));
    }

    #[test]
    fn test_rejects_negative_duration() {
        assert_eq!(
            TimeGrid::from_beats(-1.0, 120.0, &[1]),
            Err(GridError::InvalidDuration(-1.0))
        );
        assert!(matches!(
            TimeGrid::from_seconds(f64::NAN, 120.0, &[1]),
            Err(GridError::InvalidDuration(_))
        ));
    }

    #[test]
    fn test_rejects_infinite_duration() {
        assert_eq!(
            TimeGrid::from_beats(f64::INFINITY, 120.0, &[4]),
            Err(GridError::InvalidDuration(f64::INFINITY))
        );
        assert_eq!(
            TimeGrid::new(Some(10.0), Some(f64::INFINITY), 120.0, &[4]),
            Err(GridError::InvalidDuration(f64::INFINITY))
        );

        let mut tg = TimeGrid::from_beats(2.0, 120.0, &[4]).unwrap();
        let before = tg.clone();
        assert_eq!(
            tg.extend_to_beat(f64::INFINITY),
            Err(GridError::InvalidDuration(f64::INFINITY))
        );
        assert_eq!(tg.extend_to_beat(f64::NAN), Ok(()));
        assert_eq!(tg, before);
    }

    #[test]
    fn test_empty_subdivisions_default_to_whole_beats() {
        let tg = TimeGrid::from_beats(2.0, 120.0, &[]).unwrap();
        assert_eq!(tg.subdivisions(), &[1]);
        assert_eq!(tg.grid().len(), 3);
    }

    #[test]
    fn test_multiple_subdivisions_union() {
        let tg = TimeGrid::from_beats(1.0, 120.0, &[2, 3]).unwrap();
        assert_eq!(tg.subgrid(2).unwrap().sorted(), vec![0.0, 0.5, 1.0]);

        let g3 = tg.subgrid(3).unwrap();
        assert_eq!(g3.len(), 4);
        assert!(g3.contains(1.0 / 3.0));
        assert!(g3.contains(2.0 / 3.0));
        assert!(g3.contains(1.0));

        // {0, 1/3, 1/2, 2/3, 1}
        assert_eq!(tg.grid().len(), 5);
        for v in tg.subgrid(2).unwrap().union(g3).iter() {
            assert!(tg.grid().contains(v));
        }
    }

    #[test]
    fn test_long_grid_has_no_drift() {
        let tg = TimeGrid::from_beats(1000.0, 120.0, &[3]).unwrap();
        assert_eq!(tg.grid().len(), 3001);
        assert_eq!(tg.grid().max(), Some(1000.0));
    }

    #[test]
    fn test_beat_sec_roundtrip() {
        let tg = TimeGrid::from_beats(4.0, 120.0, &[1]).unwrap();
        assert!(approx_eq!(f64, tg.beat_to_sec(1.0), 0.5));
        assert!(approx_eq!(f64, tg.sec_to_beat(0.5), 1.0));
        for x in [0.0, 0.37, 1.0, 12.25, 999.9] {
            assert!(approx_eq!(f64, tg.beat_to_sec(tg.sec_to_beat(x)), x, epsilon = 1e-12));
            assert!(approx_eq!(f64, tg.sec_to_beat(tg.beat_to_sec(x)), x, epsilon = 1e-12));
        }
    }

    #[test]
    fn test_extend_to_beat() {
        let mut tg = TimeGrid::from_beats(1.0, 120.0, &[2]).unwrap();
        assert_eq!(tg.grid().max(), Some(1.0));

        tg.extend_to_beat(3.0).unwrap();
        assert_eq!(tg.duration_beats(), 3.0);
        assert!(approx_eq!(f64, tg.duration_sec(), 1.5));
        let g2 = tg.subgrid(2).unwrap();
        assert_eq!(g2.max(), Some(3.0));
        assert!(g2.contains(2.5));
        assert_eq!(tg.grid().max(), Some(3.0));
    }

    #[test]
    fn test_extend_to_beat_is_monotonic_and_idempotent() {
        let mut tg = TimeGrid::from_beats(2.0, 120.0, &[1]).unwrap();
        let before = tg.clone();
        tg.extend_to_beat(1.5).unwrap();
        assert_eq!(tg, before);

        tg.extend_to_beat(5.0).unwrap();
        let once = tg.clone();
        tg.extend_to_beat(5.0).unwrap();
        assert_eq!(tg, once);
        for p in before.grid().iter() {
            assert!(tg.grid().contains(p));
        }
        assert!(approx_eq!(
            f64,
            tg.duration_sec(),
            tg.duration_beats() * tg.beat_duration_sec()
        ));
    }

    #[test]
    fn test_quantize_beat_union() {
        let tg = TimeGrid::from_beats(4.0, 120.0, &[1]).unwrap();
        assert_eq!(tg.quantize_beat(1.49, None), Ok(1.0));
        assert_eq!(tg.quantize_beat(1.51, None), Ok(2.0));
    }

    #[test]
    fn test_quantize_beat_single_subdivision() {
        let tg = TimeGrid::from_beats(1.0, 120.0, &[2, 3]).unwrap();
        assert_eq!(tg.quantize_beat(0.4, Some(2)), Ok(0.5));
        let q3 = tg.quantize_beat(0.4, Some(3)).unwrap();
        assert!(approx_eq!(f64, q3, 1.0 / 3.0, epsilon = 1e-9));
    }

    #[test]
    fn test_quantize_beat_unknown_subdivision() {
        let tg = TimeGrid::from_beats(1.0, 120.0, &[2]).unwrap();
        assert_eq!(
            tg.quantize_beat(0.3, Some(3)),
            Err(GridError::UnknownSubdivision(3))
        );
    }

    #[test]
    fn test_quantize_sec() {
        let tg = TimeGrid::from_beats(4.0, 60.0, &[1]).unwrap();
        assert!(approx_eq!(f64, tg.quantize_sec(1.8, None).unwrap(), 2.0));

        let half = TimeGrid::from_beats(1.0, 60.0, &[2]).unwrap();
        assert!(approx_eq!(f64, half.quantize_sec(0.6, Some(2)).unwrap(), 0.5));
    }

    #[test]
    fn test_finest_resolution() {
        let tg = TimeGrid::from_beats(2.0, 120.0, &[2, 3]).unwrap();
        // 1/3 and 1/2 are 1/6 apart
        assert!(approx_eq!(f64, tg.finest_resolution_beats(), 1.0 / 6.0, epsilon = 1e-9));
        assert!(approx_eq!(f64, tg.finest_resolution_sec(), 1.0 / 12.0, epsilon = 1e-9));

        let zero = TimeGrid::from_beats(0.0, 120.0, &[4]).unwrap();
        assert_eq!(zero.grid().len(), 1);
        assert_eq!(zero.finest_resolution_beats(), 0.25);
        assert_le!(tg.finest_resolution_beats(), 0.5);
    }

    #[test]
    fn test_from_subgrids() {
        let mut parts = BTreeMap::new();
        parts.insert(2, Grid::series(0.0, 0.5, 5));
        parts.insert(3, [0.0, 1.0 / 3.0].into_iter().collect());
        let tg = TimeGrid::from_subgrids(parts, 60.0).unwrap();

        assert_eq!(tg.subdivisions(), &[2, 3]);
        assert_eq!(tg.duration_beats(), 2.0);
        assert_eq!(tg.duration_sec(), 2.0);
        assert_eq!(tg.grid().len(), 6);
        assert_eq!(tg.quantize_beat(0.3, Some(3)).unwrap(), 1.0 / 3.0);
    }

    #[test]
    fn test_from_empty_subgrids() {
        let tg = TimeGrid::from_subgrids(BTreeMap::new(), 120.0).unwrap();
        assert!(tg.grid().is_empty());
        assert_eq!(tg.duration_beats(), 0.0);
        assert_eq!(tg.quantize_beat(1.0, None), Err(GridError::EmptyGrid));
    }
}
