// Loudness quantisation onto a vocabulary of dynamic markings.
//
// Vocabulary entry `j` of `n` sits at `headroom_db + step_db * (n - 1 - j)`
// dB. `step_db` is negative, so the first marking is the quietest and the
// last one sits exactly at the headroom. With the defaults (-3 dB steps,
// -1 dB headroom) `ppppp` is -34 dB and `fffff` is -1 dB.

use crate::error::GridError;
use crate::grid::Grid;
use serde::{Deserialize, Serialize};

pub const DEFAULT_DYNAMICS: [&str; 12] = [
    "ppppp", "pppp", "ppp", "pp", "p", "mp", "mf", "f", "ff", "fff", "ffff", "fffff",
];

pub const DEFAULT_STEP_DB: f64 = -3.0;
pub const DEFAULT_HEADROOM_DB: f64 = -1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicLevel {
    pub marking: String,
    pub db: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DynamicGrid {
    step_db: f64,
    headroom_db: f64,
    /// Quietest first.
    levels: Vec<DynamicLevel>,
    thresholds: Grid,
}

impl DynamicGrid {
    pub fn new<S: Into<String>>(
        step_db: f64,
        headroom_db: f64,
        vocabulary: impl IntoIterator<Item = S>,
    ) -> Result<Self, GridError> {
        if !(step_db.is_finite() && step_db < 0.0) {
            return Err(GridError::InvalidStep {
                step: step_db,
                reason: "dynamic step must be negative",
            });
        }
        let markings: Vec<String> = vocabulary.into_iter().map(Into::into).collect();
        if markings.is_empty() {
            return Err(GridError::EmptyGrid);
        }

        Ok(Self::build(step_db, headroom_db, markings))
    }

    fn build(step_db: f64, headroom_db: f64, markings: Vec<String>) -> Self {
        let n = markings.len();
        let levels: Vec<DynamicLevel> = markings
            .into_iter()
            .enumerate()
            .map(|(j, marking)| DynamicLevel {
                marking,
                db: headroom_db + step_db * (n - 1 - j) as f64,
            })
            .collect();
        let thresholds = levels.iter().map(|l| l.db).collect();
        DynamicGrid {
            step_db,
            headroom_db,
            levels,
            thresholds,
        }
    }

    pub fn step_db(&self) -> f64 {
        self.step_db
    }

    pub fn headroom_db(&self) -> f64 {
        self.headroom_db
    }

    /// Marking/threshold pairs, quietest first.
    pub fn levels(&self) -> &[DynamicLevel] {
        &self.levels
    }

    /// Nearest threshold in dB.
    pub fn quantize_db(&self, db: f64) -> Result<f64, GridError> {
        self.thresholds.quantise(db)
    }

    /// Marking of the nearest threshold.
    pub fn map_db_to_dynamic(&self, db: f64) -> Result<&str, GridError> {
        let q = self.quantize_db(db)?;
        self.levels
            .iter()
            .find(|l| l.db == q)
            .map(|l| l.marking.as_str())
            .ok_or(GridError::EmptyGrid)
    }

    pub fn dynamic_to_db(&self, marking: &str) -> Option<f64> {
        self.levels
            .iter()
            .find(|l| l.marking == marking)
            .map(|l| l.db)
    }
}

impl Default for DynamicGrid {
    fn default() -> Self {
        let markings = DEFAULT_DYNAMICS.iter().map(|m| (*m).to_string()).collect();
        Self::build(DEFAULT_STEP_DB, DEFAULT_HEADROOM_DB, markings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extremes() {
        let dg = DynamicGrid::new(-3.0, -1.0, DEFAULT_DYNAMICS).unwrap();
        assert_eq!(dg.map_db_to_dynamic(-1.0), Ok("fffff"));
        assert_eq!(dg.map_db_to_dynamic(-100.0), Ok("ppppp"));
        assert_eq!(dg.map_db_to_dynamic(12.0), Ok("fffff"));
    }

    #[test]
    fn test_thresholds_ascend() {
        let dg = DynamicGrid::default();
        let dbs: Vec<f64> = dg.levels().iter().map(|l| l.db).collect();
        assert!(dbs.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(dbs[0], -34.0);
        assert_eq!(*dbs.last().unwrap(), -1.0);
    }

    #[test]
    fn test_default_matches_explicit() {
        assert_eq!(
            DynamicGrid::default(),
            DynamicGrid::new(-3.0, -1.0, DEFAULT_DYNAMICS).unwrap()
        );
    }

    #[test]
    fn test_quantize_db() {
        let dg = DynamicGrid::default();
        assert_eq!(dg.quantize_db(-15.0), Ok(-16.0));
        // halfway between -16 and -13
        assert_eq!(dg.quantize_db(-14.5), Ok(-16.0));
        assert_eq!(dg.map_db_to_dynamic(-15.0), Ok("mf"));
        assert!(matches!(
            dg.quantize_db(f64::NAN),
            Err(GridError::NotComparable(_))
        ));
    }

    #[test]
    fn test_dynamic_to_db() {
        let dg = DynamicGrid::default();
        assert_eq!(dg.dynamic_to_db("mf"), Some(-16.0));
        assert_eq!(dg.dynamic_to_db("fffff"), Some(-1.0));
        assert_eq!(dg.dynamic_to_db("sfz"), None);
    }

    #[test]
    fn test_custom_vocabulary() {
        let dg = DynamicGrid::new(-6.0, 0.0, ["p", "f"]).unwrap();
        assert_eq!(dg.dynamic_to_db("p"), Some(-6.0));
        assert_eq!(dg.map_db_to_dynamic(-2.0), Ok("f"));
    }

    #[test]
    fn test_invalid_construction() {
        assert!(matches!(
            DynamicGrid::new(0.0, -1.0, DEFAULT_DYNAMICS),
            Err(GridError::InvalidStep { .. })
        ));
        assert!(matches!(
            DynamicGrid::new(3.0, -1.0, DEFAULT_DYNAMICS),
            Err(GridError::InvalidStep { .. })
        ));
        assert_eq!(
            DynamicGrid::new(-3.0, -1.0, Vec::<String>::new()),
            Err(GridError::EmptyGrid)
        );
    }
}
