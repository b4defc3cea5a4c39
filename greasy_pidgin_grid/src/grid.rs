// The generic quantisation grid: a set of distinct values with nearest-value
// lookup.
//
// Every specialised grid in this crate (time, pitch, dynamics) is built on
// top of `Grid`. Values are stored in a `BTreeMap` keyed by a canonicalized
// form of the value (floats rounded to `CANONICAL_RESOLUTION`, negative zero
// folded onto zero), which gives:
// - uniqueness: inserting a value whose canonical key already exists is a
//   no-op, so `2/4` and `1/2` land on the same lattice point;
// - stable ascending iteration, so `sorted()` is free and output is
//   reproducible run to run;
// - O(log n) nearest lookup via the neighbours on either side of the query.
//
// Generator constructors mirror the SuperCollider collection helpers
// (`fill`, `series`, `geom`, `interpolation`, `rand`, `fib`). All of them are
// deterministic except `rand`, which draws from a caller-supplied RNG.

use crate::error::GridError;
use log::warn;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;
use std::ops::Bound;

/// Values closer together than this collapse onto one grid point.
pub const CANONICAL_RESOLUTION: f64 = 1e-9;

/// Above this magnitude the f64 spacing is already coarser than
/// `CANONICAL_RESOLUTION`, so keys are taken verbatim.
const ROUNDING_LIMIT: f64 = 1e6;

/// Broad numeric kind of a grid value, used by `Grid::check_types`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Integer,
    Real,
}

/// Canonical, totally ordered key of a grid value.
#[derive(Debug, Clone, Copy)]
pub struct GridKey(f64);

impl GridKey {
    /// Canonicalize a float. Returns `None` for NaN, which has no place in
    /// an ordered grid.
    pub fn new(value: f64) -> Option<Self> {
        if value.is_nan() {
            return None;
        }
        if !value.is_finite() || value.abs() >= ROUNDING_LIMIT {
            return Some(GridKey(value + 0.0));
        }
        let rounded = (value / CANONICAL_RESOLUTION).round() * CANONICAL_RESOLUTION;
        // `+ 0.0` turns -0.0 into 0.0.
        Some(GridKey(rounded + 0.0))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl PartialEq for GridKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GridKey {}

impl PartialOrd for GridKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GridKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Anything that can live on a grid: it has a numeric position and a kind.
pub trait GridValue: Copy + fmt::Debug {
    fn kind(&self) -> ValueKind;

    fn to_f64(&self) -> f64;

    /// Canonical key, or `None` if the value cannot be ordered.
    fn key(&self) -> Option<GridKey> {
        GridKey::new(self.to_f64())
    }

    fn distance(&self, other: &Self) -> f64 {
        (self.to_f64() - other.to_f64()).abs()
    }
}

impl GridValue for f64 {
    fn kind(&self) -> ValueKind {
        ValueKind::Real
    }
    fn to_f64(&self) -> f64 {
        *self
    }
}

impl GridValue for f32 {
    fn kind(&self) -> ValueKind {
        ValueKind::Real
    }
    fn to_f64(&self) -> f64 {
        f64::from(*self)
    }
}

impl GridValue for i64 {
    fn kind(&self) -> ValueKind {
        ValueKind::Integer
    }
    fn to_f64(&self) -> f64 {
        *self as f64
    }
}

impl GridValue for i32 {
    fn kind(&self) -> ValueKind {
        ValueKind::Integer
    }
    fn to_f64(&self) -> f64 {
        f64::from(*self)
    }
}

impl GridValue for u8 {
    fn kind(&self) -> ValueKind {
        ValueKind::Integer
    }
    fn to_f64(&self) -> f64 {
        f64::from(*self)
    }
}

/// A number that may be either integral or real, for grids that mix both.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    Integer(i64),
    Real(f64),
}

impl GridValue for Number {
    fn kind(&self) -> ValueKind {
        match self {
            Number::Integer(_) => ValueKind::Integer,
            Number::Real(_) => ValueKind::Real,
        }
    }

    fn to_f64(&self) -> f64 {
        match *self {
            Number::Integer(i) => i as f64,
            Number::Real(r) => r,
        }
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::Integer(value)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Real(value)
    }
}

/// A set of distinct values with nearest-value quantisation.
#[derive(Clone)]
pub struct Grid<T: GridValue = f64> {
    values: BTreeMap<GridKey, T>,
}

impl<T: GridValue> Grid<T> {
    pub fn new() -> Self {
        Grid {
            values: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Add a value. Returns `false` if an equal (canonically) value was
    /// already present or the value cannot be ordered; the first inserted
    /// representative is kept.
    pub fn insert(&mut self, value: T) -> bool {
        let Some(key) = value.key() else {
            warn!("ignoring unorderable grid value {value:?}");
            return false;
        };
        match self.values.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    pub fn contains(&self, value: T) -> bool {
        value.key().is_some_and(|k| self.values.contains_key(&k))
    }

    /// Values in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.values.values().copied()
    }

    pub fn sorted(&self) -> Vec<T> {
        self.iter().collect()
    }

    pub fn min(&self) -> Option<T> {
        self.values.first_key_value().map(|(_, v)| *v)
    }

    pub fn max(&self) -> Option<T> {
        self.values.last_key_value().map(|(_, v)| *v)
    }

    pub fn union(&self, other: &Grid<T>) -> Grid<T> {
        let mut merged = self.clone();
        merged.extend(other.iter());
        merged
    }

    /// With `Some(kind)`, true if every element has that kind. With `None`,
    /// true if all elements share a single kind. Empty grids pass both.
    pub fn check_types(&self, expected: Option<ValueKind>) -> bool {
        let mut kinds = self.values.values().map(GridValue::kind);
        match expected {
            Some(kind) => kinds.all(|k| k == kind),
            None => match kinds.next() {
                Some(first) => kinds.all(|k| k == first),
                None => true,
            },
        }
    }

    /// Whether `value` can be quantised against this grid at all.
    pub fn is_comparable(&self, value: T) -> bool {
        !self.is_empty() && value.key().is_some()
    }

    /// Return the element closest to `value`. When `value` sits exactly
    /// halfway between two elements the lower one wins.
    pub fn quantise(&self, value: T) -> Result<T, GridError> {
        if self.is_empty() {
            return Err(GridError::EmptyGrid);
        }
        let key = value
            .key()
            .ok_or_else(|| GridError::NotComparable(format!("{value:?}")))?;

        let below = self.values.range(..=key).next_back().map(|(_, v)| *v);
        let above = self
            .values
            .range((Bound::Excluded(key), Bound::Unbounded))
            .next()
            .map(|(_, v)| *v);

        match (below, above) {
            (Some(lo), Some(hi)) => {
                if value.distance(&hi) < value.distance(&lo) {
                    Ok(hi)
                } else {
                    Ok(lo)
                }
            }
            (Some(lo), None) => Ok(lo),
            (None, Some(hi)) => Ok(hi),
            (None, None) => Err(GridError::EmptyGrid),
        }
    }

    // -----------------------------------------------------------------------
    // Generators
    // -----------------------------------------------------------------------

    /// `size` elements, element `i` being `f(i)`.
    pub fn fill(size: usize, f: impl FnMut(usize) -> T) -> Self {
        (0..size).map(f).collect()
    }

    /// `size` copies of one value, which collapse to a single element.
    pub fn fill_value(size: usize, value: T) -> Self {
        Self::fill(size, |_| value)
    }
}

impl Grid<f64> {
    /// Arithmetic progression `start, start + step, ...`.
    pub fn series(start: f64, step: f64, size: usize) -> Self {
        Self::fill(size, |i| start + i as f64 * step)
    }

    /// Geometric progression `start, start * ratio, ...`.
    pub fn geom(start: f64, ratio: f64, size: usize) -> Self {
        Self::fill(size, |i| start * ratio.powi(i as i32))
    }

    /// `size` evenly spaced points over `[start, end]`, both ends included
    /// exactly.
    pub fn interpolation(start: f64, end: f64, size: usize) -> Result<Self, GridError> {
        match size {
            0 => Err(GridError::InvalidSize {
                size,
                reason: "interpolation needs at least one point",
            }),
            1 => Ok(Self::fill_value(1, start)),
            _ => {
                let step = (end - start) / (size - 1) as f64;
                Ok(Self::fill(size, |i| {
                    if i == size - 1 {
                        end
                    } else {
                        start + i as f64 * step
                    }
                }))
            }
        }
    }

    /// `size` uniform draws from `[low, high]`. With `integer`, draws whole
    /// numbers between the truncated bounds (inclusive). Collisions collapse,
    /// so the result may hold fewer than `size` points.
    pub fn rand(
        size: usize,
        low: f64,
        high: f64,
        integer: bool,
        rng: &mut impl Rng,
    ) -> Result<Self, GridError> {
        if low.is_nan() || high.is_nan() || low > high {
            return Err(GridError::InvalidRange { low, high });
        }
        let grid = if integer {
            let (lo, hi) = (low as i64, high as i64);
            Self::fill(size, |_| rng.random_range(lo..=hi) as f64)
        } else if low == high {
            Self::fill_value(size, low)
        } else {
            Self::fill(size, |_| rng.random_range(low..=high))
        };
        Ok(grid)
    }

    /// First `size` terms of the Fibonacci-style recurrence seeded `a, b`.
    pub fn fib(size: usize, a: f64, b: f64) -> Self {
        let mut terms = Vec::with_capacity(size);
        let (mut x, mut y) = (a, b);
        for _ in 0..size {
            terms.push(x);
            let next = x + y;
            x = y;
            y = next;
        }
        terms.into_iter().collect()
    }
}

impl<T: GridValue> Default for Grid<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: GridValue> fmt::Debug for Grid<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.values.values()).finish()
    }
}

/// Two grids are equal when they hold the same canonical points.
impl<T: GridValue> PartialEq for Grid<T> {
    fn eq(&self, other: &Self) -> bool {
        self.values.keys().eq(other.values.keys())
    }
}

impl<T: GridValue> FromIterator<T> for Grid<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut grid = Grid::new();
        grid.extend(iter);
        grid
    }
}

impl<T: GridValue> Extend<T> for Grid<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_duplicates_collapse() {
        let g: Grid<i64> = [1, 2, 3, 2, 1].into_iter().collect();
        assert_eq!(g.len(), 3);
        assert_eq!(g.sorted(), vec![1, 2, 3]);
    }

    #[test]
    fn test_near_equal_floats_collapse() {
        let g: Grid = [0.5, 2.0 / 4.0, 0.1 + 0.2, 0.3].into_iter().collect();
        assert_eq!(g.len(), 2);
        assert!(g.contains(0.3));
    }

    #[test]
    fn test_negative_zero_is_zero() {
        let g: Grid = [0.0, -0.0].into_iter().collect();
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn test_nan_is_not_inserted() {
        let mut g = Grid::new();
        assert!(!g.insert(f64::NAN));
        assert!(g.is_empty());
    }

    #[test]
    fn test_sorted() {
        let g: Grid<i64> = [5, 1, 3].into_iter().collect();
        assert_eq!(g.sorted(), vec![1, 3, 5]);
        assert_eq!(g.min(), Some(1));
        assert_eq!(g.max(), Some(5));
    }

    #[test]
    fn test_check_types_with_expected_kind() {
        let g: Grid<i64> = [1, 2, 3].into_iter().collect();
        assert!(g.check_types(Some(ValueKind::Integer)));
        assert!(!g.check_types(Some(ValueKind::Real)));
    }

    #[test]
    fn test_check_types_homogeneous() {
        let ints: Grid<Number> = [Number::Integer(1), Number::Integer(2)].into_iter().collect();
        assert!(ints.check_types(None));

        let mixed: Grid<Number> = [Number::Integer(1), Number::Real(2.5)].into_iter().collect();
        assert!(!mixed.check_types(None));
        assert!(!mixed.check_types(Some(ValueKind::Integer)));
    }

    #[test]
    fn test_check_types_empty() {
        let g: Grid<i64> = Grid::new();
        assert!(g.check_types(None));
        assert!(g.check_types(Some(ValueKind::Integer)));
    }

    #[test]
    fn test_is_comparable() {
        let g = Grid::series(1.0, 1.0, 3);
        assert!(g.is_comparable(2.5));
        assert!(!g.is_comparable(f64::NAN));
        assert!(!Grid::<f64>::new().is_comparable(1.0));
    }

    #[test]
    fn test_quantise_numeric() {
        let g: Grid<i64> = [0, 5, 10].into_iter().collect();
        assert_eq!(g.quantise(6), Ok(5));
        assert_eq!(g.quantise(-20), Ok(0));
        assert_eq!(g.quantise(200), Ok(10));

        let f: Grid = [0.0, 5.0, 10.0].into_iter().collect();
        assert_eq!(f.quantise(9.9), Ok(10.0));
    }

    #[test]
    fn test_quantise_tie_prefers_lower() {
        let g: Grid = [1.0, 2.0].into_iter().collect();
        assert_eq!(g.quantise(1.5), Ok(1.0));
    }

    #[test]
    fn test_quantise_is_idempotent() {
        let g = Grid::interpolation(0.0, 1.0, 7).unwrap();
        for p in g.iter() {
            assert_eq!(g.quantise(p), Ok(p));
        }
    }

    #[test]
    fn test_quantise_not_comparable() {
        let g: Grid = [1.0, 5.0, 10.0].into_iter().collect();
        assert!(matches!(
            g.quantise(f64::NAN),
            Err(GridError::NotComparable(_))
        ));
    }

    #[test]
    fn test_quantise_empty() {
        let g: Grid = Grid::new();
        assert_eq!(g.quantise(10.0), Err(GridError::EmptyGrid));
    }

    #[test]
    fn test_quantise_mixed_numbers() {
        let g: Grid<Number> = [Number::Integer(0), Number::Real(2.5), Number::Integer(5)]
            .into_iter()
            .collect();
        assert_eq!(g.quantise(Number::Integer(2)), Ok(Number::Real(2.5)));
    }

    #[test]
    fn test_fill_constant() {
        let g = Grid::fill_value(4, 7i64);
        assert_eq!(g.sorted(), vec![7]);
    }

    #[test]
    fn test_fill_function() {
        let g: Grid<i64> = Grid::fill(5, |i| i as i64 * 2);
        assert_eq!(g.sorted(), vec![0, 2, 4, 6, 8]);
    }

    #[test]
    fn test_series() {
        let g = Grid::series(0.0, 2.0, 5);
        assert_eq!(g.sorted(), vec![0.0, 2.0, 4.0, 6.0, 8.0]);
        assert!(Grid::series(3.0, 1.0, 0).is_empty());
    }

    #[test]
    fn test_geom() {
        let g = Grid::geom(1.0, 2.0, 4);
        assert_eq!(g.sorted(), vec![1.0, 2.0, 4.0, 8.0]);
    }

    #[test]
    fn test_interpolation() {
        let g = Grid::interpolation(0.0, 10.0, 6).unwrap();
        assert_eq!(g.sorted(), vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
    }

    #[test]
    fn test_interpolation_keeps_endpoints_exact() {
        let g = Grid::interpolation(0.1, 0.7, 7).unwrap();
        assert_eq!(g.min(), Some(0.1));
        assert_eq!(g.max(), Some(0.7));
        assert_eq!(g.len(), 7);
    }

    #[test]
    fn test_interpolation_single_point() {
        let g = Grid::interpolation(3.0, 9.0, 1).unwrap();
        assert_eq!(g.sorted(), vec![3.0]);
    }

    #[test]
    fn test_interpolation_zero_size() {
        assert!(matches!(
            Grid::interpolation(0.0, 1.0, 0),
            Err(GridError::InvalidSize { size: 0, .. })
        ));
    }

    #[test]
    fn test_rand_bounds_and_cardinality() {
        let mut rng = StdRng::seed_from_u64(7);
        let g = Grid::rand(10, 0.0, 1.0, false, &mut rng).unwrap();
        assert!(g.len() <= 10);
        assert!(g.iter().all(|v| (0.0..=1.0).contains(&v)));

        let ints = Grid::rand(200, 0.0, 127.0, true, &mut rng).unwrap();
        assert!(ints.len() <= 128);
        assert!(ints.iter().all(|v| v.fract() == 0.0 && (0.0..=127.0).contains(&v)));
    }

    #[test]
    fn test_rand_is_reproducible_with_seed() {
        let a = Grid::rand(16, -1.0, 1.0, false, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = Grid::rand(16, -1.0, 1.0, false, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rand_rejects_inverted_range() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            Grid::rand(3, 2.0, 1.0, false, &mut rng),
            Err(GridError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_fib() {
        let g = Grid::fib(7, 0.0, 1.0);
        // 0, 1, 1, 2, 3, 5, 8 with the repeated 1 collapsed
        assert_eq!(g.sorted(), vec![0.0, 1.0, 2.0, 3.0, 5.0, 8.0]);
        assert!(approx_eq!(f64, g.max().unwrap(), 8.0));
        assert!(Grid::fib(0, 0.0, 1.0).is_empty());
        assert_eq!(Grid::fib(1, 4.0, 9.0).sorted(), vec![4.0]);
    }

    #[test]
    fn test_union() {
        let a = Grid::series(0.0, 0.5, 3);
        let b = Grid::interpolation(0.0, 1.0, 4).unwrap();
        let u = a.union(&b);
        assert_eq!(u.len(), 5);
        assert!(u.contains(1.0 / 3.0));
        assert!(u.contains(0.5));
    }
}
