//! Windowed statistics over [`PricePoint`] slices.
//!
//! Every function is pure and works at full `f64` precision. Rounding for output is
//! applied separately via [`round_dp`] and the `*_DECIMALS` constants.

use crate::{
    series::{PricePoint, SeriesStore},
    symbol::Symbol,
};
use chrono::{DateTime, TimeDelta, Utc};
use fnv::{FnvHashMap, FnvHashSet};
use indexmap::IndexMap;
use itertools::Itertools;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use serde::Serialize;
use std::cmp::Ordering;

/// Output decimal places for prices, averages and standard deviations.
pub const PRICE_DECIMALS: u32 = 6;

/// Output decimal places for correlation coefficients.
pub const CORRELATION_DECIMALS: u32 = 4;

/// Minimum aligned pairs required to compute a correlation.
pub const MIN_ALIGNED_PAIRS: usize = 2;

/// Sample variance at or below which a series is treated as constant.
pub const ZERO_VARIANCE: f64 = 1e-10;

/// Round `value` to `dp` decimal places, midpoint away from zero.
///
/// Values a [`Decimal`] cannot represent (NaN, infinities, |x| > ~7.9e28) are returned as is.
pub fn round_dp(value: f64, dp: u32) -> f64 {
    Decimal::from_f64(value)
        .map(|decimal| decimal.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|decimal| decimal.to_f64())
        .unwrap_or(value)
}

/// Arithmetic mean of `price`, `0.0` for an empty window.
pub fn average(points: &[PricePoint]) -> f64 {
    mean(points.iter().map(|point| point.price))
}

/// Square root of the sample variance (Bessel corrected) of `price`, `0.0` for `n < 2`.
pub fn sample_std_dev(points: &[PricePoint]) -> f64 {
    let prices = points.iter().map(|point| point.price).collect::<Vec<_>>();
    sample_variance(&prices).sqrt()
}

fn mean<Iter>(values: Iter) -> f64
where
    Iter: IntoIterator<Item = f64>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));

    if count == 0 { 0.0 } else { sum / count as f64 }
}

fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }

    let mean = mean(values.iter().copied());
    values
        .iter()
        .map(|value| {
            let diff = value - mean;
            diff * diff
        })
        .sum::<f64>()
        / (values.len() - 1) as f64
}

/// Pair the [`PricePoint`]s of two windows that share the exact same `observed_at`.
///
/// Pairs follow the order of first appearance in `a`. Instants without a counterpart are
/// dropped from both sides, and a repeated instant only pairs its first occurrence.
pub fn align_points(a: &[PricePoint], b: &[PricePoint]) -> Vec<(PricePoint, PricePoint)> {
    let mut by_instant = FnvHashMap::with_capacity_and_hasher(b.len(), Default::default());
    for point in b {
        by_instant.entry(point.observed_at).or_insert(*point);
    }

    let mut seen = FnvHashSet::with_capacity_and_hasher(a.len(), Default::default());
    a.iter()
        .filter(|point| seen.insert(point.observed_at))
        .filter_map(|point| {
            by_instant
                .get(&point.observed_at)
                .map(|other| (*point, *other))
        })
        .collect()
}

/// Aligned prices of two windows, see [`align_points`].
pub fn align(a: &[PricePoint], b: &[PricePoint]) -> (Vec<f64>, Vec<f64>) {
    align_points(a, b)
        .into_iter()
        .map(|(a, b)| (a.price, b.price))
        .unzip()
}

/// Outcome of a pairwise correlation.
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug)]
pub enum Correlation {
    /// Pearson coefficient in `[-1, 1]`.
    Value(f64),
    /// Fewer than [`MIN_ALIGNED_PAIRS`] aligned samples - reported as `0.0`.
    InsufficientOverlap,
}

impl Correlation {
    pub fn value(&self) -> f64 {
        match self {
            Correlation::Value(value) => *value,
            Correlation::InsufficientOverlap => 0.0,
        }
    }

    pub fn is_insufficient(&self) -> bool {
        matches!(self, Correlation::InsufficientOverlap)
    }
}

/// Pearson correlation of two windows aligned by instant (see [`align`]).
pub fn correlation(a: &[PricePoint], b: &[PricePoint]) -> Correlation {
    let (a, b) = align(a, b);
    pearson(&a, &b)
}

/// Pearson correlation coefficient of two equal length samples using sample covariance
/// and sample variances.
///
/// A constant sample (variance within [`ZERO_VARIANCE`]) yields exactly `Value(0.0)`.
pub fn pearson(a: &[f64], b: &[f64]) -> Correlation {
    if a.len() != b.len() || a.len() < MIN_ALIGNED_PAIRS {
        return Correlation::InsufficientOverlap;
    }

    let mean_a = mean(a.iter().copied());
    let mean_b = mean(b.iter().copied());

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;

    for (value_a, value_b) in a.iter().zip(b) {
        let diff_a = value_a - mean_a;
        let diff_b = value_b - mean_b;
        cov += diff_a * diff_b;
        var_a += diff_a * diff_a;
        var_b += diff_b * diff_b;
    }

    let bessel = (a.len() - 1) as f64;
    let (cov, var_a, var_b) = (cov / bessel, var_a / bessel, var_b / bessel);

    if var_a <= ZERO_VARIANCE || var_b <= ZERO_VARIANCE {
        return Correlation::Value(0.0);
    }

    // sqrt(var_a * var_b) == std_a * std_b, but keeps r(X, X) at exactly 1.0
    let coefficient = cov / (var_a * var_b).sqrt();
    if coefficient.is_nan() {
        Correlation::Value(0.0)
    } else {
        Correlation::Value(coefficient.clamp(-1.0, 1.0))
    }
}

/// Aligned view of two windows used to answer a pairwise correlation query.
#[derive(Clone, PartialEq, Debug)]
pub struct PairStatistics {
    pub correlation: Correlation,
    /// Aligned points of the first window.
    pub first: Vec<PricePoint>,
    /// Aligned points of the second window.
    pub second: Vec<PricePoint>,
}

impl PairStatistics {
    pub fn first_average(&self) -> f64 {
        average(&self.first)
    }

    pub fn second_average(&self) -> f64 {
        average(&self.second)
    }
}

/// Align two windows and correlate them, keeping the aligned points.
pub fn pair_statistics(a: &[PricePoint], b: &[PricePoint]) -> PairStatistics {
    let (first, second): (Vec<_>, Vec<_>) = align_points(a, b).into_iter().unzip();
    let prices_a = first.iter().map(|point| point.price).collect::<Vec<_>>();
    let prices_b = second.iter().map(|point| point.price).collect::<Vec<_>>();

    PairStatistics {
        correlation: pearson(&prices_a, &prices_b),
        first,
        second,
    }
}

/// Symbol x symbol correlation matrix with per-symbol window statistics.
#[derive(Clone, PartialEq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationMatrix {
    pub matrix: IndexMap<Symbol, IndexMap<Symbol, f64>>,
    pub averages: IndexMap<Symbol, f64>,
    pub standard_deviations: IndexMap<Symbol, f64>,
}

impl CorrelationMatrix {
    /// Copy with correlations rounded to [`CORRELATION_DECIMALS`] and averages / standard
    /// deviations rounded to [`PRICE_DECIMALS`].
    pub fn rounded(&self) -> Self {
        let round_all = |values: &IndexMap<Symbol, f64>, dp: u32| {
            values
                .iter()
                .map(|(symbol, value)| (symbol.clone(), round_dp(*value, dp)))
                .collect::<IndexMap<_, _>>()
        };

        Self {
            matrix: self
                .matrix
                .iter()
                .map(|(symbol, row)| (symbol.clone(), round_all(row, CORRELATION_DECIMALS)))
                .collect(),
            averages: round_all(&self.averages, PRICE_DECIMALS),
            standard_deviations: round_all(&self.standard_deviations, PRICE_DECIMALS),
        }
    }

    pub fn get(&self, row: &Symbol, column: &Symbol) -> Option<f64> {
        self.matrix.get(row)?.get(column).copied()
    }
}

/// Correlation matrix over every registered symbol's trailing `minutes` window, measured
/// from the current wall-clock time.
pub fn correlation_matrix(store: &SeriesStore, minutes: u32) -> CorrelationMatrix {
    correlation_matrix_at(store, TimeDelta::minutes(i64::from(minutes)), Utc::now())
}

/// Correlation matrix over every registered symbol's `window` ending at `now`.
///
/// The diagonal is exactly `1.0`. Off-diagonal entries are the aligned pairwise
/// [`correlation`] (`0.0` on insufficient overlap), computed once per unordered pair.
/// Averages and standard deviations use each symbol's own, unaligned window.
pub fn correlation_matrix_at(
    store: &SeriesStore,
    window: TimeDelta,
    now: DateTime<Utc>,
) -> CorrelationMatrix {
    let windows = store.windows_at(window, now);

    let pairwise = (0..windows.len())
        .tuple_combinations()
        .map(|(i, j)| ((i, j), correlation(&windows[i], &windows[j]).value()))
        .collect::<FnvHashMap<_, _>>();

    let lookup = |i: usize, j: usize| match i.cmp(&j) {
        Ordering::Equal => 1.0,
        Ordering::Less => pairwise.get(&(i, j)).copied().unwrap_or_default(),
        Ordering::Greater => pairwise.get(&(j, i)).copied().unwrap_or_default(),
    };

    let matrix: IndexMap<Symbol, IndexMap<Symbol, f64>> = windows
        .keys()
        .enumerate()
        .map(|(i, row)| {
            let columns = windows
                .keys()
                .enumerate()
                .map(|(j, column)| (column.clone(), lookup(i, j)))
                .collect::<IndexMap<_, _>>();
            (row.clone(), columns)
        })
        .collect();

    CorrelationMatrix {
        matrix,
        averages: windows
            .iter()
            .map(|(symbol, points)| (symbol.clone(), average(points)))
            .collect(),
        standard_deviations: windows
            .iter()
            .map(|(symbol, points)| (symbol.clone(), sample_std_dev(points)))
            .collect(),
    }
}
