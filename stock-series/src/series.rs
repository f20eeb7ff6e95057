use crate::{error::SeriesError, symbol::Symbol};
use chrono::{DateTime, TimeDelta, Utc};
use derive_more::Constructor;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Maximum [`PricePoint`]s retained per [`Symbol`] - one hour of 10 second samples.
pub const MAX_HISTORY: usize = 360;

/// One price observation.
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, Deserialize, Serialize, Constructor)]
pub struct PricePoint {
    pub price: f64,
    #[serde(rename = "lastUpdatedAt")]
    pub observed_at: DateTime<Utc>,
}

/// Capped ring buffer of [`PricePoint`]s ordered by `observed_at` ascending.
///
/// Pushing beyond `capacity` evicts from the front (oldest first).
#[derive(Clone, Debug)]
pub struct Series {
    points: VecDeque<PricePoint>,
    capacity: usize,
}

impl Series {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a [`PricePoint`] to the tail, evicting from the head while over capacity.
    ///
    /// Returns the evicted points count. A point observed before the current tail is
    /// rejected with `Err(latest)` so the series stays time ordered.
    pub fn push(&mut self, point: PricePoint) -> Result<usize, DateTime<Utc>> {
        if let Some(latest) = self
            .points
            .back()
            .filter(|latest| point.observed_at < latest.observed_at)
        {
            return Err(latest.observed_at);
        }

        self.points.push_back(point);

        let mut evicted = 0;
        while self.points.len() > self.capacity {
            self.points.pop_front();
            evicted += 1;
        }

        Ok(evicted)
    }

    /// Every [`PricePoint`] observed at or after `since`, oldest first.
    pub fn since(&self, since: DateTime<Utc>) -> Vec<PricePoint> {
        let start = self.points.partition_point(|point| point.observed_at < since);
        self.points.range(start..).copied().collect()
    }

    pub fn latest(&self) -> Option<&PricePoint> {
        self.points.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PricePoint> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Process wide store of one [`Series`] per registered [`Symbol`].
///
/// The key set is fixed at construction. Each [`Series`] sits behind its own [`RwLock`]:
/// an append (including any eviction) holds the write lock for its full duration, so a
/// concurrent reader observes the series either wholly before or wholly after it.
/// Reads spanning several symbols lock and snapshot each symbol independently.
#[derive(Debug)]
pub struct SeriesStore {
    series: IndexMap<Symbol, RwLock<Series>>,
    capacity: usize,
}

impl Default for SeriesStore {
    fn default() -> Self {
        Self::new(Symbol::defaults())
    }
}

impl SeriesStore {
    /// Construct a [`SeriesStore`] registering the provided symbols, each capped at
    /// [`MAX_HISTORY`].
    pub fn new<Iter, S>(symbols: Iter) -> Self
    where
        Iter: IntoIterator<Item = S>,
        S: Into<Symbol>,
    {
        Self::with_capacity(symbols, MAX_HISTORY)
    }

    /// Construct a [`SeriesStore`] registering the provided symbols, each capped at
    /// `capacity` points. Duplicate symbols are registered once.
    pub fn with_capacity<Iter, S>(symbols: Iter, capacity: usize) -> Self
    where
        Iter: IntoIterator<Item = S>,
        S: Into<Symbol>,
    {
        let capacity = capacity.max(1);
        let series = symbols
            .into_iter()
            .map(|symbol| (symbol.into(), RwLock::new(Series::new(capacity))))
            .collect();

        Self { series, capacity }
    }

    /// Registered symbols, in registration order.
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.series.keys()
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.series.contains_key(symbol)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a [`PricePoint`] to the tail of the `symbol` [`Series`], evicting the oldest
    /// points while the series exceeds capacity.
    pub fn append(&self, symbol: &Symbol, point: PricePoint) -> Result<(), SeriesError> {
        self.series(symbol)?
            .write()
            .push(point)
            .map(|_evicted| ())
            .map_err(|latest| SeriesError::OutOfOrder {
                symbol: symbol.clone(),
                latest,
                observed_at: point.observed_at,
            })
    }

    /// Most recent [`PricePoint`] of the `symbol` [`Series`], if any.
    pub fn latest(&self, symbol: &Symbol) -> Result<Option<PricePoint>, SeriesError> {
        Ok(self.series(symbol)?.read().latest().copied())
    }

    pub fn len(&self, symbol: &Symbol) -> Result<usize, SeriesError> {
        Ok(self.series(symbol)?.read().len())
    }

    /// Every [`PricePoint`] of the `symbol` [`Series`] observed within the trailing
    /// `minutes`, measured from the current wall-clock time.
    pub fn read_window(
        &self,
        symbol: &Symbol,
        minutes: u32,
    ) -> Result<Vec<PricePoint>, SeriesError> {
        self.read_window_at(symbol, TimeDelta::minutes(i64::from(minutes)), Utc::now())
    }

    /// Every [`PricePoint`] of the `symbol` [`Series`] with `observed_at >= now - window`,
    /// oldest first. An empty window is not an error.
    pub fn read_window_at(
        &self,
        symbol: &Symbol,
        window: TimeDelta,
        now: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>, SeriesError> {
        Ok(self.series(symbol)?.read().since(now - window))
    }

    /// Snapshot the trailing `window` of every registered [`Series`], in registration order.
    pub fn windows_at(
        &self,
        window: TimeDelta,
        now: DateTime<Utc>,
    ) -> IndexMap<Symbol, Vec<PricePoint>> {
        let since = now - window;
        self.series
            .iter()
            .map(|(symbol, series)| (symbol.clone(), series.read().since(since)))
            .collect()
    }

    fn series(&self, symbol: &Symbol) -> Result<&RwLock<Series>, SeriesError> {
        self.series
            .get(symbol)
            .ok_or_else(|| SeriesError::UnknownSymbol(symbol.clone()))
    }
}
