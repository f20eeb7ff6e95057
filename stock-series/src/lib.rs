//! # Stock Series
//! Rolling, bounded price histories for a fixed set of symbols, fed by a random-walk
//! [`PriceGenerator`] and queried through the pure functions in [`statistic`].
//!
//! ## Overview
//! * [`SeriesStore`]: one capped [`Series`] per registered [`Symbol`], each behind its own
//!   lock so appends and window reads on unrelated symbols never contend.
//! * [`PriceGenerator`]: advances every symbol by one bounded random step per tick, using a
//!   single timestamp for the whole tick so series can be aligned by instant.
//! * [`statistic`]: windowed average, sample standard deviation, timestamp-aligned Pearson
//!   correlation and the full correlation matrix.

/// All errors generated in `stock-series`.
pub mod error;

/// Random-walk [`PriceGenerator`] that periodically appends to a [`SeriesStore`].
pub mod generator;

/// [`PricePoint`], the capped [`Series`] and the per-symbol locked [`SeriesStore`].
pub mod series;

/// Pure statistics over windowed [`PricePoint`] slices, plus output rounding.
pub mod statistic;

/// [`Symbol`] identifier and the default registered set.
pub mod symbol;

pub use error::SeriesError;
pub use generator::PriceGenerator;
pub use series::{MAX_HISTORY, PricePoint, Series, SeriesStore};
pub use symbol::{DEFAULT_SYMBOLS, Symbol};
