use crate::{
    series::{PricePoint, SeriesStore},
    statistic::round_dp,
};
use chrono::{DateTime, SubsecRound, TimeDelta, Utc};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::{ops::Range, sync::Arc, time::Duration};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

/// Default period between generator ticks.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(10);

/// Range a symbol's first price is drawn from.
pub const SEED_PRICE_RANGE: Range<f64> = 0.0..1000.0;

/// Range each random walk step is drawn from.
pub const STEP_RANGE: Range<f64> = -10.0..10.0;

/// Decimal places generated prices are rounded to.
pub const GENERATED_PRICE_DECIMALS: u32 = 4;

/// Bounded random-walk price generator.
///
/// Each tick draws one step per registered symbol and appends the new [`PricePoint`] to
/// the [`SeriesStore`]. Every symbol in a tick shares one millisecond-truncated instant so
/// series can be aligned by exact timestamp.
///
/// Tick instants never go backwards: if the wall clock steps back, each tick is stamped
/// 1ms after the previous one until the clock catches up.
#[derive(Debug)]
pub struct PriceGenerator<R = StdRng> {
    rng: R,
    last_observed_at: Option<DateTime<Utc>>,
}

impl PriceGenerator<StdRng> {
    /// Construct a [`PriceGenerator`] seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_os_rng())
    }
}

impl<R> PriceGenerator<R>
where
    R: Rng,
{
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            last_observed_at: None,
        }
    }

    /// Next price following `previous`, or a fresh seed price if there is none.
    pub fn next_price(&mut self, previous: Option<f64>) -> f64 {
        let previous = previous.unwrap_or_else(|| self.rng.random_range(SEED_PRICE_RANGE));
        let step = self.rng.random_range(STEP_RANGE);
        round_dp(previous + step, GENERATED_PRICE_DECIMALS)
    }

    /// Millisecond instant for a tick at wall clock `now`, strictly after the previous one.
    fn next_observed_at(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        let now = now.trunc_subsecs(3);
        let observed_at = match self.last_observed_at {
            Some(last) if now <= last => {
                let next = last + TimeDelta::milliseconds(1);
                warn!(
                    %now,
                    %last,
                    %next,
                    "PriceGenerator clock went backwards, advancing from last tick"
                );
                next
            }
            _ => now,
        };
        self.last_observed_at = Some(observed_at);
        observed_at
    }

    /// Advance every registered symbol by one step observed at `now`.
    ///
    /// Returns the number of [`PricePoint`]s appended.
    pub fn tick(&mut self, store: &SeriesStore, now: DateTime<Utc>) -> usize {
        let observed_at = self.next_observed_at(now);

        let mut appended = 0;
        for symbol in store.symbols() {
            let previous = match store.latest(symbol) {
                Ok(latest) => latest.map(|point| point.price),
                Err(error) => {
                    warn!(%symbol, %error, "PriceGenerator failed to read latest price");
                    continue;
                }
            };

            let point = PricePoint::new(self.next_price(previous), observed_at);
            match store.append(symbol, point) {
                Ok(()) => appended += 1,
                Err(error) => warn!(%symbol, %error, "PriceGenerator dropped PricePoint"),
            }
        }

        appended
    }

    /// Tick every `period` for the lifetime of the process. The first tick is immediate,
    /// missed ticks are delayed rather than bursted.
    pub async fn run(mut self, store: Arc<SeriesStore>, period: Duration) {
        let mut timer = interval(period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            period_secs = period.as_secs_f64(),
            symbols = store.symbols().count(),
            "PriceGenerator started"
        );

        loop {
            timer.tick().await;
            let appended = self.tick(&store, Utc::now());
            debug!(appended, "PriceGenerator tick");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{series::MAX_HISTORY, symbol::Symbol};
    use chrono::{TimeDelta, TimeZone};

    fn generator() -> PriceGenerator<StdRng> {
        PriceGenerator::new(StdRng::seed_from_u64(42))
    }

    fn decimals_within(value: f64, dp: u32) -> bool {
        round_dp(value, dp) == value
    }

    #[test]
    fn test_next_price_seeds_then_walks() {
        let mut generator = generator();

        let seed = generator.next_price(None);
        assert!((-10.0..1010.0).contains(&seed), "seed {seed} out of range");
        assert!(decimals_within(seed, GENERATED_PRICE_DECIMALS));

        let mut previous = seed;
        for _ in 0..1_000 {
            let next = generator.next_price(Some(previous));
            assert!((next - previous).abs() <= 10.0 + 1e-9, "{previous} -> {next}");
            assert!(decimals_within(next, GENERATED_PRICE_DECIMALS));
            previous = next;
        }
    }

    #[test]
    fn test_tick_shares_one_instant_across_symbols() {
        let store = SeriesStore::default();
        let mut generator = generator();
        let now = Utc.with_ymd_and_hms(2024, 6, 3, 14, 0, 0).unwrap()
            + TimeDelta::nanoseconds(123_456_789);

        assert_eq!(generator.tick(&store, now), 5);

        let expected = now.trunc_subsecs(3);
        for symbol in store.symbols() {
            let latest = store.latest(symbol).unwrap().unwrap();
            assert_eq!(latest.observed_at, expected);
        }
    }

    #[test]
    fn test_tick_respects_capacity_and_ordering() {
        let store = SeriesStore::new(["AAPL", "GOOGL"]);
        let symbol = Symbol::new("AAPL");
        let mut generator = generator();
        let t0 = Utc.with_ymd_and_hms(2024, 6, 3, 14, 0, 0).unwrap();

        for index in 0..(MAX_HISTORY as i64 + 40) {
            generator.tick(&store, t0 + TimeDelta::seconds(10 * index));
        }

        let history = store
            .read_window_at(&symbol, TimeDelta::days(1), t0 + TimeDelta::days(1))
            .unwrap();
        assert_eq!(history.len(), MAX_HISTORY);
        assert!(history.windows(2).all(|w| w[0].observed_at < w[1].observed_at));
        assert!(history.windows(2).all(|w| (w[1].price - w[0].price).abs() <= 10.0 + 1e-9));
    }

    #[test]
    fn test_tick_with_clock_stepped_back_keeps_appending() {
        let store = SeriesStore::new(["AAPL", "GOOGL"]);
        let mut generator = generator();
        let t0 = Utc.with_ymd_and_hms(2024, 6, 3, 14, 0, 0).unwrap();

        assert_eq!(generator.tick(&store, t0), 2);

        // Clock steps back one minute, then runs forward past t0 again
        let appended = (0..8)
            .map(|index| {
                let now = t0 - TimeDelta::minutes(1) + TimeDelta::seconds(10 * index);
                generator.tick(&store, now)
            })
            .collect::<Vec<_>>();
        assert_eq!(appended, vec![2; 8]);

        for symbol in store.symbols() {
            let history = store
                .read_window_at(symbol, TimeDelta::days(1), t0 + TimeDelta::days(1))
                .unwrap();
            assert_eq!(history.len(), 9);
            assert!(history.windows(2).all(|w| w[0].observed_at < w[1].observed_at));
            assert_eq!(history[1].observed_at, t0 + TimeDelta::milliseconds(1));
            assert_eq!(history[8].observed_at, t0 + TimeDelta::seconds(10));
        }

        let aapl = store.latest(&Symbol::new("AAPL")).unwrap().unwrap();
        let googl = store.latest(&Symbol::new("GOOGL")).unwrap().unwrap();
        assert_eq!(aapl.observed_at, googl.observed_at);
    }

    #[test]
    fn test_tick_with_repeated_instant_advances_one_millisecond() {
        let store = SeriesStore::new(["AAPL"]);
        let mut generator = generator();
        let t0 = Utc.with_ymd_and_hms(2024, 6, 3, 14, 0, 0).unwrap();

        assert_eq!(generator.tick(&store, t0), 1);
        assert_eq!(generator.tick(&store, t0 + TimeDelta::microseconds(400)), 1);

        let latest = store.latest(&Symbol::new("AAPL")).unwrap().unwrap();
        assert_eq!(latest.observed_at, t0 + TimeDelta::milliseconds(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_ticks_on_interval() {
        let store = Arc::new(SeriesStore::new(["AAPL"]));
        let symbol = Symbol::new("AAPL");

        let handle = tokio::spawn(generator().run(Arc::clone(&store), Duration::from_secs(10)));

        // First tick is immediate, then one per period
        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(store.len(&symbol).unwrap(), 3);

        handle.abort();
    }
}
