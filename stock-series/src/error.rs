use crate::symbol::Symbol;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// All errors generated in `stock-series`.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Error)]
pub enum SeriesError {
    #[error("ticker '{0}' not found")]
    UnknownSymbol(Symbol),

    #[error(
        "\
        OutOfOrder: PricePoint for {symbol} observed at {observed_at} precedes the latest \
        PricePoint observed at {latest}\
    "
    )]
    OutOfOrder {
        symbol: Symbol,
        latest: DateTime<Utc>,
        observed_at: DateTime<Utc>,
    },
}

impl SeriesError {
    /// Determine if the error means the requested [`Symbol`] is not registered.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SeriesError::UnknownSymbol(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_series_error_is_not_found() {
        struct TestCase {
            input: SeriesError,
            expected: bool,
        }

        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let tests = vec![
            TestCase {
                // TC0: is not found w/ SeriesError::UnknownSymbol
                input: SeriesError::UnknownSymbol(Symbol::new("XYZ")),
                expected: true,
            },
            TestCase {
                // TC1: is not not found w/ SeriesError::OutOfOrder
                input: SeriesError::OutOfOrder {
                    symbol: Symbol::new("AAPL"),
                    latest: t0,
                    observed_at: t0 - chrono::TimeDelta::seconds(10),
                },
                expected: false,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = test.input.is_not_found();
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }
    }

    #[test]
    fn test_unknown_symbol_message() {
        let error = SeriesError::UnknownSymbol(Symbol::new("xyz"));
        assert_eq!(error.to_string(), "ticker 'XYZ' not found");
    }
}
