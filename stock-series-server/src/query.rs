use crate::error::ApiError;
use std::str::FromStr;
use stock_series::Symbol;

/// Smallest accepted `minutes` window.
pub const MIN_MINUTES: u32 = 1;

/// Largest accepted `minutes` window.
pub const MAX_MINUTES: u32 = 60;

/// Keys accepted for the repeated ticker parameter.
const TICKER_KEYS: [&str; 2] = ["ticker", "ticker[]"];

/// Supported `aggregation` values.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Aggregation {
    Average,
}

impl FromStr for Aggregation {
    type Err = ApiError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "average" => Ok(Aggregation::Average),
            other => Err(ApiError::Validation(format!(
                "unsupported aggregation '{other}', only aggregation=average is supported"
            ))),
        }
    }
}

/// Decoded query string, keeping repeated keys in order.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    /// Decode a raw `application/x-www-form-urlencoded` query string.
    pub fn parse(raw: Option<&str>) -> Result<Self, ApiError> {
        serde_urlencoded::from_str(raw.unwrap_or_default())
            .map(Self)
            .map_err(|error| ApiError::Validation(format!("malformed query string: {error}")))
    }

    fn first(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    fn all<'a>(&'a self, keys: &'a [&str]) -> impl Iterator<Item = &'a str> {
        self.0
            .iter()
            .filter(|(name, _)| keys.contains(&name.as_str()))
            .map(|(_, value)| value.as_str())
    }

    /// Required `minutes` window, an integer in `[MIN_MINUTES, MAX_MINUTES]`. Never clamped.
    pub fn minutes(&self) -> Result<u32, ApiError> {
        let invalid = || {
            ApiError::Validation(format!(
                "minutes is required and must be an integer in [{MIN_MINUTES}, {MAX_MINUTES}]"
            ))
        };

        self.first("minutes")
            .and_then(|value| value.trim().parse::<u32>().ok())
            .filter(|minutes| (MIN_MINUTES..=MAX_MINUTES).contains(minutes))
            .ok_or_else(invalid)
    }

    /// Required `aggregation`.
    pub fn aggregation(&self) -> Result<Aggregation, ApiError> {
        self.first("aggregation")
            .ok_or_else(|| ApiError::Validation("aggregation=average is required".to_string()))?
            .parse()
    }

    /// Exactly two distinct `ticker` values, normalised to [`Symbol`]s.
    pub fn ticker_pair(&self) -> Result<(Symbol, Symbol), ApiError> {
        let tickers = self
            .all(&TICKER_KEYS)
            .map(Symbol::new)
            .collect::<Vec<_>>();

        match <[Symbol; 2]>::try_from(tickers) {
            Ok([first, second]) if first != second => Ok((first, second)),
            Ok([first, _]) => Err(ApiError::Validation(format!(
                "two distinct ticker values are required, got '{first}' twice"
            ))),
            Err(tickers) => Err(ApiError::Validation(format!(
                "exactly two ticker values are required, got {}",
                tickers.len()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(raw: &str) -> QueryParams {
        QueryParams::parse(Some(raw)).unwrap()
    }

    #[test]
    fn test_minutes() {
        struct TestCase {
            input: &'static str,
            expected: Option<u32>,
        }

        let tests = vec![
            TestCase {
                // TC0: lower bound
                input: "minutes=1",
                expected: Some(1),
            },
            TestCase {
                // TC1: upper bound
                input: "minutes=60",
                expected: Some(60),
            },
            TestCase {
                // TC2: above range is rejected, not clamped
                input: "minutes=61",
                expected: None,
            },
            TestCase {
                // TC3: zero
                input: "minutes=0",
                expected: None,
            },
            TestCase {
                // TC4: negative
                input: "minutes=-5",
                expected: None,
            },
            TestCase {
                // TC5: non numeric
                input: "minutes=ten",
                expected: None,
            },
            TestCase {
                // TC6: fractional
                input: "minutes=5.5",
                expected: None,
            },
            TestCase {
                // TC7: missing
                input: "aggregation=average",
                expected: None,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = params(test.input).minutes().ok();
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }
    }

    #[test]
    fn test_aggregation() {
        assert_eq!(
            params("aggregation=average").aggregation(),
            Ok(Aggregation::Average)
        );
        assert!(matches!(
            params("aggregation=median").aggregation(),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            params("minutes=5").aggregation(),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn test_ticker_pair() {
        struct TestCase {
            input: &'static str,
            expected: Option<(&'static str, &'static str)>,
        }

        let tests = vec![
            TestCase {
                // TC0: two distinct tickers, normalised
                input: "ticker=aapl&ticker=GOOGL",
                expected: Some(("AAPL", "GOOGL")),
            },
            TestCase {
                // TC1: bracketed array form
                input: "ticker%5B%5D=MSFT&ticker%5B%5D=TSLA",
                expected: Some(("MSFT", "TSLA")),
            },
            TestCase {
                // TC2: one ticker
                input: "ticker=AAPL",
                expected: None,
            },
            TestCase {
                // TC3: three tickers
                input: "ticker=AAPL&ticker=GOOGL&ticker=TSLA",
                expected: None,
            },
            TestCase {
                // TC4: same ticker twice
                input: "ticker=AAPL&ticker=aapl",
                expected: None,
            },
            TestCase {
                // TC5: none
                input: "",
                expected: None,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = params(test.input).ticker_pair().ok();
            let expected = test
                .expected
                .map(|(first, second)| (Symbol::new(first), Symbol::new(second)));
            assert_eq!(actual, expected, "TC{} failed", index);
        }
    }

    #[test]
    fn test_parse_missing_query() {
        let params = QueryParams::parse(None).unwrap();
        assert_eq!(params, QueryParams::default());
        assert!(params.minutes().is_err());
    }
}
