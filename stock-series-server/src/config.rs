use std::{fmt::Display, net::SocketAddr, str::FromStr, time::Duration};
use stock_series::{MAX_HISTORY, Symbol, generator::DEFAULT_TICK_INTERVAL};
use tracing::warn;

/// Default HTTP listen address.
pub const DEFAULT_ADDR: &str = "0.0.0.0:3000";

/// HTTP server configuration
///
/// Read from the environment via [`ServerConfig::from_env`]:
/// - `STOCK_ADDR`: listen address (default `0.0.0.0:3000`)
/// - `STOCK_SYMBOLS`: comma separated symbols (default `AAPL,GOOGL,TSLA,MSFT,AMZN`)
/// - `STOCK_TICK_SECS`: seconds between generated prices (default `10`)
/// - `STOCK_MAX_HISTORY`: points retained per symbol (default `360`)
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Address the HTTP server binds to
    pub addr: SocketAddr,
    /// Registered symbols, in output order
    pub symbols: Vec<Symbol>,
    /// Period between PriceGenerator ticks
    pub tick_interval: Duration,
    /// Maximum points retained per symbol
    pub max_history: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            symbols: Symbol::defaults(),
            tick_interval: DEFAULT_TICK_INTERVAL,
            max_history: MAX_HISTORY,
        }
    }
}

impl ServerConfig {
    /// Read configuration from process environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, falling back to defaults for missing or
    /// invalid values.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let addr = parse_var(&lookup, "STOCK_ADDR").unwrap_or(defaults.addr);

        let symbols = lookup("STOCK_SYMBOLS")
            .map(|value| {
                value
                    .split(',')
                    .filter(|symbol| !symbol.trim().is_empty())
                    .map(Symbol::new)
                    .collect::<Vec<_>>()
            })
            .filter(|symbols| !symbols.is_empty())
            .unwrap_or(defaults.symbols);

        let tick_interval = parse_var::<u64, _>(&lookup, "STOCK_TICK_SECS")
            .filter(|secs| non_zero("STOCK_TICK_SECS", *secs))
            .map(Duration::from_secs)
            .unwrap_or(defaults.tick_interval);

        let max_history = parse_var::<usize, _>(&lookup, "STOCK_MAX_HISTORY")
            .filter(|max| non_zero("STOCK_MAX_HISTORY", *max))
            .unwrap_or(defaults.max_history);

        Self {
            addr,
            symbols,
            tick_interval,
            max_history,
        }
    }

    /// Set listen address
    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    /// Set registered symbols
    pub fn with_symbols<Iter, S>(mut self, symbols: Iter) -> Self
    where
        Iter: IntoIterator<Item = S>,
        S: Into<Symbol>,
    {
        self.symbols = symbols.into_iter().map(Into::into).collect();
        self
    }

    /// Set generator tick interval
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Set per-symbol history capacity
    pub fn with_max_history(mut self, max_history: usize) -> Self {
        self.max_history = max_history;
        self
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Option<T>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(error) => {
            warn!(name, value = %raw, %error, "invalid environment variable, using default");
            None
        }
    }
}

fn non_zero<T>(name: &str, value: T) -> bool
where
    T: Default + PartialEq,
{
    let valid = value != T::default();
    if !valid {
        warn!(name, "environment variable must be non-zero, using default");
    }
    valid
}
