use derive_more::Display;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Symbols registered when no explicit set is configured.
pub const DEFAULT_SYMBOLS: [&str; 5] = ["AAPL", "GOOGL", "TSLA", "MSFT", "AMZN"];

/// Identifier of one tracked asset, normalised to upper case (eg/ "aapl" -> "AAPL").
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, Deserialize, Serialize)]
#[serde(from = "SmolStr", into = "SmolStr")]
pub struct Symbol(SmolStr);

impl Symbol {
    pub fn new<S: AsRef<str>>(symbol: S) -> Self {
        Self(SmolStr::new(symbol.as_ref().trim().to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Construct the [`DEFAULT_SYMBOLS`] set.
    pub fn defaults() -> Vec<Self> {
        DEFAULT_SYMBOLS.iter().map(Self::new).collect()
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Symbol {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<SmolStr> for Symbol {
    fn from(value: SmolStr) -> Self {
        Self::new(value)
    }
}

impl From<Symbol> for SmolStr {
    fn from(value: Symbol) -> Self {
        value.0
    }
}
