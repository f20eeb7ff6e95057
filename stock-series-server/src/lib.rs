//! HTTP surface over a [`stock_series::SeriesStore`] fed by a
//! [`stock_series::PriceGenerator`].
//!
//! Routes:
//! - `GET /tickers`
//! - `GET /stocks/{ticker}?minutes=&aggregation=average`
//! - `GET /stockcorrelation?minutes=&ticker=&ticker=`
//! - `GET /correlationmatrix?minutes=`
//! - `GET /health`

/// Router, shared state and request handlers.
pub mod api;

/// Environment driven [`ServerConfig`](config::ServerConfig).
pub mod config;

/// [`ApiError`](error::ApiError) and its HTTP mapping.
pub mod error;

/// Query string parsing and validation.
pub mod query;

pub use api::{AppState, router};
pub use config::ServerConfig;
pub use error::ApiError;
