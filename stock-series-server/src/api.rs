use crate::{
    error::ApiError,
    query::{Aggregation, QueryParams},
};
use axum::{
    Json, Router,
    extract::{Path, RawQuery, State},
    routing::get,
};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use stock_series::{
    PricePoint, SeriesStore, Symbol,
    statistic::{
        self, CORRELATION_DECIMALS, CorrelationMatrix, PRICE_DECIMALS, round_dp,
    },
};
use tower_http::trace::TraceLayer;
use tracing::debug;

/// Shared state handed to every handler via [`State`].
#[derive(Debug)]
pub struct AppState {
    pub store: Arc<SeriesStore>,
}

impl AppState {
    pub fn new(store: Arc<SeriesStore>) -> Arc<Self> {
        Arc::new(Self { store })
    }
}

/// Assemble the HTTP router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/tickers", get(tickers))
        .route("/stocks/{ticker}", get(stock_average))
        .route("/stockcorrelation", get(stock_correlation))
        .route("/correlationmatrix", get(correlation_matrix))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `GET /stocks/{ticker}` response body.
#[derive(Clone, PartialEq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAverageResponse {
    pub average_stock_price: f64,
    pub price_history: Vec<PricePoint>,
}

/// Per-stock section of a `GET /stockcorrelation` response.
#[derive(Clone, PartialEq, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockSummary {
    pub average_price: f64,
    pub price_history: Vec<PricePoint>,
}

impl StockSummary {
    fn new(average_price: f64, price_history: Vec<PricePoint>) -> Self {
        Self {
            average_price: round_dp(average_price, PRICE_DECIMALS),
            price_history: rounded_history(price_history),
        }
    }
}

/// `GET /stockcorrelation` response body.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct StockCorrelationResponse {
    pub correlation: f64,
    pub stocks: IndexMap<Symbol, StockSummary>,
}

fn rounded_history(points: Vec<PricePoint>) -> Vec<PricePoint> {
    points
        .into_iter()
        .map(|point| PricePoint::new(round_dp(point.price, PRICE_DECIMALS), point.observed_at))
        .collect()
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `GET /tickers`: registered symbols in registration order.
pub async fn tickers(State(state): State<Arc<AppState>>) -> Json<Vec<Symbol>> {
    Json(state.store.symbols().cloned().collect())
}

/// `GET /stocks/{ticker}?minutes=&aggregation=average`
pub async fn stock_average(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
    RawQuery(raw): RawQuery,
) -> Result<Json<StockAverageResponse>, ApiError> {
    let params = QueryParams::parse(raw.as_deref())?;
    let minutes = params.minutes()?;
    let aggregation = params.aggregation()?;

    let symbol = Symbol::new(ticker);
    let window = state.store.read_window(&symbol, minutes)?;
    if window.is_empty() {
        return Err(ApiError::NotFound(format!(
            "no data for '{symbol}' in last {minutes} min"
        )));
    }

    let average_stock_price = match aggregation {
        Aggregation::Average => statistic::average(&window),
    };
    debug!(%symbol, minutes, points = window.len(), average_stock_price, "stock average");

    Ok(Json(StockAverageResponse {
        average_stock_price: round_dp(average_stock_price, PRICE_DECIMALS),
        price_history: rounded_history(window),
    }))
}

/// `GET /stockcorrelation?minutes=&ticker=&ticker=`
///
/// Fewer than two aligned instants is not an error: the response carries a zero
/// correlation and empty per-stock sections.
pub async fn stock_correlation(
    State(state): State<Arc<AppState>>,
    RawQuery(raw): RawQuery,
) -> Result<Json<StockCorrelationResponse>, ApiError> {
    let params = QueryParams::parse(raw.as_deref())?;
    let minutes = params.minutes()?;
    let (first, second) = params.ticker_pair()?;

    let first_window = state.store.read_window(&first, minutes)?;
    let second_window = state.store.read_window(&second, minutes)?;

    let pair = statistic::pair_statistics(&first_window, &second_window);
    debug!(
        %first,
        %second,
        minutes,
        aligned = pair.first.len(),
        correlation = ?pair.correlation,
        "stock correlation"
    );

    if pair.correlation.is_insufficient() {
        return Ok(Json(StockCorrelationResponse {
            correlation: 0.0,
            stocks: IndexMap::from([
                (first, StockSummary::default()),
                (second, StockSummary::default()),
            ]),
        }));
    }

    let correlation = round_dp(pair.correlation.value(), CORRELATION_DECIMALS);
    let first_average = pair.first_average();
    let second_average = pair.second_average();
    let first_summary = StockSummary::new(first_average, pair.first);
    let second_summary = StockSummary::new(second_average, pair.second);

    Ok(Json(StockCorrelationResponse {
        correlation,
        stocks: IndexMap::from([(first, first_summary), (second, second_summary)]),
    }))
}

/// `GET /correlationmatrix?minutes=`
pub async fn correlation_matrix(
    State(state): State<Arc<AppState>>,
    RawQuery(raw): RawQuery,
) -> Result<Json<CorrelationMatrix>, ApiError> {
    let minutes = QueryParams::parse(raw.as_deref())?.minutes()?;

    let matrix = statistic::correlation_matrix(&state.store, minutes);
    debug!(minutes, symbols = matrix.averages.len(), "correlation matrix");

    Ok(Json(matrix.rounded()))
}
