use std::sync::Arc;
use stock_series::{PriceGenerator, SeriesStore};
use stock_series_server::{AppState, ServerConfig, router};
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Initialize logging
    init_logging();

    info!("Starting stock-series HTTP server");

    // Configurable via STOCK_ADDR, STOCK_SYMBOLS, STOCK_TICK_SECS, STOCK_MAX_HISTORY
    let config = ServerConfig::from_env();
    info!(
        addr = %config.addr,
        symbols = ?config.symbols,
        tick_secs = config.tick_interval.as_secs(),
        max_history = config.max_history,
        "Loaded configuration"
    );

    let store = Arc::new(SeriesStore::with_capacity(
        config.symbols.iter().cloned(),
        config.max_history,
    ));

    // Generator runs for the process lifetime
    tokio::spawn(PriceGenerator::from_entropy().run(Arc::clone(&store), config.tick_interval));

    let app = router(AppState::new(store));

    let listener = TcpListener::bind(config.addr)
        .await
        .expect("Failed to bind HTTP server");

    info!("HTTP server listening on http://{}", config.addr);

    if let Err(error) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("HTTP server terminated with error: {}", error);
    }
}

/// Resolve once Ctrl+C is received.
async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        error!("Failed to install Ctrl+C handler: {}", error);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, gracefully stopping");
}

/// Initialize logging, JSON formatted when LOG_FORMAT=json
fn init_logging() {
    let subscriber = tracing_subscriber::fmt().with_env_filter(
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
    );

    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));
    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
