use bandscan::config::Config;
use bandscan::services::Registry;
use bandscan::sources::TradingViewClient;
use bandscan::AppState;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Arc::new(Config::from_env());

    // Initialize tracing; stdout stays clean for tool transports
    let default_filter = if config.debug {
        "bandscan=debug,tower_http=debug"
    } else {
        "bandscan=info,tower_http=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting bandscan on {}:{}", config.host, config.port);

    // Exchange registry and upstream client
    let registry = Arc::new(Registry::load(&config.coinlist_dir));
    let source = Arc::new(TradingViewClient::new(
        config.screener_api_url.clone(),
        Duration::from_secs(config.request_timeout_secs),
    ));
    info!(
        "Using screener API at {} (retries: {}, backoff: {}..{}ms)",
        config.screener_api_url,
        config.retry.max_retries,
        config.retry.base_backoff_ms,
        config.retry.max_backoff_ms
    );

    let state = AppState::new(config.clone(), source, registry);

    // Build CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the router
    let app = bandscan::app(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start the server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("bandscan listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
