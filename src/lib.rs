//! Bandscan - multi-exchange market screener with Bollinger Band ratings and
//! candle pattern scans

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod sources;
pub mod types;

use axum::Router;
use config::Config;
use services::{MarketDataAdapter, PatternScanner, Registry, ScreenerService};
use sources::MarketSource;
use std::sync::Arc;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub screener: Arc<ScreenerService>,
    pub patterns: Arc<PatternScanner>,
}

impl AppState {
    /// Wire services around a source and registry.
    pub fn new(config: Arc<Config>, source: Arc<dyn MarketSource>, registry: Arc<Registry>) -> Self {
        let adapter = Arc::new(MarketDataAdapter::new(
            source,
            registry,
            config.retry.clone(),
        ));
        Self::with_adapter(config, adapter)
    }

    pub fn with_adapter(config: Arc<Config>, adapter: Arc<MarketDataAdapter>) -> Self {
        Self {
            screener: Arc::new(ScreenerService::new(adapter.clone(), config.scan.clone())),
            patterns: Arc::new(PatternScanner::new(adapter, config.scan.clone())),
            config,
        }
    }
}

/// API router with state applied.
pub fn app(state: AppState) -> Router {
    api::router().with_state(state)
}

pub use error::{Result, ScreenerError, SourceError};
pub use types::*;
