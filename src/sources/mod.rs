//! Upstream market-data sources.

pub mod tradingview;

#[cfg(test)]
pub mod mock;

pub use tradingview::TradingViewClient;

use crate::error::SourceError;
use crate::types::{RawRow, ScreenerQuery};
use async_trait::async_trait;

/// A queryable screener backend returning raw per-symbol field rows.
///
/// Implementations perform exactly one upstream round trip per call and
/// never retry; retries belong to the caller.
#[async_trait]
pub trait MarketSource: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Execute one batched query.
    async fn query(&self, query: &ScreenerQuery) -> Result<Vec<RawRow>, SourceError>;
}
