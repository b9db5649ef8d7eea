//! Candle pattern endpoints.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Router,
};
use serde::Deserialize;

use super::{invalid_query, split_list, ToolResponse};
use crate::error::ScreenerError;
use crate::services::patterns::DEFAULT_MIN_RUN;
use crate::types::{CandleDirection, ScanResult};
use crate::AppState;

fn default_exchange() -> String {
    "kucoin".to_string()
}

fn default_min_run() -> i64 {
    DEFAULT_MIN_RUN as i64
}

#[derive(Debug, Deserialize)]
pub struct ConsecutiveQuery {
    #[serde(default = "default_exchange")]
    pub exchange: String,
    #[serde(default = "ConsecutiveQuery::default_timeframe")]
    pub timeframe: String,
    /// `bullish`, `bearish` or `any`.
    #[serde(default = "ConsecutiveQuery::default_direction")]
    pub direction: String,
    #[serde(default = "default_min_run")]
    pub min_run: i64,
    pub min_growth: Option<f64>,
    #[serde(default = "ConsecutiveQuery::default_limit")]
    pub limit: i64,
}

impl ConsecutiveQuery {
    fn default_timeframe() -> String {
        "15m".to_string()
    }

    fn default_direction() -> String {
        "bullish".to_string()
    }

    fn default_limit() -> i64 {
        20
    }

    fn direction(&self) -> Result<Option<CandleDirection>, ScreenerError> {
        if self.direction.trim().eq_ignore_ascii_case("any") {
            return Ok(None);
        }
        CandleDirection::from_str(&self.direction)
            .map(Some)
            .ok_or_else(|| {
                ScreenerError::InvalidArgument(format!(
                    "direction must be bullish, bearish or any (got {})",
                    self.direction
                ))
            })
    }
}

#[derive(Debug, Deserialize)]
pub struct AdvancedQuery {
    #[serde(default = "default_exchange")]
    pub exchange: String,
    /// Comma-separated; the first is the base timeframe. Defaults to `15m,1h`.
    #[serde(default)]
    pub timeframes: String,
    #[serde(default = "default_min_run")]
    pub min_run: i64,
    #[serde(default)]
    pub agreement_only: bool,
    #[serde(default = "AdvancedQuery::default_limit")]
    pub limit: i64,
}

impl AdvancedQuery {
    fn default_limit() -> i64 {
        15
    }
}

/// Create the patterns router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/consecutive", get(consecutive_candles))
        .route("/advanced", get(advanced_pattern))
}

async fn consecutive_candles(
    State(state): State<AppState>,
    query: Result<Query<ConsecutiveQuery>, QueryRejection>,
) -> ToolResponse<ScanResult> {
    let Query(q) = match query {
        Ok(q) => q,
        Err(e) => return ToolResponse::err(invalid_query(e)),
    };
    let direction = match q.direction() {
        Ok(direction) => direction,
        Err(e) => return ToolResponse::err(e),
    };
    ToolResponse::from_result(
        state
            .patterns
            .consecutive_candles_scan(
                &q.exchange,
                &q.timeframe,
                direction,
                q.min_run,
                q.min_growth,
                q.limit,
            )
            .await,
    )
}

async fn advanced_pattern(
    State(state): State<AppState>,
    query: Result<Query<AdvancedQuery>, QueryRejection>,
) -> ToolResponse<ScanResult> {
    let Query(q) = match query {
        Ok(q) => q,
        Err(e) => return ToolResponse::err(invalid_query(e)),
    };
    let timeframes = split_list(&q.timeframes);
    ToolResponse::from_result(
        state
            .patterns
            .advanced_candle_pattern(&q.exchange, &timeframes, q.min_run, q.agreement_only, q.limit)
            .await,
    )
}
