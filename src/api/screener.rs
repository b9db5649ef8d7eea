//! Screener endpoints.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    routing::get,
    Router,
};
use serde::Deserialize;

use super::{invalid_query, split_list, ToolResponse};
use crate::error::ScreenerError;
use crate::services::params::rating_target;
use crate::types::{
    CoinAnalysis, ExchangeInfo, MultiChangeRow, RatingTarget, RsiRange, ScanResult,
    VolumeBreakout, VolumeConfirmation,
};
use crate::AppState;

fn default_exchange() -> String {
    "kucoin".to_string()
}

fn default_movers_timeframe() -> String {
    "15m".to_string()
}

fn default_limit() -> i64 {
    25
}

#[derive(Debug, Deserialize)]
pub struct MoversQuery {
    #[serde(default = "default_exchange")]
    pub exchange: String,
    #[serde(default = "default_movers_timeframe")]
    pub timeframe: String,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

#[derive(Debug, Deserialize)]
pub struct BollingerQuery {
    #[serde(default = "default_exchange")]
    pub exchange: String,
    #[serde(default = "BollingerQuery::default_timeframe")]
    pub timeframe: String,
    #[serde(default = "BollingerQuery::default_threshold")]
    pub bbw_threshold: f64,
    #[serde(default = "BollingerQuery::default_limit")]
    pub limit: i64,
}

impl BollingerQuery {
    fn default_timeframe() -> String {
        "4h".to_string()
    }

    fn default_threshold() -> f64 {
        0.04
    }

    fn default_limit() -> i64 {
        50
    }
}

/// `rating` selects one bucket; `min_rating`/`max_rating` select a range.
#[derive(Debug, Deserialize)]
pub struct RatingQuery {
    #[serde(default = "default_exchange")]
    pub exchange: String,
    #[serde(default = "RatingQuery::default_timeframe")]
    pub timeframe: String,
    pub rating: Option<i64>,
    pub min_rating: Option<i64>,
    pub max_rating: Option<i64>,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

impl RatingQuery {
    fn default_timeframe() -> String {
        "5m".to_string()
    }

    fn target(&self) -> RatingTarget {
        match (self.min_rating, self.max_rating) {
            (None, None) => {
                let rating = self.rating.unwrap_or(2);
                rating_target(rating, rating)
            }
            (min, max) => rating_target(min.unwrap_or(-3), max.unwrap_or(3)),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CoinQuery {
    #[serde(default = "default_exchange")]
    pub exchange: String,
    #[serde(default = "default_movers_timeframe")]
    pub timeframe: String,
}

#[derive(Debug, Deserialize)]
pub struct VolumeQuery {
    #[serde(default = "default_exchange")]
    pub exchange: String,
    #[serde(default = "default_movers_timeframe")]
    pub timeframe: String,
    #[serde(default = "VolumeQuery::default_multiplier")]
    pub volume_multiplier: f64,
    #[serde(default = "VolumeQuery::default_change")]
    pub price_change_min: f64,
    #[serde(default)]
    pub rsi_range: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

impl VolumeQuery {
    fn default_multiplier() -> f64 {
        2.0
    }

    fn default_change() -> f64 {
        3.0
    }
}

#[derive(Debug, Deserialize)]
pub struct MultiChangeQuery {
    #[serde(default = "default_exchange")]
    pub exchange: String,
    /// Comma-separated, e.g. `15m,1h,4h,1D`.
    #[serde(default = "MultiChangeQuery::default_timeframes")]
    pub timeframes: String,
    #[serde(default = "MultiChangeQuery::default_base")]
    pub base_timeframe: String,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

impl MultiChangeQuery {
    fn default_timeframes() -> String {
        "15m,1h,4h,1D".to_string()
    }

    fn default_base() -> String {
        "4h".to_string()
    }
}

/// Create the screener router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/top-gainers", get(top_gainers))
        .route("/top-losers", get(top_losers))
        .route("/bollinger", get(bollinger_scan))
        .route("/rating", get(rating_filter))
        .route("/coin/:symbol", get(coin_analysis))
        .route("/volume/:symbol", get(volume_confirmation))
        .route("/volume-breakouts", get(volume_breakouts))
        .route("/multi-changes", get(multi_changes))
}

pub fn exchanges_router() -> Router<AppState> {
    Router::new().route("/api/exchanges", get(list_exchanges))
}

async fn top_gainers(
    State(state): State<AppState>,
    query: Result<Query<MoversQuery>, QueryRejection>,
) -> ToolResponse<ScanResult> {
    let Query(q) = match query {
        Ok(q) => q,
        Err(e) => return ToolResponse::err(invalid_query(e)),
    };
    ToolResponse::from_result(state.screener.top_gainers(&q.exchange, &q.timeframe, q.limit).await)
}

async fn top_losers(
    State(state): State<AppState>,
    query: Result<Query<MoversQuery>, QueryRejection>,
) -> ToolResponse<ScanResult> {
    let Query(q) = match query {
        Ok(q) => q,
        Err(e) => return ToolResponse::err(invalid_query(e)),
    };
    ToolResponse::from_result(state.screener.top_losers(&q.exchange, &q.timeframe, q.limit).await)
}

async fn bollinger_scan(
    State(state): State<AppState>,
    query: Result<Query<BollingerQuery>, QueryRejection>,
) -> ToolResponse<ScanResult> {
    let Query(q) = match query {
        Ok(q) => q,
        Err(e) => return ToolResponse::err(invalid_query(e)),
    };
    ToolResponse::from_result(
        state
            .screener
            .bollinger_scan(&q.exchange, &q.timeframe, q.bbw_threshold, q.limit)
            .await,
    )
}

async fn rating_filter(
    State(state): State<AppState>,
    query: Result<Query<RatingQuery>, QueryRejection>,
) -> ToolResponse<ScanResult> {
    let Query(q) = match query {
        Ok(q) => q,
        Err(e) => return ToolResponse::err(invalid_query(e)),
    };
    ToolResponse::from_result(
        state
            .screener
            .rating_filter(&q.exchange, &q.timeframe, q.target(), q.limit)
            .await,
    )
}

async fn coin_analysis(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    query: Result<Query<CoinQuery>, QueryRejection>,
) -> ToolResponse<CoinAnalysis> {
    let Query(q) = match query {
        Ok(q) => q,
        Err(e) => return ToolResponse::err(invalid_query(e)),
    };
    ToolResponse::from_result(
        state
            .screener
            .coin_analysis(&symbol, &q.exchange, &q.timeframe)
            .await,
    )
}

async fn volume_confirmation(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    query: Result<Query<CoinQuery>, QueryRejection>,
) -> ToolResponse<VolumeConfirmation> {
    let Query(q) = match query {
        Ok(q) => q,
        Err(e) => return ToolResponse::err(invalid_query(e)),
    };
    ToolResponse::from_result(
        state
            .screener
            .volume_confirmation_analysis(&symbol, &q.exchange, &q.timeframe)
            .await,
    )
}

async fn volume_breakouts(
    State(state): State<AppState>,
    query: Result<Query<VolumeQuery>, QueryRejection>,
) -> ToolResponse<Vec<VolumeBreakout>> {
    let Query(q) = match query {
        Ok(q) => q,
        Err(e) => return ToolResponse::err(invalid_query(e)),
    };
    let raw_range = q.rsi_range.as_deref().unwrap_or("any");
    let Some(rsi_range) = RsiRange::from_str(raw_range) else {
        return ToolResponse::err(ScreenerError::InvalidArgument(format!(
            "rsi_range must be one of oversold, overbought, neutral, any (got {})",
            raw_range
        )));
    };
    ToolResponse::from_result(
        state
            .screener
            .volume_breakout_scanner(
                &q.exchange,
                &q.timeframe,
                q.volume_multiplier,
                q.price_change_min,
                rsi_range,
                q.limit,
            )
            .await,
    )
}

async fn multi_changes(
    State(state): State<AppState>,
    query: Result<Query<MultiChangeQuery>, QueryRejection>,
) -> ToolResponse<Vec<MultiChangeRow>> {
    let Query(q) = match query {
        Ok(q) => q,
        Err(e) => return ToolResponse::err(invalid_query(e)),
    };
    let timeframes = split_list(&q.timeframes);
    ToolResponse::from_result(
        state
            .screener
            .multi_timeframe_changes(&q.exchange, &timeframes, &q.base_timeframe, q.limit)
            .await,
    )
}

async fn list_exchanges(State(state): State<AppState>) -> ToolResponse<Vec<ExchangeInfo>> {
    ToolResponse::ok(state.screener.list_exchanges())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rating_query(rating: Option<i64>, min: Option<i64>, max: Option<i64>) -> RatingQuery {
        RatingQuery {
            exchange: default_exchange(),
            timeframe: RatingQuery::default_timeframe(),
            rating,
            min_rating: min,
            max_rating: max,
            limit: 25,
        }
    }

    #[test]
    fn test_rating_target_from_query() {
        assert_eq!(rating_query(None, None, None).target(), RatingTarget::Exact(2));
        assert_eq!(rating_query(Some(-7), None, None).target(), RatingTarget::Exact(-3));
        assert_eq!(
            rating_query(Some(1), Some(1), None).target(),
            RatingTarget::Range { min: 1, max: 3 }
        );
    }

    #[test]
    fn test_query_defaults() {
        let q: MoversQuery = serde_urlencoded::from_str("exchange=binance").unwrap();
        assert_eq!(q.exchange, "binance");
        assert_eq!(q.timeframe, "15m");
        assert_eq!(q.limit, 25);

        let q: BollingerQuery = serde_urlencoded::from_str("").unwrap();
        assert_eq!(q.timeframe, "4h");
        assert_eq!(q.bbw_threshold, 0.04);
    }
}
