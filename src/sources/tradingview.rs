use crate::error::SourceError;
use crate::sources::MarketSource;
use crate::types::{FilterOp, RawRow, ScreenerQuery, SortOrder};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_API_URL: &str = "https://scanner.tradingview.com";

/// Scanner request body.
#[derive(Debug, Serialize)]
struct ScanRequest<'a> {
    filter: Vec<ScanFilter<'a>>,
    columns: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    sort: Option<ScanSort<'a>>,
    range: [usize; 2],
    symbols: ScanSymbols<'a>,
    markets: [&'a str; 1],
}

#[derive(Debug, Serialize)]
struct ScanFilter<'a> {
    left: &'a str,
    operation: &'static str,
    #[serde(skip_serializing_if = "is_null")]
    right: &'a Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScanSort<'a> {
    sort_by: &'a str,
    sort_order: &'static str,
}

#[derive(Debug, Serialize)]
struct ScanSymbols<'a> {
    query: ScanSymbolQuery,
    tickers: &'a [String],
}

#[derive(Debug, Serialize)]
struct ScanSymbolQuery {
    types: Vec<String>,
}

/// Scanner response body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScanResponse {
    total_count: Option<u64>,
    data: Option<Vec<ScanRow>>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScanRow {
    s: String,
    #[serde(default)]
    d: Vec<Value>,
}

fn is_null(value: &&Value) -> bool {
    value.is_null()
}

fn operation(op: FilterOp) -> &'static str {
    match op {
        FilterOp::Equal => "equal",
        FilterOp::Greater => "greater",
        FilterOp::NotEmpty => "nempty",
    }
}

fn build_request(query: &ScreenerQuery) -> ScanRequest<'_> {
    ScanRequest {
        filter: query
            .filters
            .iter()
            .map(|f| ScanFilter {
                left: &f.field,
                operation: operation(f.op),
                right: &f.value,
            })
            .collect(),
        columns: &query.fields,
        sort: query.sort.as_ref().map(|s| ScanSort {
            sort_by: &s.field,
            sort_order: match s.order {
                SortOrder::Asc => "asc",
                SortOrder::Desc => "desc",
            },
        }),
        range: [0, query.limit],
        symbols: ScanSymbols {
            query: ScanSymbolQuery { types: Vec::new() },
            tickers: &query.tickers,
        },
        markets: [query.market.as_str()],
    }
}

/// Pair each row's positional values with the requested columns.
fn into_rows(columns: &[String], rows: Vec<ScanRow>) -> Vec<RawRow> {
    rows.into_iter()
        .map(|row| RawRow {
            ticker: row.s,
            values: columns.iter().cloned().zip(row.d).collect(),
        })
        .collect()
}

/// TradingView screener REST client.
#[derive(Clone)]
pub struct TradingViewClient {
    client: Client,
    base_url: String,
}

impl TradingViewClient {
    /// Create a new client against `base_url` with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .user_agent("bandscan/0.1")
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn scan_url(&self, market: &str) -> String {
        format!("{}/{}/scan", self.base_url.trim_end_matches('/'), market)
    }
}

impl Default for TradingViewClient {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL, Duration::from_secs(15))
    }
}

#[async_trait]
impl MarketSource for TradingViewClient {
    fn name(&self) -> &str {
        "tradingview"
    }

    async fn query(&self, query: &ScreenerQuery) -> Result<Vec<RawRow>, SourceError> {
        let url = self.scan_url(query.market.as_str());
        let body = build_request(query);

        debug!(
            "Scanner query {} exchange={} columns={} limit={}",
            url,
            query.exchange,
            query.fields.len(),
            query.limit
        );

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();

        if status.as_u16() == 429 {
            let retry_after_secs = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            warn!("Scanner rate limited (retry-after {:?})", retry_after_secs);
            return Err(SourceError::RateLimited { retry_after_secs });
        }

        if status.as_u16() == 404 {
            return Err(SourceError::InvalidMarket(query.market.to_string()));
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(
                "Scanner returned {}: {}",
                status,
                text.chars().take(200).collect::<String>()
            );
            return Err(SourceError::Http {
                status: status.as_u16(),
            });
        }

        let parsed: ScanResponse = response.json().await?;

        if let Some(error) = parsed.error.filter(|e| !e.is_empty()) {
            return Err(SourceError::Decode(error));
        }

        let rows = into_rows(&query.fields, parsed.data.unwrap_or_default());
        debug!(
            rows = rows.len(),
            total = parsed.total_count.unwrap_or_default(),
            "Scanner returned rows"
        );
        Ok(rows)
    }
}
