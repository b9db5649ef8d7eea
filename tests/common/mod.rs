//! Shared fixtures for integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use bandscan::config::{Config, RetryConfig};
use bandscan::services::{MarketDataAdapter, RecordingSleeper, Registry};
use bandscan::sources::MarketSource;
use bandscan::types::{Candle, RawRow, ScreenerQuery, Timeframe};
use bandscan::{AppState, SourceError};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Deterministic in-memory source: scripted failures first, then `rows`.
pub struct FixtureSource {
    rows: Vec<RawRow>,
    failures: Mutex<VecDeque<SourceError>>,
    attempts: AtomicUsize,
}

impl FixtureSource {
    pub fn new(rows: Vec<RawRow>) -> Arc<Self> {
        Self::failing(rows, Vec::new())
    }

    pub fn failing(rows: Vec<RawRow>, failures: Vec<SourceError>) -> Arc<Self> {
        Arc::new(Self {
            rows,
            failures: Mutex::new(failures.into()),
            attempts: AtomicUsize::new(0),
        })
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketSource for FixtureSource {
    fn name(&self) -> &str {
        "fixture"
    }

    async fn query(&self, query: &ScreenerQuery) -> Result<Vec<RawRow>, SourceError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.failures.lock().unwrap().pop_front() {
            return Err(error);
        }
        Ok(self
            .rows
            .iter()
            .filter(|row| query.tickers.is_empty() || query.tickers.contains(&row.ticker))
            .take(query.limit)
            .cloned()
            .collect())
    }
}

pub fn adapter(source: Arc<FixtureSource>) -> (Arc<MarketDataAdapter>, Arc<RecordingSleeper>) {
    let sleeper = Arc::new(RecordingSleeper::new());
    let adapter = MarketDataAdapter::with_sleeper(
        source,
        Arc::new(Registry::builtin()),
        RetryConfig::default(),
        sleeper.clone(),
    );
    (Arc::new(adapter), sleeper)
}

pub fn state(source: Arc<FixtureSource>) -> AppState {
    let (adapter, _) = adapter(source);
    AppState::with_adapter(Arc::new(Config::default()), adapter)
}

/// A row at `tf` with Bollinger bands 90 / 100 / 110.
pub fn banded_row(ticker: &str, tf: Timeframe, close: f64, change: f64, volume: f64) -> RawRow {
    RawRow::new(ticker)
        .with(tf.field("close"), close)
        .with(tf.field("change"), change)
        .with(tf.field("volume"), volume)
        .with(tf.field("BB.upper"), 110.0)
        .with(tf.field("SMA20"), 100.0)
        .with(tf.field("BB.lower"), 90.0)
}

/// Add `candles` (oldest first) to `row` as offset columns at `tf`.
pub fn with_candles(row: RawRow, tf: Timeframe, candles: &[Candle]) -> RawRow {
    candles
        .iter()
        .rev()
        .enumerate()
        .fold(row, |row, (offset, candle)| {
            row.with(tf.field_at("open", offset), candle.open)
                .with(tf.field_at("close", offset), candle.close)
        })
}

/// Up-candles open below their close, down-candles above.
pub fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
    let mut prev = closes.first().copied().unwrap_or(0.0) - 1.0;
    closes
        .iter()
        .map(|&close| {
            let open = if close >= prev { close - 0.5 } else { close + 0.5 };
            prev = close;
            Candle::new(open, close)
        })
        .collect()
}
