//! Market data adapter: one batched upstream query per call, retried with
//! capped exponential backoff on transient failures.

use crate::config::RetryConfig;
use crate::error::{Result, ScreenerError, SourceError};
use crate::services::registry::Registry;
use crate::sources::MarketSource;
use crate::types::{fields, ExchangeSpec, FieldFilter, RawRow, ScreenerQuery};
use async_trait::async_trait;
use rand::Rng;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Delay seam for the retry loop.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, delay: Duration);
}

/// Real delays on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// Records requested delays and returns immediately.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.delays
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, delay: Duration) {
        if let Ok(mut delays) = self.delays.lock() {
            delays.push(delay);
        }
    }
}

/// Why an attempt did not produce usable rows.
enum AttemptFailure {
    Retryable { reason: String, hint: Option<Duration> },
    Permanent(ScreenerError),
}

/// Resilient front for a [`MarketSource`].
pub struct MarketDataAdapter {
    source: Arc<dyn MarketSource>,
    registry: Arc<Registry>,
    retry: RetryConfig,
    sleeper: Arc<dyn Sleeper>,
}

impl MarketDataAdapter {
    pub fn new(source: Arc<dyn MarketSource>, registry: Arc<Registry>, retry: RetryConfig) -> Self {
        Self::with_sleeper(source, registry, retry, Arc::new(TokioSleeper))
    }

    pub fn with_sleeper(
        source: Arc<dyn MarketSource>,
        registry: Arc<Registry>,
        retry: RetryConfig,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            source,
            registry,
            retry,
            sleeper,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Base query scoped to an exchange: its registered tickers when it has a
    /// universe, otherwise an upstream `exchange` filter. The aggregate
    /// exchange spans the whole market.
    pub fn scoped_query(spec: &ExchangeSpec) -> ScreenerQuery {
        let query = ScreenerQuery::new(spec.name.clone(), spec.market);
        if !spec.symbols.is_empty() {
            query.tickers(spec.symbols.clone())
        } else if spec.is_aggregate() {
            query
        } else {
            query.filter(FieldFilter::equal(fields::EXCHANGE, spec.upstream_name()))
        }
    }

    /// Delay before retry number `attempt + 1`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let delay_ms = self
            .retry
            .base_backoff_ms
            .saturating_mul(2_u64.saturating_pow(attempt))
            .min(self.retry.max_backoff_ms);
        Duration::from_millis(delay_ms)
    }

    fn retry_delay(&self, attempt: u32, hint: Option<Duration>) -> Duration {
        let max = Duration::from_millis(self.retry.max_backoff_ms);
        let mut delay = self.backoff_delay(attempt);
        if let Some(hint) = hint {
            delay = delay.max(hint.min(max));
        }
        if self.retry.jitter {
            let spread = delay.as_millis() as u64 / 4;
            if spread > 0 {
                delay += Duration::from_millis(rand::thread_rng().gen_range(0..=spread));
            }
        }
        delay
    }

    fn classify(
        &self,
        query: &ScreenerQuery,
        outcome: std::result::Result<Vec<RawRow>, SourceError>,
        attempts: u32,
    ) -> std::result::Result<Vec<RawRow>, AttemptFailure> {
        match outcome {
            Ok(rows) if rows.is_empty() && query.expect_rows => Err(AttemptFailure::Retryable {
                reason: "upstream returned no rows".to_string(),
                hint: None,
            }),
            Ok(rows) => Ok(rows),
            Err(SourceError::InvalidMarket(market)) => {
                warn!(exchange = %query.exchange, market = %market, "Upstream rejected market");
                Err(AttemptFailure::Permanent(ScreenerError::InvalidExchange(
                    query.exchange.clone(),
                )))
            }
            Err(e) if e.is_retryable() => {
                let hint = match &e {
                    SourceError::RateLimited {
                        retry_after_secs: Some(secs),
                    } => Some(Duration::from_secs(*secs)),
                    _ => None,
                };
                Err(AttemptFailure::Retryable {
                    reason: e.to_string(),
                    hint,
                })
            }
            Err(e) => Err(AttemptFailure::Permanent(ScreenerError::DataUnavailable {
                attempts,
                reason: e.to_string(),
            })),
        }
    }

    /// Execute `query`, retrying transient failures.
    ///
    /// Fails fast with `InvalidExchange` (no upstream call) when the exchange
    /// is not registered, and with `DataUnavailable` once retries run out.
    pub async fn fetch(&self, query: &ScreenerQuery) -> Result<Vec<RawRow>> {
        self.registry.resolve(&query.exchange)?;

        let max_attempts = self.retry.max_retries.saturating_add(1);
        let mut last_reason = String::new();

        for attempt in 0..max_attempts {
            let outcome = self.source.query(query).await;
            match self.classify(query, outcome, attempt + 1) {
                Ok(rows) => {
                    if attempt > 0 {
                        info!(
                            source = self.source.name(),
                            exchange = %query.exchange,
                            attempt = attempt + 1,
                            "Upstream recovered after retries"
                        );
                    }
                    debug!(
                        exchange = %query.exchange,
                        rows = rows.len(),
                        "Fetched screener rows"
                    );
                    return Ok(rows);
                }
                Err(AttemptFailure::Permanent(e)) => return Err(e),
                Err(AttemptFailure::Retryable { reason, hint }) => {
                    if attempt + 1 < max_attempts {
                        let delay = self.retry_delay(attempt, hint);
                        warn!(
                            source = self.source.name(),
                            exchange = %query.exchange,
                            attempt = attempt + 1,
                            max_retries = self.retry.max_retries,
                            delay_ms = delay.as_millis() as u64,
                            "Upstream query failed ({}), retrying",
                            reason
                        );
                        self.sleeper.sleep(delay).await;
                    }
                    last_reason = reason;
                }
            }
        }

        warn!(
            source = self.source.name(),
            exchange = %query.exchange,
            attempts = max_attempts,
            "Upstream query exhausted retries: {}",
            last_reason
        );
        Err(ScreenerError::DataUnavailable {
            attempts: max_attempts,
            reason: last_reason,
        })
    }
}
