//! Scripted in-memory source for unit tests.

use crate::error::SourceError;
use crate::sources::MarketSource;
use crate::types::{RawRow, ScreenerQuery};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Fails with each scripted error in turn, then serves `rows`.
pub struct ScriptedSource {
    rows: Vec<RawRow>,
    failures: Mutex<VecDeque<SourceError>>,
    attempts: AtomicUsize,
    queries: Mutex<Vec<ScreenerQuery>>,
    honour_tickers: bool,
}

impl ScriptedSource {
    pub fn new(rows: Vec<RawRow>) -> Self {
        Self {
            rows,
            failures: Mutex::new(VecDeque::new()),
            attempts: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
            honour_tickers: true,
        }
    }

    /// Serve every row regardless of the query's ticker restriction.
    pub fn ignoring_tickers(mut self) -> Self {
        self.honour_tickers = false;
        self
    }

    pub fn fail_with(self, error: SourceError) -> Self {
        self.failures.lock().unwrap().push_back(error);
        self
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<ScreenerQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl MarketSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn query(&self, query: &ScreenerQuery) -> Result<Vec<RawRow>, SourceError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.clone());

        if let Some(error) = self.failures.lock().unwrap().pop_front() {
            return Err(error);
        }

        Ok(self
            .rows
            .iter()
            .filter(|row| {
                !self.honour_tickers
                    || query.tickers.is_empty()
                    || query.tickers.contains(&row.ticker)
            })
            .take(query.limit)
            .cloned()
            .collect())
    }
}
