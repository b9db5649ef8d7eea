use serde::{Deserialize, Serialize};

use super::{Momentum, Rating, SymbolSnapshot, Timeframe, TrendDirection};

/// Indicator-engine output for one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolSignals {
    pub rating: Rating,
    /// Rating label ("Strong Buy" .. "Strong Sell"), absent when indeterminate.
    pub signal: Option<String>,
    /// Bollinger band width, absent when the bands are unusable.
    pub bbw: Option<f64>,
    pub momentum: Momentum,
    pub trend: TrendDirection,
}

/// Direction of a single candle or of a run of candles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandleDirection {
    Bullish,
    Bearish,
}

impl CandleDirection {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "bullish" | "bull" | "up" => Some(CandleDirection::Bullish),
            "bearish" | "bear" | "down" => Some(CandleDirection::Bearish),
            _ => None,
        }
    }
}

/// Latest run observed on one timeframe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeframeRun {
    pub timeframe: Timeframe,
    /// `None` when the latest candle was neutral.
    pub direction: Option<CandleDirection>,
    pub run_length: usize,
    /// Whether this run meets the requested minimum length.
    pub qualifies: bool,
}

/// A consecutive-candle match for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternMatch {
    pub symbol: String,
    pub direction: CandleDirection,
    pub run_length: usize,
    /// Per-timeframe runs; a single entry for single-timeframe scans.
    pub timeframes: Vec<TimeframeRun>,
    /// Every timeframe shows a qualifying run in `direction`.
    pub agreement: bool,
}

/// One ranked row of a scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanEntry {
    pub snapshot: SymbolSnapshot,
    #[serde(flatten)]
    pub signals: SymbolSignals,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub pattern: Option<PatternMatch>,
}

impl ScanEntry {
    pub fn symbol(&self) -> &str {
        &self.snapshot.symbol
    }
}

/// Ordered scan output. Entry order is the ranking the operation promises.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub exchange: String,
    pub timeframe: Timeframe,
    pub entries: Vec<ScanEntry>,
}

impl ScanResult {
    pub fn empty(exchange: impl Into<String>, timeframe: Timeframe) -> Self {
        Self {
            exchange: exchange.into(),
            timeframe,
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Symbols in ranked order.
    pub fn symbols(&self) -> Vec<&str> {
        self.entries.iter().map(ScanEntry::symbol).collect()
    }
}
