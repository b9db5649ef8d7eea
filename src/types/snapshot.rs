use serde::{Deserialize, Serialize};

use super::{RawRow, Timeframe};

/// Upstream column names (before the timeframe suffix is applied).
pub mod fields {
    pub const OPEN: &str = "open";
    pub const CLOSE: &str = "close";
    pub const HIGH: &str = "high";
    pub const LOW: &str = "low";
    pub const VOLUME: &str = "volume";
    pub const VOLUME_SMA20: &str = "volume.SMA20";
    pub const CHANGE: &str = "change";
    pub const BB_UPPER: &str = "BB.upper";
    pub const BB_MIDDLE: &str = "SMA20";
    pub const BB_LOWER: &str = "BB.lower";
    pub const RSI: &str = "RSI";
    pub const MACD: &str = "MACD.macd";
    pub const MACD_SIGNAL: &str = "MACD.signal";
    pub const EMA50: &str = "EMA50";
    pub const EMA200: &str = "EMA200";
    pub const ADX: &str = "ADX";
    pub const STOCH_K: &str = "Stoch.K";
    pub const STOCH_D: &str = "Stoch.D";

    /// Non-suffixed descriptive columns.
    pub const NAME: &str = "name";
    pub const EXCHANGE: &str = "exchange";

    /// Every per-timeframe column a snapshot is built from.
    pub const SNAPSHOT: [&str; 18] = [
        OPEN,
        CLOSE,
        HIGH,
        LOW,
        VOLUME,
        VOLUME_SMA20,
        CHANGE,
        BB_UPPER,
        BB_MIDDLE,
        BB_LOWER,
        RSI,
        MACD,
        MACD_SIGNAL,
        EMA50,
        EMA200,
        ADX,
        STOCH_K,
        STOCH_D,
    ];
}

/// Column list for a full snapshot at `timeframe`.
pub fn snapshot_fields(timeframe: Timeframe) -> Vec<String> {
    std::iter::once(fields::NAME.to_string())
        .chain(fields::SNAPSHOT.iter().map(|f| timeframe.field(f)))
        .collect()
}

/// Point-in-time market data for one symbol on one exchange and timeframe.
///
/// Every numeric field is optional: a column the upstream did not return is
/// absent, never zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolSnapshot {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub close: Option<f64>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub volume: Option<f64>,
    pub volume_sma20: Option<f64>,
    pub change_percent: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_middle: Option<f64>,
    pub bb_lower: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub ema50: Option<f64>,
    pub ema200: Option<f64>,
    pub adx: Option<f64>,
    pub stoch_k: Option<f64>,
    pub stoch_d: Option<f64>,
}

impl SymbolSnapshot {
    /// An empty snapshot: every field absent.
    pub fn empty(symbol: impl Into<String>, timeframe: Timeframe) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            close: None,
            open: None,
            high: None,
            low: None,
            volume: None,
            volume_sma20: None,
            change_percent: None,
            bb_upper: None,
            bb_middle: None,
            bb_lower: None,
            rsi: None,
            macd: None,
            macd_signal: None,
            ema50: None,
            ema200: None,
            adx: None,
            stoch_k: None,
            stoch_d: None,
        }
    }

    /// Read a snapshot out of an upstream row for `timeframe`.
    pub fn from_row(row: &RawRow, timeframe: Timeframe) -> Self {
        let get = |field: &str| row.number(&timeframe.field(field));

        let open = get(fields::OPEN);
        let close = get(fields::CLOSE);
        let change_percent = get(fields::CHANGE).or_else(|| percent_change(open, close));

        Self {
            symbol: row.ticker.clone(),
            timeframe,
            close,
            open,
            high: get(fields::HIGH),
            low: get(fields::LOW),
            volume: get(fields::VOLUME),
            volume_sma20: get(fields::VOLUME_SMA20),
            change_percent,
            bb_upper: get(fields::BB_UPPER),
            bb_middle: get(fields::BB_MIDDLE),
            bb_lower: get(fields::BB_LOWER),
            rsi: get(fields::RSI),
            macd: get(fields::MACD),
            macd_signal: get(fields::MACD_SIGNAL),
            ema50: get(fields::EMA50),
            ema200: get(fields::EMA200),
            adx: get(fields::ADX),
            stoch_k: get(fields::STOCH_K),
            stoch_d: get(fields::STOCH_D),
        }
    }

    /// The three Bollinger bands, if all are present and correctly ordered.
    pub fn bands(&self) -> Option<Bands> {
        let bands = Bands {
            upper: self.bb_upper?,
            middle: self.bb_middle?,
            lower: self.bb_lower?,
        };
        bands.is_ordered().then_some(bands)
    }
}

/// Bollinger band values with `upper >= middle >= lower`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl Bands {
    pub fn is_ordered(&self) -> bool {
        self.upper >= self.middle && self.middle >= self.lower
    }
}

/// `(close - open) / open * 100`, absent when open is zero or either side is
/// missing.
pub fn percent_change(open: Option<f64>, close: Option<f64>) -> Option<f64> {
    let open = open?;
    let close = close?;
    if open == 0.0 {
        return None;
    }
    Some((close - open) / open * 100.0)
}

/// One candle of a per-symbol history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open: f64,
    pub close: f64,
}

impl Candle {
    pub fn new(open: f64, close: f64) -> Self {
        Self { open, close }
    }

    /// Body change in percent of the open.
    pub fn change_percent(&self) -> Option<f64> {
        percent_change(Some(self.open), Some(self.close))
    }
}

/// Columns carrying `lookback` candles of history at `timeframe`.
pub fn candle_fields(timeframe: Timeframe, lookback: usize) -> Vec<String> {
    (0..lookback)
        .flat_map(|offset| {
            [
                timeframe.field_at(fields::OPEN, offset),
                timeframe.field_at(fields::CLOSE, offset),
            ]
        })
        .collect()
}

/// Rebuild a candle series (oldest to newest) from offset columns.
///
/// Walks back from the latest bar and stops at the first missing open or
/// close, so the result is always the contiguous newest part of the history.
pub fn candles_from_row(row: &RawRow, timeframe: Timeframe, lookback: usize) -> Vec<Candle> {
    let mut newest_first = Vec::with_capacity(lookback);
    for offset in 0..lookback {
        let open = row.number(&timeframe.field_at(fields::OPEN, offset));
        let close = row.number(&timeframe.field_at(fields::CLOSE, offset));
        match (open, close) {
            (Some(open), Some(close)) => newest_first.push(Candle::new(open, close)),
            _ => break,
        }
    }
    newest_first.reverse();
    newest_first
}
