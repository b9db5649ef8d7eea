use serde::{Deserialize, Serialize};

use super::{CandleDirection, Momentum, Rating, SymbolSignals, SymbolSnapshot, Timeframe, TrendDirection, Volatility};

/// Where the close sits relative to the outer bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandPosition {
    AboveUpper,
    BelowLower,
    WithinBands,
    Indeterminate,
}

/// ADX trend strength bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendStrength {
    Strong,
    Weak,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceData {
    pub current_price: Option<f64>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub change_percent: Option<f64>,
    pub volume: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BollingerAnalysis {
    pub rating: Rating,
    pub signal: Option<String>,
    pub bbw: Option<f64>,
    pub upper: Option<f64>,
    pub middle: Option<f64>,
    pub lower: Option<f64>,
    pub position: BandPosition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalIndicators {
    pub rsi: Option<f64>,
    pub rsi_signal: Momentum,
    pub sma20: Option<f64>,
    pub ema50: Option<f64>,
    pub ema200: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_divergence: Option<f64>,
    pub adx: Option<f64>,
    pub trend_strength: Option<TrendStrength>,
    pub stoch_k: Option<f64>,
    pub stoch_d: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSentiment {
    pub overall_rating: Rating,
    pub buy_sell_signal: Option<String>,
    pub volatility: Volatility,
    /// Direction of the current candle's change.
    pub momentum: Option<CandleDirection>,
    pub trend: TrendDirection,
}

/// Detailed single-symbol report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinAnalysis {
    pub symbol: String,
    pub exchange: String,
    pub timeframe: Timeframe,
    pub price_data: PriceData,
    pub bollinger_analysis: BollingerAnalysis,
    pub technical_indicators: TechnicalIndicators,
    pub market_sentiment: MarketSentiment,
}

/// RSI window accepted by the volume scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RsiRange {
    Oversold,
    Overbought,
    Neutral,
    #[default]
    Any,
}

impl RsiRange {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "oversold" => Some(RsiRange::Oversold),
            "overbought" => Some(RsiRange::Overbought),
            "neutral" => Some(RsiRange::Neutral),
            "any" | "" => Some(RsiRange::Any),
            _ => None,
        }
    }

    /// `Any` accepts rows without RSI; every other range needs a value.
    pub fn matches(&self, rsi: Option<f64>) -> bool {
        match (self, rsi) {
            (RsiRange::Any, _) => true,
            (_, None) => false,
            (RsiRange::Oversold, Some(v)) => v < 30.0,
            (RsiRange::Overbought, Some(v)) => v > 70.0,
            (RsiRange::Neutral, Some(v)) => (30.0..=70.0).contains(&v),
        }
    }
}

/// Action hint for a high-volume move, tempered by RSI extremes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradingRecommendation {
    StrongBuy,
    OverboughtCaution,
    StrongSell,
    OversoldOpportunity,
}

impl TradingRecommendation {
    pub fn label(&self) -> &'static str {
        match self {
            TradingRecommendation::StrongBuy => "Strong Buy",
            TradingRecommendation::OverboughtCaution => "Overbought - Caution",
            TradingRecommendation::StrongSell => "Strong Sell",
            TradingRecommendation::OversoldOpportunity => "Oversold - Opportunity",
        }
    }
}

/// A symbol trading on unusual volume with a meaningful price move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeBreakout {
    pub symbol: String,
    pub change_percent: f64,
    pub volume_ratio: f64,
    /// Volume ratio capped at 10.
    pub volume_strength: f64,
    pub current_volume: f64,
    pub breakout_type: CandleDirection,
    pub rsi: Option<f64>,
    pub rating: Rating,
    /// Absent below 2x average volume.
    pub recommendation: Option<TradingRecommendation>,
}

/// Volume ratio bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeStrength {
    VeryStrong,
    Strong,
    Medium,
    Normal,
    Weak,
}

/// Whether a confirmation signal leans bullish, bearish or is a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalTone {
    Bullish,
    Bearish,
    Warning,
}

/// Volume-confirmation findings for a single candle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeSignal {
    /// 2x volume with a move of at least 3%.
    StrongBreakout,
    /// 1.5x volume but the price barely moved.
    VolumeDivergence,
    /// A 2% move on under 0.8x volume.
    WeakSignal,
    BandBreakoutConfirmed,
    BandBreakdownConfirmed,
    OverboughtOnVolume,
    OversoldOnVolume,
}

impl VolumeSignal {
    /// `None` for signals that are informational only.
    pub fn tone(&self) -> Option<SignalTone> {
        match self {
            VolumeSignal::StrongBreakout
            | VolumeSignal::BandBreakoutConfirmed
            | VolumeSignal::OversoldOnVolume => Some(SignalTone::Bullish),
            VolumeSignal::BandBreakdownConfirmed | VolumeSignal::WeakSignal => {
                Some(SignalTone::Bearish)
            }
            VolumeSignal::VolumeDivergence => Some(SignalTone::Warning),
            VolumeSignal::OverboughtOnVolume => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSignalNote {
    pub signal: VolumeSignal,
    pub tone: Option<SignalTone>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandleMetrics {
    pub close: Option<f64>,
    /// Body change `(close - open) / open * 100`.
    pub change_percent: Option<f64>,
    /// `(high - low) / low * 100`.
    pub candle_range_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeAnalysis {
    pub current_volume: Option<f64>,
    pub average_volume: Option<f64>,
    pub volume_ratio: Option<f64>,
    pub volume_strength: Option<VolumeStrength>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalTally {
    pub bullish_signals: usize,
    pub bearish_signals: usize,
    pub warning_signals: usize,
}

/// Single-symbol report on whether volume backs the latest price move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeConfirmation {
    pub symbol: String,
    pub exchange: String,
    pub timeframe: Timeframe,
    pub price_data: CandleMetrics,
    pub volume_analysis: VolumeAnalysis,
    pub rsi: Option<f64>,
    pub band_position: BandPosition,
    pub bb_upper: Option<f64>,
    pub bb_lower: Option<f64>,
    pub signals: Vec<VolumeSignalNote>,
    pub overall_assessment: SignalTally,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeframeChange {
    pub timeframe: Timeframe,
    pub change_percent: Option<f64>,
}

/// Percent change of one symbol across several timeframes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiChangeRow {
    pub symbol: String,
    pub changes: Vec<TimeframeChange>,
    pub base: SymbolSnapshot,
    #[serde(flatten)]
    pub signals: SymbolSignals,
}
