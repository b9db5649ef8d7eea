//! Indicator engine: pure per-snapshot signal computation.
//!
//! Nothing here performs I/O or fails. Missing inputs produce indeterminate
//! outputs so one bad row never aborts a batch.

pub mod bollinger;
pub mod momentum;
pub mod trend;
pub mod volume;

pub use bollinger::{band_width, rate, rate_snapshot, snapshot_bbw};

use crate::types::{
    BollingerAnalysis, CandleDirection, MarketSentiment, PriceData, SymbolSignals,
    SymbolSnapshot, TechnicalIndicators,
};

/// Rating, BBW, momentum and trend for one snapshot.
pub fn analyze(snapshot: &SymbolSnapshot) -> SymbolSignals {
    let rating = bollinger::rate_snapshot(snapshot);
    SymbolSignals {
        rating,
        signal: rating.label().map(str::to_string),
        bbw: bollinger::snapshot_bbw(snapshot),
        momentum: momentum::classify(snapshot.rsi),
        trend: trend::direction(snapshot),
    }
}

pub fn price_data(snapshot: &SymbolSnapshot) -> PriceData {
    PriceData {
        current_price: snapshot.close,
        open: snapshot.open,
        high: snapshot.high,
        low: snapshot.low,
        close: snapshot.close,
        change_percent: snapshot.change_percent,
        volume: snapshot.volume,
    }
}

pub fn bollinger_analysis(snapshot: &SymbolSnapshot, signals: &SymbolSignals) -> BollingerAnalysis {
    BollingerAnalysis {
        rating: signals.rating,
        signal: signals.signal.clone(),
        bbw: signals.bbw,
        upper: snapshot.bb_upper,
        middle: snapshot.bb_middle,
        lower: snapshot.bb_lower,
        position: bollinger::band_position(snapshot),
    }
}

pub fn technical_indicators(snapshot: &SymbolSnapshot, signals: &SymbolSignals) -> TechnicalIndicators {
    TechnicalIndicators {
        rsi: snapshot.rsi,
        rsi_signal: signals.momentum,
        sma20: snapshot.bb_middle,
        ema50: snapshot.ema50,
        ema200: snapshot.ema200,
        macd: snapshot.macd,
        macd_signal: snapshot.macd_signal,
        macd_divergence: trend::macd_divergence(snapshot),
        adx: snapshot.adx,
        trend_strength: trend::strength(snapshot.adx),
        stoch_k: snapshot.stoch_k,
        stoch_d: snapshot.stoch_d,
    }
}

pub fn market_sentiment(snapshot: &SymbolSnapshot, signals: &SymbolSignals) -> MarketSentiment {
    MarketSentiment {
        overall_rating: signals.rating,
        buy_sell_signal: signals.signal.clone(),
        volatility: bollinger::volatility(signals.bbw),
        momentum: snapshot.change_percent.map(|change| {
            if change > 0.0 {
                CandleDirection::Bullish
            } else {
                CandleDirection::Bearish
            }
        }),
        trend: signals.trend,
    }
}
