//! Display-only trend label from EMA and MACD alignment.

use crate::types::{SymbolSnapshot, TrendDirection, TrendStrength};
use std::cmp::Ordering;

/// ADX above this marks a strong trend.
pub const STRONG_TREND_ADX: f64 = 25.0;

/// Bullish when EMA50 > EMA200 and MACD > signal, bearish when both point
/// down, neutral when they disagree or either comparison is flat.
pub fn direction(snapshot: &SymbolSnapshot) -> TrendDirection {
    let (Some(ema50), Some(ema200), Some(macd), Some(signal)) = (
        snapshot.ema50,
        snapshot.ema200,
        snapshot.macd,
        snapshot.macd_signal,
    ) else {
        return TrendDirection::Indeterminate;
    };

    let averages = ema50.partial_cmp(&ema200);
    let crossover = macd.partial_cmp(&signal);

    match (averages, crossover) {
        (Some(Ordering::Greater), Some(Ordering::Greater)) => TrendDirection::Bullish,
        (Some(Ordering::Less), Some(Ordering::Less)) => TrendDirection::Bearish,
        (Some(_), Some(_)) => TrendDirection::Neutral,
        _ => TrendDirection::Indeterminate,
    }
}

/// MACD line minus signal line.
pub fn macd_divergence(snapshot: &SymbolSnapshot) -> Option<f64> {
    Some(snapshot.macd? - snapshot.macd_signal?)
}

pub fn strength(adx: Option<f64>) -> Option<TrendStrength> {
    adx.map(|v| {
        if v > STRONG_TREND_ADX {
            TrendStrength::Strong
        } else {
            TrendStrength::Weak
        }
    })
}
