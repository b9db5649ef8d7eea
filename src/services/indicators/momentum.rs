//! RSI momentum classification.

use crate::types::Momentum;

/// RSI at or above this is overbought.
pub const OVERBOUGHT: f64 = 70.0;
/// RSI at or below this is oversold.
pub const OVERSOLD: f64 = 30.0;

/// Classify an RSI reading. Values outside 0..=100 are treated as bad data.
pub fn classify(rsi: Option<f64>) -> Momentum {
    match rsi {
        Some(v) if !(0.0..=100.0).contains(&v) => Momentum::Indeterminate,
        Some(v) if v >= OVERBOUGHT => Momentum::Overbought,
        Some(v) if v <= OVERSOLD => Momentum::Oversold,
        Some(_) => Momentum::Neutral,
        None => Momentum::Indeterminate,
    }
}
