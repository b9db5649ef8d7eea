//! Volume confirmation: does traded volume back the latest price move?

use crate::services::indicators::bollinger;
use crate::types::{
    percent_change, BandPosition, CandleMetrics, SignalTally, SignalTone, SymbolSnapshot,
    TradingRecommendation, VolumeAnalysis, VolumeConfirmation, VolumeSignal, VolumeSignalNote,
    VolumeStrength,
};

pub const VERY_STRONG_RATIO: f64 = 3.0;
pub const STRONG_RATIO: f64 = 2.0;
pub const MEDIUM_RATIO: f64 = 1.5;
pub const NORMAL_RATIO: f64 = 1.0;
/// Below this a sizeable move is not backed by volume.
pub const THIN_RATIO: f64 = 0.8;

const BREAKOUT_MOVE: f64 = 3.0;
const THIN_MOVE: f64 = 2.0;
const FLAT_MOVE: f64 = 1.0;
const RSI_OVERBOUGHT: f64 = 70.0;
const RSI_OVERSOLD: f64 = 30.0;

/// Current volume over its 20-period average.
pub fn volume_ratio(snapshot: &SymbolSnapshot) -> Option<f64> {
    let volume = snapshot.volume?;
    let average = snapshot.volume_sma20.filter(|v| *v > 0.0)?;
    let ratio = volume / average;
    ratio.is_finite().then_some(ratio)
}

pub fn strength(ratio: f64) -> VolumeStrength {
    if ratio >= VERY_STRONG_RATIO {
        VolumeStrength::VeryStrong
    } else if ratio >= STRONG_RATIO {
        VolumeStrength::Strong
    } else if ratio >= MEDIUM_RATIO {
        VolumeStrength::Medium
    } else if ratio >= NORMAL_RATIO {
        VolumeStrength::Normal
    } else {
        VolumeStrength::Weak
    }
}

/// Candle body change, falling back to the reported change.
pub fn candle_change(snapshot: &SymbolSnapshot) -> Option<f64> {
    percent_change(snapshot.open, snapshot.close).or(snapshot.change_percent)
}

/// High-low range as a percent of the low.
pub fn candle_range(snapshot: &SymbolSnapshot) -> Option<f64> {
    let (high, low) = (snapshot.high?, snapshot.low?);
    if low <= 0.0 {
        return None;
    }
    Some((high - low) / low * 100.0)
}

fn note(signal: VolumeSignal, message: String) -> VolumeSignalNote {
    VolumeSignalNote {
        signal,
        tone: signal.tone(),
        message,
    }
}

/// Confirmation signals for one candle. Nothing fires without a volume ratio.
pub fn confirmation_signals(
    change: Option<f64>,
    ratio: Option<f64>,
    position: BandPosition,
    rsi: Option<f64>,
) -> Vec<VolumeSignalNote> {
    let Some(ratio) = ratio else {
        return Vec::new();
    };
    let mut notes = Vec::new();

    if let Some(change) = change {
        let moved = change.abs();
        if ratio >= STRONG_RATIO && moved >= BREAKOUT_MOVE {
            notes.push(note(
                VolumeSignal::StrongBreakout,
                format!("{:.1}x volume with a {:.1}% move", ratio, change),
            ));
        }
        if ratio >= MEDIUM_RATIO && moved < FLAT_MOVE {
            notes.push(note(
                VolumeSignal::VolumeDivergence,
                format!("{:.1}x volume but price barely moved", ratio),
            ));
        }
        if moved >= THIN_MOVE && ratio < THIN_RATIO {
            notes.push(note(
                VolumeSignal::WeakSignal,
                format!("{:.1}% move on thin volume ({:.1}x)", change, ratio),
            ));
        }
    }

    if ratio >= MEDIUM_RATIO {
        match position {
            BandPosition::AboveUpper => notes.push(note(
                VolumeSignal::BandBreakoutConfirmed,
                "Upper band breakout confirmed by volume".to_string(),
            )),
            BandPosition::BelowLower => notes.push(note(
                VolumeSignal::BandBreakdownConfirmed,
                "Lower band breakdown confirmed by volume".to_string(),
            )),
            _ => {}
        }
    }

    if ratio >= STRONG_RATIO {
        match rsi {
            Some(rsi) if rsi > RSI_OVERBOUGHT => notes.push(note(
                VolumeSignal::OverboughtOnVolume,
                format!("RSI {:.1} on {:.1}x volume", rsi, ratio),
            )),
            Some(rsi) if rsi < RSI_OVERSOLD => notes.push(note(
                VolumeSignal::OversoldOnVolume,
                format!("RSI {:.1} on {:.1}x volume", rsi, ratio),
            )),
            _ => {}
        }
    }

    notes
}

pub fn tally(notes: &[VolumeSignalNote]) -> SignalTally {
    notes.iter().fold(SignalTally::default(), |mut tally, n| {
        match n.tone {
            Some(SignalTone::Bullish) => tally.bullish_signals += 1,
            Some(SignalTone::Bearish) => tally.bearish_signals += 1,
            Some(SignalTone::Warning) => tally.warning_signals += 1,
            None => {}
        }
        tally
    })
}

/// Trade hint for a move on at least 2x volume. A missing RSI counts as
/// neither overbought nor oversold.
pub fn recommendation(change: f64, ratio: f64, rsi: Option<f64>) -> Option<TradingRecommendation> {
    if ratio < STRONG_RATIO || change == 0.0 {
        return None;
    }
    let rsi = rsi.unwrap_or(50.0);
    Some(if change > 0.0 {
        if rsi < RSI_OVERBOUGHT {
            TradingRecommendation::StrongBuy
        } else {
            TradingRecommendation::OverboughtCaution
        }
    } else if rsi > RSI_OVERSOLD {
        TradingRecommendation::StrongSell
    } else {
        TradingRecommendation::OversoldOpportunity
    })
}

/// Full volume report for one snapshot.
pub fn confirmation(snapshot: &SymbolSnapshot, exchange: &str) -> VolumeConfirmation {
    let ratio = volume_ratio(snapshot);
    let change = candle_change(snapshot);
    let position = bollinger::band_position(snapshot);
    let signals = confirmation_signals(change, ratio, position, snapshot.rsi);

    VolumeConfirmation {
        symbol: snapshot.symbol.clone(),
        exchange: exchange.to_string(),
        timeframe: snapshot.timeframe,
        price_data: CandleMetrics {
            close: snapshot.close,
            change_percent: change,
            candle_range_percent: candle_range(snapshot),
        },
        volume_analysis: VolumeAnalysis {
            current_volume: snapshot.volume,
            average_volume: snapshot.volume_sma20,
            volume_ratio: ratio,
            volume_strength: ratio.map(strength),
        },
        rsi: snapshot.rsi,
        band_position: position,
        bb_upper: snapshot.bb_upper,
        bb_lower: snapshot.bb_lower,
        overall_assessment: tally(&signals),
        signals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Timeframe;

    fn snapshot(open: f64, close: f64, volume: f64, average: f64) -> SymbolSnapshot {
        let mut snap = SymbolSnapshot::empty("KUCOIN:SOLUSDT", Timeframe::FifteenMinutes);
        snap.open = Some(open);
        snap.close = Some(close);
        snap.high = Some(close.max(open) + 2.0);
        snap.low = Some(close.min(open) - 2.0);
        snap.volume = Some(volume);
        snap.volume_sma20 = Some(average);
        snap.bb_upper = Some(110.0);
        snap.bb_middle = Some(100.0);
        snap.bb_lower = Some(90.0);
        snap
    }

    fn kinds(notes: &[VolumeSignalNote]) -> Vec<VolumeSignal> {
        notes.iter().map(|n| n.signal).collect()
    }

    #[test]
    fn test_strength_buckets() {
        assert_eq!(strength(3.0), VolumeStrength::VeryStrong);
        assert_eq!(strength(2.5), VolumeStrength::Strong);
        assert_eq!(strength(1.5), VolumeStrength::Medium);
        assert_eq!(strength(1.0), VolumeStrength::Normal);
        assert_eq!(strength(0.99), VolumeStrength::Weak);
    }

    #[test]
    fn test_ratio_needs_positive_average() {
        let mut snap = snapshot(100.0, 101.0, 500.0, 0.0);
        assert_eq!(volume_ratio(&snap), None);
        snap.volume_sma20 = Some(250.0);
        assert_eq!(volume_ratio(&snap), Some(2.0));
        snap.volume = None;
        assert_eq!(volume_ratio(&snap), None);
    }

    #[test]
    fn test_breakout_above_band_on_volume() {
        // 80 -> 120: +50% body, closes above the upper band on 4x volume.
        let mut snap = snapshot(80.0, 120.0, 400.0, 100.0);
        snap.rsi = Some(78.0);
        let report = confirmation(&snap, "kucoin");

        assert_eq!(report.volume_analysis.volume_strength, Some(VolumeStrength::VeryStrong));
        assert_eq!(report.band_position, BandPosition::AboveUpper);
        assert_eq!(
            kinds(&report.signals),
            vec![
                VolumeSignal::StrongBreakout,
                VolumeSignal::BandBreakoutConfirmed,
                VolumeSignal::OverboughtOnVolume,
            ]
        );
        assert_eq!(
            report.overall_assessment,
            SignalTally {
                bullish_signals: 2,
                bearish_signals: 0,
                warning_signals: 0,
            }
        );
        assert_eq!(report.price_data.change_percent, Some(50.0));
    }

    #[test]
    fn test_divergence_and_thin_moves() {
        let flat = snapshot(100.0, 100.5, 160.0, 100.0);
        let notes = confirmation(&flat, "kucoin").signals;
        assert_eq!(kinds(&notes), vec![VolumeSignal::VolumeDivergence]);
        assert_eq!(tally(&notes).warning_signals, 1);

        let thin = snapshot(100.0, 96.0, 50.0, 100.0);
        let report = confirmation(&thin, "kucoin");
        assert_eq!(kinds(&report.signals), vec![VolumeSignal::WeakSignal]);
        assert_eq!(report.overall_assessment.bearish_signals, 1);
        assert_eq!(report.volume_analysis.volume_strength, Some(VolumeStrength::Weak));
    }

    #[test]
    fn test_no_volume_no_signals() {
        let mut snap = snapshot(100.0, 120.0, 0.0, 0.0);
        snap.volume = None;
        let report = confirmation(&snap, "kucoin");
        assert!(report.signals.is_empty());
        assert_eq!(report.volume_analysis.volume_strength, None);
        assert_eq!(report.overall_assessment, SignalTally::default());
    }

    #[test]
    fn test_candle_range() {
        let mut snap = SymbolSnapshot::empty("X:Y", Timeframe::OneHour);
        snap.high = Some(150.0);
        snap.low = Some(100.0);
        assert_eq!(candle_range(&snap), Some(50.0));
        snap.low = Some(0.0);
        assert_eq!(candle_range(&snap), None);
    }

    #[test]
    fn test_recommendation() {
        assert_eq!(recommendation(4.0, 1.9, Some(50.0)), None);
        assert_eq!(recommendation(4.0, 2.0, Some(50.0)), Some(TradingRecommendation::StrongBuy));
        assert_eq!(
            recommendation(4.0, 2.0, Some(70.0)),
            Some(TradingRecommendation::OverboughtCaution)
        );
        assert_eq!(recommendation(-4.0, 3.0, None), Some(TradingRecommendation::StrongSell));
        assert_eq!(
            recommendation(-4.0, 3.0, Some(30.0)),
            Some(TradingRecommendation::OversoldOpportunity)
        );
    }
}
