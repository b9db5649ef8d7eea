//! Integration tests for the candle pattern scanner

mod common;

use bandscan::config::ScanConfig;
use bandscan::services::patterns::{final_run, RunState};
use bandscan::services::PatternScanner;
use bandscan::types::{Candle, CandleDirection, RawRow, Timeframe};
use bandscan::ScreenerError;
use common::{adapter, candles_from_closes, with_candles, FixtureSource};

fn scanner(source: std::sync::Arc<FixtureSource>) -> PatternScanner {
    let (adapter, _) = adapter(source);
    PatternScanner::new(adapter, ScanConfig::default())
}

// =============================================================================
// State machine
// =============================================================================

#[test]
fn test_latest_run_ignores_earlier_broken_run() {
    let candles = candles_from_closes(&[10.0, 11.0, 12.0, 11.0, 13.0, 14.0, 15.0]);
    assert_eq!(
        final_run(&candles, None),
        RunState::Run {
            direction: CandleDirection::Bullish,
            length: 3,
        }
    );
}

#[test]
fn test_empty_series_has_no_run() {
    assert_eq!(final_run(&[], None), RunState::NoRun);
    assert_eq!(final_run(&[Candle::new(5.0, 5.0)], None), RunState::NoRun);
}

// =============================================================================
// Consecutive candle scan
// =============================================================================

#[tokio::test]
async fn test_scan_matches_bullish_run() {
    let tf = Timeframe::FifteenMinutes;
    let candles = candles_from_closes(&[10.0, 11.0, 12.0, 11.0, 13.0, 14.0, 15.0]);
    let source = FixtureSource::new(vec![with_candles(RawRow::new("KUCOIN:SOLUSDT"), tf, &candles)]);
    let scanner = scanner(source);

    let result = scanner
        .consecutive_candles_scan("kucoin", "15m", Some(CandleDirection::Bullish), 3, None, 10)
        .await
        .unwrap();

    assert_eq!(result.symbols(), vec!["KUCOIN:SOLUSDT"]);
    let pattern = result.entries[0].pattern.as_ref().unwrap();
    assert_eq!(pattern.direction, CandleDirection::Bullish);
    assert_eq!(pattern.run_length, 3);
    assert_eq!(pattern.timeframes.len(), 1);

    let longer = scanner
        .consecutive_candles_scan("kucoin", "15m", Some(CandleDirection::Bullish), 4, None, 10)
        .await
        .unwrap();
    assert!(longer.is_empty());
}

#[tokio::test]
async fn test_scan_skips_short_histories() {
    let tf = Timeframe::OneHour;
    let short = candles_from_closes(&[1.0, 2.0]);
    let source = FixtureSource::new(vec![with_candles(RawRow::new("KUCOIN:NEW"), tf, &short)]);
    let scanner = scanner(source);

    let result = scanner
        .consecutive_candles_scan("kucoin", "1h", None, 3, None, 10)
        .await
        .unwrap();
    assert!(result.is_empty());
}

#[tokio::test]
async fn test_scan_validates_inputs() {
    let scanner = scanner(FixtureSource::new(Vec::new()));
    assert_eq!(
        scanner
            .consecutive_candles_scan("kucoin", "1m", None, 3, None, 10)
            .await
            .unwrap_err(),
        ScreenerError::InvalidTimeframe("1m".to_string())
    );
    assert!(scanner
        .consecutive_candles_scan("kucoin", "1h", None, 3, None, 0)
        .await
        .unwrap()
        .is_empty());
}

// =============================================================================
// Advanced pattern
// =============================================================================

#[tokio::test]
async fn test_advanced_pattern_requires_same_direction() {
    let m15 = Timeframe::FifteenMinutes;
    let h1 = Timeframe::OneHour;
    let up = candles_from_closes(&[1.0, 2.0, 3.0, 4.0]);
    let down = candles_from_closes(&[4.0, 3.0, 2.0, 1.0]);

    let agree = with_candles(with_candles(RawRow::new("OKX:AGREE"), m15, &up), h1, &up);
    let differ = with_candles(with_candles(RawRow::new("OKX:DIFFER"), m15, &up), h1, &down);
    let only_base = with_candles(RawRow::new("OKX:BASE"), m15, &up);
    let source = FixtureSource::new(vec![differ, only_base, agree]);
    let scanner = scanner(source.clone());

    let result = scanner
        .advanced_candle_pattern("okx", &["15m", "1h"], 3, false, 10)
        .await
        .unwrap();

    assert_eq!(result.timeframe, m15);
    assert_eq!(result.symbols()[0], "OKX:AGREE");
    assert_eq!(result.len(), 3);
    for entry in &result.entries[1..] {
        assert!(!entry.pattern.as_ref().unwrap().agreement);
    }
    assert_eq!(source.attempts(), 2);

    let agreeing = scanner
        .advanced_candle_pattern("okx", &["15m", "1h"], 3, true, 10)
        .await
        .unwrap();
    assert_eq!(agreeing.symbols(), vec!["OKX:AGREE"]);
}
