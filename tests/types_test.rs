//! Unit tests for wire-facing types

use bandscan::types::*;
use serde_json::json;

// =============================================================================
// Timeframe Tests
// =============================================================================

#[test]
fn test_timeframe_column_names() {
    assert_eq!(Timeframe::FiveMinutes.field("close"), "close|5");
    assert_eq!(Timeframe::FourHours.field("BB.upper"), "BB.upper|240");
    assert_eq!(Timeframe::OneDay.field("RSI"), "RSI");
    assert_eq!(Timeframe::OneWeek.field("EMA50"), "EMA50|1W");
    assert_eq!(Timeframe::OneHour.field_at("open", 2), "open[2]|60");
    assert_eq!(Timeframe::OneDay.field_at("close", 0), "close");
}

#[test]
fn test_timeframe_parse_and_serde() {
    assert_eq!(Timeframe::from_str("1D"), Some(Timeframe::OneDay));
    assert_eq!(Timeframe::from_str("15m"), Some(Timeframe::FifteenMinutes));
    assert_eq!(Timeframe::from_str("2h"), None);

    let json = serde_json::to_value(Timeframe::OneMonth).unwrap();
    assert_eq!(json, json!("1M"));
    let back: Timeframe = serde_json::from_value(json!("4h")).unwrap();
    assert_eq!(back, Timeframe::FourHours);
}

// =============================================================================
// Rating Tests
// =============================================================================

#[test]
fn test_rating_serializes_as_score() {
    assert_eq!(serde_json::to_value(Rating::StrongSell).unwrap(), json!(-3));
    assert_eq!(serde_json::to_value(Rating::Indeterminate).unwrap(), json!(null));

    let parsed: Rating = serde_json::from_value(json!(1)).unwrap();
    assert_eq!(parsed, Rating::WeakBuy);
    let unknown: Rating = serde_json::from_value(json!(9)).unwrap();
    assert_eq!(unknown, Rating::Indeterminate);
}

#[test]
fn test_rating_target_clamps_and_orders() {
    assert_eq!(RatingTarget::clamped(5, -7), RatingTarget::Range { min: -3, max: 3 });
    assert_eq!(RatingTarget::clamped(2, 2), RatingTarget::Exact(2));

    let target = RatingTarget::Range { min: -1, max: 1 };
    assert!(target.matches(Rating::Neutral));
    assert!(!target.matches(Rating::Buy));
    assert!(!target.matches(Rating::Indeterminate));
}

// =============================================================================
// Snapshot Tests
// =============================================================================

#[test]
fn test_snapshot_reads_timeframe_columns() {
    let tf = Timeframe::OneHour;
    let row = RawRow::new("BINANCE:ETHUSDT")
        .with(tf.field("open"), 200.0)
        .with(tf.field("close"), 250.0)
        .with(tf.field("BB.upper"), 260.0)
        .with(tf.field("SMA20"), 205.0)
        .with(tf.field("BB.lower"), 190.0)
        .with("close", 999.0);

    let snapshot = SymbolSnapshot::from_row(&row, tf);
    assert_eq!(snapshot.symbol, "BINANCE:ETHUSDT");
    assert_eq!(snapshot.close, Some(250.0));
    assert_eq!(snapshot.change_percent, Some(25.0));
    assert_eq!(snapshot.rsi, None);
    assert!(snapshot.bands().is_some());
}

#[test]
fn test_misordered_bands_are_unusable() {
    let mut snapshot = SymbolSnapshot::empty("KUCOIN:X", Timeframe::OneDay);
    snapshot.bb_upper = Some(90.0);
    snapshot.bb_middle = Some(100.0);
    snapshot.bb_lower = Some(110.0);
    assert!(snapshot.bands().is_none());
}

// =============================================================================
// Exchange Tests
// =============================================================================

#[test]
fn test_exchange_qualifies_symbols() {
    let kucoin = ExchangeSpec {
        name: "kucoin".to_string(),
        market: MarketCategory::Crypto,
        symbols: Vec::new(),
    };
    assert_eq!(kucoin.qualify(" btcusdt "), "KUCOIN:BTCUSDT");
    assert_eq!(kucoin.qualify("binance:ethusdt"), "BINANCE:ETHUSDT");

    let all = ExchangeSpec {
        name: "all".to_string(),
        market: MarketCategory::Crypto,
        symbols: Vec::new(),
    };
    assert_eq!(all.qualify("btcusdt"), "BTCUSDT");
}
