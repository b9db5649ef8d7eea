//! Caller input normalisation shared by the screener and pattern scanner.

use crate::error::{Result, ScreenerError};
use crate::types::{RatingTarget, Timeframe};

pub const MOVERS_LIMIT_CAP: usize = 50;
pub const RATING_LIMIT_CAP: usize = 50;
pub const BOLLINGER_LIMIT_CAP: usize = 100;
pub const VOLUME_LIMIT_CAP: usize = 50;
pub const MULTI_CHANGE_LIMIT_CAP: usize = 50;
pub const CANDLE_SCAN_LIMIT_CAP: usize = 50;
pub const ADVANCED_PATTERN_LIMIT_CAP: usize = 30;

pub fn parse_timeframe(raw: &str) -> Result<Timeframe> {
    Timeframe::from_str(raw).ok_or_else(|| ScreenerError::InvalidTimeframe(raw.trim().to_string()))
}

/// Parse a list of timeframes, dropping duplicates but keeping order.
pub fn parse_timeframes<S: AsRef<str>>(raw: &[S]) -> Result<Vec<Timeframe>> {
    let mut parsed = Vec::with_capacity(raw.len());
    for tf in raw {
        let tf = parse_timeframe(tf.as_ref())?;
        if !parsed.contains(&tf) {
            parsed.push(tf);
        }
    }
    if parsed.is_empty() {
        return Err(ScreenerError::InvalidArgument(
            "at least one timeframe is required".to_string(),
        ));
    }
    Ok(parsed)
}

/// Non-positive limits mean "nothing"; large ones are capped.
pub fn clamp_limit(limit: i64, cap: usize) -> usize {
    if limit <= 0 {
        0
    } else {
        (limit as u64).min(cap as u64) as usize
    }
}

/// Rating target from caller bounds, clamped into -3..=3.
pub fn rating_target(min: i64, max: i64) -> RatingTarget {
    let clamp = |v: i64| v.clamp(-3, 3) as i8;
    RatingTarget::clamped(clamp(min), clamp(max))
}

/// A finite number clamped into `[lo, hi]`.
pub fn clamp_finite(name: &str, value: f64, lo: f64, hi: f64) -> Result<f64> {
    if !value.is_finite() {
        return Err(ScreenerError::InvalidArgument(format!(
            "{} must be a finite number",
            name
        )));
    }
    Ok(value.clamp(lo, hi))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(-5, 50), 0);
        assert_eq!(clamp_limit(0, 50), 0);
        assert_eq!(clamp_limit(25, 50), 25);
        assert_eq!(clamp_limit(500, 50), 50);
        assert_eq!(clamp_limit(i64::MAX, 100), 100);
    }

    #[test]
    fn test_parse_timeframe_errors() {
        assert_eq!(parse_timeframe("4h").unwrap(), Timeframe::FourHours);
        assert_eq!(
            parse_timeframe(" 3h ").unwrap_err(),
            ScreenerError::InvalidTimeframe("3h".to_string())
        );
    }

    #[test]
    fn test_parse_timeframes_dedupes() {
        let parsed = parse_timeframes(&["15m", "1h", "15m"]).unwrap();
        assert_eq!(parsed, vec![Timeframe::FifteenMinutes, Timeframe::OneHour]);
        let empty: [&str; 0] = [];
        assert!(matches!(
            parse_timeframes(&empty),
            Err(ScreenerError::InvalidArgument(_))
        ));
        assert!(parse_timeframes(&["15m", "bogus"]).is_err());
    }

    #[test]
    fn test_rating_target_clamps() {
        assert_eq!(rating_target(9, 9), RatingTarget::Exact(3));
        assert_eq!(rating_target(-100, 1), RatingTarget::Range { min: -3, max: 1 });
    }

    #[test]
    fn test_clamp_finite() {
        assert_eq!(clamp_finite("x", 0.5, 1.5, 10.0).unwrap(), 1.5);
        assert!(clamp_finite("x", f64::NAN, 1.5, 10.0).is_err());
    }
}
