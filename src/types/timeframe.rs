use serde::{Deserialize, Serialize};
use std::fmt;

/// Candle timeframe accepted by every screener operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "4h")]
    FourHours,
    #[serde(rename = "1D")]
    OneDay,
    #[serde(rename = "1W")]
    OneWeek,
    #[serde(rename = "1M")]
    OneMonth,
}

impl Timeframe {
    /// All timeframes in ascending duration.
    pub const ALL: [Timeframe; 7] = [
        Timeframe::FiveMinutes,
        Timeframe::FifteenMinutes,
        Timeframe::OneHour,
        Timeframe::FourHours,
        Timeframe::OneDay,
        Timeframe::OneWeek,
        Timeframe::OneMonth,
    ];

    /// Parse a timeframe string. Matching is exact: `1m` is not `1M`.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim() {
            "5m" => Some(Timeframe::FiveMinutes),
            "15m" => Some(Timeframe::FifteenMinutes),
            "1h" => Some(Timeframe::OneHour),
            "4h" => Some(Timeframe::FourHours),
            "1D" => Some(Timeframe::OneDay),
            "1W" => Some(Timeframe::OneWeek),
            "1M" => Some(Timeframe::OneMonth),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::FiveMinutes => "5m",
            Timeframe::FifteenMinutes => "15m",
            Timeframe::OneHour => "1h",
            Timeframe::FourHours => "4h",
            Timeframe::OneDay => "1D",
            Timeframe::OneWeek => "1W",
            Timeframe::OneMonth => "1M",
        }
    }

    /// Upstream resolution suffix. The daily resolution is the upstream
    /// default and carries no suffix.
    pub fn resolution(&self) -> Option<&'static str> {
        match self {
            Timeframe::FiveMinutes => Some("5"),
            Timeframe::FifteenMinutes => Some("15"),
            Timeframe::OneHour => Some("60"),
            Timeframe::FourHours => Some("240"),
            Timeframe::OneDay => None,
            Timeframe::OneWeek => Some("1W"),
            Timeframe::OneMonth => Some("1M"),
        }
    }

    /// Upstream column name for `field` at this timeframe.
    pub fn field(&self, field: &str) -> String {
        match self.resolution() {
            Some(suffix) => format!("{}|{}", field, suffix),
            None => field.to_string(),
        }
    }

    /// Upstream column name for `field` taken `offset` bars back.
    pub fn field_at(&self, field: &str, offset: usize) -> String {
        if offset == 0 {
            self.field(field)
        } else {
            self.field(&format!("{}[{}]", field, offset))
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
