use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Position of price relative to its Bollinger bands, from -3 to +3.
///
/// Serialized as the bare integer, or `null` when indeterminate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rating {
    StrongBuy,
    Buy,
    WeakBuy,
    Neutral,
    WeakSell,
    Sell,
    StrongSell,
    /// Bands or price missing for this symbol.
    Indeterminate,
}

impl Rating {
    /// Create a rating from its integer score. Out-of-range scores are
    /// rejected.
    pub fn from_score(score: i8) -> Option<Self> {
        match score {
            3 => Some(Rating::StrongBuy),
            2 => Some(Rating::Buy),
            1 => Some(Rating::WeakBuy),
            0 => Some(Rating::Neutral),
            -1 => Some(Rating::WeakSell),
            -2 => Some(Rating::Sell),
            -3 => Some(Rating::StrongSell),
            _ => None,
        }
    }

    /// Integer score, `None` when indeterminate.
    pub fn score(&self) -> Option<i8> {
        match self {
            Rating::StrongBuy => Some(3),
            Rating::Buy => Some(2),
            Rating::WeakBuy => Some(1),
            Rating::Neutral => Some(0),
            Rating::WeakSell => Some(-1),
            Rating::Sell => Some(-2),
            Rating::StrongSell => Some(-3),
            Rating::Indeterminate => None,
        }
    }

    pub fn is_determinate(&self) -> bool {
        !matches!(self, Rating::Indeterminate)
    }

    /// Display label, `None` when indeterminate.
    pub fn label(&self) -> Option<&'static str> {
        match self {
            Rating::StrongBuy => Some("Strong Buy"),
            Rating::Buy => Some("Buy"),
            Rating::WeakBuy => Some("Weak Buy"),
            Rating::Neutral => Some("Neutral"),
            Rating::WeakSell => Some("Weak Sell"),
            Rating::Sell => Some("Sell"),
            Rating::StrongSell => Some("Strong Sell"),
            Rating::Indeterminate => None,
        }
    }
}

impl Serialize for Rating {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.score().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Rating {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let score = Option::<i8>::deserialize(deserializer)?;
        Ok(score
            .and_then(Rating::from_score)
            .unwrap_or(Rating::Indeterminate))
    }
}

/// Target for rating filters: a single rating or an inclusive range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingTarget {
    Exact(i8),
    Range { min: i8, max: i8 },
}

impl RatingTarget {
    /// Build a target with both ends clamped into -3..=3 and ordered.
    pub fn clamped(min: i8, max: i8) -> Self {
        let a = min.clamp(-3, 3);
        let b = max.clamp(-3, 3);
        let (min, max) = if a <= b { (a, b) } else { (b, a) };
        if min == max {
            RatingTarget::Exact(min)
        } else {
            RatingTarget::Range { min, max }
        }
    }

    /// Indeterminate ratings never match.
    pub fn matches(&self, rating: Rating) -> bool {
        match (self, rating.score()) {
            (_, None) => false,
            (RatingTarget::Exact(target), Some(score)) => score == *target,
            (RatingTarget::Range { min, max }, Some(score)) => (*min..=*max).contains(&score),
        }
    }
}

/// RSI momentum class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Momentum {
    Overbought,
    Oversold,
    Neutral,
    Indeterminate,
}

impl Momentum {
    pub fn label(&self) -> &'static str {
        match self {
            Momentum::Overbought => "Overbought",
            Momentum::Oversold => "Oversold",
            Momentum::Neutral => "Neutral",
            Momentum::Indeterminate => "Indeterminate",
        }
    }
}

/// Display-only trend label from moving-average and MACD alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Bullish,
    Bearish,
    Neutral,
    Indeterminate,
}

/// Coarse volatility bucket from band width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Volatility {
    High,
    Medium,
    Low,
    Indeterminate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_round_trip() {
        for score in -3..=3 {
            let rating = Rating::from_score(score).unwrap();
            assert_eq!(rating.score(), Some(score));
        }
        assert_eq!(Rating::from_score(4), None);
        assert_eq!(Rating::Indeterminate.score(), None);
    }

    #[test]
    fn test_rating_serialization() {
        assert_eq!(serde_json::to_string(&Rating::Buy).unwrap(), "2");
        assert_eq!(serde_json::to_string(&Rating::StrongSell).unwrap(), "-3");
        assert_eq!(serde_json::to_string(&Rating::Indeterminate).unwrap(), "null");
        let parsed: Rating = serde_json::from_str("-1").unwrap();
        assert_eq!(parsed, Rating::WeakSell);
        let parsed: Rating = serde_json::from_str("null").unwrap();
        assert_eq!(parsed, Rating::Indeterminate);
    }

    #[test]
    fn test_labels() {
        assert_eq!(Rating::StrongBuy.label(), Some("Strong Buy"));
        assert_eq!(Rating::WeakSell.label(), Some("Weak Sell"));
        assert_eq!(Rating::Indeterminate.label(), None);
    }

    #[test]
    fn test_target_clamped_and_ordered() {
        assert_eq!(RatingTarget::clamped(5, 5), RatingTarget::Exact(3));
        assert_eq!(
            RatingTarget::clamped(2, -9),
            RatingTarget::Range { min: -3, max: 2 }
        );
    }

    #[test]
    fn test_target_matches() {
        let exact = RatingTarget::Exact(2);
        assert!(exact.matches(Rating::Buy));
        assert!(!exact.matches(Rating::StrongBuy));
        assert!(!exact.matches(Rating::Indeterminate));

        let range = RatingTarget::Range { min: -1, max: 1 };
        assert!(range.matches(Rating::Neutral));
        assert!(range.matches(Rating::WeakSell));
        assert!(!range.matches(Rating::Sell));
    }
}
