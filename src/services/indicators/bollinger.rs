//! Bollinger Band width and the -3..+3 band-position rating.
//!
//! The rating is a fixed ladder of `(predicate, rating)` rungs evaluated from
//! the top; the first rung whose predicate holds wins. Buy-side rungs split at
//! the midpoint between middle and upper, sell-side rungs at the midpoint
//! between middle and lower.
//!
//! When an outer band lies within the middle-line tolerance, a price on that
//! band rates 0: the middle rung is checked before the +2/-2 rungs.

use crate::types::{BandPosition, Bands, Rating, SymbolSnapshot, Volatility};

/// Relative tolerance for "price sits on the middle band".
pub const MIDDLE_EPSILON: f64 = 1e-9;

/// BBW above this is high volatility.
pub const HIGH_VOLATILITY_BBW: f64 = 0.05;
/// BBW above this (and not high) is medium volatility.
pub const MEDIUM_VOLATILITY_BBW: f64 = 0.02;

/// Price and bands as seen by one ladder rung.
#[derive(Debug, Clone, Copy)]
struct Position {
    price: f64,
    bands: Bands,
    tolerance: f64,
}

impl Position {
    fn new(price: f64, bands: Bands) -> Self {
        Self {
            price,
            bands,
            tolerance: MIDDLE_EPSILON * bands.middle.abs().max(1.0),
        }
    }

    fn upper_mid(&self) -> f64 {
        self.bands.middle + (self.bands.upper - self.bands.middle) / 2.0
    }

    fn lower_mid(&self) -> f64 {
        self.bands.middle - (self.bands.middle - self.bands.lower) / 2.0
    }

    fn on_middle(&self) -> bool {
        (self.price - self.bands.middle).abs() <= self.tolerance
    }

    fn above_middle(&self) -> bool {
        self.price > self.bands.middle + self.tolerance
    }

    fn below_middle(&self) -> bool {
        self.price < self.bands.middle - self.tolerance
    }
}

type Rung = (fn(&Position) -> bool, Rating);

/// The rating ladder, highest first.
const LADDER: [Rung; 7] = [
    (|p| p.price > p.bands.upper, Rating::StrongBuy),
    (|p| p.above_middle() && p.price >= p.upper_mid(), Rating::Buy),
    (|p| p.above_middle(), Rating::WeakBuy),
    (|p| p.on_middle(), Rating::Neutral),
    (|p| p.price < p.bands.lower, Rating::StrongSell),
    (|p| p.below_middle() && p.price <= p.lower_mid(), Rating::Sell),
    (|p| p.below_middle(), Rating::WeakSell),
];

/// Band width `(upper - lower) / middle`. Absent when middle is zero or
/// any band is missing.
pub fn band_width(upper: Option<f64>, middle: Option<f64>, lower: Option<f64>) -> Option<f64> {
    let (upper, middle, lower) = (upper?, middle?, lower?);
    if middle == 0.0 {
        return None;
    }
    let bbw = (upper - lower) / middle;
    bbw.is_finite().then_some(bbw)
}

/// BBW of a snapshot's bands.
pub fn snapshot_bbw(snapshot: &SymbolSnapshot) -> Option<f64> {
    band_width(snapshot.bb_upper, snapshot.bb_middle, snapshot.bb_lower)
}

/// Rate `price` against the bands. Misordered bands are indeterminate.
pub fn rate(price: f64, bands: Bands) -> Rating {
    if !price.is_finite() || !bands.is_ordered() {
        return Rating::Indeterminate;
    }
    let position = Position::new(price, bands);
    LADDER
        .iter()
        .find(|(predicate, _)| predicate(&position))
        .map(|(_, rating)| *rating)
        .unwrap_or(Rating::Indeterminate)
}

/// Rating of a snapshot's close against its bands.
pub fn rate_snapshot(snapshot: &SymbolSnapshot) -> Rating {
    match (snapshot.close, snapshot.bands()) {
        (Some(price), Some(bands)) => rate(price, bands),
        _ => Rating::Indeterminate,
    }
}

/// Coarse band position of the close.
pub fn band_position(snapshot: &SymbolSnapshot) -> BandPosition {
    match (snapshot.close, snapshot.bands()) {
        (Some(price), Some(bands)) if price > bands.upper => BandPosition::AboveUpper,
        (Some(price), Some(bands)) if price < bands.lower => BandPosition::BelowLower,
        (Some(_), Some(_)) => BandPosition::WithinBands,
        _ => BandPosition::Indeterminate,
    }
}

pub fn volatility(bbw: Option<f64>) -> Volatility {
    match bbw {
        Some(w) if w > HIGH_VOLATILITY_BBW => Volatility::High,
        Some(w) if w > MEDIUM_VOLATILITY_BBW => Volatility::Medium,
        Some(_) => Volatility::Low,
        None => Volatility::Indeterminate,
    }
}
