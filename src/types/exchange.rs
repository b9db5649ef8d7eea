use serde::{Deserialize, Serialize};
use std::fmt;

/// Upstream screener market an exchange belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketCategory {
    Crypto,
    America,
    Turkey,
}

impl MarketCategory {
    /// Market path segment used by the upstream screener.
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketCategory::Crypto => "crypto",
            MarketCategory::America => "america",
            MarketCategory::Turkey => "turkey",
        }
    }
}

impl fmt::Display for MarketCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered exchange and its symbol universe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeSpec {
    /// Lower-case exchange name (e.g. "kucoin").
    pub name: String,
    pub market: MarketCategory,
    /// Fully qualified tickers (`EXCHANGE:SYMBOL`). Empty means "whatever the
    /// upstream lists for this exchange".
    pub symbols: Vec<String>,
}

impl ExchangeSpec {
    /// The aggregate pseudo-exchange that spans a whole market.
    pub fn is_aggregate(&self) -> bool {
        self.name == "all"
    }

    /// Upper-case form used in upstream filters and ticker prefixes.
    pub fn upstream_name(&self) -> String {
        self.name.to_uppercase()
    }

    /// Qualify a bare symbol with this exchange's prefix.
    pub fn qualify(&self, symbol: &str) -> String {
        let symbol = symbol.trim().to_uppercase();
        if symbol.contains(':') || self.is_aggregate() {
            symbol
        } else {
            format!("{}:{}", self.upstream_name(), symbol)
        }
    }
}

/// Summary row for exchange listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeInfo {
    pub name: String,
    pub market: MarketCategory,
    pub symbol_count: usize,
}
