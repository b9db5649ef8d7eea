//! Exchange registry: the static exchange → market mapping plus optional
//! per-exchange symbol universes.

use crate::error::{Result, ScreenerError};
use crate::types::{ExchangeInfo, ExchangeSpec, MarketCategory};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Built-in exchange → market mapping.
pub const EXCHANGE_MARKETS: &[(&str, MarketCategory)] = &[
    ("all", MarketCategory::Crypto),
    ("huobi", MarketCategory::Crypto),
    ("kucoin", MarketCategory::Crypto),
    ("coinbase", MarketCategory::Crypto),
    ("gateio", MarketCategory::Crypto),
    ("binance", MarketCategory::Crypto),
    ("bitfinex", MarketCategory::Crypto),
    ("bybit", MarketCategory::Crypto),
    ("okx", MarketCategory::Crypto),
    ("bist", MarketCategory::Turkey),
    ("nasdaq", MarketCategory::America),
];

/// Immutable exchange registry, built once at startup and shared by reference.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    exchanges: BTreeMap<String, ExchangeSpec>,
}

impl Registry {
    /// Registry over the built-in exchanges with empty universes.
    pub fn builtin() -> Self {
        Self::from_specs(EXCHANGE_MARKETS.iter().map(|(name, market)| ExchangeSpec {
            name: name.to_string(),
            market: *market,
            symbols: Vec::new(),
        }))
    }

    /// Registry over explicit exchange specs.
    pub fn from_specs(specs: impl IntoIterator<Item = ExchangeSpec>) -> Self {
        let exchanges = specs
            .into_iter()
            .map(|mut spec| {
                spec.name = spec.name.trim().to_lowercase();
                (spec.name.clone(), spec)
            })
            .collect();
        Self { exchanges }
    }

    /// Built-in exchanges with universes read from `<dir>/<exchange>.txt`.
    pub fn load(dir: &Path) -> Self {
        let registry = Self::from_specs(EXCHANGE_MARKETS.iter().map(|(name, market)| {
            ExchangeSpec {
                name: name.to_string(),
                market: *market,
                symbols: load_symbols(dir, name),
            }
        }));

        let loaded = registry
            .exchanges
            .values()
            .filter(|spec| !spec.symbols.is_empty())
            .count();
        info!(
            "Exchange registry ready: {} exchanges, {} with symbol lists from {}",
            registry.exchanges.len(),
            loaded,
            dir.display()
        );

        registry
    }

    /// Look up an exchange by name (case-insensitive, trimmed).
    pub fn resolve(&self, name: &str) -> Result<&ExchangeSpec> {
        let key = name.trim().to_lowercase();
        self.exchanges
            .get(&key)
            .ok_or_else(|| ScreenerError::InvalidExchange(name.trim().to_string()))
    }

    /// Registered exchanges sorted by name.
    pub fn list(&self) -> Vec<ExchangeInfo> {
        self.exchanges
            .values()
            .map(|spec| ExchangeInfo {
                name: spec.name.clone(),
                market: spec.market,
                symbol_count: spec.symbols.len(),
            })
            .collect()
    }
}

/// Read one ticker per line, trying the exact and lower-cased file names.
/// Unreadable or missing files yield an empty list.
pub fn load_symbols(dir: &Path, exchange: &str) -> Vec<String> {
    let candidates = [
        dir.join(format!("{}.txt", exchange)),
        dir.join(format!("{}.txt", exchange.to_lowercase())),
    ];

    for path in &candidates {
        let Ok(content) = std::fs::read_to_string(path) else {
            continue;
        };
        let symbols: Vec<String> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        if !symbols.is_empty() {
            debug!("Loaded {} symbols from {}", symbols.len(), path.display());
            return symbols;
        }
    }

    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_resolve_case_insensitive() {
        let registry = Registry::builtin();
        let spec = registry.resolve("  KuCoin ").unwrap();
        assert_eq!(spec.name, "kucoin");
        assert_eq!(spec.market, MarketCategory::Crypto);
        assert_eq!(registry.resolve("NASDAQ").unwrap().market, MarketCategory::America);
        assert_eq!(registry.resolve("bist").unwrap().market, MarketCategory::Turkey);
    }

    #[test]
    fn test_resolve_unknown() {
        let registry = Registry::builtin();
        let err = registry.resolve("mtgox").unwrap_err();
        assert_eq!(err, ScreenerError::InvalidExchange("mtgox".to_string()));
        assert!(registry.resolve("").is_err());
    }

    #[test]
    fn test_list_sorted() {
        let registry = Registry::builtin();
        let names: Vec<String> = registry.list().into_iter().map(|e| e.name).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert_eq!(names.len(), EXCHANGE_MARKETS.len());
    }

    #[test]
    fn test_load_reads_symbol_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("kucoin.txt")).unwrap();
        writeln!(file, "KUCOIN:BTCUSDT\n\n  KUCOIN:ETHUSDT  \n").unwrap();

        let registry = Registry::load(dir.path());
        let spec = registry.resolve("kucoin").unwrap();
        assert_eq!(spec.symbols, vec!["KUCOIN:BTCUSDT", "KUCOIN:ETHUSDT"]);
        assert!(registry.resolve("binance").unwrap().symbols.is_empty());
    }

    #[test]
    fn test_load_missing_dir_is_empty() {
        let registry = Registry::load(Path::new("/nonexistent/coinlist"));
        assert_eq!(registry.list().len(), EXCHANGE_MARKETS.len());
        assert!(registry.list().iter().all(|e| e.symbol_count == 0));
    }
}
