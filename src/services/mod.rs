pub mod indicators;
pub mod market_data;
pub mod params;
pub mod patterns;
pub mod registry;
pub mod screener;

pub use market_data::{MarketDataAdapter, RecordingSleeper, Sleeper, TokioSleeper};
pub use patterns::PatternScanner;
pub use registry::Registry;
pub use screener::ScreenerService;
