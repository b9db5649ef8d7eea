//! Screener service: movers, Bollinger squeeze, rating filter and the
//! single-symbol / volume / multi-timeframe reports built on them.

use crate::config::ScanConfig;
use crate::error::{Result, ScreenerError};
use crate::services::indicators::{self, volume};
use crate::services::market_data::MarketDataAdapter;
use crate::services::params::{self, clamp_finite, clamp_limit, parse_timeframe, parse_timeframes};
use crate::types::{
    fields, snapshot_fields, CandleDirection, CoinAnalysis, ExchangeInfo, ExchangeSpec,
    FieldFilter, MultiChangeRow, RatingTarget, RawRow, RsiRange, ScanEntry, ScanResult,
    ScreenerQuery, SortOrder, SortSpec, SymbolSnapshot, Timeframe, TimeframeChange,
    VolumeBreakout, VolumeConfirmation,
};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Volume ratio at which breakout strength saturates.
const MAX_VOLUME_STRENGTH: f64 = 10.0;

/// Descending order with absent values last.
fn desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn entry(snapshot: SymbolSnapshot) -> ScanEntry {
    let signals = indicators::analyze(&snapshot);
    ScanEntry {
        snapshot,
        signals,
        pattern: None,
    }
}

fn skip(symbol: &str, field: &str) {
    let reason = ScreenerError::IndeterminateField {
        symbol: symbol.to_string(),
        field: field.to_string(),
    };
    debug!("Skipping row: {}", reason);
}

/// Ranked screening operations over one exchange at a time.
pub struct ScreenerService {
    adapter: Arc<MarketDataAdapter>,
    scan: ScanConfig,
}

impl ScreenerService {
    pub fn new(adapter: Arc<MarketDataAdapter>, scan: ScanConfig) -> Self {
        Self { adapter, scan }
    }

    fn resolve(&self, exchange: &str) -> Result<&ExchangeSpec> {
        self.adapter.registry().resolve(exchange)
    }

    /// Universe-wide snapshot query at `timeframe`.
    fn universe_query(&self, spec: &ExchangeSpec, timeframe: Timeframe) -> ScreenerQuery {
        MarketDataAdapter::scoped_query(spec)
            .select(snapshot_fields(timeframe))
            .limit(self.scan.universe_limit)
    }

    async fn snapshots(&self, query: &ScreenerQuery, timeframe: Timeframe) -> Result<Vec<SymbolSnapshot>> {
        let rows = self.adapter.fetch(query).await?;
        Ok(rows
            .iter()
            .map(|row| SymbolSnapshot::from_row(row, timeframe))
            .collect())
    }

    // =========================================================================
    // Movers
    // =========================================================================

    /// Largest percent gains, ties broken by higher volume.
    pub async fn top_gainers(&self, exchange: &str, timeframe: &str, limit: i64) -> Result<ScanResult> {
        self.movers(exchange, timeframe, limit, SortOrder::Desc).await
    }

    /// Largest percent losses, ties broken by higher volume.
    pub async fn top_losers(&self, exchange: &str, timeframe: &str, limit: i64) -> Result<ScanResult> {
        self.movers(exchange, timeframe, limit, SortOrder::Asc).await
    }

    async fn movers(
        &self,
        exchange: &str,
        timeframe: &str,
        limit: i64,
        order: SortOrder,
    ) -> Result<ScanResult> {
        let spec = self.resolve(exchange)?;
        let timeframe = parse_timeframe(timeframe)?;
        let limit = clamp_limit(limit, params::MOVERS_LIMIT_CAP);
        if limit == 0 {
            return Ok(ScanResult::empty(&spec.name, timeframe));
        }

        let change = timeframe.field(fields::CHANGE);
        let query = self
            .universe_query(spec, timeframe)
            .filter(FieldFilter::not_empty(&change))
            .sort(SortSpec {
                field: change,
                order,
            });

        let snapshots = self.snapshots(&query, timeframe).await?;
        let fetched = snapshots.len();

        let mut entries: Vec<ScanEntry> = snapshots
            .into_iter()
            .filter(|s| {
                let present = s.change_percent.is_some();
                if !present {
                    skip(&s.symbol, fields::CHANGE);
                }
                present
            })
            .map(entry)
            .collect();

        entries.sort_by(|a, b| {
            let by_change = match order {
                SortOrder::Desc => desc(a.snapshot.change_percent, b.snapshot.change_percent),
                SortOrder::Asc => desc(b.snapshot.change_percent, a.snapshot.change_percent),
            };
            by_change.then_with(|| desc(a.snapshot.volume, b.snapshot.volume))
        });
        entries.truncate(limit);

        info!(
            exchange = %spec.name,
            timeframe = %timeframe,
            fetched,
            kept = entries.len(),
            "Movers scan complete"
        );

        Ok(ScanResult {
            exchange: spec.name.clone(),
            timeframe,
            entries,
        })
    }

    // =========================================================================
    // Bollinger squeeze
    // =========================================================================

    /// Symbols with `0 < BBW < bbw_threshold`, tightest squeeze first.
    pub async fn bollinger_scan(
        &self,
        exchange: &str,
        timeframe: &str,
        bbw_threshold: f64,
        limit: i64,
    ) -> Result<ScanResult> {
        let spec = self.resolve(exchange)?;
        let timeframe = parse_timeframe(timeframe)?;
        if !bbw_threshold.is_finite() || bbw_threshold <= 0.0 {
            return Err(ScreenerError::InvalidArgument(format!(
                "bbw_threshold must be a positive number, got {}",
                bbw_threshold
            )));
        }
        let limit = clamp_limit(limit, params::BOLLINGER_LIMIT_CAP);
        if limit == 0 {
            return Ok(ScanResult::empty(&spec.name, timeframe));
        }

        let query = self
            .universe_query(spec, timeframe)
            .filter(FieldFilter::not_empty(timeframe.field(fields::BB_UPPER)))
            .filter(FieldFilter::not_empty(timeframe.field(fields::BB_MIDDLE)))
            .filter(FieldFilter::not_empty(timeframe.field(fields::BB_LOWER)));

        let snapshots = self.snapshots(&query, timeframe).await?;
        let fetched = snapshots.len();

        let mut entries: Vec<ScanEntry> = snapshots
            .into_iter()
            .map(entry)
            .filter(|e| match e.signals.bbw {
                Some(bbw) => bbw > 0.0 && bbw < bbw_threshold,
                None => {
                    skip(e.symbol(), "bbw");
                    false
                }
            })
            .collect();

        entries.sort_by(|a, b| desc(b.signals.bbw, a.signals.bbw));
        entries.truncate(limit);

        info!(
            exchange = %spec.name,
            timeframe = %timeframe,
            threshold = bbw_threshold,
            fetched,
            kept = entries.len(),
            "Bollinger scan complete"
        );

        Ok(ScanResult {
            exchange: spec.name.clone(),
            timeframe,
            entries,
        })
    }

    // =========================================================================
    // Rating filter
    // =========================================================================

    /// Symbols whose rating matches `target`, in the provider's order.
    pub async fn rating_filter(
        &self,
        exchange: &str,
        timeframe: &str,
        target: RatingTarget,
        limit: i64,
    ) -> Result<ScanResult> {
        let spec = self.resolve(exchange)?;
        let timeframe = parse_timeframe(timeframe)?;
        let limit = clamp_limit(limit, params::RATING_LIMIT_CAP);
        if limit == 0 {
            return Ok(ScanResult::empty(&spec.name, timeframe));
        }

        let query = self
            .universe_query(spec, timeframe)
            .sort(SortSpec::desc(timeframe.field(fields::CHANGE)));

        let snapshots = self.snapshots(&query, timeframe).await?;
        let fetched = snapshots.len();

        let entries: Vec<ScanEntry> = snapshots
            .into_iter()
            .map(entry)
            .filter(|e| target.matches(e.signals.rating))
            .take(limit)
            .collect();

        info!(
            exchange = %spec.name,
            timeframe = %timeframe,
            target = ?target,
            fetched,
            kept = entries.len(),
            "Rating filter complete"
        );

        Ok(ScanResult {
            exchange: spec.name.clone(),
            timeframe,
            entries,
        })
    }

    // =========================================================================
    // Single symbol
    // =========================================================================

    /// Snapshot of exactly `symbol`. Rows for any other ticker are ignored.
    async fn symbol_snapshot(
        &self,
        spec: &ExchangeSpec,
        symbol: &str,
        timeframe: Timeframe,
    ) -> Result<SymbolSnapshot> {
        if symbol.trim().is_empty() {
            return Err(ScreenerError::InvalidArgument("symbol is required".to_string()));
        }
        let ticker = spec.qualify(symbol);

        let query = ScreenerQuery::new(spec.name.clone(), spec.market)
            .select(snapshot_fields(timeframe))
            .tickers(vec![ticker.clone()])
            .limit(1);

        let rows = self.adapter.fetch(&query).await?;
        let row = rows
            .iter()
            .find(|row| row.ticker.eq_ignore_ascii_case(&ticker))
            .ok_or_else(|| ScreenerError::DataUnavailable {
                attempts: 1,
                reason: format!("no data returned for {}", ticker),
            })?;

        Ok(SymbolSnapshot::from_row(row, timeframe))
    }

    /// Detailed report for one symbol.
    pub async fn coin_analysis(&self, symbol: &str, exchange: &str, timeframe: &str) -> Result<CoinAnalysis> {
        let spec = self.resolve(exchange)?;
        let timeframe = parse_timeframe(timeframe)?;
        let snapshot = self.symbol_snapshot(spec, symbol, timeframe).await?;
        let signals = indicators::analyze(&snapshot);

        Ok(CoinAnalysis {
            symbol: snapshot.symbol.clone(),
            exchange: spec.name.clone(),
            timeframe,
            price_data: indicators::price_data(&snapshot),
            bollinger_analysis: indicators::bollinger_analysis(&snapshot, &signals),
            technical_indicators: indicators::technical_indicators(&snapshot, &signals),
            market_sentiment: indicators::market_sentiment(&snapshot, &signals),
        })
    }

    /// Whether volume backs the latest candle of one symbol.
    pub async fn volume_confirmation_analysis(
        &self,
        symbol: &str,
        exchange: &str,
        timeframe: &str,
    ) -> Result<VolumeConfirmation> {
        let spec = self.resolve(exchange)?;
        let timeframe = parse_timeframe(timeframe)?;
        let snapshot = self.symbol_snapshot(spec, symbol, timeframe).await?;
        let report = volume::confirmation(&snapshot, &spec.name);

        debug!(
            symbol = %report.symbol,
            signals = report.signals.len(),
            "Volume confirmation complete"
        );
        Ok(report)
    }

    // =========================================================================
    // Volume breakouts
    // =========================================================================

    /// Symbols trading at `volume_multiplier`x their average volume with an
    /// absolute move of at least `price_change_min` percent.
    pub async fn volume_breakout_scanner(
        &self,
        exchange: &str,
        timeframe: &str,
        volume_multiplier: f64,
        price_change_min: f64,
        rsi_range: RsiRange,
        limit: i64,
    ) -> Result<Vec<VolumeBreakout>> {
        let spec = self.resolve(exchange)?;
        let timeframe = parse_timeframe(timeframe)?;
        let multiplier = clamp_finite("volume_multiplier", volume_multiplier, 1.5, MAX_VOLUME_STRENGTH)?;
        let change_min = clamp_finite("price_change_min", price_change_min, 1.0, 20.0)?;
        let limit = clamp_limit(limit, params::VOLUME_LIMIT_CAP);
        if limit == 0 {
            return Ok(Vec::new());
        }

        let query = self
            .universe_query(spec, timeframe)
            .filter(FieldFilter::greater(timeframe.field(fields::VOLUME), 0.0))
            .sort(SortSpec::desc(timeframe.field(fields::VOLUME)));

        let snapshots = self.snapshots(&query, timeframe).await?;
        let fetched = snapshots.len();

        let mut breakouts: Vec<VolumeBreakout> = snapshots
            .iter()
            .filter_map(|snapshot| {
                let (Some(change), Some(volume)) = (snapshot.change_percent, snapshot.volume) else {
                    skip(&snapshot.symbol, fields::CHANGE);
                    return None;
                };
                let Some(ratio) = volume::volume_ratio(snapshot) else {
                    skip(&snapshot.symbol, fields::VOLUME_SMA20);
                    return None;
                };
                if change.abs() < change_min || ratio < multiplier || !rsi_range.matches(snapshot.rsi) {
                    return None;
                }
                Some(VolumeBreakout {
                    symbol: snapshot.symbol.clone(),
                    change_percent: change,
                    volume_ratio: ratio,
                    volume_strength: ratio.min(MAX_VOLUME_STRENGTH),
                    current_volume: volume,
                    breakout_type: if change > 0.0 {
                        CandleDirection::Bullish
                    } else {
                        CandleDirection::Bearish
                    },
                    rsi: snapshot.rsi,
                    rating: indicators::rate_snapshot(snapshot),
                    recommendation: volume::recommendation(change, ratio, snapshot.rsi),
                })
            })
            .collect();

        breakouts.sort_by(|a, b| {
            b.volume_strength
                .total_cmp(&a.volume_strength)
                .then_with(|| b.change_percent.abs().total_cmp(&a.change_percent.abs()))
        });
        breakouts.truncate(limit);

        info!(
            exchange = %spec.name,
            timeframe = %timeframe,
            fetched,
            kept = breakouts.len(),
            "Volume breakout scan complete"
        );

        Ok(breakouts)
    }

    // =========================================================================
    // Multi-timeframe changes
    // =========================================================================

    /// Percent change per timeframe for the base timeframe's top movers.
    ///
    /// Issues one fetch per timeframe, sequentially. The base fetch fixes the
    /// symbol set and order.
    pub async fn multi_timeframe_changes<S: AsRef<str>>(
        &self,
        exchange: &str,
        timeframes: &[S],
        base_timeframe: &str,
        limit: i64,
    ) -> Result<Vec<MultiChangeRow>> {
        let spec = self.resolve(exchange)?;
        let timeframes = parse_timeframes(timeframes)?;
        let base = parse_timeframe(base_timeframe)?;
        let limit = clamp_limit(limit, params::MULTI_CHANGE_LIMIT_CAP);
        if limit == 0 {
            return Ok(Vec::new());
        }

        let base_query = MarketDataAdapter::scoped_query(spec)
            .select(snapshot_fields(base))
            .sort(SortSpec::desc(base.field(fields::CHANGE)))
            .limit(limit);
        let base_rows = self.adapter.fetch(&base_query).await?;
        let tickers: Vec<String> = base_rows.iter().map(|row| row.ticker.clone()).collect();

        let mut changes_by_tf: HashMap<Timeframe, HashMap<String, Option<f64>>> = HashMap::new();
        for tf in timeframes.iter().copied().filter(|tf| *tf != base) {
            let query = ScreenerQuery::new(spec.name.clone(), spec.market)
                .select([tf.field(fields::OPEN), tf.field(fields::CLOSE)])
                .tickers(tickers.clone())
                .limit(tickers.len());
            let rows = self.adapter.fetch(&query).await?;
            changes_by_tf.insert(
                tf,
                rows.iter().map(|row| (row.ticker.clone(), row_change(row, tf))).collect(),
            );
        }

        let result: Vec<MultiChangeRow> = base_rows
            .iter()
            .map(|row| {
                let snapshot = SymbolSnapshot::from_row(row, base);
                let changes = timeframes
                    .iter()
                    .map(|tf| TimeframeChange {
                        timeframe: *tf,
                        change_percent: if *tf == base {
                            row_change(row, base)
                        } else {
                            changes_by_tf
                                .get(tf)
                                .and_then(|by_ticker| by_ticker.get(&row.ticker).copied().flatten())
                        },
                    })
                    .collect();
                let signals = indicators::analyze(&snapshot);
                MultiChangeRow {
                    symbol: row.ticker.clone(),
                    changes,
                    base: snapshot,
                    signals,
                }
            })
            .collect();

        info!(
            exchange = %spec.name,
            timeframes = timeframes.len(),
            rows = result.len(),
            "Multi-timeframe changes complete"
        );

        Ok(result)
    }

    // =========================================================================
    // Registry
    // =========================================================================

    pub fn list_exchanges(&self) -> Vec<ExchangeInfo> {
        self.adapter.registry().list()
    }
}

/// `(close - open) / open * 100` at `timeframe`.
fn row_change(row: &RawRow, timeframe: Timeframe) -> Option<f64> {
    crate::types::percent_change(
        row.number(&timeframe.field(fields::OPEN)),
        row.number(&timeframe.field(fields::CLOSE)),
    )
}
