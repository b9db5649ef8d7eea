//! Consecutive-candle pattern scanner.
//!
//! Each symbol's candles (oldest to newest) are folded through a small run
//! state machine. A bullish candle closes above its open, a bearish one below;
//! a neutral candle ends any run.

use crate::config::ScanConfig;
use crate::error::Result;
use crate::services::indicators;
use crate::services::market_data::MarketDataAdapter;
use crate::services::params::{self, clamp_limit, parse_timeframe, parse_timeframes};
use crate::types::{
    candle_fields, candles_from_row, fields, snapshot_fields, Candle, CandleDirection,
    ExchangeSpec, PatternMatch, RawRow, ScanEntry, ScanResult, ScreenerQuery, SortSpec,
    SymbolSnapshot, Timeframe, TimeframeRun,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

pub const DEFAULT_MIN_RUN: usize = 3;
pub const DEFAULT_ADVANCED_TIMEFRAMES: [Timeframe; 2] =
    [Timeframe::FifteenMinutes, Timeframe::OneHour];

/// Run state after some prefix of a candle series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    NoRun,
    Run {
        direction: CandleDirection,
        length: usize,
    },
}

impl RunState {
    /// Advance by one candle of direction `candle` (`None` for neutral).
    pub fn step(self, candle: Option<CandleDirection>) -> Self {
        match (self, candle) {
            (_, None) => RunState::NoRun,
            (RunState::Run { direction, length }, Some(next)) if direction == next => {
                RunState::Run {
                    direction,
                    length: length + 1,
                }
            }
            (_, Some(next)) => RunState::Run {
                direction: next,
                length: 1,
            },
        }
    }

    pub fn direction(&self) -> Option<CandleDirection> {
        match self {
            RunState::NoRun => None,
            RunState::Run { direction, .. } => Some(*direction),
        }
    }

    pub fn length(&self) -> usize {
        match self {
            RunState::NoRun => 0,
            RunState::Run { length, .. } => *length,
        }
    }
}

/// Direction of one candle. With `min_growth`, bodies smaller than that
/// percentage of the open count as neutral.
pub fn candle_direction(candle: &Candle, min_growth: Option<f64>) -> Option<CandleDirection> {
    if let Some(min) = min_growth {
        let body = candle.change_percent()?;
        if body.abs() < min {
            return None;
        }
    }
    if candle.close > candle.open {
        Some(CandleDirection::Bullish)
    } else if candle.close < candle.open {
        Some(CandleDirection::Bearish)
    } else {
        None
    }
}

/// Run state at the most recent candle.
pub fn final_run(candles: &[Candle], min_growth: Option<f64>) -> RunState {
    candles
        .iter()
        .fold(RunState::NoRun, |state, candle| {
            state.step(candle_direction(candle, min_growth))
        })
}

/// Latest run on one timeframe, `None` when there are too few candles.
fn timeframe_run(
    candles: &[Candle],
    timeframe: Timeframe,
    min_run: usize,
    min_growth: Option<f64>,
) -> Option<TimeframeRun> {
    if candles.len() < min_run {
        return None;
    }
    let state = final_run(candles, min_growth);
    Some(TimeframeRun {
        timeframe,
        direction: state.direction(),
        run_length: state.length(),
        qualifies: state.length() >= min_run,
    })
}

fn latest_change(candles: &[Candle]) -> f64 {
    candles
        .last()
        .and_then(Candle::change_percent)
        .map(f64::abs)
        .unwrap_or(0.0)
}

/// Pattern scans over one exchange.
pub struct PatternScanner {
    adapter: Arc<MarketDataAdapter>,
    scan: ScanConfig,
}

impl PatternScanner {
    pub fn new(adapter: Arc<MarketDataAdapter>, scan: ScanConfig) -> Self {
        Self { adapter, scan }
    }

    fn resolve(&self, exchange: &str) -> Result<&ExchangeSpec> {
        self.adapter.registry().resolve(exchange)
    }

    fn clamp_min_run(&self, min_run: i64) -> usize {
        let lookback = self.scan.candle_lookback.max(2);
        min_run.clamp(2, lookback as i64) as usize
    }

    /// Universe query carrying a snapshot plus candle history at `timeframe`.
    fn history_query(&self, spec: &ExchangeSpec, timeframe: Timeframe) -> ScreenerQuery {
        MarketDataAdapter::scoped_query(spec)
            .select(snapshot_fields(timeframe))
            .select(candle_fields(timeframe, self.scan.candle_lookback))
            .sort(SortSpec::desc(timeframe.field(fields::VOLUME)))
            .limit(self.scan.universe_limit)
    }

    fn candles(&self, row: &RawRow, timeframe: Timeframe) -> Vec<Candle> {
        candles_from_row(row, timeframe, self.scan.candle_lookback)
    }

    /// Symbols whose latest run at `timeframe` is at least `min_run` candles
    /// long, longest runs first. `direction` of `None` accepts either side.
    pub async fn consecutive_candles_scan(
        &self,
        exchange: &str,
        timeframe: &str,
        direction: Option<CandleDirection>,
        min_run: i64,
        min_growth: Option<f64>,
        limit: i64,
    ) -> Result<ScanResult> {
        let spec = self.resolve(exchange)?;
        let timeframe = parse_timeframe(timeframe)?;
        let min_run = self.clamp_min_run(min_run);
        let min_growth = min_growth.filter(|g| g.is_finite() && *g > 0.0);
        let limit = clamp_limit(limit, params::CANDLE_SCAN_LIMIT_CAP);
        if limit == 0 {
            return Ok(ScanResult::empty(&spec.name, timeframe));
        }

        let rows = self.adapter.fetch(&self.history_query(spec, timeframe)).await?;

        let mut skipped = 0usize;
        let mut ranked: Vec<(f64, ScanEntry)> = Vec::new();
        for row in &rows {
            let candles = self.candles(row, timeframe);
            let Some(run) = timeframe_run(&candles, timeframe, min_run, min_growth) else {
                skipped += 1;
                continue;
            };
            let Some(run_direction) = run.direction.filter(|_| run.qualifies) else {
                continue;
            };
            if direction.is_some_and(|wanted| wanted != run_direction) {
                continue;
            }

            let snapshot = SymbolSnapshot::from_row(row, timeframe);
            let signals = indicators::analyze(&snapshot);
            let pattern = PatternMatch {
                symbol: row.ticker.clone(),
                direction: run_direction,
                run_length: run.run_length,
                timeframes: vec![run],
                agreement: true,
            };
            ranked.push((
                latest_change(&candles),
                ScanEntry {
                    snapshot,
                    signals,
                    pattern: Some(pattern),
                },
            ));
        }

        ranked.sort_by(|(change_a, a), (change_b, b)| {
            let run_a = a.pattern.as_ref().map_or(0, |p| p.run_length);
            let run_b = b.pattern.as_ref().map_or(0, |p| p.run_length);
            run_b.cmp(&run_a).then_with(|| change_b.total_cmp(change_a))
        });
        let entries: Vec<ScanEntry> = ranked.into_iter().take(limit).map(|(_, e)| e).collect();

        info!(
            exchange = %spec.name,
            timeframe = %timeframe,
            min_run,
            fetched = rows.len(),
            skipped,
            kept = entries.len(),
            "Consecutive candle scan complete"
        );

        Ok(ScanResult {
            exchange: spec.name.clone(),
            timeframe,
            entries,
        })
    }

    /// Run the candle state machine on every timeframe for the symbols that
    /// match on the base (first) timeframe, flagging cross-timeframe
    /// agreement.
    ///
    /// One fetch per timeframe, sequentially. Agreeing symbols rank first,
    /// then longer base runs.
    pub async fn advanced_candle_pattern<S: AsRef<str>>(
        &self,
        exchange: &str,
        timeframes: &[S],
        min_run: i64,
        agreement_only: bool,
        limit: i64,
    ) -> Result<ScanResult> {
        let spec = self.resolve(exchange)?;
        let timeframes = if timeframes.is_empty() {
            DEFAULT_ADVANCED_TIMEFRAMES.to_vec()
        } else {
            parse_timeframes(timeframes)?
        };
        let base = timeframes[0];
        let min_run = self.clamp_min_run(min_run);
        let limit = clamp_limit(limit, params::ADVANCED_PATTERN_LIMIT_CAP);
        if limit == 0 {
            return Ok(ScanResult::empty(&spec.name, base));
        }

        let base_rows = self.adapter.fetch(&self.history_query(spec, base)).await?;

        let mut candidates: Vec<(&RawRow, TimeframeRun, f64)> = Vec::new();
        for row in &base_rows {
            let candles = self.candles(row, base);
            match timeframe_run(&candles, base, min_run, None) {
                Some(run) if run.qualifies && run.direction.is_some() => {
                    candidates.push((row, run, latest_change(&candles)))
                }
                Some(_) => {}
                None => debug!(symbol = %row.ticker, "Too few {} candles, skipping", base),
            }
        }

        if candidates.is_empty() {
            info!(exchange = %spec.name, timeframe = %base, "No base timeframe runs found");
            return Ok(ScanResult::empty(&spec.name, base));
        }

        let tickers: Vec<String> = candidates.iter().map(|(row, _, _)| row.ticker.clone()).collect();
        let mut runs_by_tf: HashMap<Timeframe, HashMap<String, TimeframeRun>> = HashMap::new();
        for tf in timeframes.iter().copied().skip(1) {
            let query = ScreenerQuery::new(spec.name.clone(), spec.market)
                .select(candle_fields(tf, self.scan.candle_lookback))
                .tickers(tickers.clone())
                .limit(tickers.len());
            let rows = self.adapter.fetch(&query).await?;
            let runs = rows
                .iter()
                .filter_map(|row| {
                    let candles = self.candles(row, tf);
                    timeframe_run(&candles, tf, min_run, None).map(|run| (row.ticker.clone(), run))
                })
                .collect();
            runs_by_tf.insert(tf, runs);
        }

        let mut ranked: Vec<(f64, ScanEntry)> = candidates
            .into_iter()
            .filter_map(|(row, base_run, change)| {
                let direction = base_run.direction?;
                let mut runs = vec![base_run.clone()];
                for tf in timeframes.iter().skip(1) {
                    let run = runs_by_tf
                        .get(tf)
                        .and_then(|by_ticker| by_ticker.get(&row.ticker))
                        .cloned()
                        .unwrap_or(TimeframeRun {
                            timeframe: *tf,
                            direction: None,
                            run_length: 0,
                            qualifies: false,
                        });
                    runs.push(run);
                }
                let agreement = runs
                    .iter()
                    .all(|run| run.qualifies && run.direction == Some(direction));
                if agreement_only && !agreement {
                    return None;
                }

                let snapshot = SymbolSnapshot::from_row(row, base);
                let signals = indicators::analyze(&snapshot);
                Some((
                    change,
                    ScanEntry {
                        snapshot,
                        signals,
                        pattern: Some(PatternMatch {
                            symbol: row.ticker.clone(),
                            direction,
                            run_length: base_run.run_length,
                            timeframes: runs,
                            agreement,
                        }),
                    },
                ))
            })
            .collect();

        ranked.sort_by(|(change_a, a), (change_b, b)| {
            let key = |e: &ScanEntry| {
                e.pattern
                    .as_ref()
                    .map_or((false, 0), |p| (p.agreement, p.run_length))
            };
            key(b).cmp(&key(a)).then_with(|| change_b.total_cmp(change_a))
        });
        let entries: Vec<ScanEntry> = ranked.into_iter().take(limit).map(|(_, e)| e).collect();

        info!(
            exchange = %spec.name,
            timeframes = timeframes.len(),
            min_run,
            agreement_only,
            kept = entries.len(),
            "Advanced candle pattern scan complete"
        );

        Ok(ScanResult {
            exchange: spec.name.clone(),
            timeframe: base,
            entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryConfig;
    use crate::services::market_data::RecordingSleeper;
    use crate::services::registry::Registry;
    use crate::sources::mock::ScriptedSource;

    /// Candles for `closes`: up-candles open 0.5 below the close, down-candles
    /// 0.5 above, based on the previous close's direction.
    fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
        let mut prev = closes[0] - 1.0;
        closes
            .iter()
            .map(|&close| {
                let open = if close >= prev { close - 0.5 } else { close + 0.5 };
                prev = close;
                Candle::new(open, close)
            })
            .collect()
    }

    /// A row carrying `candles` (oldest first) as offset columns.
    fn history_row(ticker: &str, tf: Timeframe, candles: &[Candle]) -> RawRow {
        let mut row = RawRow::new(ticker);
        for (offset, candle) in candles.iter().rev().enumerate() {
            row = row
                .with(tf.field_at("open", offset), candle.open)
                .with(tf.field_at("close", offset), candle.close);
        }
        row
    }

    fn scanner(rows: Vec<RawRow>) -> (PatternScanner, Arc<ScriptedSource>) {
        let source = Arc::new(ScriptedSource::new(rows));
        let adapter = MarketDataAdapter::with_sleeper(
            source.clone(),
            Arc::new(Registry::builtin()),
            RetryConfig::default(),
            Arc::new(RecordingSleeper::new()),
        );
        (
            PatternScanner::new(Arc::new(adapter), ScanConfig::default()),
            source,
        )
    }

    // =========================================================================
    // State machine
    // =========================================================================

    #[test]
    fn test_broken_run_resets() {
        let candles = candles_from_closes(&[10.0, 11.0, 12.0, 11.0, 13.0, 14.0, 15.0]);
        let state = final_run(&candles, None);
        assert_eq!(
            state,
            RunState::Run {
                direction: CandleDirection::Bullish,
                length: 3
            }
        );
    }

    #[test]
    fn test_neutral_candle_breaks_run() {
        let candles = vec![
            Candle::new(1.0, 2.0),
            Candle::new(2.0, 3.0),
            Candle::new(3.0, 3.0),
        ];
        assert_eq!(final_run(&candles, None), RunState::NoRun);

        let state = RunState::NoRun.step(Some(CandleDirection::Bearish));
        assert_eq!(state.length(), 1);
        assert_eq!(state.step(Some(CandleDirection::Bullish)).length(), 1);
    }

    #[test]
    fn test_min_growth_treats_small_bodies_as_neutral() {
        let candles = vec![
            Candle::new(100.0, 103.0),
            Candle::new(103.0, 103.1),
            Candle::new(103.1, 106.0),
        ];
        assert_eq!(final_run(&candles, None).length(), 3);
        assert_eq!(final_run(&candles, Some(1.0)).length(), 1);
    }

    // =========================================================================
    // Scans
    // =========================================================================

    #[tokio::test]
    async fn test_consecutive_scan_reports_latest_run() {
        let tf = Timeframe::FifteenMinutes;
        let rising = candles_from_closes(&[10.0, 11.0, 12.0, 11.0, 13.0, 14.0, 15.0]);
        let falling = candles_from_closes(&[20.0, 19.0, 18.0, 17.0, 16.0]);
        let choppy = candles_from_closes(&[10.0, 11.0, 10.0, 11.0, 10.0]);
        let short = candles_from_closes(&[5.0, 6.0]);
        let (scanner, _) = scanner(vec![
            history_row("KUCOIN:UP", tf, &rising),
            history_row("KUCOIN:DOWN", tf, &falling),
            history_row("KUCOIN:CHOP", tf, &choppy),
            history_row("KUCOIN:NEW", tf, &short),
        ]);

        let result = scanner
            .consecutive_candles_scan("kucoin", "15m", None, 3, None, 20)
            .await
            .unwrap();
        assert_eq!(result.symbols(), vec!["KUCOIN:DOWN", "KUCOIN:UP"]);

        let up = result.entries[1].pattern.as_ref().unwrap();
        assert_eq!(up.direction, CandleDirection::Bullish);
        assert_eq!(up.run_length, 3);

        let bullish = scanner
            .consecutive_candles_scan("kucoin", "15m", Some(CandleDirection::Bullish), 3, None, 20)
            .await
            .unwrap();
        assert_eq!(bullish.symbols(), vec!["KUCOIN:UP"]);
    }

    #[tokio::test]
    async fn test_advanced_pattern_agreement() {
        let up = candles_from_closes(&[1.0, 2.0, 3.0, 4.0]);
        let down = candles_from_closes(&[4.0, 3.0, 2.0, 1.0]);
        let m15 = Timeframe::FifteenMinutes;
        let h1 = Timeframe::OneHour;

        let both = history_row("KUCOIN:BOTH", m15, &up);
        let both = up.iter().rev().enumerate().fold(both, |row, (k, c)| {
            row.with(h1.field_at("open", k), c.open)
                .with(h1.field_at("close", k), c.close)
        });
        let split = history_row("KUCOIN:SPLIT", m15, &up);
        let split = down.iter().rev().enumerate().fold(split, |row, (k, c)| {
            row.with(h1.field_at("open", k), c.open)
                .with(h1.field_at("close", k), c.close)
        });

        let (scanner, source) = scanner(vec![split, both]);
        let result = scanner
            .advanced_candle_pattern("kucoin", &["15m", "1h"], 3, false, 10)
            .await
            .unwrap();
        assert_eq!(result.symbols(), vec!["KUCOIN:BOTH", "KUCOIN:SPLIT"]);
        assert!(result.entries[0].pattern.as_ref().unwrap().agreement);
        let split = result.entries[1].pattern.as_ref().unwrap();
        assert!(!split.agreement);
        assert_eq!(split.timeframes[1].direction, Some(CandleDirection::Bearish));
        assert_eq!(source.attempts(), 2);

        let agreeing = scanner
            .advanced_candle_pattern("kucoin", &["15m", "1h"], 3, true, 10)
            .await
            .unwrap();
        assert_eq!(agreeing.symbols(), vec!["KUCOIN:BOTH"]);
    }

    #[tokio::test]
    async fn test_advanced_pattern_defaults_timeframes() {
        let (scanner, _) = scanner(vec![]);
        let empty: [&str; 0] = [];
        let result = scanner
            .advanced_candle_pattern("kucoin", &empty, 3, false, 0)
            .await
            .unwrap();
        assert!(result.is_empty());
        assert_eq!(result.timeframe, Timeframe::FifteenMinutes);
    }
}
