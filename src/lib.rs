//! # tascore - technical-analysis scoring engine
//!
//! Turns an ordered OHLCV series into oscillators, bands, divergences,
//! support/resistance levels, candlestick and chart patterns, and a
//! weighted composite recommendation.
//!
//! ## Quick Start
//!
//! ```rust
//! use tascore::prelude::*;
//!
//! let bars: Vec<Bar> = (0..80)
//!     .map(|i| {
//!         let base = 100.0 + (i as f64 * 0.4).sin() * 6.0;
//!         Bar {
//!             timestamp: i,
//!             open: base,
//!             high: base + 1.5,
//!             low: base - 1.5,
//!             close: base + 0.5,
//!             volume: 10_000.0,
//!         }
//!     })
//!     .collect();
//!
//! let series = Series::new(bars).unwrap();
//! let analyzer = Analyzer::new(AnalyzerConfig::default()).unwrap();
//! let report = analyzer.analyze(&series).unwrap();
//! println!("{}: score {}", report.recommendation.as_str(), report.score);
//! ```
//!
//! The engine is pure: it owns no cross-call state, never mutates its
//! inputs, and performs no I/O. Independent analyses can run fully in
//! parallel (see [`analyze_parallel`]).

pub mod divergence;
pub mod indicators;
pub mod levels;
pub mod patterns;
pub mod score;
pub mod swings;

pub mod prelude {
    pub use crate::{
        analyze_parallel,
        divergence::{DivergenceEvent, DivergenceKind, IndicatorName},
        indicators::MaAlignment,
        levels::{Level, LevelKind},
        patterns::{PatternKind, PatternMatch, PatternScope},
        score::{Recommendation, TradePlan},
        AnalysisError, AnalysisReport, Analyzer, AnalyzerConfig, Bar, Direction, IndicatorSeries,
        Period, Result, Series, Signal, SignalKind, Strength, TickerError, TickerReport,
        Tolerance,
    };
}

use divergence::{detect_divergences, DivergenceEvent, DivergenceParams, IndicatorName};
use levels::{support_resistance, Level, LevelParams};
use patterns::{scan_candles, scan_chart, PatternMatch};
use score::{composite_score, extract_signals, trade_plan, Recommendation, SignalInputs, TradePlan};

/// Candlestick matches only score while they complete within this many
/// final bars; older shapes are history, not signal.
const RECENT_PATTERN_BARS: usize = 3;

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors surfaced before any computation happens. Insufficient history
/// is deliberately not an error: it degrades the affected indicator to an
/// undefined series inside an otherwise valid report.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalysisError {
    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("{field} = {value} out of range ({min}, {max})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid bar at index {index}: {reason}")]
    InvalidBar { index: usize, reason: &'static str },

    #[error("Non-monotonic timestamp at index {index}")]
    NonMonotonicTimestamp { index: usize },
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Window length, always > 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Period(usize);

impl Period {
    pub fn new(value: usize) -> Result<Self> {
        if value == 0 {
            return Err(AnalysisError::InvalidValue("Period must be > 0"));
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: usize) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl serde::Serialize for Period {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Period {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = usize::deserialize(d)?;
        Period::new(value).map_err(serde::de::Error::custom)
    }
}

/// Relative tolerance in the open unit interval (0, 1).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Tolerance(f64);

impl Tolerance {
    pub fn new(value: f64) -> Result<Self> {
        if !value.is_finite() || value <= 0.0 || value >= 1.0 {
            return Err(AnalysisError::OutOfRange {
                field: "Tolerance",
                value,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl serde::Serialize for Tolerance {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Tolerance {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(d)?;
        Tolerance::new(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// SERIES INPUT
// ============================================================

/// One OHLCV bar. All price fields must be finite and satisfy
/// `low <= min(open, close) <= max(open, close) <= high`; volume must be
/// non-negative.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Bar {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    #[inline]
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    #[inline]
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    #[inline]
    pub fn body_top(&self) -> f64 {
        self.open.max(self.close)
    }

    #[inline]
    pub fn body_bottom(&self) -> f64 {
        self.open.min(self.close)
    }

    #[inline]
    pub fn upper_shadow(&self) -> f64 {
        self.high - self.body_top()
    }

    #[inline]
    pub fn lower_shadow(&self) -> f64 {
        self.body_bottom() - self.low
    }

    #[inline]
    pub fn midpoint(&self) -> f64 {
        (self.open + self.close) / 2.0
    }

    #[inline]
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    #[inline]
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    fn validate(&self, index: usize) -> Result<()> {
        let fields = [self.open, self.high, self.low, self.close, self.volume];
        if fields.iter().any(|v| !v.is_finite()) {
            return Err(AnalysisError::InvalidBar {
                index,
                reason: "non-finite field",
            });
        }
        if self.volume < 0.0 {
            return Err(AnalysisError::InvalidBar {
                index,
                reason: "negative volume",
            });
        }
        if self.low > self.body_bottom() || self.body_top() > self.high {
            return Err(AnalysisError::InvalidBar {
                index,
                reason: "OHLC ordering violated",
            });
        }
        Ok(())
    }
}

/// A validated, ordered OHLCV series. Construction rejects malformed
/// bars and non-monotonic timestamps before any computation happens.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Series {
    bars: Vec<Bar>,
}

impl Series {
    pub fn new(bars: Vec<Bar>) -> Result<Self> {
        if bars.is_empty() {
            return Err(AnalysisError::InvalidValue(
                "series must contain at least one bar",
            ));
        }
        for (index, bar) in bars.iter().enumerate() {
            bar.validate(index)?;
        }
        for (index, pair) in bars.windows(2).enumerate() {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(AnalysisError::NonMonotonicTimestamp { index: index + 1 });
            }
        }
        Ok(Self { bars })
    }

    #[inline]
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    #[inline]
    pub fn last(&self) -> &Bar {
        &self.bars[self.bars.len() - 1]
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume).collect()
    }
}

// ============================================================
// INDICATOR SERIES
// ============================================================

/// Indicator output aligned 1:1 by position with the input series.
/// `None` marks the warm-up window where insufficient history exists.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct IndicatorSeries {
    values: Vec<Option<f64>>,
}

impl IndicatorSeries {
    /// A series of `len` undefined entries.
    pub fn undefined(len: usize) -> Self {
        Self {
            values: vec![None; len],
        }
    }

    pub fn from_options(values: Vec<Option<f64>>) -> Self {
        Self { values }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at `index`, `None` when out of range or undefined.
    #[inline]
    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    /// Last defined entry with its index.
    pub fn last_defined(&self) -> Option<(usize, f64)> {
        self.values
            .iter()
            .enumerate()
            .rev()
            .find_map(|(i, v)| v.map(|v| (i, v)))
    }

    pub fn is_all_undefined(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }
}

// ============================================================
// SIGNALS
// ============================================================

/// Direction of a signal or pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Direction {
    Bullish,
    Neutral,
    Bearish,
}

/// Discrete strength tier, mapped to a fixed scoring weight.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub enum Strength {
    Weak,
    Medium,
    Strong,
    VeryStrong,
}

/// The closed set of indicator-state signals the scorer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SignalKind {
    RsiExtreme,
    RsiLean,
    MacdCross,
    MacdTrend,
    BollingerBreakout,
    BollingerTouch,
    KdjCross,
    KdjExtreme,
    ObvConfirmation,
    WilliamsExtreme,
    BiasStretch,
    VolumeSurge,
    VolumeDryUp,
    MaAlignment,
    MaCross,
    TrendStretch,
    LevelProximity,
}

/// One discrete observation about the final bar. Immutable once produced.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Signal {
    pub kind: SignalKind,
    pub direction: Direction,
    pub strength: Strength,
    /// Bar index the signal originates from.
    pub index: usize,
}

// ============================================================
// CONFIGURATION
// ============================================================

/// Engine configuration, threaded by value into every calculator. Never
/// process-global, so concurrent analyses cannot interfere.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnalyzerConfig {
    pub rsi_period: Period,
    pub macd_fast: Period,
    pub macd_slow: Period,
    pub macd_signal: Period,
    pub bb_period: Period,
    pub bb_k: f64,
    pub atr_period: Period,
    pub ma_periods: Vec<Period>,
    pub kdj_period: Period,
    pub bias_period: Period,
    pub williams_period: Period,
    pub volume_period: Period,
    pub volume_surge_ratio: f64,
    pub divergence_window: Period,
    pub divergence_min_distance: Period,
    pub divergence_max_count: Period,
    pub sr_lookback: Period,
    pub chart_lookback: Period,
    pub chart_swing_window: Period,
    pub pattern_tolerance: Tolerance,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            rsi_period: Period::new_const(14),
            macd_fast: Period::new_const(12),
            macd_slow: Period::new_const(26),
            macd_signal: Period::new_const(9),
            bb_period: Period::new_const(20),
            bb_k: 2.0,
            atr_period: Period::new_const(14),
            ma_periods: vec![
                Period::new_const(5),
                Period::new_const(10),
                Period::new_const(20),
                Period::new_const(50),
                Period::new_const(200),
            ],
            kdj_period: Period::new_const(9),
            bias_period: Period::new_const(6),
            williams_period: Period::new_const(14),
            volume_period: Period::new_const(20),
            volume_surge_ratio: 1.5,
            divergence_window: Period::new_const(2),
            divergence_min_distance: Period::new_const(5),
            divergence_max_count: Period::new_const(3),
            sr_lookback: Period::new_const(60),
            chart_lookback: Period::new_const(60),
            chart_swing_window: Period::new_const(3),
            pattern_tolerance: Tolerance::new_const(0.03),
        }
    }
}

impl AnalyzerConfig {
    /// Cross-field validation; the newtypes already guarantee the
    /// per-field ranges.
    pub fn validate(&self) -> Result<()> {
        if !self.bb_k.is_finite() || self.bb_k <= 0.0 {
            return Err(AnalysisError::OutOfRange {
                field: "bb_k",
                value: self.bb_k,
                min: 0.0,
                max: f64::INFINITY,
            });
        }
        if !self.volume_surge_ratio.is_finite() || self.volume_surge_ratio <= 0.0 {
            return Err(AnalysisError::OutOfRange {
                field: "volume_surge_ratio",
                value: self.volume_surge_ratio,
                min: 0.0,
                max: f64::INFINITY,
            });
        }
        if self.macd_fast >= self.macd_slow {
            return Err(AnalysisError::InvalidValue(
                "macd_fast must be shorter than macd_slow",
            ));
        }
        if self.ma_periods.is_empty() {
            return Err(AnalysisError::InvalidValue("ma_periods must not be empty"));
        }
        Ok(())
    }
}

// ============================================================
// REPORT
// ============================================================

/// Latest MACD values, present once the signal line has warmed up.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct MacdSnapshot {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// Latest band values.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct BollingerSnapshot {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// Latest KDJ values.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct KdjSnapshot {
    pub k: f64,
    pub d: f64,
    pub j: f64,
}

/// Latest value of every indicator. Fields stay `None` while the
/// corresponding indicator is inside its warm-up window.
#[derive(Debug, Clone, serde::Serialize)]
pub struct IndicatorSnapshot {
    pub close: f64,
    pub rsi: Option<f64>,
    pub macd: Option<MacdSnapshot>,
    pub bollinger: Option<BollingerSnapshot>,
    pub atr: Option<f64>,
    pub atr_percent: Option<f64>,
    /// (period, latest average) per configured period.
    pub moving_averages: Vec<(usize, Option<f64>)>,
    pub ma_alignment: Option<indicators::MaAlignment>,
    pub volume_ratio: Option<f64>,
    pub kdj: Option<KdjSnapshot>,
    pub obv: Option<f64>,
    pub williams_r: Option<f64>,
    pub bias: Option<f64>,
}

/// The complete analysis result. Immutable once constructed; persistence
/// belongs to the caller.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AnalysisReport {
    pub indicators: IndicatorSnapshot,
    pub signals: Vec<Signal>,
    /// Most recent first, across all scanned oscillators.
    pub divergences: Vec<DivergenceEvent>,
    /// Ranked support/resistance clusters, strongest first.
    pub levels: Vec<Level>,
    pub candlestick_patterns: Vec<PatternMatch>,
    pub chart_patterns: Vec<PatternMatch>,
    pub trade_plan: Option<TradePlan>,
    pub score: i32,
    pub recommendation: Recommendation,
}

// ============================================================
// ANALYZER
// ============================================================

/// The engine. Stateless apart from its validated configuration; every
/// call is independent and reentrant.
#[derive(Debug, Clone)]
pub struct Analyzer {
    config: AnalyzerConfig,
}

impl Analyzer {
    /// Validate the configuration and build an engine.
    pub fn new(config: AnalyzerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Run the full analysis over a validated series.
    pub fn analyze(&self, series: &Series) -> Result<AnalysisReport> {
        let cfg = &self.config;
        let bars = series.bars();
        let closes = series.closes();
        let volumes = series.volumes();
        let last = bars.len() - 1;
        let close = bars[last].close;

        let rsi = indicators::rsi(&closes, cfg.rsi_period.get())?;
        let macd = indicators::macd(
            &closes,
            cfg.macd_fast.get(),
            cfg.macd_slow.get(),
            cfg.macd_signal.get(),
        )?;
        let bollinger = indicators::bollinger(&closes, cfg.bb_period.get(), cfg.bb_k)?;
        let atr = indicators::atr(bars, cfg.atr_period.get())?;
        let atr_percent = indicators::atr_percent(bars, cfg.atr_period.get())?;
        let ma_periods: Vec<usize> = cfg.ma_periods.iter().map(|p| p.get()).collect();
        let ma = indicators::ma_system(&closes, &ma_periods)?;
        let volume =
            indicators::volume_profile(&volumes, cfg.volume_period.get(), cfg.volume_surge_ratio)?;
        let kdj = indicators::kdj(bars, cfg.kdj_period.get())?;
        let obv = indicators::obv(bars);
        let williams = indicators::williams_r(bars, cfg.williams_period.get())?;
        let bias = indicators::bias(&closes, cfg.bias_period.get())?;

        let divergence_params = DivergenceParams {
            window: cfg.divergence_window.get(),
            min_distance: cfg.divergence_min_distance.get(),
            max_count: cfg.divergence_max_count.get(),
        };
        let mut divergences =
            detect_divergences(&closes, &rsi, IndicatorName::Rsi, &divergence_params)?;
        divergences.extend(detect_divergences(
            &closes,
            &macd.line,
            IndicatorName::Macd,
            &divergence_params,
        )?);
        divergences.extend(detect_divergences(
            &closes,
            &obv,
            IndicatorName::Obv,
            &divergence_params,
        )?);
        divergences.sort_by(|a, b| b.price_points.1.cmp(&a.price_points.1));

        let levels = support_resistance(
            bars,
            &LevelParams {
                lookback: cfg.sr_lookback.get(),
                tolerance: cfg.pattern_tolerance.get(),
            },
        )?;

        let candlestick_patterns = scan_candles(bars);
        let chart_patterns = scan_chart(
            bars,
            cfg.chart_lookback.get(),
            cfg.chart_swing_window.get(),
            cfg.pattern_tolerance.get(),
        )?;

        let signals = extract_signals(&SignalInputs {
            bars,
            rsi: &rsi,
            macd: &macd,
            bollinger: &bollinger,
            kdj: &kdj,
            obv: &obv,
            williams: &williams,
            bias: &bias,
            volume: &volume,
            ma: &ma,
            levels: &levels,
        });

        // Only shapes completing on the final bars are actionable; the
        // chart scan is already restricted to its trailing window.
        let scored_patterns: Vec<PatternMatch> = candlestick_patterns
            .iter()
            .filter(|m| m.end_index + RECENT_PATTERN_BARS > last)
            .chain(chart_patterns.iter())
            .copied()
            .collect();
        let score = composite_score(&signals, &divergences, &scored_patterns);
        let recommendation = Recommendation::from_score(score);

        let atr_last = atr.get(last);
        let atr_percent_last = atr_percent.get(last);
        let indicators = IndicatorSnapshot {
            close,
            rsi: rsi.get(last),
            macd: match (
                macd.line.get(last),
                macd.signal.get(last),
                macd.histogram.get(last),
            ) {
                (Some(line), Some(signal), Some(histogram)) => Some(MacdSnapshot {
                    line,
                    signal,
                    histogram,
                }),
                _ => None,
            },
            bollinger: match (
                bollinger.upper.get(last),
                bollinger.middle.get(last),
                bollinger.lower.get(last),
            ) {
                (Some(upper), Some(middle), Some(lower)) => Some(BollingerSnapshot {
                    upper,
                    middle,
                    lower,
                }),
                _ => None,
            },
            atr: atr_last,
            atr_percent: atr_percent_last,
            moving_averages: ma
                .periods
                .iter()
                .zip(ma.averages.iter())
                .map(|(&p, s)| (p, s.get(last)))
                .collect(),
            ma_alignment: ma.alignment[last],
            volume_ratio: volume.ratio.get(last),
            kdj: match (kdj.k.get(last), kdj.d.get(last), kdj.j.get(last)) {
                (Some(k), Some(d), Some(j)) => Some(KdjSnapshot { k, d, j }),
                _ => None,
            },
            obv: obv.get(last),
            williams_r: williams.get(last),
            bias: bias.get(last),
        };

        let trade_plan = trade_plan(close, atr_last, atr_percent_last, &levels);

        Ok(AnalysisReport {
            indicators,
            signals,
            divergences,
            levels,
            candlestick_patterns,
            chart_patterns,
            trade_plan,
            score,
            recommendation,
        })
    }
}

// ============================================================
// PARALLEL ANALYSIS
// ============================================================

use rayon::prelude::*;

/// Result of analyzing a single instrument.
#[derive(Debug)]
pub struct TickerReport {
    pub symbol: String,
    pub report: AnalysisReport,
}

/// Error from analyzing a single instrument.
#[derive(Debug)]
pub struct TickerError {
    pub symbol: String,
    pub error: AnalysisError,
}

/// Analyze many instruments in parallel. Each analysis is independent, so
/// the fan-out needs no coordination.
pub fn analyze_parallel<'a, I>(
    analyzer: &Analyzer,
    instruments: I,
) -> (Vec<TickerReport>, Vec<TickerError>)
where
    I: IntoParallelIterator<Item = (&'a str, &'a Series)>,
{
    let results: Vec<_> = instruments
        .into_par_iter()
        .map(|(symbol, series)| {
            analyzer
                .analyze(series)
                .map(|report| TickerReport {
                    symbol: symbol.to_string(),
                    report,
                })
                .map_err(|error| TickerError {
                    symbol: symbol.to_string(),
                    error,
                })
        })
        .collect();

    let mut reports = Vec::new();
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(r) => reports.push(r),
            Err(e) => errors.push(e),
        }
    }
    (reports, errors)
}

// ============================================================
// TESTS
// ============================================================
