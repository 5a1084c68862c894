//! Candlestick pattern detectors (1-3 bar windows)
//!
//! Each detector is a struct carrying its ratio thresholds, dispatched
//! through the closed [`CandleRecognizer`] enum. Trend-dependent shapes
//! (hammer vs hanging man, the stars) are gated by a per-bar
//! [`PatternContext`].

use super::{PatternKind, PatternMatch};
use crate::{Bar, Direction};

/// Lookback for the trend classification behind trend-gated patterns.
const TREND_PERIOD: usize = 14;
/// Lookback for the trailing average body used by "large body" checks.
const BODY_AVG_PERIOD: usize = 10;

// ============================================================
// CONTEXT
// ============================================================

/// Trend classification at a bar, from the close change over
/// [`TREND_PERIOD`] bars.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Trend {
    StrongUp,
    WeakUp,
    #[default]
    Sideways,
    WeakDown,
    StrongDown,
}

impl Trend {
    #[inline]
    pub fn is_up(self) -> bool {
        matches!(self, Trend::StrongUp | Trend::WeakUp)
    }

    #[inline]
    pub fn is_down(self) -> bool {
        matches!(self, Trend::StrongDown | Trend::WeakDown)
    }
}

/// Per-bar market context for the candle detectors.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternContext {
    pub trend: Trend,
    /// Trailing average body size, excluding the current bar.
    pub avg_body: f64,
}

/// Precompute contexts for every bar.
pub fn compute_contexts(bars: &[Bar]) -> Vec<PatternContext> {
    (0..bars.len())
        .map(|i| PatternContext {
            trend: trend_at(bars, i),
            avg_body: avg_body_at(bars, i),
        })
        .collect()
}

fn trend_at(bars: &[Bar], index: usize) -> Trend {
    if index < TREND_PERIOD {
        return Trend::Sideways;
    }
    let first = bars[index - TREND_PERIOD].close;
    if first <= f64::EPSILON {
        return Trend::Sideways;
    }
    let change = (bars[index].close - first) / first;
    match change {
        c if c > 0.05 => Trend::StrongUp,
        c if c > 0.02 => Trend::WeakUp,
        c if c < -0.05 => Trend::StrongDown,
        c if c < -0.02 => Trend::WeakDown,
        _ => Trend::Sideways,
    }
}

fn avg_body_at(bars: &[Bar], index: usize) -> f64 {
    if index == 0 {
        return bars[0].body();
    }
    let start = index.saturating_sub(BODY_AVG_PERIOD);
    let trailing = &bars[start..index];
    trailing.iter().map(Bar::body).sum::<f64>() / trailing.len() as f64
}

// ============================================================
// DETECTOR TRAIT + DISPATCH
// ============================================================

/// A single candlestick shape classifier.
pub trait CandleDetector {
    fn min_bars(&self) -> usize;
    fn detect(&self, bars: &[Bar], index: usize, ctx: &PatternContext) -> Option<PatternMatch>;
}

macro_rules! define_candle_recognizers {
    ($($variant:ident($detector:ty)),* $(,)?) => {
        /// The closed set of candlestick detectors, dispatched without
        /// dynamic type inspection.
        #[derive(Debug, Clone)]
        pub enum CandleRecognizer {
            $($variant($detector)),*
        }

        impl CandleRecognizer {
            /// Every recognizer with its default thresholds.
            pub fn all_defaults() -> Vec<CandleRecognizer> {
                vec![$(CandleRecognizer::$variant(<$detector>::default())),*]
            }

            #[inline]
            pub fn detect(
                &self,
                bars: &[Bar],
                index: usize,
                ctx: &PatternContext,
            ) -> Option<PatternMatch> {
                match self {
                    $(Self::$variant(d) => CandleDetector::detect(d, bars, index, ctx)),*
                }
            }

            #[inline]
            pub fn min_bars(&self) -> usize {
                match self {
                    $(Self::$variant(d) => CandleDetector::min_bars(d)),*
                }
            }
        }
    };
}

define_candle_recognizers! {
    Doji(DojiDetector),
    Hammer(HammerDetector),
    HangingMan(HangingManDetector),
    InvertedHammer(InvertedHammerDetector),
    ShootingStar(ShootingStarDetector),
    Engulfing(EngulfingDetector),
    MorningStar(MorningStarDetector),
    EveningStar(EveningStarDetector),
    ThreeWhiteSoldiers(ThreeWhiteSoldiersDetector),
    ThreeBlackCrows(ThreeBlackCrowsDetector),
}

/// Scan every bar with every default recognizer. Overlapping matches on
/// the same bars are all reported.
pub fn scan_candles(bars: &[Bar]) -> Vec<PatternMatch> {
    let recognizers = CandleRecognizer::all_defaults();
    let contexts = compute_contexts(bars);
    let mut matches = Vec::new();
    for index in 0..bars.len() {
        for recognizer in &recognizers {
            if index + 1 >= recognizer.min_bars() {
                if let Some(m) = recognizer.detect(bars, index, &contexts[index]) {
                    matches.push(m);
                }
            }
        }
    }
    matches
}

#[inline]
fn single_bar_match(kind: PatternKind, direction: Direction, index: usize) -> PatternMatch {
    PatternMatch {
        kind,
        scope: kind.scope(),
        direction,
        strength: kind.strength(),
        start_index: index,
        end_index: index,
    }
}

// ============================================================
// SINGLE BAR
// ============================================================

/// Doji: body below a small fraction of the bar's full range.
#[derive(Debug, Clone, Copy)]
pub struct DojiDetector {
    pub max_body_ratio: f64,
}

impl Default for DojiDetector {
    fn default() -> Self {
        Self {
            max_body_ratio: 0.1,
        }
    }
}

impl CandleDetector for DojiDetector {
    fn min_bars(&self) -> usize {
        1
    }

    fn detect(&self, bars: &[Bar], index: usize, _ctx: &PatternContext) -> Option<PatternMatch> {
        let bar = bars.get(index)?;
        // A zero-range bar has a zero body and still qualifies.
        if bar.body() > self.max_body_ratio * bar.range() {
            return None;
        }
        Some(single_bar_match(PatternKind::Doji, Direction::Neutral, index))
    }
}

/// Shared shape test for the hammer family: a small body at one end of
/// the range with one dominant shadow.
#[derive(Debug, Clone, Copy)]
struct ShadowShape {
    pub min_shadow_body_ratio: f64,
    pub max_opposite_shadow_ratio: f64,
    pub max_body_ratio: f64,
}

impl Default for ShadowShape {
    fn default() -> Self {
        Self {
            min_shadow_body_ratio: 2.0,
            max_opposite_shadow_ratio: 0.1,
            max_body_ratio: 0.33,
        }
    }
}

impl ShadowShape {
    /// Long lower shadow, negligible upper shadow, small body near the top.
    fn is_hammer_shape(&self, bar: &Bar) -> bool {
        let range = bar.range();
        range > 0.0
            && bar.lower_shadow() >= self.min_shadow_body_ratio * bar.body()
            && bar.upper_shadow() <= self.max_opposite_shadow_ratio * range
            && bar.body() <= self.max_body_ratio * range
            && bar.body() > 0.0
    }

    /// Long upper shadow, negligible lower shadow, small body near the bottom.
    fn is_inverted_shape(&self, bar: &Bar) -> bool {
        let range = bar.range();
        range > 0.0
            && bar.upper_shadow() >= self.min_shadow_body_ratio * bar.body()
            && bar.lower_shadow() <= self.max_opposite_shadow_ratio * range
            && bar.body() <= self.max_body_ratio * range
            && bar.body() > 0.0
    }
}

macro_rules! shadow_shape_detector {
    ($name:ident, $kind:expr, $direction:expr, $shape:ident, $gate:ident) => {
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name {
            shape: ShadowShape,
        }

        impl CandleDetector for $name {
            fn min_bars(&self) -> usize {
                1
            }

            fn detect(
                &self,
                bars: &[Bar],
                index: usize,
                ctx: &PatternContext,
            ) -> Option<PatternMatch> {
                let bar = bars.get(index)?;
                if !ctx.trend.$gate() || !self.shape.$shape(bar) {
                    return None;
                }
                Some(single_bar_match($kind, $direction, index))
            }
        }
    };
}

shadow_shape_detector!(
    HammerDetector,
    PatternKind::Hammer,
    Direction::Bullish,
    is_hammer_shape,
    is_down
);
shadow_shape_detector!(
    HangingManDetector,
    PatternKind::HangingMan,
    Direction::Bearish,
    is_hammer_shape,
    is_up
);
shadow_shape_detector!(
    InvertedHammerDetector,
    PatternKind::InvertedHammer,
    Direction::Bullish,
    is_inverted_shape,
    is_down
);
shadow_shape_detector!(
    ShootingStarDetector,
    PatternKind::ShootingStar,
    Direction::Bearish,
    is_inverted_shape,
    is_up
);

// ============================================================
// TWO BAR
// ============================================================

/// Engulfing: the second body fully contains the first and runs the
/// opposite direction.
#[derive(Debug, Clone, Copy)]
pub struct EngulfingDetector {
    /// The engulfing body must exceed the engulfed body by this factor.
    pub min_body_factor: f64,
}

impl Default for EngulfingDetector {
    fn default() -> Self {
        Self {
            min_body_factor: 1.0,
        }
    }
}

impl CandleDetector for EngulfingDetector {
    fn min_bars(&self) -> usize {
        2
    }

    fn detect(&self, bars: &[Bar], index: usize, _ctx: &PatternContext) -> Option<PatternMatch> {
        if index < 1 {
            return None;
        }
        let prev = bars.get(index - 1)?;
        let curr = bars.get(index)?;
        if prev.body() <= 0.0 || curr.body() <= prev.body() * self.min_body_factor {
            return None;
        }

        let contains = curr.body_top() >= prev.body_top() && curr.body_bottom() <= prev.body_bottom();
        if !contains {
            return None;
        }

        let kind = if curr.is_bullish() && prev.is_bearish() {
            PatternKind::BullishEngulfing
        } else if curr.is_bearish() && prev.is_bullish() {
            PatternKind::BearishEngulfing
        } else {
            return None;
        };

        Some(PatternMatch {
            kind,
            scope: kind.scope(),
            direction: if kind == PatternKind::BullishEngulfing {
                Direction::Bullish
            } else {
                Direction::Bearish
            },
            strength: kind.strength(),
            start_index: index - 1,
            end_index: index,
        })
    }
}

// ============================================================
// THREE BAR
// ============================================================

/// Morning star: large bearish body, gapped small middle bar, large
/// bullish body closing back into the first body. Requires a preceding
/// decline.
#[derive(Debug, Clone, Copy)]
pub struct MorningStarDetector {
    pub max_star_body_ratio: f64,
}

impl Default for MorningStarDetector {
    fn default() -> Self {
        Self {
            max_star_body_ratio: 0.3,
        }
    }
}

impl CandleDetector for MorningStarDetector {
    fn min_bars(&self) -> usize {
        3
    }

    fn detect(&self, bars: &[Bar], index: usize, ctx: &PatternContext) -> Option<PatternMatch> {
        if index < 2 || !ctx.trend.is_down() {
            return None;
        }
        let first = bars.get(index - 2)?;
        let star = bars.get(index - 1)?;
        let third = bars.get(index)?;

        let large_first = first.is_bearish() && first.body() >= ctx.avg_body;
        let small_star = star.body() <= self.max_star_body_ratio * first.body();
        // Gap: the star's whole body sits below the first close.
        let gapped = star.body_top() <= first.close;
        let strong_third =
            third.is_bullish() && third.body() >= ctx.avg_body && third.close >= first.midpoint();

        if large_first && small_star && gapped && strong_third {
            Some(PatternMatch {
                kind: PatternKind::MorningStar,
                scope: PatternKind::MorningStar.scope(),
                direction: Direction::Bullish,
                strength: PatternKind::MorningStar.strength(),
                start_index: index - 2,
                end_index: index,
            })
        } else {
            None
        }
    }
}

/// Evening star: the bearish mirror of the morning star, after a rise.
#[derive(Debug, Clone, Copy)]
pub struct EveningStarDetector {
    pub max_star_body_ratio: f64,
}

impl Default for EveningStarDetector {
    fn default() -> Self {
        Self {
            max_star_body_ratio: 0.3,
        }
    }
}

impl CandleDetector for EveningStarDetector {
    fn min_bars(&self) -> usize {
        3
    }

    fn detect(&self, bars: &[Bar], index: usize, ctx: &PatternContext) -> Option<PatternMatch> {
        if index < 2 || !ctx.trend.is_up() {
            return None;
        }
        let first = bars.get(index - 2)?;
        let star = bars.get(index - 1)?;
        let third = bars.get(index)?;

        let large_first = first.is_bullish() && first.body() >= ctx.avg_body;
        let small_star = star.body() <= self.max_star_body_ratio * first.body();
        let gapped = star.body_bottom() >= first.close;
        let strong_third =
            third.is_bearish() && third.body() >= ctx.avg_body && third.close <= first.midpoint();

        if large_first && small_star && gapped && strong_third {
            Some(PatternMatch {
                kind: PatternKind::EveningStar,
                scope: PatternKind::EveningStar.scope(),
                direction: Direction::Bearish,
                strength: PatternKind::EveningStar.strength(),
                start_index: index - 2,
                end_index: index,
            })
        } else {
            None
        }
    }
}

/// Three white soldiers: three bullish bodies, each opening inside the
/// prior body and closing above the prior close.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreeWhiteSoldiersDetector;

impl CandleDetector for ThreeWhiteSoldiersDetector {
    fn min_bars(&self) -> usize {
        3
    }

    fn detect(&self, bars: &[Bar], index: usize, _ctx: &PatternContext) -> Option<PatternMatch> {
        if index < 2 {
            return None;
        }
        let trio = [
            bars.get(index - 2)?,
            bars.get(index - 1)?,
            bars.get(index)?,
        ];
        if !trio.iter().all(|b| b.is_bullish()) {
            return None;
        }
        for pair in trio.windows(2) {
            let (prev, curr) = (pair[0], pair[1]);
            let opens_inside = curr.open >= prev.open && curr.open <= prev.close;
            let closes_beyond = curr.close > prev.close;
            if !opens_inside || !closes_beyond {
                return None;
            }
        }
        Some(PatternMatch {
            kind: PatternKind::ThreeWhiteSoldiers,
            scope: PatternKind::ThreeWhiteSoldiers.scope(),
            direction: Direction::Bullish,
            strength: PatternKind::ThreeWhiteSoldiers.strength(),
            start_index: index - 2,
            end_index: index,
        })
    }
}

/// Three black crows: the bearish mirror of the soldiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreeBlackCrowsDetector;

impl CandleDetector for ThreeBlackCrowsDetector {
    fn min_bars(&self) -> usize {
        3
    }

    fn detect(&self, bars: &[Bar], index: usize, _ctx: &PatternContext) -> Option<PatternMatch> {
        if index < 2 {
            return None;
        }
        let trio = [
            bars.get(index - 2)?,
            bars.get(index - 1)?,
            bars.get(index)?,
        ];
        if !trio.iter().all(|b| b.is_bearish()) {
            return None;
        }
        for pair in trio.windows(2) {
            let (prev, curr) = (pair[0], pair[1]);
            let opens_inside = curr.open <= prev.open && curr.open >= prev.close;
            let closes_beyond = curr.close < prev.close;
            if !opens_inside || !closes_beyond {
                return None;
            }
        }
        Some(PatternMatch {
            kind: PatternKind::ThreeBlackCrows,
            scope: PatternKind::ThreeBlackCrows.scope(),
            direction: Direction::Bearish,
            strength: PatternKind::ThreeBlackCrows.strength(),
            start_index: index - 2,
            end_index: index,
        })
    }
}
