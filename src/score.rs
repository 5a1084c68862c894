//! Composite scorer: turns the latest indicator state into discrete
//! signals, applies the fixed weight policy, and reduces everything to an
//! integer score and a recommendation tier. Pure reduction, no I/O.

use crate::divergence::{DivergenceEvent, IndicatorName};
use crate::indicators::{BollingerSeries, KdjSeries, MaAlignment, MacdSeries, MaSystem, VolumeProfile};
use crate::levels::{nearest_resistance, nearest_support, Level};
use crate::patterns::PatternMatch;
use crate::{Bar, Direction, IndicatorSeries, Signal, SignalKind, Strength};

/// BIAS beyond this many percent counts as stretched.
const BIAS_STRETCH: f64 = 5.0;
/// Volume ratio below this counts as a dry-up.
const VOLUME_DRY_RATIO: f64 = 0.7;
/// Lookback and threshold for the trend-stretch check.
const TREND_STRETCH_LOOKBACK: usize = 21;
const TREND_STRETCH_PCT: f64 = 15.0;
/// A level within this many percent of the close counts as "near".
const LEVEL_PROXIMITY_PCT: f64 = 3.0;
/// KDJ zone boundaries.
const KDJ_HIGH: f64 = 80.0;
const KDJ_LOW: f64 = 20.0;
/// Williams %R zone boundaries.
const WILLIAMS_HIGH: f64 = -20.0;
const WILLIAMS_LOW: f64 = -80.0;

/// Everything the extractor reads; all series aligned with `bars`.
pub struct SignalInputs<'a> {
    pub bars: &'a [Bar],
    pub rsi: &'a IndicatorSeries,
    pub macd: &'a MacdSeries,
    pub bollinger: &'a BollingerSeries,
    pub kdj: &'a KdjSeries,
    pub obv: &'a IndicatorSeries,
    pub williams: &'a IndicatorSeries,
    pub bias: &'a IndicatorSeries,
    pub volume: &'a VolumeProfile,
    pub ma: &'a MaSystem,
    pub levels: &'a [Level],
}

/// Extract the discrete signal set for the final bar. Indicators still in
/// their warm-up window simply contribute nothing.
pub fn extract_signals(inputs: &SignalInputs) -> Vec<Signal> {
    let bars = inputs.bars;
    if bars.is_empty() {
        return Vec::new();
    }
    let last = bars.len() - 1;
    let close = bars[last].close;
    let mut signals = Vec::new();
    let mut push = |kind, direction, strength| {
        signals.push(Signal {
            kind,
            direction,
            strength,
            index: last,
        });
    };

    // RSI zones.
    if let Some(rsi) = inputs.rsi.get(last) {
        if rsi < 30.0 {
            push(SignalKind::RsiExtreme, Direction::Bullish, Strength::Strong);
        } else if rsi < 40.0 {
            push(SignalKind::RsiLean, Direction::Bullish, Strength::Weak);
        } else if rsi > 70.0 {
            push(SignalKind::RsiExtreme, Direction::Bearish, Strength::Strong);
        } else if rsi > 60.0 {
            push(SignalKind::RsiLean, Direction::Bearish, Strength::Weak);
        }
    }

    // MACD: a histogram sign flip on the final bar is a cross; otherwise
    // the sign is trend confirmation.
    let histogram = inputs.macd.histogram.get(last);
    if let Some(hist) = histogram {
        let prev = last.checked_sub(1).and_then(|i| inputs.macd.histogram.get(i));
        match prev {
            Some(prev) if hist > 0.0 && prev <= 0.0 => {
                push(SignalKind::MacdCross, Direction::Bullish, Strength::Strong)
            }
            Some(prev) if hist < 0.0 && prev >= 0.0 => {
                push(SignalKind::MacdCross, Direction::Bearish, Strength::Strong)
            }
            _ if hist > 0.0 => push(SignalKind::MacdTrend, Direction::Bullish, Strength::Weak),
            _ if hist < 0.0 => push(SignalKind::MacdTrend, Direction::Bearish, Strength::Weak),
            _ => {}
        }
    }

    // Bollinger position.
    if let (Some(upper), Some(middle), Some(lower)) = (
        inputs.bollinger.upper.get(last),
        inputs.bollinger.middle.get(last),
        inputs.bollinger.lower.get(last),
    ) {
        if close < lower {
            push(SignalKind::BollingerBreakout, Direction::Bullish, Strength::Medium);
        } else if close < lower + (middle - lower) * 0.3 {
            push(SignalKind::BollingerTouch, Direction::Bullish, Strength::Weak);
        } else if close > upper {
            push(SignalKind::BollingerBreakout, Direction::Bearish, Strength::Medium);
        } else if close > upper - (upper - middle) * 0.3 {
            push(SignalKind::BollingerTouch, Direction::Bearish, Strength::Weak);
        }
    }

    // KDJ cross, then zones.
    if let (Some(k), Some(d)) = (inputs.kdj.k.get(last), inputs.kdj.d.get(last)) {
        let prev = last.checked_sub(1).map(|i| {
            (
                inputs.kdj.k.get(i).unwrap_or(50.0),
                inputs.kdj.d.get(i).unwrap_or(50.0),
            )
        });
        match prev {
            Some((pk, pd)) if k > d && pk <= pd => {
                push(SignalKind::KdjCross, Direction::Bullish, Strength::Strong)
            }
            Some((pk, pd)) if k < d && pk >= pd => {
                push(SignalKind::KdjCross, Direction::Bearish, Strength::Strong)
            }
            _ if k > KDJ_HIGH && d > KDJ_HIGH => {
                push(SignalKind::KdjExtreme, Direction::Bearish, Strength::Medium)
            }
            _ if k < KDJ_LOW && d < KDJ_LOW => {
                push(SignalKind::KdjExtreme, Direction::Bullish, Strength::Medium)
            }
            _ => {}
        }
    }

    // OBV confirming the price direction over a short window.
    if last >= 5 {
        if let (Some(obv_now), Some(obv_then)) = (inputs.obv.get(last), inputs.obv.get(last - 5)) {
            let price_then = bars[last - 5].close;
            if obv_now > obv_then && close > price_then {
                push(SignalKind::ObvConfirmation, Direction::Bullish, Strength::Weak);
            } else if obv_now < obv_then && close < price_then {
                push(SignalKind::ObvConfirmation, Direction::Bearish, Strength::Weak);
            }
        }
    }

    // Williams %R extremes.
    if let Some(wr) = inputs.williams.get(last) {
        if wr <= WILLIAMS_LOW {
            push(SignalKind::WilliamsExtreme, Direction::Bullish, Strength::Weak);
        } else if wr >= WILLIAMS_HIGH {
            push(SignalKind::WilliamsExtreme, Direction::Bearish, Strength::Weak);
        }
    }

    // BIAS stretch.
    if let Some(bias) = inputs.bias.get(last) {
        if bias <= -BIAS_STRETCH {
            push(SignalKind::BiasStretch, Direction::Bullish, Strength::Weak);
        } else if bias >= BIAS_STRETCH {
            push(SignalKind::BiasStretch, Direction::Bearish, Strength::Weak);
        }
    }

    // Volume surge in the bar's direction; dry-up while a decline stalls.
    if last >= 1 {
        let prev_close = bars[last - 1].close;
        if let Some(ratio) = inputs.volume.ratio.get(last) {
            if inputs.volume.anomalous[last] {
                if close > prev_close {
                    push(SignalKind::VolumeSurge, Direction::Bullish, Strength::Medium);
                } else if close < prev_close {
                    push(SignalKind::VolumeSurge, Direction::Bearish, Strength::Medium);
                }
            } else if ratio < VOLUME_DRY_RATIO
                && close < prev_close
                && matches!(histogram, Some(h) if h < 0.0)
            {
                // Selling pressure fading near the end of a decline.
                push(SignalKind::VolumeDryUp, Direction::Bullish, Strength::Weak);
            }
        }
    }

    // Moving-average stack, and the golden/death cross on the final bar.
    if let Some(alignment) = inputs.ma.alignment.get(last).copied().flatten() {
        let prev = last
            .checked_sub(1)
            .and_then(|i| inputs.ma.alignment.get(i).copied().flatten());
        match (alignment, prev) {
            (MaAlignment::BullishStack, Some(prev)) if prev != MaAlignment::BullishStack => {
                push(SignalKind::MaCross, Direction::Bullish, Strength::Strong)
            }
            (MaAlignment::BearishStack, Some(prev)) if prev != MaAlignment::BearishStack => {
                push(SignalKind::MaCross, Direction::Bearish, Strength::Strong)
            }
            (MaAlignment::BullishStack, _) => {
                push(SignalKind::MaAlignment, Direction::Bullish, Strength::Medium)
            }
            (MaAlignment::BearishStack, _) => {
                push(SignalKind::MaAlignment, Direction::Bearish, Strength::Medium)
            }
            (MaAlignment::Mixed, _) => {}
        }
    }

    // Over-stretched trailing move leans contrarian.
    if last >= TREND_STRETCH_LOOKBACK {
        let base = bars[last - TREND_STRETCH_LOOKBACK].close;
        if base > 0.0 {
            let change = (close - base) / base * 100.0;
            if change <= -TREND_STRETCH_PCT {
                push(SignalKind::TrendStretch, Direction::Bullish, Strength::Weak);
            } else if change >= TREND_STRETCH_PCT {
                push(SignalKind::TrendStretch, Direction::Bearish, Strength::Weak);
            }
        }
    }

    // Proximity to the nearest clustered levels.
    if close > 0.0 {
        if let Some(support) = nearest_support(inputs.levels, close) {
            if (close - support.price) / close * 100.0 < LEVEL_PROXIMITY_PCT {
                push(SignalKind::LevelProximity, Direction::Bullish, Strength::Weak);
            }
        }
        if let Some(resistance) = nearest_resistance(inputs.levels, close) {
            if (resistance.price - close) / close * 100.0 < LEVEL_PROXIMITY_PCT {
                push(SignalKind::LevelProximity, Direction::Bearish, Strength::Weak);
            }
        }
    }

    signals
}

// ============================================================
// WEIGHT POLICY
// ============================================================

#[inline]
fn direction_sign(direction: Direction) -> i32 {
    match direction {
        Direction::Bullish => 1,
        Direction::Neutral => 0,
        Direction::Bearish => -1,
    }
}

#[inline]
fn strength_weight(strength: Strength) -> i32 {
    match strength {
        Strength::Weak => 1,
        Strength::Medium => 2,
        Strength::Strong => 3,
        Strength::VeryStrong => 4,
    }
}

/// Signed weight of one extracted signal.
pub fn signal_weight(signal: &Signal) -> i32 {
    direction_sign(signal.direction) * strength_weight(signal.strength)
}

/// Signed weight of a divergence: oscillator divergences ±4, OBV ±2.
pub fn divergence_weight(event: &DivergenceEvent) -> i32 {
    let base = match event.indicator {
        IndicatorName::Macd | IndicatorName::Rsi => 4,
        IndicatorName::Obv => 2,
    };
    direction_sign(event.kind.direction()) * base
}

/// Signed weight of a pattern match. Pattern weights cap at ±3; neutral
/// patterns contribute nothing.
pub fn pattern_weight(pattern: &PatternMatch) -> i32 {
    direction_sign(pattern.direction) * strength_weight(pattern.strength).min(3)
}

/// Sum the documented weights over every input. Deterministic and free of
/// side effects.
pub fn composite_score(
    signals: &[Signal],
    divergences: &[DivergenceEvent],
    patterns: &[PatternMatch],
) -> i32 {
    signals.iter().map(signal_weight).sum::<i32>()
        + divergences.iter().map(divergence_weight).sum::<i32>()
        + patterns.iter().map(pattern_weight).sum::<i32>()
}

/// Recommendation tiers over the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Recommendation {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
}

impl Recommendation {
    /// `>= 6` strong buy, `3..=5` buy, `-2..=2` hold, `-5..=-3` sell,
    /// `<= -6` strong sell.
    pub fn from_score(score: i32) -> Self {
        match score {
            s if s >= 6 => Recommendation::StrongBuy,
            s if s >= 3 => Recommendation::Buy,
            s if s >= -2 => Recommendation::Hold,
            s if s >= -5 => Recommendation::Sell,
            _ => Recommendation::StrongSell,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Recommendation::StrongBuy => "strong_buy",
            Recommendation::Buy => "buy",
            Recommendation::Hold => "hold",
            Recommendation::Sell => "sell",
            Recommendation::StrongSell => "strong_sell",
        }
    }
}

// ============================================================
// TRADE PLAN
// ============================================================

/// ATR-derived entry/exit suggestion, tightened against the nearest
/// clustered levels.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct TradePlan {
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub risk_reward: Option<f64>,
}

/// Build a trade plan from the latest close, ATR, and level list.
/// `None` while the ATR is still undefined.
pub fn trade_plan(
    close: f64,
    atr: Option<f64>,
    atr_percent: Option<f64>,
    levels: &[Level],
) -> Option<TradePlan> {
    let atr = atr?;
    let atr_percent = atr_percent?;

    let multiplier = if atr_percent > 5.0 {
        2.5
    } else if atr_percent > 3.0 {
        2.0
    } else {
        1.5
    };

    let mut stop_loss = close - atr * multiplier;
    if let Some(support) = nearest_support(levels, close) {
        if stop_loss > support.price {
            stop_loss = support.price * 0.98;
        }
    }

    let mut take_profit = close + atr * multiplier * 2.5;
    if let Some(resistance) = nearest_resistance(levels, close) {
        if take_profit > resistance.price {
            take_profit = resistance.price * 0.98;
        }
    }

    let entry = close - atr * 0.5;
    let risk = close - stop_loss;
    let reward = take_profit - close;
    let risk_reward = (risk > 0.0).then(|| reward / risk);

    Some(TradePlan {
        entry,
        stop_loss,
        take_profit,
        risk_reward,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::divergence::DivergenceKind;
    use crate::levels::LevelKind;
    use crate::patterns::{PatternKind, PatternScope};

    fn signal(kind: SignalKind, direction: Direction, strength: Strength) -> Signal {
        Signal {
            kind,
            direction,
            strength,
            index: 0,
        }
    }

    #[test]
    fn signal_weights_follow_the_table() {
        let s = signal(SignalKind::RsiExtreme, Direction::Bullish, Strength::Strong);
        assert_eq!(signal_weight(&s), 3);
        let s = signal(SignalKind::MacdTrend, Direction::Bearish, Strength::Weak);
        assert_eq!(signal_weight(&s), -1);
        let s = signal(SignalKind::VolumeSurge, Direction::Neutral, Strength::Medium);
        assert_eq!(signal_weight(&s), 0);
    }

    #[test]
    fn divergence_weights_by_indicator() {
        let event = DivergenceEvent {
            kind: DivergenceKind::RegularBullish,
            indicator: IndicatorName::Macd,
            price_points: (3, 10),
            indicator_points: (3, 10),
        };
        assert_eq!(divergence_weight(&event), 4);
        let event = DivergenceEvent {
            indicator: IndicatorName::Rsi,
            kind: DivergenceKind::RegularBearish,
            ..event
        };
        assert_eq!(divergence_weight(&event), -4);
        let event = DivergenceEvent {
            indicator: IndicatorName::Obv,
            kind: DivergenceKind::HiddenBullish,
            ..event
        };
        assert_eq!(divergence_weight(&event), 2);
    }

    #[test]
    fn pattern_weights_cap_at_three() {
        let soldiers = PatternMatch {
            kind: PatternKind::ThreeWhiteSoldiers,
            scope: PatternScope::Candlestick,
            direction: Direction::Bullish,
            strength: Strength::VeryStrong,
            start_index: 0,
            end_index: 2,
        };
        assert_eq!(pattern_weight(&soldiers), 3);

        let doji = PatternMatch {
            kind: PatternKind::Doji,
            direction: Direction::Neutral,
            strength: Strength::Weak,
            ..soldiers
        };
        assert_eq!(pattern_weight(&doji), 0);

        let engulfing = PatternMatch {
            kind: PatternKind::BearishEngulfing,
            direction: Direction::Bearish,
            strength: Strength::Medium,
            ..soldiers
        };
        assert_eq!(pattern_weight(&engulfing), -2);
    }

    #[test]
    fn composite_is_the_exact_sum() {
        let signals = vec![
            signal(SignalKind::RsiExtreme, Direction::Bullish, Strength::Strong),
            signal(SignalKind::MacdCross, Direction::Bullish, Strength::Strong),
            signal(SignalKind::BollingerTouch, Direction::Bearish, Strength::Weak),
        ];
        let divergences = vec![DivergenceEvent {
            kind: DivergenceKind::RegularBullish,
            indicator: IndicatorName::Macd,
            price_points: (3, 10),
            indicator_points: (3, 10),
        }];
        let patterns = vec![PatternMatch {
            kind: PatternKind::MorningStar,
            scope: PatternScope::Candlestick,
            direction: Direction::Bullish,
            strength: Strength::Strong,
            start_index: 10,
            end_index: 12,
        }];
        // 3 + 3 - 1 + 4 + 3
        assert_eq!(composite_score(&signals, &divergences, &patterns), 12);
    }

    #[test]
    fn recommendation_tier_boundaries() {
        assert_eq!(Recommendation::from_score(7), Recommendation::StrongBuy);
        assert_eq!(Recommendation::from_score(6), Recommendation::StrongBuy);
        assert_eq!(Recommendation::from_score(5), Recommendation::Buy);
        assert_eq!(Recommendation::from_score(3), Recommendation::Buy);
        assert_eq!(Recommendation::from_score(2), Recommendation::Hold);
        assert_eq!(Recommendation::from_score(0), Recommendation::Hold);
        assert_eq!(Recommendation::from_score(-2), Recommendation::Hold);
        assert_eq!(Recommendation::from_score(-3), Recommendation::Sell);
        assert_eq!(Recommendation::from_score(-5), Recommendation::Sell);
        assert_eq!(Recommendation::from_score(-6), Recommendation::StrongSell);
    }

    #[test]
    fn trade_plan_needs_a_defined_atr() {
        assert!(trade_plan(100.0, None, None, &[]).is_none());
    }

    #[test]
    fn trade_plan_uses_atr_multiples() {
        // atr_percent 2% -> multiplier 1.5
        let plan = trade_plan(100.0, Some(2.0), Some(2.0), &[]).unwrap();
        assert!((plan.stop_loss - 97.0).abs() < 1e-9);
        assert!((plan.take_profit - 107.5).abs() < 1e-9);
        assert!((plan.entry - 99.0).abs() < 1e-9);
        assert!((plan.risk_reward.unwrap() - 2.5).abs() < 1e-9);
    }

    #[test]
    fn trade_plan_respects_levels() {
        let levels = [
            Level {
                price: 98.5,
                kind: LevelKind::RecentLow,
                confluence: 2,
                rank: 1,
            },
            Level {
                price: 103.0,
                kind: LevelKind::FibRetracement,
                confluence: 1,
                rank: 2,
            },
        ];
        let plan = trade_plan(100.0, Some(2.0), Some(2.0), &levels).unwrap();
        // Stop tightened under the 98.5 support, target capped under 103.
        assert!((plan.stop_loss - 98.5 * 0.98).abs() < 1e-9);
        assert!((plan.take_profit - 103.0 * 0.98).abs() < 1e-9);
    }
}
