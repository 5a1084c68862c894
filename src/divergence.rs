//! Divergence detection: price extrema compared against an oscillator at
//! the same indices. Indicator-agnostic; the engine runs it against RSI,
//! the MACD line, and OBV.

use crate::swings::{find_swings, SwingKind};
use crate::{AnalysisError, Direction, IndicatorSeries, Result};

/// Relative tolerance below which a price or indicator leg counts as flat
/// and the pair reports nothing.
const SLOPE_EPSILON: f64 = 1e-4;

/// The four price-vs-oscillator disagreement shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DivergenceKind {
    /// Lower price trough, higher indicator trough: reversal up.
    RegularBullish,
    /// Higher price peak, lower indicator peak: reversal down.
    RegularBearish,
    /// Higher price trough, lower indicator trough: continuation up.
    HiddenBullish,
    /// Lower price peak, higher indicator peak: continuation down.
    HiddenBearish,
}

impl DivergenceKind {
    pub fn direction(self) -> Direction {
        match self {
            DivergenceKind::RegularBullish | DivergenceKind::HiddenBullish => Direction::Bullish,
            DivergenceKind::RegularBearish | DivergenceKind::HiddenBearish => Direction::Bearish,
        }
    }
}

/// Which oscillator the divergence was measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum IndicatorName {
    Rsi,
    Macd,
    Obv,
}

/// A detected divergence between two same-kind price extrema.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct DivergenceEvent {
    pub kind: DivergenceKind,
    pub indicator: IndicatorName,
    /// Bar indices of the paired price extrema (earlier, later).
    pub price_points: (usize, usize),
    /// Bar indices at which the indicator was sampled (earlier, later).
    pub indicator_points: (usize, usize),
}

/// Extremum-pairing parameters.
#[derive(Debug, Clone, Copy)]
pub struct DivergenceParams {
    /// Symmetric comparison window for swing extraction.
    pub window: usize,
    /// Minimum bar distance between paired extrema.
    pub min_distance: usize,
    /// Maximum number of events returned, most recent first.
    pub max_count: usize,
}

/// Detect divergences between `closes` and `indicator`.
///
/// Consecutive same-kind extrema at least `min_distance` bars apart are
/// paired; pairs where either leg is flat within a relative epsilon are
/// skipped. Events are returned most recent first, capped at `max_count`.
/// Deterministic: identical inputs always produce identical events.
pub fn detect_divergences(
    closes: &[f64],
    indicator: &IndicatorSeries,
    name: IndicatorName,
    params: &DivergenceParams,
) -> Result<Vec<DivergenceEvent>> {
    if params.max_count == 0 {
        return Err(AnalysisError::InvalidValue(
            "divergence max_count must be > 0",
        ));
    }
    let swings = find_swings(closes, params.window)?;

    let mut events = Vec::new();
    for kind in [SwingKind::Trough, SwingKind::Peak] {
        let same: Vec<_> = swings.iter().filter(|s| s.kind == kind).collect();
        for pair in same.windows(2) {
            let (first, second) = (pair[0], pair[1]);
            if second.index - first.index < params.min_distance {
                continue;
            }
            let (Some(ind_first), Some(ind_second)) =
                (indicator.get(first.index), indicator.get(second.index))
            else {
                continue;
            };

            if is_flat(first.value, second.value) || is_flat(ind_first, ind_second) {
                continue;
            }
            let price_up = second.value > first.value;
            let ind_up = ind_second > ind_first;
            if price_up == ind_up {
                continue;
            }

            let divergence = match (kind, price_up) {
                (SwingKind::Trough, false) => DivergenceKind::RegularBullish,
                (SwingKind::Trough, true) => DivergenceKind::HiddenBullish,
                (SwingKind::Peak, true) => DivergenceKind::RegularBearish,
                (SwingKind::Peak, false) => DivergenceKind::HiddenBearish,
            };
            events.push(DivergenceEvent {
                kind: divergence,
                indicator: name,
                price_points: (first.index, second.index),
                indicator_points: (first.index, second.index),
            });
        }
    }

    events.sort_by(|a, b| b.price_points.1.cmp(&a.price_points.1));
    events.truncate(params.max_count);
    Ok(events)
}

#[inline]
fn is_flat(a: f64, b: f64) -> bool {
    (b - a).abs() <= SLOPE_EPSILON * a.abs().max(b.abs())
}
