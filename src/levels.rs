//! Support/resistance calculator: recent-range extremes, Fibonacci
//! retracement/extension levels off the latest significant swing, and
//! round-number levels, clustered by proximity and ranked by confluence.

use crate::{AnalysisError, Bar, Result};

/// Fibonacci retracement ratios applied inside the swing.
const FIB_RETRACEMENTS: [f64; 5] = [0.236, 0.382, 0.5, 0.618, 0.786];
/// Fibonacci extension ratios projected beyond the swing.
const FIB_EXTENSIONS: [f64; 3] = [1.272, 1.618, 2.0];

/// Method that produced a level candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum LevelKind {
    RecentHigh,
    RecentLow,
    FibRetracement,
    FibExtension,
    RoundNumber,
}

impl LevelKind {
    /// Dominance order when a cluster mixes methods.
    fn priority(self) -> u8 {
        match self {
            LevelKind::RecentHigh | LevelKind::RecentLow => 0,
            LevelKind::FibRetracement => 1,
            LevelKind::FibExtension => 2,
            LevelKind::RoundNumber => 3,
        }
    }
}

/// A ranked support/resistance cluster.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Level {
    pub price: f64,
    /// Dominant method among the cluster's members.
    pub kind: LevelKind,
    /// Number of underlying methods agreeing on this price area.
    pub confluence: usize,
    /// 1 is the strongest level.
    pub rank: usize,
}

/// Lookback and clustering parameters.
#[derive(Debug, Clone, Copy)]
pub struct LevelParams {
    pub lookback: usize,
    /// Relative proximity (fraction of price) that merges candidates.
    pub tolerance: f64,
}

/// Compute the ranked level list for `bars`.
///
/// Candidates inside `tolerance` of each other merge into one cluster;
/// rank improves with method confluence and with proximity to the current
/// close. Returns an empty list for an empty series.
pub fn support_resistance(bars: &[Bar], params: &LevelParams) -> Result<Vec<Level>> {
    if params.lookback == 0 {
        return Err(AnalysisError::InvalidValue("sr lookback must be > 0"));
    }
    if !(0.0..1.0).contains(&params.tolerance) || params.tolerance == 0.0 {
        return Err(AnalysisError::OutOfRange {
            field: "sr tolerance",
            value: params.tolerance,
            min: 0.0,
            max: 1.0,
        });
    }
    if bars.is_empty() {
        return Ok(Vec::new());
    }

    let window = &bars[bars.len().saturating_sub(params.lookback)..];
    let current = bars[bars.len() - 1].close;

    let mut high = f64::MIN;
    let mut low = f64::MAX;
    let (mut high_at, mut low_at) = (0, 0);
    for (i, bar) in window.iter().enumerate() {
        if bar.high > high {
            high = bar.high;
            high_at = i;
        }
        if bar.low < low {
            low = bar.low;
            low_at = i;
        }
    }

    let mut candidates: Vec<(f64, LevelKind)> =
        vec![(high, LevelKind::RecentHigh), (low, LevelKind::RecentLow)];

    // Fibonacci off the most recent significant swing: the later extremum
    // decides the swing direction. A zero-range window is degenerate and
    // contributes no fib levels.
    let range = high - low;
    if range > 0.0 {
        if high_at < low_at {
            // Downswing high -> low: retrace up from the low, extend below it.
            for r in FIB_RETRACEMENTS {
                candidates.push((low + range * r, LevelKind::FibRetracement));
            }
            for e in FIB_EXTENSIONS {
                candidates.push((high - range * e, LevelKind::FibExtension));
            }
        } else {
            // Upswing low -> high: retrace down from the high, extend above it.
            for r in FIB_RETRACEMENTS {
                candidates.push((high - range * r, LevelKind::FibRetracement));
            }
            for e in FIB_EXTENSIONS {
                candidates.push((low + range * e, LevelKind::FibExtension));
            }
        }
    }

    let step = round_step(current);
    let floor = (current / step).floor() * step;
    candidates.push((floor, LevelKind::RoundNumber));
    candidates.push((floor + step, LevelKind::RoundNumber));

    candidates.retain(|(price, _)| price.is_finite() && *price > 0.0);
    candidates.sort_by(|a, b| a.0.total_cmp(&b.0));

    // Single pass over price-sorted candidates, merging neighbors inside
    // the tolerance band.
    let mut clusters: Vec<Vec<(f64, LevelKind)>> = Vec::new();
    for candidate in candidates {
        match clusters.last_mut() {
            Some(cluster) => {
                let mean = cluster.iter().map(|(p, _)| p).sum::<f64>() / cluster.len() as f64;
                if candidate.0 - mean <= params.tolerance * mean {
                    cluster.push(candidate);
                } else {
                    clusters.push(vec![candidate]);
                }
            }
            None => clusters.push(vec![candidate]),
        }
    }

    let mut levels: Vec<Level> = clusters
        .into_iter()
        .map(|members| {
            let price = members.iter().map(|(p, _)| p).sum::<f64>() / members.len() as f64;
            let kind = members
                .iter()
                .map(|(_, k)| *k)
                .min_by_key(|k| k.priority())
                .unwrap();
            Level {
                price,
                kind,
                confluence: members.len(),
                rank: 0,
            }
        })
        .collect();

    levels.sort_by(|a, b| {
        b.confluence.cmp(&a.confluence).then(
            (a.price - current)
                .abs()
                .total_cmp(&(b.price - current).abs()),
        )
    });
    for (i, level) in levels.iter_mut().enumerate() {
        level.rank = i + 1;
    }
    Ok(levels)
}

/// Closest level strictly below `price`.
pub fn nearest_support(levels: &[Level], price: f64) -> Option<&Level> {
    levels
        .iter()
        .filter(|l| l.price < price)
        .max_by(|a, b| a.price.total_cmp(&b.price))
}

/// Closest level strictly above `price`.
pub fn nearest_resistance(levels: &[Level], price: f64) -> Option<&Level> {
    levels
        .iter()
        .filter(|l| l.price > price)
        .min_by(|a, b| a.price.total_cmp(&b.price))
}

/// Round-number increment appropriate to the price's magnitude.
fn round_step(price: f64) -> f64 {
    if price >= 10_000.0 {
        100.0
    } else if price >= 1_000.0 {
        50.0
    } else if price >= 100.0 {
        10.0
    } else if price >= 20.0 {
        5.0
    } else if price >= 1.0 {
        1.0
    } else {
        0.1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAMS: LevelParams = LevelParams {
        lookback: 60,
        tolerance: 0.01,
    };

    fn bar(i: i64, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            timestamp: i,
            open: close,
            high,
            low,
            close,
            volume: 1000.0,
        }
    }

    /// Rally from 100 to 150, pulling back to 130.
    fn upswing_bars() -> Vec<Bar> {
        let mut bars: Vec<Bar> = (0..25)
            .map(|i| {
                let base = 100.0 + i as f64 * 2.0;
                bar(i, base + 1.0, base - 1.0, base)
            })
            .collect();
        for i in 25..30 {
            let base = 148.0 - (i - 25) as f64 * 4.0;
            bars.push(bar(i as i64, base + 1.0, base - 1.0, base));
        }
        bars
    }

    #[test]
    fn rejects_bad_parameters() {
        let bars = upswing_bars();
        assert!(support_resistance(&bars, &LevelParams { lookback: 0, tolerance: 0.01 }).is_err());
        assert!(support_resistance(&bars, &LevelParams { lookback: 60, tolerance: 0.0 }).is_err());
        assert!(support_resistance(&bars, &LevelParams { lookback: 60, tolerance: 1.0 }).is_err());
    }

    #[test]
    fn empty_series_yields_no_levels() {
        assert!(support_resistance(&[], &PARAMS).unwrap().is_empty());
    }

    #[test]
    fn recent_extremes_are_present() {
        let bars = upswing_bars();
        let levels = support_resistance(&bars, &PARAMS).unwrap();
        let top = levels.iter().map(|l| l.price).fold(f64::MIN, f64::max);
        let bottom = levels.iter().map(|l| l.price).fold(f64::MAX, f64::min);
        assert!(top >= 149.0, "recent high missing, max level {top}");
        assert!(bottom <= 99.0 + 1.0, "recent low missing, min level {bottom}");
    }

    #[test]
    fn ranks_are_dense_from_one() {
        let bars = upswing_bars();
        let levels = support_resistance(&bars, &PARAMS).unwrap();
        let mut ranks: Vec<usize> = levels.iter().map(|l| l.rank).collect();
        ranks.sort_unstable();
        assert_eq!(ranks, (1..=levels.len()).collect::<Vec<_>>());
    }

    #[test]
    fn confluence_outranks_distance() {
        let bars = upswing_bars();
        let levels = support_resistance(&bars, &PARAMS).unwrap();
        for pair in levels.windows(2) {
            assert!(
                pair[0].confluence >= pair[1].confluence
                    || pair[0].rank < pair[1].rank
            );
        }
        if let Some(top) = levels.iter().find(|l| l.rank == 1) {
            assert!(top.confluence >= levels.iter().map(|l| l.confluence).max().unwrap());
        }
    }

    #[test]
    fn support_and_resistance_straddle_the_close() {
        let bars = upswing_bars();
        let close = bars.last().unwrap().close;
        let levels = support_resistance(&bars, &PARAMS).unwrap();
        let support = nearest_support(&levels, close).unwrap();
        let resistance = nearest_resistance(&levels, close).unwrap();
        assert!(support.price < close);
        assert!(resistance.price > close);
    }

    #[test]
    fn flat_series_still_produces_round_numbers() {
        let bars: Vec<Bar> = (0..30).map(|i| bar(i, 100.0, 100.0, 100.0)).collect();
        let levels = support_resistance(&bars, &PARAMS).unwrap();
        assert!(!levels.is_empty());
        assert!(levels
            .iter()
            .any(|l| l.kind == LevelKind::RoundNumber || l.confluence > 1));
    }

    #[test]
    fn round_step_scales_with_magnitude() {
        assert_eq!(round_step(12_500.0), 100.0);
        assert_eq!(round_step(2_400.0), 50.0);
        assert_eq!(round_step(450.0), 10.0);
        assert_eq!(round_step(45.0), 5.0);
        assert_eq!(round_step(7.0), 1.0);
        assert_eq!(round_step(0.4), 0.1);
    }
}
