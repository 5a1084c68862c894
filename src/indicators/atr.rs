//! Average True Range — Wilder's smoothing over the true range
//! `max(high - low, |high - prev_close|, |low - prev_close|)`.

use crate::{AnalysisError, Bar, IndicatorSeries, Result};

/// Compute the ATR series over `bars` with the given period.
///
/// True ranges exist from index 1, so the ATR is defined from index
/// `period` (SMA seed over the first `period` true ranges, Wilder
/// smoothing after).
pub fn atr(bars: &[Bar], period: usize) -> Result<IndicatorSeries> {
    if period == 0 {
        return Err(AnalysisError::InvalidValue("atr period must be > 0"));
    }
    if bars.len() < period + 1 {
        return Ok(IndicatorSeries::undefined(bars.len()));
    }

    let true_ranges: Vec<f64> = bars
        .windows(2)
        .map(|w| {
            let (prev, curr) = (&w[0], &w[1]);
            let hl = curr.high - curr.low;
            let hc = (curr.high - prev.close).abs();
            let lc = (curr.low - prev.close).abs();
            hl.max(hc).max(lc)
        })
        .collect();

    let mut values = vec![None; bars.len()];
    let period_f = period as f64;
    let mut current: f64 = true_ranges[..period].iter().sum::<f64>() / period_f;
    values[period] = Some(current);
    for (i, &tr) in true_ranges.iter().enumerate().skip(period) {
        current = (current * (period_f - 1.0) + tr) / period_f;
        values[i + 1] = Some(current);
    }

    Ok(IndicatorSeries::from_options(values))
}

/// ATR as a percentage of the closing price at each index. Useful for
/// comparing volatility across instruments on different price scales.
pub fn atr_percent(bars: &[Bar], period: usize) -> Result<IndicatorSeries> {
    let base = atr(bars, period)?;
    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| match base.get(i) {
            Some(v) if bar.close > 0.0 => Some(v / bar.close * 100.0),
            _ => None,
        })
        .collect();
    Ok(IndicatorSeries::from_options(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Bar;

    fn bar(i: i64, open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            timestamp: i,
            open,
            high,
            low,
            close,
            volume: 1000.0,
        }
    }

    #[test]
    fn rejects_zero_period() {
        assert!(atr(&[], 0).is_err());
    }

    #[test]
    fn short_series_is_entirely_undefined() {
        let bars: Vec<Bar> = (0..10)
            .map(|i| bar(i, 100.0, 105.0, 95.0, 102.0))
            .collect();
        assert!(atr(&bars, 14).unwrap().is_all_undefined());
    }

    #[test]
    fn constant_range_converges_to_the_range() {
        let bars: Vec<Bar> = (0..40)
            .map(|i| {
                let base = 100.0 + i as f64 * 0.1;
                bar(i, base, base + 5.0, base - 5.0, base)
            })
            .collect();
        let series = atr(&bars, 14).unwrap();
        let last = series.last_defined().unwrap().1;
        assert!((last - 10.0).abs() < 1.0, "expected ATR near 10, got {last}");
    }

    #[test]
    fn gaps_widen_the_true_range() {
        let bars = vec![
            bar(0, 100.0, 105.0, 95.0, 95.0),
            // Gap up: |115 - 95| = 20 dominates the 7-point bar range.
            bar(1, 110.0, 115.0, 108.0, 112.0),
            bar(2, 112.0, 118.0, 110.0, 115.0),
            bar(3, 115.0, 120.0, 113.0, 118.0),
        ];
        let series = atr(&bars, 3).unwrap();
        let value = series.get(3).unwrap();
        assert!(value > 7.0, "ATR should reflect the gap, got {value}");
    }

    #[test]
    fn warmup_boundary() {
        let bars: Vec<Bar> = (0..20)
            .map(|i| bar(i, 100.0, 103.0, 97.0, 101.0))
            .collect();
        let series = atr(&bars, 14).unwrap();
        assert_eq!(series.get(13), None);
        assert!(series.get(14).is_some());
    }

    #[test]
    fn percent_variant_scales_by_close() {
        let bars: Vec<Bar> = (0..30)
            .map(|i| bar(i, 100.0, 102.0, 98.0, 100.0))
            .collect();
        let pct = atr_percent(&bars, 14).unwrap();
        let value = pct.last_defined().unwrap().1;
        assert!((value - 4.0).abs() < 0.5, "4-point range on 100 ≈ 4%, got {value}");
    }
}
