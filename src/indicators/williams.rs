//! Williams %R: the close's position inside the trailing high/low range,
//! scaled to [-100, 0].

use crate::{AnalysisError, Bar, IndicatorSeries, Result};

/// Compute Williams %R over `bars` with window `period`.
///
/// `(highest_high - close) / (highest_high - lowest_low) * -100`, defined
/// from index `period - 1`. A zero-range window yields 0.0 rather than a
/// division fault.
pub fn williams_r(bars: &[Bar], period: usize) -> Result<IndicatorSeries> {
    if period == 0 {
        return Err(AnalysisError::InvalidValue(
            "williams %r period must be > 0",
        ));
    }
    if bars.len() < period {
        return Ok(IndicatorSeries::undefined(bars.len()));
    }

    let mut values = vec![None; bars.len()];
    for i in period - 1..bars.len() {
        let window = &bars[i + 1 - period..=i];
        let highest = window.iter().map(|b| b.high).fold(f64::MIN, f64::max);
        let lowest = window.iter().map(|b| b.low).fold(f64::MAX, f64::min);
        let range = highest - lowest;
        values[i] = Some(if range > 0.0 {
            (highest - bars[i].close) / range * -100.0
        } else {
            0.0
        });
    }

    Ok(IndicatorSeries::from_options(values))
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn rejects_zero_period() {
        assert!(williams_r(&[], 0).is_err());
    }

    #[test]
    fn bounded_in_minus_100_to_0() {
        let bars: Vec<Bar> = (0..40)
            .map(|i| {
                let base = 100.0 + (i as f64 * 0.8).sin() * 10.0;
                bar(i, base + 3.0, base - 3.0, base)
            })
            .collect();
        let series = williams_r(&bars, 14).unwrap();
        for i in 0..40 {
            if let Some(v) = series.get(i) {
                assert!((-100.0..=0.0).contains(&v), "%R {v} out of range");
            }
        }
    }

    #[test]
    fn close_at_window_high_is_zero() {
        let mut bars: Vec<Bar> = (0..14).map(|i| bar(i, 100.0, 90.0, 95.0)).collect();
        bars.push(bar(14, 110.0, 95.0, 110.0));
        let series = williams_r(&bars, 14).unwrap();
        assert_eq!(series.get(14), Some(0.0));
    }

    #[test]
    fn close_at_window_low_is_minus_100() {
        let mut bars: Vec<Bar> = (0..14).map(|i| bar(i, 100.0, 90.0, 95.0)).collect();
        bars.push(bar(14, 100.0, 80.0, 80.0));
        let series = williams_r(&bars, 14).unwrap();
        assert_eq!(series.get(14), Some(-100.0));
    }

    #[test]
    fn flat_window_yields_zero_without_fault() {
        let bars: Vec<Bar> = (0..20).map(|i| bar(i, 100.0, 100.0, 100.0)).collect();
        let series = williams_r(&bars, 14).unwrap();
        for i in 13..20 {
            assert_eq!(series.get(i), Some(0.0));
        }
    }

    #[test]
    fn warmup_window_is_undefined() {
        let bars: Vec<Bar> = (0..20).map(|i| bar(i, 101.0, 99.0, 100.0)).collect();
        let series = williams_r(&bars, 14).unwrap();
        assert_eq!(series.get(12), None);
        assert!(series.get(13).is_some());
    }
}
