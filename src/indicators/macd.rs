//! Moving Average Convergence Divergence.
//!
//! Line = EMA(fast) − EMA(slow); signal = EMA of the line over
//! `signal_period`; histogram = line − signal wherever both are defined.

use super::ma::ema;
use crate::{AnalysisError, IndicatorSeries, Result};

/// MACD line, signal line, and histogram, all aligned with the input.
#[derive(Debug, Clone)]
pub struct MacdSeries {
    pub line: IndicatorSeries,
    pub signal: IndicatorSeries,
    pub histogram: IndicatorSeries,
}

/// Compute MACD over `closes` with the given EMA periods.
///
/// The line is defined from index `slow - 1`; the signal and histogram
/// from `slow + signal_period - 2`.
pub fn macd(closes: &[f64], fast: usize, slow: usize, signal_period: usize) -> Result<MacdSeries> {
    if fast == 0 || slow == 0 || signal_period == 0 {
        return Err(AnalysisError::InvalidValue("macd periods must be > 0"));
    }
    if fast >= slow {
        return Err(AnalysisError::InvalidValue(
            "macd fast period must be shorter than slow period",
        ));
    }

    let len = closes.len();
    let fast_ema = ema(closes, fast)?;
    let slow_ema = ema(closes, slow)?;

    let line_values: Vec<Option<f64>> = (0..len)
        .map(|i| match (fast_ema.get(i), slow_ema.get(i)) {
            (Some(f), Some(s)) => Some(f - s),
            _ => None,
        })
        .collect();
    let line = IndicatorSeries::from_options(line_values);

    // The defined portion of the line is a contiguous tail; run the signal
    // EMA over that tail and re-align it.
    let start = (0..len).find(|&i| line.get(i).is_some());
    let (signal, histogram) = match start {
        Some(start) => {
            let tail: Vec<f64> = (start..len).map(|i| line.get(i).unwrap()).collect();
            let tail_signal = ema(&tail, signal_period)?;
            let mut signal_values = vec![None; len];
            let mut histogram_values = vec![None; len];
            for (offset, value) in tail_signal.values().iter().enumerate() {
                if let Some(s) = value {
                    signal_values[start + offset] = Some(*s);
                    histogram_values[start + offset] = Some(tail[offset] - s);
                }
            }
            (
                IndicatorSeries::from_options(signal_values),
                IndicatorSeries::from_options(histogram_values),
            )
        }
        None => (
            IndicatorSeries::undefined(len),
            IndicatorSeries::undefined(len),
        ),
    };

    Ok(MacdSeries {
        line,
        signal,
        histogram,
    })
}
