//! Relative Strength Index — Wilder's smoothing.
//!
//! Gains and losses are averaged with an SMA seed over the first `period`
//! deltas, then smoothed with factor `1/period`:
//!
//! ```text
//! avg_gain = (prev_avg_gain * (period - 1) + gain) / period
//! avg_loss = (prev_avg_loss * (period - 1) + loss) / period
//! RSI      = 100 - 100 / (1 + avg_gain / avg_loss)
//! ```
//!
//! A zero average loss yields exactly 100.0 rather than a division fault.

use crate::{AnalysisError, IndicatorSeries, Result};

/// Compute the RSI series for `closes` over `period`.
///
/// The first `period` entries are undefined (one delta per close pair,
/// `period` deltas consumed by the seed). A series shorter than
/// `period + 1` closes is entirely undefined.
pub fn rsi(closes: &[f64], period: usize) -> Result<IndicatorSeries> {
    if period == 0 {
        return Err(AnalysisError::InvalidValue("rsi period must be > 0"));
    }
    if closes.len() < period + 1 {
        return Ok(IndicatorSeries::undefined(closes.len()));
    }

    let mut values = vec![None; closes.len()];
    let period_f = period as f64;

    // SMA seed over the first `period` deltas.
    let (mut avg_gain, mut avg_loss) = closes[..=period]
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold((0.0, 0.0), |(g, l), d| {
            if d > 0.0 {
                (g + d, l)
            } else {
                (g, l - d)
            }
        });
    avg_gain /= period_f;
    avg_loss /= period_f;
    values[period] = Some(rsi_value(avg_gain, avg_loss));

    for i in period + 1..closes.len() {
        let delta = closes[i] - closes[i - 1];
        let gain = delta.max(0.0);
        let loss = (-delta).max(0.0);
        avg_gain = (avg_gain * (period_f - 1.0) + gain) / period_f;
        avg_loss = (avg_loss * (period_f - 1.0) + loss) / period_f;
        values[i] = Some(rsi_value(avg_gain, avg_loss));
    }

    Ok(IndicatorSeries::from_options(values))
}

/// Zero loss (including a fully flat window) maps to 100.0.
#[inline]
fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
