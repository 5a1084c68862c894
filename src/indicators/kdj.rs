//! KDJ stochastic oscillator.
//!
//! RSV is the raw stochastic over the trailing window; K and D are
//! recursive one-third smoothings seeded at 50; J = 3K − 2D amplifies the
//! divergence between them.

use crate::{AnalysisError, Bar, IndicatorSeries, Result};

/// K, D, and J lines, defined from the first bar.
#[derive(Debug, Clone)]
pub struct KdjSeries {
    pub k: IndicatorSeries,
    pub d: IndicatorSeries,
    pub j: IndicatorSeries,
}

/// Compute KDJ over `bars` with window `period`.
///
/// The window is truncated at the start of the series, so the lines are
/// defined from index 0. A zero-range window yields an RSV of 50 (the
/// neutral seed) rather than a division fault.
pub fn kdj(bars: &[Bar], period: usize) -> Result<KdjSeries> {
    if period == 0 {
        return Err(AnalysisError::InvalidValue("kdj period must be > 0"));
    }

    let len = bars.len();
    let mut k_values = Vec::with_capacity(len);
    let mut d_values = Vec::with_capacity(len);
    let mut j_values = Vec::with_capacity(len);

    let mut k = 50.0;
    let mut d = 50.0;
    for i in 0..len {
        let start = (i + 1).saturating_sub(period);
        let window = &bars[start..=i];
        let highest = window.iter().map(|b| b.high).fold(f64::MIN, f64::max);
        let lowest = window.iter().map(|b| b.low).fold(f64::MAX, f64::min);
        let range = highest - lowest;

        let rsv = if range > 0.0 {
            (bars[i].close - lowest) / range * 100.0
        } else {
            50.0
        };

        k = (2.0 * k + rsv) / 3.0;
        d = (2.0 * d + k) / 3.0;
        k_values.push(Some(k));
        d_values.push(Some(d));
        j_values.push(Some(3.0 * k - 2.0 * d));
    }

    Ok(KdjSeries {
        k: IndicatorSeries::from_options(k_values),
        d: IndicatorSeries::from_options(d_values),
        j: IndicatorSeries::from_options(j_values),
    })
}
