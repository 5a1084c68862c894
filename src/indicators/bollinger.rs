//! Bollinger Bands: SMA middle band with upper/lower bands offset by
//! `k` population standard deviations of the same window.

use super::ma::sma;
use crate::{AnalysisError, IndicatorSeries, Result};

/// Upper/middle/lower bands, aligned with the input.
#[derive(Debug, Clone)]
pub struct BollingerSeries {
    pub upper: IndicatorSeries,
    pub middle: IndicatorSeries,
    pub lower: IndicatorSeries,
}

/// Compute Bollinger Bands over `closes` with window `period` and band
/// width `k` standard deviations. Undefined until `period` bars exist.
pub fn bollinger(closes: &[f64], period: usize, k: f64) -> Result<BollingerSeries> {
    if period == 0 {
        return Err(AnalysisError::InvalidValue("bollinger period must be > 0"));
    }
    if !k.is_finite() || k <= 0.0 {
        return Err(AnalysisError::OutOfRange {
            field: "bb_k",
            value: k,
            min: 0.0,
            max: f64::INFINITY,
        });
    }

    let len = closes.len();
    let middle = sma(closes, period)?;
    let mut upper = vec![None; len];
    let mut lower = vec![None; len];

    for i in 0..len {
        if let Some(mean) = middle.get(i) {
            let window = &closes[i + 1 - period..=i];
            let variance =
                window.iter().map(|c| (c - mean) * (c - mean)).sum::<f64>() / period as f64;
            let offset = k * variance.sqrt();
            upper[i] = Some(mean + offset);
            lower[i] = Some(mean - offset);
        }
    }

    Ok(BollingerSeries {
        upper: IndicatorSeries::from_options(upper),
        middle,
        lower: IndicatorSeries::from_options(lower),
    })
}
