//! Volume analysis: rolling average volume, the ratio of each bar's
//! volume to that average, and anomaly flags for ratios beyond a
//! configured multiple.

use super::ma::sma;
use crate::{AnalysisError, IndicatorSeries, Result};

/// Rolling volume statistics, aligned with the input.
#[derive(Debug, Clone)]
pub struct VolumeProfile {
    pub average: IndicatorSeries,
    /// Current volume / rolling average volume.
    pub ratio: IndicatorSeries,
    /// True where the ratio exceeds the configured surge multiple.
    pub anomalous: Vec<bool>,
}

/// Compute the volume profile over `volumes` with window `period`,
/// flagging bars whose ratio exceeds `surge_ratio`.
pub fn volume_profile(volumes: &[f64], period: usize, surge_ratio: f64) -> Result<VolumeProfile> {
    if !surge_ratio.is_finite() || surge_ratio <= 0.0 {
        return Err(AnalysisError::OutOfRange {
            field: "volume_surge_ratio",
            value: surge_ratio,
            min: 0.0,
            max: f64::INFINITY,
        });
    }

    let average = sma(volumes, period)?;
    let ratio_values: Vec<Option<f64>> = volumes
        .iter()
        .enumerate()
        .map(|(i, &v)| match average.get(i) {
            // Zero average volume (a dead window) is degenerate: report a
            // neutral ratio of 1 instead of dividing by zero.
            Some(avg) if avg > 0.0 => Some(v / avg),
            Some(_) => Some(1.0),
            None => None,
        })
        .collect();

    let anomalous = ratio_values
        .iter()
        .map(|r| matches!(r, Some(v) if *v > surge_ratio))
        .collect();

    Ok(VolumeProfile {
        average,
        ratio: IndicatorSeries::from_options(ratio_values),
        anomalous,
    })
}
