//! BIAS: percentage deviation of the close from its own moving average.

use super::ma::sma;
use crate::{IndicatorSeries, Result};

/// Compute `(close - SMA(period)) / SMA(period) * 100`, aligned with the
/// input. Undefined while the SMA is undefined or zero.
pub fn bias(closes: &[f64], period: usize) -> Result<IndicatorSeries> {
    let average = sma(closes, period)?;
    let values = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| match average.get(i) {
            Some(mean) if mean != 0.0 => Some((close - mean) / mean * 100.0),
            _ => None,
        })
        .collect();
    Ok(IndicatorSeries::from_options(values))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_period() {
        assert!(bias(&[1.0], 0).is_err());
    }

    #[test]
    fn flat_closes_have_zero_bias() {
        let closes = vec![100.0; 10];
        let series = bias(&closes, 6).unwrap();
        assert_eq!(series.get(9), Some(0.0));
    }

    #[test]
    fn close_above_average_is_positive() {
        let mut closes = vec![100.0; 9];
        closes.push(110.0);
        let series = bias(&closes, 6).unwrap();
        let value = series.get(9).unwrap();
        assert!(value > 0.0, "close above the mean must be positive, got {value}");
    }

    #[test]
    fn hand_computed_value() {
        // Window [100 x5, 112] => SMA = 102; (112 - 102) / 102 * 100.
        let closes = vec![100.0, 100.0, 100.0, 100.0, 100.0, 112.0];
        let series = bias(&closes, 6).unwrap();
        let value = series.get(5).unwrap();
        assert!((value - 10.0 / 102.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn zero_average_is_undefined() {
        let closes = vec![0.0; 8];
        let series = bias(&closes, 6).unwrap();
        assert_eq!(series.get(7), None);
    }
}
