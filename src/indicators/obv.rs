//! On-Balance Volume: a single forward scan producing an aligned output,
//! seeded at 0 on the first bar. Adds volume on up-closes, subtracts on
//! down-closes, unchanged on flat closes.

use crate::{Bar, IndicatorSeries};

/// Compute the OBV series. Defined from the first bar; an empty input
/// yields an empty series.
pub fn obv(bars: &[Bar]) -> IndicatorSeries {
    let mut values = Vec::with_capacity(bars.len());
    let mut total = 0.0;
    for (i, bar) in bars.iter().enumerate() {
        if i > 0 {
            let prev_close = bars[i - 1].close;
            if bar.close > prev_close {
                total += bar.volume;
            } else if bar.close < prev_close {
                total -= bar.volume;
            }
        }
        values.push(Some(total));
    }
    IndicatorSeries::from_options(values)
}
