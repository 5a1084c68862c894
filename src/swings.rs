//! Swing-point extraction: local extrema over a symmetric comparison
//! window, shared by the divergence detector, the support/resistance
//! calculator, and the chart pattern recognizer.

use crate::{AnalysisError, Result};

/// Whether a swing point is a local maximum or minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SwingKind {
    Peak,
    Trough,
}

/// A local extremum in a value series.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct SwingPoint {
    pub index: usize,
    pub value: f64,
    pub kind: SwingKind,
}

/// Find all swing points in `values` using a symmetric window of `window`
/// bars on each side.
///
/// An index qualifies as a peak (trough) when its value is strictly
/// greater (less) than every other value in the window, so flat runs
/// produce no swings. The first and last `window` indices can never
/// qualify. Results are ordered by index.
pub fn find_swings(values: &[f64], window: usize) -> Result<Vec<SwingPoint>> {
    if window == 0 {
        return Err(AnalysisError::InvalidValue("swing window must be > 0"));
    }
    if values.len() < 2 * window + 1 {
        return Ok(Vec::new());
    }

    let mut swings = Vec::new();
    for i in window..values.len() - window {
        let candidate = values[i];
        let neighbors = values[i - window..i]
            .iter()
            .chain(values[i + 1..=i + window].iter());

        let mut is_peak = true;
        let mut is_trough = true;
        for &n in neighbors {
            if candidate <= n {
                is_peak = false;
            }
            if candidate >= n {
                is_trough = false;
            }
            if !is_peak && !is_trough {
                break;
            }
        }

        if is_peak {
            swings.push(SwingPoint {
                index: i,
                value: candidate,
                kind: SwingKind::Peak,
            });
        } else if is_trough {
            swings.push(SwingPoint {
                index: i,
                value: candidate,
                kind: SwingKind::Trough,
            });
        }
    }
    Ok(swings)
}
