//! Chart pattern recognizer: geometric templates over the swing-point
//! sequence of a trailing window.

use super::{PatternKind, PatternMatch};
use crate::swings::{find_swings, SwingKind, SwingPoint};
use crate::{AnalysisError, Bar, Direction, Result};

/// Scan the trailing `lookback` bars for chart patterns.
///
/// Swings are extracted from closes with a symmetric `swing_window`;
/// `tolerance` is the relative price tolerance for "near-equal" and
/// "materially different" comparisons. Matches carry absolute bar
/// indices.
pub fn scan_chart(
    bars: &[Bar],
    lookback: usize,
    swing_window: usize,
    tolerance: f64,
) -> Result<Vec<PatternMatch>> {
    if lookback == 0 {
        return Err(AnalysisError::InvalidValue("chart lookback must be > 0"));
    }
    if !(tolerance > 0.0 && tolerance < 1.0) {
        return Err(AnalysisError::OutOfRange {
            field: "pattern_tolerance",
            value: tolerance,
            min: 0.0,
            max: 1.0,
        });
    }

    let offset = bars.len().saturating_sub(lookback);
    let closes: Vec<f64> = bars[offset..].iter().map(|b| b.close).collect();
    let mut swings = find_swings(&closes, swing_window)?;
    for swing in &mut swings {
        swing.index += offset;
    }

    let mut matches = Vec::new();
    scan_double_extremes(&swings, tolerance, &mut matches);
    scan_head_and_shoulders(&swings, tolerance, &mut matches);
    if let Some(triangle) = classify_triangle(&swings, tolerance) {
        matches.push(triangle);
    }
    matches.sort_by_key(|m| m.end_index);
    Ok(matches)
}

#[inline]
fn near_equal(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance * a.abs().max(b.abs())
}

/// Double top: two near-equal peaks around a materially lower trough.
/// Double bottom is the mirror.
fn scan_double_extremes(swings: &[SwingPoint], tolerance: f64, out: &mut Vec<PatternMatch>) {
    for triple in swings.windows(3) {
        let [first, middle, second] = [triple[0], triple[1], triple[2]];
        match (first.kind, middle.kind, second.kind) {
            (SwingKind::Peak, SwingKind::Trough, SwingKind::Peak) => {
                let peaks_match = near_equal(first.value, second.value, tolerance);
                let valley_is_deep =
                    first.value.min(second.value) - middle.value > tolerance * first.value;
                if peaks_match && valley_is_deep {
                    out.push(chart_match(PatternKind::DoubleTop, Direction::Bearish, first, second));
                }
            }
            (SwingKind::Trough, SwingKind::Peak, SwingKind::Trough) => {
                let troughs_match = near_equal(first.value, second.value, tolerance);
                let peak_is_high =
                    middle.value - first.value.max(second.value) > tolerance * middle.value;
                if troughs_match && peak_is_high {
                    out.push(chart_match(
                        PatternKind::DoubleBottom,
                        Direction::Bullish,
                        first,
                        second,
                    ));
                }
            }
            _ => {}
        }
    }
}

/// Head-and-shoulders: five alternating swings whose middle extremum
/// clears both near-equal flanking extrema by more than the tolerance.
fn scan_head_and_shoulders(swings: &[SwingPoint], tolerance: f64, out: &mut Vec<PatternMatch>) {
    for five in swings.windows(5) {
        let kinds: Vec<SwingKind> = five.iter().map(|s| s.kind).collect();
        let (left, head, right) = (five[0], five[2], five[4]);
        if kinds
            == [
                SwingKind::Peak,
                SwingKind::Trough,
                SwingKind::Peak,
                SwingKind::Trough,
                SwingKind::Peak,
            ]
        {
            let head_clears = head.value - left.value > tolerance * head.value
                && head.value - right.value > tolerance * head.value;
            if head_clears && near_equal(left.value, right.value, tolerance) {
                out.push(chart_match(
                    PatternKind::HeadAndShoulders,
                    Direction::Bearish,
                    left,
                    right,
                ));
            }
        } else if kinds
            == [
                SwingKind::Trough,
                SwingKind::Peak,
                SwingKind::Trough,
                SwingKind::Peak,
                SwingKind::Trough,
            ]
        {
            let head_clears = left.value - head.value > tolerance * left.value
                && right.value - head.value > tolerance * right.value;
            if head_clears && near_equal(left.value, right.value, tolerance) {
                out.push(chart_match(
                    PatternKind::InverseHeadAndShoulders,
                    Direction::Bullish,
                    left,
                    right,
                ));
            }
        }
    }
}

/// Triangles: converging upper/lower envelopes over the last swings.
/// Classified by which envelope is flat versus sloped.
fn classify_triangle(swings: &[SwingPoint], tolerance: f64) -> Option<PatternMatch> {
    // Use the most recent swings; need at least two per envelope.
    let tail = &swings[swings.len().saturating_sub(6)..];
    let peaks: Vec<SwingPoint> = tail
        .iter()
        .filter(|s| s.kind == SwingKind::Peak)
        .copied()
        .collect();
    let troughs: Vec<SwingPoint> = tail
        .iter()
        .filter(|s| s.kind == SwingKind::Trough)
        .copied()
        .collect();
    if peaks.len() < 2 || troughs.len() < 2 {
        return None;
    }

    let upper = envelope_drift(&peaks)?;
    let lower = envelope_drift(&troughs)?;

    let upper_flat = upper.abs() <= tolerance;
    let lower_flat = lower.abs() <= tolerance;

    let kind = if upper_flat && lower > tolerance {
        PatternKind::AscendingTriangle
    } else if lower_flat && upper < -tolerance {
        PatternKind::DescendingTriangle
    } else if upper < -tolerance && lower > tolerance {
        PatternKind::SymmetricTriangle
    } else {
        return None;
    };

    let direction = match kind {
        PatternKind::AscendingTriangle => Direction::Bullish,
        PatternKind::DescendingTriangle => Direction::Bearish,
        _ => Direction::Neutral,
    };
    let start = tail.first()?;
    let end = tail.last()?;
    Some(chart_match(kind, direction, *start, *end))
}

/// Relative drift of an envelope from its first to its last swing.
fn envelope_drift(points: &[SwingPoint]) -> Option<f64> {
    let first = points.first()?;
    let last = points.last()?;
    if first.value.abs() <= f64::EPSILON {
        return None;
    }
    Some((last.value - first.value) / first.value)
}

fn chart_match(
    kind: PatternKind,
    direction: Direction,
    start: SwingPoint,
    end: SwingPoint,
) -> PatternMatch {
    PatternMatch {
        kind,
        scope: kind.scope(),
        direction,
        strength: kind.strength(),
        start_index: start.index,
        end_index: end.index,
    }
}
