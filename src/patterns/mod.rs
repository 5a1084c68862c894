//! Pattern recognizers
//!
//! Candlestick patterns classify 1-3 bar shapes; chart patterns classify
//! swing-point geometry over a longer window. Both produce
//! [`PatternMatch`] values from a closed set of [`PatternKind`]s - no
//! open-ended runtime registration.

use crate::{Direction, Strength};

pub mod candle;
pub mod chart;

pub use candle::{scan_candles, CandleRecognizer, PatternContext, Trend};
pub use chart::scan_chart;

/// Whether a match came from the short-window candlestick recognizer or
/// the long-window chart recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PatternScope {
    Candlestick,
    Chart,
}

/// Closed set of recognizable patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum PatternKind {
    // Candlestick
    Doji,
    Hammer,
    HangingMan,
    InvertedHammer,
    ShootingStar,
    BullishEngulfing,
    BearishEngulfing,
    MorningStar,
    EveningStar,
    ThreeWhiteSoldiers,
    ThreeBlackCrows,
    // Chart
    DoubleTop,
    DoubleBottom,
    HeadAndShoulders,
    InverseHeadAndShoulders,
    AscendingTriangle,
    DescendingTriangle,
    SymmetricTriangle,
}

impl PatternKind {
    pub fn name(self) -> &'static str {
        match self {
            PatternKind::Doji => "doji",
            PatternKind::Hammer => "hammer",
            PatternKind::HangingMan => "hanging_man",
            PatternKind::InvertedHammer => "inverted_hammer",
            PatternKind::ShootingStar => "shooting_star",
            PatternKind::BullishEngulfing => "bullish_engulfing",
            PatternKind::BearishEngulfing => "bearish_engulfing",
            PatternKind::MorningStar => "morning_star",
            PatternKind::EveningStar => "evening_star",
            PatternKind::ThreeWhiteSoldiers => "three_white_soldiers",
            PatternKind::ThreeBlackCrows => "three_black_crows",
            PatternKind::DoubleTop => "double_top",
            PatternKind::DoubleBottom => "double_bottom",
            PatternKind::HeadAndShoulders => "head_and_shoulders_top",
            PatternKind::InverseHeadAndShoulders => "head_and_shoulders_bottom",
            PatternKind::AscendingTriangle => "ascending_triangle",
            PatternKind::DescendingTriangle => "descending_triangle",
            PatternKind::SymmetricTriangle => "symmetric_triangle",
        }
    }

    pub fn scope(self) -> PatternScope {
        match self {
            PatternKind::Doji
            | PatternKind::Hammer
            | PatternKind::HangingMan
            | PatternKind::InvertedHammer
            | PatternKind::ShootingStar
            | PatternKind::BullishEngulfing
            | PatternKind::BearishEngulfing
            | PatternKind::MorningStar
            | PatternKind::EveningStar
            | PatternKind::ThreeWhiteSoldiers
            | PatternKind::ThreeBlackCrows => PatternScope::Candlestick,
            _ => PatternScope::Chart,
        }
    }

    /// Fixed strength tier per pattern.
    pub fn strength(self) -> Strength {
        match self {
            PatternKind::ThreeWhiteSoldiers | PatternKind::ThreeBlackCrows => Strength::VeryStrong,
            PatternKind::MorningStar
            | PatternKind::EveningStar
            | PatternKind::DoubleTop
            | PatternKind::DoubleBottom
            | PatternKind::HeadAndShoulders
            | PatternKind::InverseHeadAndShoulders => Strength::Strong,
            PatternKind::BullishEngulfing
            | PatternKind::BearishEngulfing
            | PatternKind::AscendingTriangle
            | PatternKind::DescendingTriangle
            | PatternKind::SymmetricTriangle => Strength::Medium,
            PatternKind::Doji
            | PatternKind::Hammer
            | PatternKind::HangingMan
            | PatternKind::InvertedHammer
            | PatternKind::ShootingStar => Strength::Weak,
        }
    }
}

/// A recognized pattern over a bar index range. Overlapping matches are
/// all reported; disambiguation belongs to the scorer.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct PatternMatch {
    pub kind: PatternKind,
    pub scope: PatternScope,
    pub direction: Direction,
    pub strength: Strength,
    pub start_index: usize,
    pub end_index: usize,
}
