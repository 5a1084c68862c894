//! Oscillator and band calculators
//!
//! Pure, stateless transforms from the input series to position-aligned
//! [`IndicatorSeries`](crate::IndicatorSeries) values. Every calculator
//! validates its own parameters and returns an entirely undefined series
//! when the input is shorter than the minimum window, so a partial report
//! can still aggregate whatever did have enough history.

pub mod atr;
pub mod bias;
pub mod bollinger;
pub mod kdj;
pub mod ma;
pub mod macd;
pub mod obv;
pub mod rsi;
pub mod volume;
pub mod williams;

pub use atr::{atr, atr_percent};
pub use bias::bias;
pub use bollinger::{bollinger, BollingerSeries};
pub use kdj::{kdj, KdjSeries};
pub use ma::{ema, ma_system, sma, MaAlignment, MaSystem};
pub use macd::{macd, MacdSeries};
pub use obv::obv;
pub use rsi::rsi;
pub use volume::{volume_profile, VolumeProfile};
pub use williams::williams_r;
