//! End-to-end scenarios against engineered series with known signals.

use tascore::divergence::{detect_divergences, DivergenceKind, DivergenceParams, IndicatorName};
use tascore::prelude::*;
use tascore::score::{divergence_weight, pattern_weight};

fn bar(timestamp: i64, open: f64, high: f64, low: f64, close: f64) -> Bar {
    Bar {
        timestamp,
        open,
        high,
        low,
        close,
        volume: 1000.0,
    }
}

fn rising_series(n: usize) -> Series {
    let bars: Vec<Bar> = (0..n)
        .map(|i| {
            let base = 100.0 + i as f64 * 2.0;
            bar(i as i64, base - 1.0, base + 0.5, base - 1.5, base)
        })
        .collect();
    Series::new(bars).unwrap()
}

/// Config whose MA stack fits inside a short series.
fn short_ma_config() -> AnalyzerConfig {
    AnalyzerConfig {
        ma_periods: vec![
            Period::new(5).unwrap(),
            Period::new(10).unwrap(),
            Period::new(20).unwrap(),
        ],
        ..AnalyzerConfig::default()
    }
}

// A strictly rising series with constant gains saturates the bullish side.
#[test]
fn rising_series_pins_the_bullish_indicators() {
    let analyzer = Analyzer::new(short_ma_config()).unwrap();
    let series = rising_series(30);
    let report = analyzer.analyze(&series).unwrap();

    // RSI saturates at exactly 100 after warm-up.
    assert_eq!(report.indicators.rsi, Some(100.0));

    // OBV accumulates every bar's volume.
    assert_eq!(report.indicators.obv, Some(29.0 * 1000.0));

    // The MA stack is fully golden-ordered.
    assert_eq!(report.indicators.ma_alignment, Some(MaAlignment::BullishStack));

    // The stack has been bullish for a while, so the final bar carries the
    // alignment signal, not a fresh cross.
    assert!(report
        .signals
        .iter()
        .any(|s| s.kind == SignalKind::MaAlignment && s.direction == Direction::Bullish));
    assert!(!report.signals.iter().any(|s| s.kind == SignalKind::MaCross));
}

// The golden cross itself scores exactly once, on the crossover bar.
#[test]
fn ma_cross_fires_on_the_crossover_bar_only() {
    let config = AnalyzerConfig {
        ma_periods: vec![Period::new(2).unwrap(), Period::new(3).unwrap()],
        ..AnalyzerConfig::default()
    };
    let analyzer = Analyzer::new(config).unwrap();

    // Flat closes keep the averages equal (mixed); the final pop flips the
    // ordering strictly bullish on the last bar.
    let mut bars: Vec<Bar> = (0..30)
        .map(|i| bar(i, 100.0, 100.5, 99.5, 100.0))
        .collect();
    bars.push(bar(30, 100.0, 110.5, 99.5, 110.0));
    let series = Series::new(bars).unwrap();
    let report = analyzer.analyze(&series).unwrap();

    let crosses: Vec<&Signal> = report
        .signals
        .iter()
        .filter(|s| s.kind == SignalKind::MaCross)
        .collect();
    assert_eq!(crosses.len(), 1);
    assert_eq!(crosses[0].direction, Direction::Bullish);
    assert_eq!(crosses[0].index, series.len() - 1);
}

// A lower price trough against a higher oscillator trough is a regular
// bullish divergence.
#[test]
fn engineered_regular_bullish_divergence_weighs_plus_four() {
    let closes = vec![
        10.0, 9.0, 8.0, 7.0, 8.0, 9.0, 10.0, 9.0, 8.0, 7.5, 6.0, 8.0, 9.0, 10.0,
    ];
    let mut rsi_values = vec![Some(50.0); closes.len()];
    rsi_values[3] = Some(25.0);
    rsi_values[10] = Some(35.0);
    let rsi = IndicatorSeries::from_options(rsi_values);

    let params = DivergenceParams {
        window: 2,
        min_distance: 4,
        max_count: 5,
    };
    let events = detect_divergences(&closes, &rsi, IndicatorName::Rsi, &params).unwrap();
    let bullish: Vec<_> = events
        .iter()
        .filter(|e| e.kind == DivergenceKind::RegularBullish)
        .collect();
    assert_eq!(bullish.len(), 1);
    assert_eq!(divergence_weight(bullish[0]), 4);
}

// Three soldiers closing out the series.
#[test]
fn three_soldiers_match_is_very_strong_and_scores_three() {
    let mut bars: Vec<Bar> = (0..10)
        .map(|i| {
            let base = 100.0 - i as f64 * 2.0;
            bar(i, base + 1.0, base + 2.0, base - 1.0, base - 0.5)
        })
        .collect();
    bars.push(bar(10, 80.0, 83.2, 79.8, 83.0));
    bars.push(bar(11, 81.5, 85.2, 81.3, 85.0));
    bars.push(bar(12, 83.5, 87.2, 83.3, 87.0));
    let series = Series::new(bars).unwrap();

    let analyzer = Analyzer::new(short_ma_config()).unwrap();
    let report = analyzer.analyze(&series).unwrap();

    let soldiers: Vec<&PatternMatch> = report
        .candlestick_patterns
        .iter()
        .filter(|m| m.kind == PatternKind::ThreeWhiteSoldiers)
        .collect();
    assert_eq!(soldiers.len(), 1);
    assert_eq!(soldiers[0].strength, Strength::VeryStrong);
    assert_eq!(soldiers[0].scope, PatternScope::Candlestick);
    assert_eq!(pattern_weight(soldiers[0]), 3);
}

// A series long enough for MACD/Bollinger but not for RSI degrades only
// the RSI.
#[test]
fn partial_degradation_keeps_the_satisfied_indicators() {
    let config = AnalyzerConfig {
        rsi_period: Period::new(40).unwrap(),
        ..short_ma_config()
    };
    let analyzer = Analyzer::new(config).unwrap();
    let series = rising_series(36);
    let report = analyzer.analyze(&series).unwrap();

    assert_eq!(report.indicators.rsi, None);
    assert!(report.indicators.macd.is_some());
    assert!(report.indicators.bollinger.is_some());
}

// A flat, zero-range sequence must never fault.
#[test]
fn flat_series_is_handled_without_faults() {
    let bars: Vec<Bar> = (0..40).map(|i| bar(i, 100.0, 100.0, 100.0, 100.0)).collect();
    let series = Series::new(bars).unwrap();
    let analyzer = Analyzer::new(short_ma_config()).unwrap();
    let report = analyzer.analyze(&series).unwrap();

    assert_eq!(report.indicators.williams_r, Some(0.0));
    assert_eq!(report.indicators.bias, Some(0.0));
    // No divergences or chart patterns can exist without swings.
    assert!(report.divergences.is_empty());
    assert!(report.chart_patterns.is_empty());
}

#[test]
fn histogram_identity_holds_in_the_report() {
    let analyzer = Analyzer::new(AnalyzerConfig::default()).unwrap();
    let bars: Vec<Bar> = (0..90)
        .map(|i| {
            let base = 100.0 + (i as f64 * 0.5).sin() * 7.0 + i as f64 * 0.05;
            bar(i as i64, base - 0.3, base + 1.0, base - 1.0, base + 0.2)
        })
        .collect();
    let series = Series::new(bars).unwrap();
    let report = analyzer.analyze(&series).unwrap();
    let macd = report.indicators.macd.unwrap();
    assert_eq!(macd.histogram, macd.line - macd.signal);
}

#[test]
fn rejects_malformed_input_before_computing() {
    let bars = vec![
        bar(0, 100.0, 101.0, 99.0, 100.0),
        bar(1, 100.0, 99.0, 101.0, 100.0), // high < low
    ];
    assert!(matches!(
        Series::new(bars),
        Err(AnalysisError::InvalidBar { index: 1, .. })
    ));
}

#[test]
fn unrecognized_scale_of_scores_maps_to_tiers() {
    assert_eq!(Recommendation::from_score(10), Recommendation::StrongBuy);
    assert_eq!(Recommendation::from_score(4), Recommendation::Buy);
    assert_eq!(Recommendation::from_score(0), Recommendation::Hold);
    assert_eq!(Recommendation::from_score(-4), Recommendation::Sell);
    assert_eq!(Recommendation::from_score(-10), Recommendation::StrongSell);
}

#[test]
fn trade_plan_appears_once_atr_is_defined() {
    let analyzer = Analyzer::new(short_ma_config()).unwrap();
    let series = rising_series(40);
    let report = analyzer.analyze(&series).unwrap();
    let plan = report.trade_plan.unwrap();
    let close = report.indicators.close;
    assert!(plan.stop_loss < close);
    assert!(plan.take_profit > plan.stop_loss);
    assert!(plan.entry <= close);
}

#[test]
fn levels_are_ranked_and_straddle_price() {
    let analyzer = Analyzer::new(AnalyzerConfig::default()).unwrap();
    let bars: Vec<Bar> = (0..80)
        .map(|i| {
            let base = 100.0 + (i as f64 * 0.3).sin() * 15.0;
            bar(i as i64, base - 0.5, base + 2.0, base - 2.0, base)
        })
        .collect();
    let series = Series::new(bars).unwrap();
    let report = analyzer.analyze(&series).unwrap();

    assert!(!report.levels.is_empty());
    assert_eq!(report.levels[0].rank, 1);
    let close = report.indicators.close;
    assert!(report.levels.iter().any(|l| l.price < close));
    assert!(report.levels.iter().any(|l| l.price > close));
}
