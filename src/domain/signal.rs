//! Signal generation.
//!
//! Turns aligned indicator series into one BUY/SELL/HOLD signal per bar.
//!
//! # Rules
//!
//! - BUY: RSI crosses up through the oversold band (prev <= band, curr > band)
//!   while the fast EMA is above the slow EMA, and every enabled filter passes.
//! - SELL: RSI crosses down through the overbought band (prev >= band,
//!   curr < band), or the fast EMA crosses below the slow EMA.
//! - SELL is checked first, so a reversal bar never opens a position.
//! - Any undefined input the rules need: HOLD.
//!
//! The only state carried between bars is the previous snapshot.

use chrono::NaiveDateTime;
use std::fmt;

use crate::domain::indicator::{
    calculate_adx, calculate_ema, calculate_macd, calculate_rsi, calculate_sma, IndicatorSeries,
};
use crate::domain::ohlcv::PriceBar;
use crate::domain::strategy::StrategyConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalKind::Buy => write!(f, "BUY"),
            SignalKind::Sell => write!(f, "SELL"),
            SignalKind::Hold => write!(f, "HOLD"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub timestamp: NaiveDateTime,
    pub symbol: String,
    pub kind: SignalKind,
    pub reference_price: f64,
}

/// One bar's worth of indicator values.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSnapshot {
    pub timestamp: NaiveDateTime,
    pub close: f64,
    pub rsi: Option<f64>,
    pub ema_fast: Option<f64>,
    pub ema_slow: Option<f64>,
    pub sma: Option<f64>,
    pub adx: Option<f64>,
    pub macd_histogram: Option<f64>,
}

impl IndicatorSnapshot {
    /// True when every value the rules read on this bar is defined.
    pub fn is_ready(&self, config: &StrategyConfig) -> bool {
        self.rsi.is_some()
            && self.ema_fast.is_some()
            && self.ema_slow.is_some()
            && (!config.use_sma_filter || self.sma.is_some())
            && (!config.use_adx_filter || self.adx.is_some())
            && (!config.use_macd_filter || self.macd_histogram.is_some())
    }
}

/// Precomputed series for one symbol. Filter series are only computed when
/// the filter is enabled.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSet {
    pub rsi: IndicatorSeries,
    pub ema_fast: IndicatorSeries,
    pub ema_slow: IndicatorSeries,
    pub sma: Option<IndicatorSeries>,
    pub adx: Option<IndicatorSeries>,
    pub macd_histogram: Option<IndicatorSeries>,
}

impl IndicatorSet {
    pub fn compute(bars: &[PriceBar], config: &StrategyConfig) -> Self {
        IndicatorSet {
            rsi: calculate_rsi(bars, config.rsi_period),
            ema_fast: calculate_ema(bars, config.ema_fast_period),
            ema_slow: calculate_ema(bars, config.ema_slow_period),
            sma: config
                .use_sma_filter
                .then(|| calculate_sma(bars, config.sma_period)),
            adx: config
                .use_adx_filter
                .then(|| calculate_adx(bars, config.adx_period)),
            macd_histogram: config.use_macd_filter.then(|| {
                calculate_macd(bars, config.macd_fast, config.macd_slow, config.macd_signal)
                    .histogram
            }),
        }
    }

    pub fn snapshot(&self, index: usize, bar: &PriceBar) -> IndicatorSnapshot {
        IndicatorSnapshot {
            timestamp: bar.timestamp,
            close: bar.close,
            rsi: self.rsi.get(index),
            ema_fast: self.ema_fast.get(index),
            ema_slow: self.ema_slow.get(index),
            sma: self.sma.as_ref().and_then(|s| s.get(index)),
            adx: self.adx.as_ref().and_then(|s| s.get(index)),
            macd_histogram: self.macd_histogram.as_ref().and_then(|s| s.get(index)),
        }
    }
}

fn crosses_above(prev: f64, curr: f64, level: f64) -> bool {
    prev <= level && curr > level
}

fn crosses_below(prev: f64, curr: f64, level: f64) -> bool {
    prev >= level && curr < level
}

fn filters_pass(current: &IndicatorSnapshot, config: &StrategyConfig) -> Option<bool> {
    let sma_ok = if config.use_sma_filter {
        current.close > current.sma?
    } else {
        true
    };
    let adx_ok = if config.use_adx_filter {
        current.adx? > config.adx_threshold
    } else {
        true
    };
    let macd_ok = if config.use_macd_filter {
        current.macd_histogram? > 0.0
    } else {
        true
    };
    Some(sma_ok && adx_ok && macd_ok)
}

fn decide(
    current: &IndicatorSnapshot,
    previous: &IndicatorSnapshot,
    config: &StrategyConfig,
) -> Option<SignalKind> {
    let (rsi, prev_rsi) = (current.rsi?, previous.rsi?);
    let (fast, slow) = (current.ema_fast?, current.ema_slow?);
    let (prev_fast, prev_slow) = (previous.ema_fast?, previous.ema_slow?);
    let filters_ok = filters_pass(current, config)?;

    let sell = crosses_below(prev_rsi, rsi, config.rsi_overbought)
        || (prev_fast >= prev_slow && fast < slow);
    let kind = if sell {
        SignalKind::Sell
    } else if crosses_above(prev_rsi, rsi, config.rsi_oversold) && fast > slow && filters_ok {
        SignalKind::Buy
    } else {
        SignalKind::Hold
    };
    Some(kind)
}

/// Evaluate the rules for one bar given the bar before it.
///
/// Shared by the backtester and by bar-by-bar live consumers.
pub fn evaluate_signal(
    symbol: &str,
    current: &IndicatorSnapshot,
    previous: Option<&IndicatorSnapshot>,
    config: &StrategyConfig,
) -> Signal {
    let kind = previous
        .and_then(|prev| decide(current, prev, config))
        .unwrap_or(SignalKind::Hold);

    Signal {
        timestamp: current.timestamp,
        symbol: symbol.to_string(),
        kind,
        reference_price: current.close,
    }
}

/// Lazy per-bar signal stream over precomputed indicators.
pub struct SignalGenerator<'a> {
    symbol: &'a str,
    bars: &'a [PriceBar],
    indicators: &'a IndicatorSet,
    config: &'a StrategyConfig,
    index: usize,
    previous: Option<IndicatorSnapshot>,
}

impl<'a> SignalGenerator<'a> {
    pub fn new(
        symbol: &'a str,
        bars: &'a [PriceBar],
        indicators: &'a IndicatorSet,
        config: &'a StrategyConfig,
    ) -> Self {
        SignalGenerator {
            symbol,
            bars,
            indicators,
            config,
            index: 0,
            previous: None,
        }
    }

    /// Snapshot of the bar behind the most recently yielded signal.
    pub fn last_snapshot(&self) -> Option<&IndicatorSnapshot> {
        self.previous.as_ref()
    }
}

impl Iterator for SignalGenerator<'_> {
    type Item = Signal;

    fn next(&mut self) -> Option<Signal> {
        let bar = self.bars.get(self.index)?;
        let snapshot = self.indicators.snapshot(self.index, bar);
        let signal = evaluate_signal(self.symbol, &snapshot, self.previous.as_ref(), self.config);
        self.previous = Some(snapshot);
        self.index += 1;
        Some(signal)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.bars.len().saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::make_bars;
    use crate::domain::indicator::IndicatorType;
    use chrono::NaiveDate;

    fn ts(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn snap(day: u32, rsi: f64, fast: f64, slow: f64) -> IndicatorSnapshot {
        IndicatorSnapshot {
            timestamp: ts(day),
            close: 100.0,
            rsi: Some(rsi),
            ema_fast: Some(fast),
            ema_slow: Some(slow),
            sma: None,
            adx: None,
            macd_histogram: None,
        }
    }

    fn kind(curr: &IndicatorSnapshot, prev: &IndicatorSnapshot, config: &StrategyConfig) -> SignalKind {
        evaluate_signal("TEST", curr, Some(prev), config).kind
    }

    #[test]
    fn buy_on_rsi_cross_up_with_bullish_emas() {
        let config = StrategyConfig::default();
        let prev = snap(1, 28.0, 105.0, 100.0);
        let curr = snap(2, 31.0, 106.0, 100.0);
        let signal = evaluate_signal("INFY", &curr, Some(&prev), &config);
        assert_eq!(signal.kind, SignalKind::Buy);
        assert_eq!(signal.symbol, "INFY");
        assert_eq!(signal.timestamp, ts(2));
        assert_eq!(signal.reference_price, 100.0);
    }

    #[test]
    fn rsi_exactly_at_band_counts_as_below() {
        let config = StrategyConfig::default();
        assert_eq!(
            kind(&snap(2, 30.5, 106.0, 100.0), &snap(1, 30.0, 105.0, 100.0), &config),
            SignalKind::Buy
        );
        assert_eq!(
            kind(&snap(2, 30.0, 106.0, 100.0), &snap(1, 29.0, 105.0, 100.0), &config),
            SignalKind::Hold
        );
    }

    #[test]
    fn no_buy_when_fast_ema_below_slow() {
        let config = StrategyConfig::default();
        assert_eq!(
            kind(&snap(2, 31.0, 99.0, 100.0), &snap(1, 28.0, 98.0, 100.0), &config),
            SignalKind::Hold
        );
    }

    #[test]
    fn no_buy_without_cross() {
        let config = StrategyConfig::default();
        assert_eq!(
            kind(&snap(2, 35.0, 106.0, 100.0), &snap(1, 32.0, 105.0, 100.0), &config),
            SignalKind::Hold
        );
    }

    #[test]
    fn sell_on_rsi_cross_down() {
        let config = StrategyConfig::default();
        assert_eq!(
            kind(&snap(2, 68.0, 106.0, 100.0), &snap(1, 72.0, 105.0, 100.0), &config),
            SignalKind::Sell
        );
    }

    #[test]
    fn sell_on_ema_cross_down() {
        let config = StrategyConfig::default();
        assert_eq!(
            kind(&snap(2, 50.0, 99.0, 100.0), &snap(1, 50.0, 101.0, 100.0), &config),
            SignalKind::Sell
        );
    }

    #[test]
    fn ema_already_below_is_not_a_cross() {
        let config = StrategyConfig::default();
        assert_eq!(
            kind(&snap(2, 50.0, 98.0, 100.0), &snap(1, 50.0, 99.0, 100.0), &config),
            SignalKind::Hold
        );
    }

    #[test]
    fn undefined_previous_yields_hold() {
        let config = StrategyConfig::default();
        let curr = snap(2, 31.0, 106.0, 100.0);
        assert_eq!(evaluate_signal("T", &curr, None, &config).kind, SignalKind::Hold);

        let mut prev = snap(1, 28.0, 105.0, 100.0);
        prev.rsi = None;
        assert_eq!(kind(&curr, &prev, &config), SignalKind::Hold);
    }

    #[test]
    fn undefined_current_yields_hold() {
        let config = StrategyConfig::default();
        let prev = snap(1, 28.0, 105.0, 100.0);
        let mut curr = snap(2, 31.0, 106.0, 100.0);
        curr.ema_slow = None;
        assert_eq!(kind(&curr, &prev, &config), SignalKind::Hold);
    }

    #[test]
    fn sma_filter_blocks_below_trend() {
        let config = StrategyConfig {
            use_sma_filter: true,
            ..Default::default()
        };
        let prev = snap(1, 28.0, 105.0, 100.0);
        let mut curr = snap(2, 31.0, 106.0, 100.0);
        curr.sma = Some(120.0);
        assert_eq!(kind(&curr, &prev, &config), SignalKind::Hold);
        curr.sma = Some(90.0);
        assert_eq!(kind(&curr, &prev, &config), SignalKind::Buy);
        curr.sma = None;
        assert_eq!(kind(&curr, &prev, &config), SignalKind::Hold);
    }

    #[test]
    fn adx_filter_suppresses_weak_trend() {
        let config = StrategyConfig {
            use_adx_filter: true,
            adx_threshold: 25.0,
            ..Default::default()
        };
        let prev = snap(1, 28.0, 105.0, 100.0);
        let mut curr = snap(2, 31.0, 106.0, 100.0);
        curr.adx = Some(18.0);
        assert_eq!(kind(&curr, &prev, &config), SignalKind::Hold);
        curr.adx = Some(30.0);
        assert_eq!(kind(&curr, &prev, &config), SignalKind::Buy);
    }

    #[test]
    fn macd_filter_requires_positive_histogram() {
        let config = StrategyConfig {
            use_macd_filter: true,
            ..Default::default()
        };
        let prev = snap(1, 28.0, 105.0, 100.0);
        let mut curr = snap(2, 31.0, 106.0, 100.0);
        curr.macd_histogram = Some(-0.1);
        assert_eq!(kind(&curr, &prev, &config), SignalKind::Hold);
        curr.macd_histogram = Some(0.0);
        assert_eq!(kind(&curr, &prev, &config), SignalKind::Hold);
        curr.macd_histogram = Some(0.2);
        assert_eq!(kind(&curr, &prev, &config), SignalKind::Buy);
    }

    #[test]
    fn filters_do_not_gate_sells() {
        let config = StrategyConfig {
            use_adx_filter: true,
            adx_threshold: 25.0,
            ..Default::default()
        };
        let prev = snap(1, 72.0, 105.0, 100.0);
        let mut curr = snap(2, 68.0, 106.0, 100.0);
        curr.adx = Some(10.0);
        assert_eq!(kind(&curr, &prev, &config), SignalKind::Sell);
    }

    #[test]
    fn flat_prices_only_hold() {
        let bars = make_bars(&[100.0; 5]);
        let config = StrategyConfig::default();
        let indicators = IndicatorSet::compute(&bars, &config);
        assert!(indicators.rsi.is_all_undefined());

        let signals: Vec<Signal> = SignalGenerator::new("FLAT", &bars, &indicators, &config).collect();
        assert_eq!(signals.len(), 5);
        assert!(signals.iter().all(|s| s.kind == SignalKind::Hold));
    }

    #[test]
    fn generator_emits_single_buy_at_rsi_cross() {
        let n = 16;
        let bars = make_bars(&(0..n).map(|i| 100.0 + i as f64).collect::<Vec<_>>());
        let rsi: Vec<Option<f64>> = (0..n)
            .map(|i| match i {
                0..=3 => None,
                4..=9 => Some(20.0 + i as f64),
                _ => Some(35.0 + i as f64),
            })
            .collect();
        let indicators = IndicatorSet {
            rsi: IndicatorSeries {
                indicator_type: IndicatorType::Rsi(4),
                values: rsi,
            },
            ema_fast: IndicatorSeries {
                indicator_type: IndicatorType::Ema(2),
                values: (0..n).map(|i| Some(110.0 + i as f64)).collect(),
            },
            ema_slow: IndicatorSeries {
                indicator_type: IndicatorType::Ema(3),
                values: (0..n).map(|i| Some(100.0 + i as f64)).collect(),
            },
            sma: None,
            adx: None,
            macd_histogram: None,
        };
        let config = StrategyConfig::default();

        let signals: Vec<Signal> = SignalGenerator::new("UP", &bars, &indicators, &config).collect();
        let buys: Vec<usize> = signals
            .iter()
            .enumerate()
            .filter(|(_, s)| s.kind == SignalKind::Buy)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(buys, vec![10]);
        assert_eq!(signals[10].reference_price, bars[10].close);
    }

    #[test]
    fn generator_tracks_last_snapshot() {
        let bars = make_bars(&[1.0, 2.0, 3.0]);
        let config = StrategyConfig::default();
        let indicators = IndicatorSet::compute(&bars, &config);
        let mut generator = SignalGenerator::new("X", &bars, &indicators, &config);
        assert!(generator.last_snapshot().is_none());
        assert_eq!(generator.size_hint(), (3, Some(3)));
        generator.next();
        assert_eq!(generator.last_snapshot().unwrap().close, 1.0);
        generator.next();
        generator.next();
        assert!(generator.next().is_none());
    }

    #[test]
    fn indicator_set_skips_disabled_filters() {
        let bars = make_bars(&[1.0; 10]);
        let config = StrategyConfig {
            use_adx_filter: true,
            ..Default::default()
        };
        let set = IndicatorSet::compute(&bars, &config);
        assert!(set.sma.is_none());
        assert!(set.adx.is_some());
        assert!(set.macd_histogram.is_none());
    }
}
