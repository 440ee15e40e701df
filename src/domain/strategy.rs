//! Strategy configuration.
//!
//! `StrategyConfig` is an explicit value handed to the core; there is no
//! global configuration state. Defaults mirror the dashboard the strategy
//! was tuned on: RSI(14) with 30/70 bands, EMA 12/50, SMA(200), ADX(14) > 20
//! and MACD(12,26,9).

use crate::domain::indicator::macd::{DEFAULT_FAST, DEFAULT_SIGNAL, DEFAULT_SLOW};
use crate::domain::indicator::IndicatorType;

/// How many units a BUY opens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PositionSizing {
    FixedQuantity(f64),
    /// Notional amount; quantity is `value / entry_price`.
    FixedNotional(f64),
}

impl PositionSizing {
    pub fn value(&self) -> f64 {
        match *self {
            PositionSizing::FixedQuantity(v) | PositionSizing::FixedNotional(v) => v,
        }
    }

    pub fn quantity_at(&self, price: f64) -> f64 {
        match *self {
            PositionSizing::FixedQuantity(q) => q,
            PositionSizing::FixedNotional(n) => n / price,
        }
    }
}

impl Default for PositionSizing {
    fn default() -> Self {
        PositionSizing::FixedQuantity(1.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    pub rsi_period: usize,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub ema_fast_period: usize,
    pub ema_slow_period: usize,
    pub use_sma_filter: bool,
    pub sma_period: usize,
    pub use_adx_filter: bool,
    pub adx_period: usize,
    pub adx_threshold: f64,
    pub use_macd_filter: bool,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub position_sizing: PositionSizing,
    /// Fractional loss from entry that forces an exit (0.02 = 2%).
    pub stop_loss_pct: Option<f64>,
    /// Fractional gain from entry that forces an exit.
    pub take_profit_pct: Option<f64>,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig {
            rsi_period: 14,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            ema_fast_period: 12,
            ema_slow_period: 50,
            use_sma_filter: false,
            sma_period: 200,
            use_adx_filter: false,
            adx_period: 14,
            adx_threshold: 20.0,
            use_macd_filter: false,
            macd_fast: DEFAULT_FAST,
            macd_slow: DEFAULT_SLOW,
            macd_signal: DEFAULT_SIGNAL,
            position_sizing: PositionSizing::default(),
            stop_loss_pct: None,
            take_profit_pct: None,
        }
    }
}

impl StrategyConfig {
    /// Indicators the signal rules read, given the enabled filters.
    pub fn required_indicators(&self) -> Vec<IndicatorType> {
        let mut required = vec![
            IndicatorType::Rsi(self.rsi_period),
            IndicatorType::Ema(self.ema_fast_period),
            IndicatorType::Ema(self.ema_slow_period),
        ];
        if self.use_sma_filter {
            required.push(IndicatorType::Sma(self.sma_period));
        }
        if self.use_adx_filter {
            required.push(IndicatorType::Adx(self.adx_period));
        }
        if self.use_macd_filter {
            required.push(IndicatorType::MacdHistogram {
                fast: self.macd_fast,
                slow: self.macd_slow,
                signal: self.macd_signal,
            });
        }
        required
    }

    /// Longest warm-up among the required indicators.
    pub fn warmup_bars(&self) -> usize {
        self.required_indicators()
            .iter()
            .map(IndicatorType::warmup)
            .max()
            .unwrap_or(0)
    }

    /// Fewest bars on which every required indicator becomes defined. The
    /// crossover look-back on that first defined bar yields HOLD.
    pub fn min_bars(&self) -> usize {
        self.warmup_bars().saturating_add(1)
    }
}
