//! Technical indicator implementations.
//!
//! Every indicator is a pure function from a bar slice to an [`IndicatorSeries`]
//! of the same length. Warm-up bars hold `None`; there is no NaN sentinel.
//!
//! - `IndicatorType`: indicator identity + parameters (usable as a map key)
//! - `IndicatorSeries`: index-aligned optional values

pub mod adx;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use adx::calculate_adx;
pub use ema::{calculate_ema, resume_ema};
pub use macd::{calculate_macd, MacdSeries};
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Adx(usize),
    MacdLine {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    MacdSignal {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    MacdHistogram {
        fast: usize,
        slow: usize,
        signal: usize,
    },
}

impl IndicatorType {
    /// Number of leading bars for which the indicator is undefined.
    pub fn warmup(&self) -> usize {
        match *self {
            IndicatorType::Sma(p) | IndicatorType::Ema(p) => p.saturating_sub(1),
            IndicatorType::Rsi(p) => p,
            IndicatorType::Adx(p) => p.saturating_mul(2).saturating_sub(1),
            IndicatorType::MacdLine { fast, slow, .. } => fast.max(slow).saturating_sub(1),
            IndicatorType::MacdSignal { fast, slow, signal }
            | IndicatorType::MacdHistogram { fast, slow, signal } => {
                fast.max(slow)
                    .saturating_sub(1)
                    .saturating_add(signal.saturating_sub(1))
            }
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Adx(period) => write!(f, "ADX({})", period),
            IndicatorType::MacdLine { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::MacdSignal { fast, slow, signal } => {
                write!(f, "MACD_SIGNAL({},{},{})", fast, slow, signal)
            }
            IndicatorType::MacdHistogram { fast, slow, signal } => {
                write!(f, "MACD_HIST({},{},{})", fast, slow, signal)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<Option<f64>>,
}

impl IndicatorSeries {
    pub fn undefined(indicator_type: IndicatorType, len: usize) -> Self {
        IndicatorSeries {
            indicator_type,
            values: vec![None; len],
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at `index`; `None` during warm-up or past the end.
    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    pub fn first_defined(&self) -> Option<usize> {
        self.values.iter().position(Option::is_some)
    }

    pub fn is_all_undefined(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }
}

/// EMA over an optional input sequence.
///
/// Seeded with the mean of the first `period` defined inputs; inputs are
/// expected to stay defined once they start. An undefined input after the
/// seed yields `None` without disturbing the running average.
pub(crate) fn ema_over(input: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; input.len()];
    if period == 0 {
        return out;
    }
    let Some(start) = input.iter().position(Option::is_some) else {
        return out;
    };
    let seed_index = start.saturating_add(period - 1);
    if seed_index >= input.len() {
        return out;
    }

    let window: Option<Vec<f64>> = input[start..=seed_index].iter().copied().collect();
    let Some(window) = window else {
        return out;
    };

    let k = ema::smoothing_factor(period);
    let mut ema = window.iter().sum::<f64>() / period as f64;
    out[seed_index] = Some(ema);

    for i in (seed_index + 1)..input.len() {
        if let Some(v) = input[i] {
            ema = v * k + ema * (1.0 - k);
            out[i] = Some(ema);
        }
    }
    out
}
