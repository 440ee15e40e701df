//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9
//! Warmup: max(fast, slow) - 1 bars for the line, plus signal - 1 for signal/histogram.

use crate::domain::indicator::{calculate_ema, ema_over, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceBar;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub line: IndicatorSeries,
    pub signal: IndicatorSeries,
    pub histogram: IndicatorSeries,
}

pub fn calculate_macd(
    bars: &[PriceBar],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> MacdSeries {
    let line_type = IndicatorType::MacdLine {
        fast,
        slow,
        signal: signal_period,
    };
    let signal_type = IndicatorType::MacdSignal {
        fast,
        slow,
        signal: signal_period,
    };
    let hist_type = IndicatorType::MacdHistogram {
        fast,
        slow,
        signal: signal_period,
    };

    if fast == 0 || slow == 0 || signal_period == 0 {
        return MacdSeries {
            line: IndicatorSeries::undefined(line_type, bars.len()),
            signal: IndicatorSeries::undefined(signal_type, bars.len()),
            histogram: IndicatorSeries::undefined(hist_type, bars.len()),
        };
    }

    let ema_fast = calculate_ema(bars, fast);
    let ema_slow = calculate_ema(bars, slow);

    let line: Vec<Option<f64>> = ema_fast
        .values
        .iter()
        .zip(&ema_slow.values)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();

    let signal = ema_over(&line, signal_period);

    let histogram: Vec<Option<f64>> = line
        .iter()
        .zip(&signal)
        .map(|(l, s)| Some((*l)? - (*s)?))
        .collect();

    MacdSeries {
        line: IndicatorSeries {
            indicator_type: line_type,
            values: line,
        },
        signal: IndicatorSeries {
            indicator_type: signal_type,
            values: signal,
        },
        histogram: IndicatorSeries {
            indicator_type: hist_type,
            values: histogram,
        },
    }
}
