//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seed with first SMA, then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! Warmup: first (n-1) bars are undefined.

use crate::domain::indicator::{ema_over, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceBar;

pub fn smoothing_factor(period: usize) -> f64 {
    2.0 / (period as f64 + 1.0)
}

pub fn calculate_ema(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    let closes: Vec<Option<f64>> = bars.iter().map(|b| Some(b.close)).collect();
    IndicatorSeries {
        indicator_type: IndicatorType::Ema(period),
        values: ema_over(&closes, period),
    }
}

/// Continue the EMA recurrence from a stored value at `seed_index`.
///
/// Bars before `seed_index` are undefined. Used by bar-by-bar consumers that
/// persist the last EMA instead of replaying the full history.
pub fn resume_ema(
    bars: &[PriceBar],
    period: usize,
    seed_index: usize,
    seed_value: f64,
) -> IndicatorSeries {
    let mut series = IndicatorSeries::undefined(IndicatorType::Ema(period), bars.len());
    if period == 0 || seed_index >= bars.len() {
        return series;
    }

    let k = smoothing_factor(period);
    let mut ema = seed_value;
    series.values[seed_index] = Some(ema);
    for i in (seed_index + 1)..bars.len() {
        ema = bars[i].close * k + ema * (1.0 - k);
        series.values[i] = Some(ema);
    }
    series
}
