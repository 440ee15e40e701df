//! Simple Moving Average indicator.
//!
//! SMA[i] = mean(C[i-n+1..=i]). Warmup: first (n-1) bars are undefined.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceBar;

pub fn calculate_sma(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    let mut series = IndicatorSeries::undefined(IndicatorType::Sma(period), bars.len());
    if period == 0 || bars.len() < period {
        return series;
    }

    let mut sum = 0.0;
    for (i, bar) in bars.iter().enumerate() {
        sum += bar.close;
        if i >= period {
            sum -= bars[i - period].close;
        }
        if i + 1 >= period {
            series.values[i] = Some(sum / period as f64);
        }
    }
    series
}
