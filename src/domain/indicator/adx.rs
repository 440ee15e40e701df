//! ADX (Average Directional Index) indicator.
//!
//! Per bar from index 1:
//! - TR  = true range against the previous close
//! - +DM = up move when it beats the down move and is positive, else 0
//! - -DM = down move when it beats the up move and is positive, else 0
//!
//! TR/+DM/-DM are Wilder-smoothed (seed = sum of the first n values, then
//! S[i] = S[i-1] - S[i-1]/n + X[i]). +DI and -DI are 100 * S(DM)/S(TR),
//! DX = 100 * |+DI - -DI| / (+DI + -DI). ADX is seeded with the mean of the
//! first n DX values and then Wilder-averaged: ADX[i] = (ADX[i-1]*(n-1) + DX[i]) / n.
//!
//! Warmup: first 2n-1 bars are undefined.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceBar;

fn directional_index(tr: f64, plus_dm: f64, minus_dm: f64) -> f64 {
    if tr == 0.0 {
        return 0.0;
    }
    let plus_di = 100.0 * plus_dm / tr;
    let minus_di = 100.0 * minus_dm / tr;
    let di_sum = plus_di + minus_di;
    if di_sum == 0.0 {
        0.0
    } else {
        100.0 * (plus_di - minus_di).abs() / di_sum
    }
}

pub fn calculate_adx(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    let mut series = IndicatorSeries::undefined(IndicatorType::Adx(period), bars.len());
    if period == 0 || bars.len() < period.saturating_mul(2) {
        return series;
    }

    let n = period as f64;
    let mut tr_sm = 0.0;
    let mut plus_sm = 0.0;
    let mut minus_sm = 0.0;
    let mut dx_sum = 0.0;
    let mut adx = 0.0;

    for i in 1..bars.len() {
        let bar = &bars[i];
        let prev = &bars[i - 1];

        let tr = bar.true_range(prev.close);
        let up_move = bar.high - prev.high;
        let down_move = prev.low - bar.low;
        let plus_dm = if up_move > down_move && up_move > 0.0 {
            up_move
        } else {
            0.0
        };
        let minus_dm = if down_move > up_move && down_move > 0.0 {
            down_move
        } else {
            0.0
        };

        if i <= period {
            tr_sm += tr;
            plus_sm += plus_dm;
            minus_sm += minus_dm;
            if i < period {
                continue;
            }
        } else {
            tr_sm = tr_sm - tr_sm / n + tr;
            plus_sm = plus_sm - plus_sm / n + plus_dm;
            minus_sm = minus_sm - minus_sm / n + minus_dm;
        }

        // DX is defined from index `period`; the first ADX lands `period - 1` bars later.
        let dx = directional_index(tr_sm, plus_sm, minus_sm);
        let dx_count = i - period + 1;
        if dx_count < period {
            dx_sum += dx;
        } else if dx_count == period {
            adx = (dx_sum + dx) / n;
            series.values[i] = Some(adx);
        } else {
            adx = (adx * (n - 1.0) + dx) / n;
            series.values[i] = Some(adx);
        }
    }

    series
}
