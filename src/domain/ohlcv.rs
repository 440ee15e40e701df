//! Price bar representation.

use chrono::NaiveDateTime;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl PriceBar {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }

    /// True when every price field is strictly positive and finite.
    pub fn has_valid_prices(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|p| p.is_finite() && *p > 0.0)
    }
}
