#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::HashMap;

use sigtrader::domain::error::SigtraderError;
use sigtrader::domain::ohlcv::PriceBar;
use sigtrader::domain::strategy::StrategyConfig;
use sigtrader::ports::data_port::DataPort;

/// Rising trend with one dip: BUY at bar 14, RSI SELL at bar 22 under
/// [`fast_config`].
pub const DIP_AND_RALLY: [f64; 26] = [
    100.0, 102.0, 104.0, 106.0, 108.0, 110.0, 112.0, 114.0, 116.0, 118.0, 120.0, 117.0, 114.0,
    111.0, 115.0, 119.0, 123.0, 127.0, 131.0, 135.0, 139.0, 136.0, 133.0, 130.0, 134.0, 138.0,
];

pub fn fast_config() -> StrategyConfig {
    StrategyConfig {
        rsi_period: 3,
        ema_fast_period: 3,
        ema_slow_period: 8,
        ..Default::default()
    }
}

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_data(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<PriceBar>, SigtraderError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(SigtraderError::Data {
                reason: reason.clone(),
            });
        }
        self.data
            .get(symbol)
            .cloned()
            .ok_or_else(|| SigtraderError::NoData {
                symbol: symbol.to_string(),
            })
    }

    fn list_symbols(&self) -> Result<Vec<String>, SigtraderError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Daily bars with open/high/low pinned to the close.
pub fn make_bars(closes: &[f64]) -> Vec<PriceBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar {
            timestamp: start() + Duration::days(i as i64),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1000,
        })
        .collect()
}

/// Same shape as [`make_bars`] but with a one-point range around the close.
pub fn make_ranged_bars(closes: &[f64]) -> Vec<PriceBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar {
            timestamp: start() + Duration::days(i as i64),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000,
        })
        .collect()
}

/// CSV body in the on-disk data format.
pub fn bars_to_csv(bars: &[PriceBar]) -> String {
    let mut out = String::from("timestamp,open,high,low,close,volume\n");
    for b in bars {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.timestamp.format("%Y-%m-%d"),
            b.open,
            b.high,
            b.low,
            b.close,
            b.volume
        ));
    }
    out
}
