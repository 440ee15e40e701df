//! Multi-symbol scanning.
//!
//! Each symbol runs the full backtest pipeline on its own data. With
//! parallelism on, symbols are spread over the rayon pool; results are merged
//! into an ordered map once every unit has finished.

use rayon::prelude::*;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

use super::backtest::{run_backtest, BacktestResult};
use super::error::SigtraderError;
use super::ohlcv::PriceBar;
use super::strategy::StrategyConfig;

pub type ScanResults = BTreeMap<String, Result<BacktestResult, SigtraderError>>;

/// One symbol's bars, owned by the scan.
#[derive(Debug, Clone)]
pub struct SymbolSeries {
    pub symbol: String,
    pub bars: Vec<PriceBar>,
}

pub struct Scanner<'a> {
    config: &'a StrategyConfig,
    parallel: bool,
    cancel: Option<&'a AtomicBool>,
}

impl<'a> Scanner<'a> {
    pub fn new(config: &'a StrategyConfig) -> Self {
        Scanner {
            config,
            parallel: true,
            cancel: None,
        }
    }

    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Symbols not yet started when the flag is raised are left out of the
    /// results. A symbol already running always finishes.
    pub fn with_cancel(mut self, cancel: &'a AtomicBool) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn scan(&self, universe: &[SymbolSeries]) -> ScanResults {
        info!(
            symbols = universe.len(),
            parallel = self.parallel,
            "scan started"
        );

        let results: Vec<(String, Result<BacktestResult, SigtraderError>)> = if self.parallel {
            universe
                .par_iter()
                .filter_map(|series| self.run_one(series))
                .collect()
        } else {
            universe
                .iter()
                .filter_map(|series| self.run_one(series))
                .collect()
        };

        let completed = results.len();
        let failed = results.iter().filter(|(_, r)| r.is_err()).count();
        info!(completed, failed, "scan complete");

        results.into_iter().collect()
    }

    fn run_one(
        &self,
        series: &SymbolSeries,
    ) -> Option<(String, Result<BacktestResult, SigtraderError>)> {
        if self.cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            warn!(symbol = %series.symbol, "scan cancelled, symbol skipped");
            return None;
        }
        let result = run_backtest(&series.symbol, &series.bars, self.config);
        if let Err(e) = &result {
            warn!(symbol = %series.symbol, error = %e, "backtest failed");
        }
        Some((series.symbol.clone(), result))
    }
}
