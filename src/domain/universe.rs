//! Symbol universe for multi-symbol scans.
//!
//! Parses symbol lists from configuration or the command line and loads each
//! symbol's bars through a `DataPort`, skipping symbols that have no data.

use crate::domain::scan::SymbolSeries;
use crate::ports::data_port::DataPort;
use std::collections::HashSet;
use tracing::{info, warn};

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),

    #[error("no symbol in the universe has data")]
    NoUsableSymbols,
}

pub fn parse_symbols(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if !seen.insert(symbol.clone()) {
            return Err(UniverseError::DuplicateSymbol(symbol));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: String,
}

#[derive(Debug)]
pub struct LoadedUniverse {
    pub series: Vec<SymbolSeries>,
    pub skipped: Vec<SkippedSymbol>,
}

/// Fetch bars for every symbol. Fetch failures and empty series are skipped
/// with a warning; short series are kept so the backtest reports them.
pub fn load_universe(
    data_port: &dyn DataPort,
    symbols: &[String],
) -> Result<LoadedUniverse, UniverseError> {
    let mut series = Vec::new();
    let mut skipped = Vec::new();

    for symbol in symbols {
        match data_port.fetch_bars(symbol) {
            Ok(bars) if bars.is_empty() => {
                warn!(symbol, "skipping symbol, no bars");
                skipped.push(SkippedSymbol {
                    symbol: symbol.clone(),
                    reason: "no data".to_string(),
                });
            }
            Ok(bars) => {
                info!(symbol, bars = bars.len(), "loaded");
                series.push(SymbolSeries {
                    symbol: symbol.clone(),
                    bars,
                });
            }
            Err(e) => {
                warn!(symbol, error = %e, "skipping symbol");
                skipped.push(SkippedSymbol {
                    symbol: symbol.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    if series.is_empty() {
        return Err(UniverseError::NoUsableSymbols);
    }

    Ok(LoadedUniverse { series, skipped })
}
