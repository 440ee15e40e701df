//! CSV report adapter implementing ReportPort.
//!
//! Writes `<SYMBOL>_trades.csv` and `<SYMBOL>_equity.csv` into the output
//! directory, creating it when missing.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::backtest::BacktestResult;
use crate::domain::error::SigtraderError;
use crate::ports::report_port::ReportPort;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Default)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        CsvReportAdapter
    }

    pub fn trades_path(output_dir: &Path, symbol: &str) -> PathBuf {
        output_dir.join(format!("{symbol}_trades.csv"))
    }

    pub fn equity_path(output_dir: &Path, symbol: &str) -> PathBuf {
        output_dir.join(format!("{symbol}_equity.csv"))
    }
}

fn csv_error(path: &Path, e: csv::Error) -> SigtraderError {
    SigtraderError::Data {
        reason: format!("failed to write {}: {}", path.display(), e),
    }
}

fn write_trades(result: &BacktestResult, path: &Path) -> Result<(), SigtraderError> {
    let mut wtr = csv::Writer::from_path(path).map_err(|e| csv_error(path, e))?;
    wtr.write_record([
        "symbol",
        "entry_timestamp",
        "entry_price",
        "exit_timestamp",
        "exit_price",
        "quantity",
        "pnl",
        "pnl_percent",
        "holding_bars",
        "exit_reason",
    ])
    .map_err(|e| csv_error(path, e))?;

    for t in &result.trades {
        wtr.write_record([
            t.symbol.clone(),
            t.entry_timestamp.format(TIMESTAMP_FORMAT).to_string(),
            format!("{:.4}", t.entry_price),
            t.exit_timestamp.format(TIMESTAMP_FORMAT).to_string(),
            format!("{:.4}", t.exit_price),
            format!("{:.4}", t.quantity),
            format!("{:.4}", t.pnl),
            format!("{:.4}", t.pnl_percent),
            t.holding_bars.to_string(),
            t.exit_reason.to_string(),
        ])
        .map_err(|e| csv_error(path, e))?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_equity(result: &BacktestResult, path: &Path) -> Result<(), SigtraderError> {
    let mut wtr = csv::Writer::from_path(path).map_err(|e| csv_error(path, e))?;
    wtr.write_record(["timestamp", "signal", "equity"])
        .map_err(|e| csv_error(path, e))?;

    for (point, signal) in result.equity_curve.iter().zip(&result.signals) {
        wtr.write_record([
            point.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            signal.kind.to_string(),
            format!("{:.4}", point.equity),
        ])
        .map_err(|e| csv_error(path, e))?;
    }
    wtr.flush()?;
    Ok(())
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, result: &BacktestResult, output_dir: &Path) -> Result<(), SigtraderError> {
        fs::create_dir_all(output_dir)?;
        write_trades(result, &Self::trades_path(output_dir, &result.symbol))?;
        write_equity(result, &Self::equity_path(output_dir, &result.symbol))?;
        Ok(())
    }
}
