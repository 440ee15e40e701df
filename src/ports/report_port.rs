//! Report generation port trait.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::SigtraderError;
use std::path::Path;

/// Port for writing backtest reports.
pub trait ReportPort {
    fn write(&self, result: &BacktestResult, output_dir: &Path) -> Result<(), SigtraderError>;

    /// Default implementation: one `write` per result.
    fn write_all<'a, I>(&self, results: I, output_dir: &Path) -> Result<(), SigtraderError>
    where
        I: IntoIterator<Item = &'a BacktestResult>,
        Self: Sized,
    {
        for result in results {
            self.write(result, output_dir)?;
        }
        Ok(())
    }
}
