//! Data access port trait.

use crate::domain::error::SigtraderError;
use crate::domain::ohlcv::PriceBar;

pub trait DataPort {
    /// Bars for `symbol` in source order. Implementations must not reorder.
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<PriceBar>, SigtraderError>;

    fn list_symbols(&self) -> Result<Vec<String>, SigtraderError>;
}
