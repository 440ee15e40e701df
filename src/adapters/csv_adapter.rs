//! CSV file data adapter.
//!
//! One file per symbol, `<dir>/<SYMBOL>.csv`, with the header
//! `timestamp,open,high,low,close,volume`. Rows are returned in file order.

use crate::domain::error::SigtraderError;
use crate::domain::ohlcv::PriceBar;
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{symbol}.csv"))
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn field<'r>(
    record: &'r csv::StringRecord,
    index: usize,
    name: &str,
    line: usize,
) -> Result<&'r str, SigtraderError> {
    record.get(index).map(str::trim).ok_or_else(|| SigtraderError::Data {
        reason: format!("line {line}: missing {name} column"),
    })
}

fn parse_number<T: std::str::FromStr>(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
    line: usize,
) -> Result<T, SigtraderError> {
    let raw = field(record, index, name, line)?;
    raw.parse().map_err(|_| SigtraderError::Data {
        reason: format!("line {line}: invalid {name} value `{raw}`"),
    })
}

impl DataPort for CsvAdapter {
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<PriceBar>, SigtraderError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => SigtraderError::NoData {
                symbol: symbol.to_string(),
            },
            _ => SigtraderError::Data {
                reason: format!("failed to read {}: {}", path.display(), e),
            },
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for (row, result) in rdr.records().enumerate() {
            // header is line 1
            let line = row + 2;
            let record = result.map_err(|e| SigtraderError::Data {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;

            let raw_ts = field(&record, 0, "timestamp", line)?;
            let timestamp = parse_timestamp(raw_ts).ok_or_else(|| SigtraderError::Data {
                reason: format!("line {line}: invalid timestamp `{raw_ts}`"),
            })?;

            bars.push(PriceBar {
                timestamp,
                open: parse_number(&record, 1, "open", line)?,
                high: parse_number(&record, 2, "high", line)?,
                low: parse_number(&record, 3, "low", line)?,
                close: parse_number(&record, 4, "close", line)?,
                volume: parse_number(&record, 5, "volume", line)?,
            });
        }

        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, SigtraderError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| SigtraderError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(symbol) = name.strip_suffix(".csv") {
                // skip reports written next to the data
                if !symbol.ends_with("_trades") && !symbol.ends_with("_equity") {
                    symbols.push(symbol.to_string());
                }
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
