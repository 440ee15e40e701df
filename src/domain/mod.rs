//! Core domain types and logic. Nothing under this module performs I/O.

pub mod ohlcv;
pub mod error;
pub mod indicator;
pub mod strategy;
pub mod config_validation;
pub mod signal;
pub mod position;
pub mod ledger;
pub mod backtest;
pub mod metrics;
pub mod scan;
pub mod universe;
