//! sigtrader: RSI/EMA signal engine and single-position backtester.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`], command-line dispatch in [`cli`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
