//! Open positions and the trades they resolve into.

use chrono::NaiveDateTime;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub symbol: String,
    pub entry_timestamp: NaiveDateTime,
    pub entry_price: f64,
    pub quantity: f64,
    /// Bars seen since entry, the entry bar excluded.
    pub bars_held: usize,
}

impl Position {
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        (price - self.entry_price) * self.quantity
    }

    /// Fractional move from entry (0.1 = +10%).
    pub fn return_at(&self, price: f64) -> f64 {
        (price - self.entry_price) / self.entry_price
    }

    pub fn should_stop_loss(&self, price: f64, stop_loss_pct: Option<f64>) -> bool {
        stop_loss_pct.is_some_and(|pct| self.return_at(price) <= -pct)
    }

    pub fn should_take_profit(&self, price: f64, take_profit_pct: Option<f64>) -> bool {
        take_profit_pct.is_some_and(|pct| self.return_at(price) >= pct)
    }

    /// Close at `exit_price`, consuming the position.
    pub fn close(
        self,
        exit_timestamp: NaiveDateTime,
        exit_price: f64,
        exit_reason: ExitReason,
    ) -> Trade {
        let pnl = self.unrealized_pnl(exit_price);
        let pnl_percent = self.return_at(exit_price) * 100.0;
        Trade {
            symbol: self.symbol,
            entry_timestamp: self.entry_timestamp,
            entry_price: self.entry_price,
            exit_timestamp,
            exit_price,
            quantity: self.quantity,
            pnl,
            pnl_percent,
            holding_bars: self.bars_held,
            exit_reason,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Signal,
    StopLoss,
    TakeProfit,
    EndOfData,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::Signal => write!(f, "signal"),
            ExitReason::StopLoss => write!(f, "stop_loss"),
            ExitReason::TakeProfit => write!(f, "take_profit"),
            ExitReason::EndOfData => write!(f, "end_of_data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub symbol: String,
    pub entry_timestamp: NaiveDateTime,
    pub entry_price: f64,
    pub exit_timestamp: NaiveDateTime,
    pub exit_price: f64,
    pub quantity: f64,
    pub pnl: f64,
    /// Percent, not fraction: 10.0 means +10%.
    pub pnl_percent: f64,
    pub holding_bars: usize,
    pub exit_reason: ExitReason,
}
