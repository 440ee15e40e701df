//! Position & trade ledger.
//!
//! Holds at most one open long position per symbol. Signals must arrive in
//! timestamp order per symbol; stale or duplicate timestamps are dropped.

use chrono::NaiveDateTime;
use std::collections::HashMap;
use tracing::{debug, warn};

use super::position::{ExitReason, Position, Trade};
use super::signal::{Signal, SignalKind};
use super::strategy::PositionSizing;

#[derive(Debug, Clone)]
pub struct Ledger {
    sizing: PositionSizing,
    stop_loss_pct: Option<f64>,
    take_profit_pct: Option<f64>,
    positions: HashMap<String, Position>,
    last_seen: HashMap<String, NaiveDateTime>,
    trades: Vec<Trade>,
    realized_pnl: f64,
    opened: usize,
}

impl Ledger {
    pub fn new(
        sizing: PositionSizing,
        stop_loss_pct: Option<f64>,
        take_profit_pct: Option<f64>,
    ) -> Self {
        Ledger {
            sizing,
            stop_loss_pct,
            take_profit_pct,
            positions: HashMap::new(),
            last_seen: HashMap::new(),
            trades: Vec::new(),
            realized_pnl: 0.0,
            opened: 0,
        }
    }

    /// Apply one signal. Returns the trade when the signal closes a position.
    ///
    /// BUY with a position open and SELL with none are ignored: no pyramiding
    /// and no shorting. HOLD leaves positions and trades untouched.
    pub fn on_signal(&mut self, signal: &Signal) -> Option<Trade> {
        if !self.observe(&signal.symbol, signal.timestamp) {
            return None;
        }
        if let Some(pos) = self.positions.get_mut(&signal.symbol) {
            pos.bars_held += 1;
        }

        match signal.kind {
            SignalKind::Hold => None,
            SignalKind::Buy => {
                if self.positions.contains_key(&signal.symbol) {
                    debug!(symbol = %signal.symbol, "BUY ignored, position already open");
                    return None;
                }
                self.open(signal);
                None
            }
            SignalKind::Sell => {
                let pos = self.positions.remove(&signal.symbol)?;
                Some(self.record(pos.close(
                    signal.timestamp,
                    signal.reference_price,
                    ExitReason::Signal,
                )))
            }
        }
    }

    /// Close the open position for `symbol` if `price` breaches its stop-loss
    /// or take-profit level. A bar that exits here is consumed: a later
    /// signal with the same timestamp is dropped.
    pub fn check_protective_exit(
        &mut self,
        symbol: &str,
        timestamp: NaiveDateTime,
        price: f64,
    ) -> Option<Trade> {
        if self.stop_loss_pct.is_none() && self.take_profit_pct.is_none() {
            return None;
        }
        if self.last_seen.get(symbol).is_some_and(|&last| timestamp <= last) {
            return None;
        }
        let pos = self.positions.get(symbol)?;
        let reason = if pos.should_stop_loss(price, self.stop_loss_pct) {
            ExitReason::StopLoss
        } else if pos.should_take_profit(price, self.take_profit_pct) {
            ExitReason::TakeProfit
        } else {
            return None;
        };

        self.last_seen.insert(symbol.to_string(), timestamp);
        let mut pos = self.positions.remove(symbol)?;
        pos.bars_held += 1;
        Some(self.record(pos.close(timestamp, price, reason)))
    }

    /// Close whatever is still open for `symbol` at end of data. The caller
    /// must pass a timestamp after the entry bar.
    pub fn force_close(
        &mut self,
        symbol: &str,
        timestamp: NaiveDateTime,
        price: f64,
    ) -> Option<Trade> {
        let pos = self.positions.remove(symbol)?;
        Some(self.record(pos.close(timestamp, price, ExitReason::EndOfData)))
    }

    pub fn open_position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    pub fn has_position(&self, symbol: &str) -> bool {
        self.positions.contains_key(symbol)
    }

    pub fn open_count(&self) -> usize {
        self.positions.len()
    }

    /// Positions opened over the ledger's lifetime.
    pub fn opened_count(&self) -> usize {
        self.opened
    }

    pub fn realized_pnl(&self) -> f64 {
        self.realized_pnl
    }

    /// Mark-to-market P&L of the open position for `symbol`, 0 when flat.
    pub fn unrealized_pnl(&self, symbol: &str, price: f64) -> f64 {
        self.positions
            .get(symbol)
            .map_or(0.0, |pos| pos.unrealized_pnl(price))
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn into_trades(self) -> Vec<Trade> {
        self.trades
    }

    fn observe(&mut self, symbol: &str, timestamp: NaiveDateTime) -> bool {
        if let Some(&last) = self.last_seen.get(symbol) {
            if timestamp <= last {
                warn!(symbol, %timestamp, %last, "out-of-order signal ignored");
                return false;
            }
        }
        self.last_seen.insert(symbol.to_string(), timestamp);
        true
    }

    fn open(&mut self, signal: &Signal) {
        let quantity = self.sizing.quantity_at(signal.reference_price);
        debug!(
            symbol = %signal.symbol,
            price = signal.reference_price,
            quantity,
            "position opened"
        );
        self.positions.insert(
            signal.symbol.clone(),
            Position {
                symbol: signal.symbol.clone(),
                entry_timestamp: signal.timestamp,
                entry_price: signal.reference_price,
                quantity,
                bars_held: 0,
            },
        );
        self.opened += 1;
    }

    fn record(&mut self, trade: Trade) -> Trade {
        debug!(
            symbol = %trade.symbol,
            pnl = trade.pnl,
            reason = %trade.exit_reason,
            "position closed"
        );
        self.realized_pnl += trade.pnl;
        self.trades.push(trade.clone());
        trade
    }
}
