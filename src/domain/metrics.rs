//! Performance metrics computed once a simulation has finished.

use super::backtest::EquityPoint;
use super::position::Trade;

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub trade_count: usize,
    pub win_rate: f64,
    pub total_pnl: f64,
    pub average_pnl: f64,
    /// Largest fall from a running equity peak, in P&L units.
    pub max_drawdown: f64,
    /// Longest run of bars spent below a prior peak.
    pub max_drawdown_duration: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub trades_breakeven: usize,
    pub profit_factor: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub avg_holding_bars: f64,
    /// Trade returns compounded, in percent.
    pub total_return_pct: f64,
    pub average_return_pct: f64,
}

impl Metrics {
    pub fn compute(trades: &[Trade], equity_curve: &[EquityPoint]) -> Self {
        let (max_drawdown, max_drawdown_duration) = compute_drawdown(equity_curve);

        let mut trades_won = 0usize;
        let mut trades_lost = 0usize;
        let mut trades_breakeven = 0usize;
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;
        let mut total_holding_bars = 0usize;
        let mut growth = 1.0_f64;
        let mut return_sum = 0.0_f64;

        for trade in trades {
            let pnl = trade.pnl;
            if pnl > 0.0 {
                trades_won += 1;
                total_wins += pnl;
                largest_win = largest_win.max(pnl);
            } else if pnl < 0.0 {
                trades_lost += 1;
                total_losses += pnl.abs();
                largest_loss = largest_loss.max(pnl.abs());
            } else {
                trades_breakeven += 1;
            }
            total_holding_bars += trade.holding_bars;
            growth *= 1.0 + trade.pnl_percent / 100.0;
            return_sum += trade.pnl_percent;
        }

        let trade_count = trades.len();
        let per_trade = |total: f64, count: usize| {
            if count > 0 { total / count as f64 } else { 0.0 }
        };

        let total_pnl: f64 = trades.iter().map(|t| t.pnl).sum();

        let profit_factor = if total_losses > 0.0 {
            total_wins / total_losses
        } else if total_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        Metrics {
            trade_count,
            win_rate: per_trade(trades_won as f64, trade_count),
            total_pnl,
            average_pnl: per_trade(total_pnl, trade_count),
            max_drawdown,
            max_drawdown_duration,
            trades_won,
            trades_lost,
            trades_breakeven,
            profit_factor,
            avg_win: per_trade(total_wins, trades_won),
            avg_loss: per_trade(total_losses, trades_lost),
            largest_win,
            largest_loss,
            avg_holding_bars: per_trade(total_holding_bars as f64, trade_count),
            total_return_pct: if trade_count > 0 { (growth - 1.0) * 100.0 } else { 0.0 },
            average_return_pct: per_trade(return_sum, trade_count),
        }
    }
}

fn compute_drawdown(equity_curve: &[EquityPoint]) -> (f64, usize) {
    let Some(first) = equity_curve.first() else {
        return (0.0, 0);
    };

    let mut peak = first.equity;
    let mut max_dd = 0.0_f64;
    let mut duration = 0usize;
    let mut max_duration = 0usize;

    for point in equity_curve {
        if point.equity >= peak {
            peak = point.equity;
            duration = 0;
        } else {
            max_dd = max_dd.max(peak - point.equity);
            duration += 1;
            max_duration = max_duration.max(duration);
        }
    }

    (max_dd, max_duration)
}
