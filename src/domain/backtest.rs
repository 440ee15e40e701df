//! Backtest simulator.
//!
//! Replays one symbol's bars in order through the signal generator and the
//! ledger. Indicators are precomputed as full series, so advancing a bar is
//! an index increment; nothing at index `i` ever reads a value past `i`.

use chrono::NaiveDateTime;
use tracing::{debug, info};

use super::config_validation::validate_strategy_config;
use super::error::SigtraderError;
use super::ledger::Ledger;
use super::metrics::Metrics;
use super::ohlcv::PriceBar;
use super::position::Trade;
use super::signal::{evaluate_signal, IndicatorSet, Signal, SignalGenerator, SignalKind};
use super::strategy::StrategyConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationPhase {
    /// Some required indicator is still undefined.
    Warmup,
    Active,
    /// Last bar processed, open exposure force-closed.
    Finished,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub symbol: String,
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<Trade>,
    /// One signal per input bar.
    pub signals: Vec<Signal>,
    /// First bar on which every required indicator is defined.
    pub first_active_index: Option<usize>,
    pub metrics: Metrics,
}

/// Check the series before simulating anything.
pub fn validate_bars(
    symbol: &str,
    bars: &[PriceBar],
    config: &StrategyConfig,
) -> Result<(), SigtraderError> {
    let minimum = config.min_bars();
    if bars.len() < minimum {
        return Err(SigtraderError::InsufficientData {
            symbol: symbol.to_string(),
            bars: bars.len(),
            minimum,
        });
    }

    for (index, pair) in bars.windows(2).enumerate() {
        if pair[1].timestamp <= pair[0].timestamp {
            return Err(SigtraderError::NonMonotonicTimestamp {
                symbol: symbol.to_string(),
                index: index + 1,
                previous: pair[0].timestamp,
                current: pair[1].timestamp,
            });
        }
    }

    if let Some(index) = bars.iter().position(|b| !b.has_valid_prices()) {
        return Err(SigtraderError::InvalidPrice {
            symbol: symbol.to_string(),
            index,
        });
    }

    Ok(())
}

pub fn run_backtest(
    symbol: &str,
    bars: &[PriceBar],
    config: &StrategyConfig,
) -> Result<BacktestResult, SigtraderError> {
    validate_strategy_config(config)?;
    validate_bars(symbol, bars, config)?;

    info!(symbol, bars = bars.len(), "backtest started");

    let indicators = IndicatorSet::compute(bars, config);
    let mut generator = SignalGenerator::new(symbol, bars, &indicators, config);
    let mut ledger = Ledger::new(
        config.position_sizing,
        config.stop_loss_pct,
        config.take_profit_pct,
    );

    let last_index = bars.len() - 1;
    let mut phase = SimulationPhase::Warmup;
    let mut first_active_index = None;
    let mut equity_curve = Vec::with_capacity(bars.len());
    let mut signals = Vec::with_capacity(bars.len());
    let mut index = 0;

    while let Some(signal) = generator.next() {
        let bar = &bars[index];

        if phase == SimulationPhase::Warmup
            && generator
                .last_snapshot()
                .is_some_and(|snapshot| snapshot.is_ready(config))
        {
            phase = SimulationPhase::Active;
            first_active_index = Some(index);
            debug!(symbol, index, "warm-up complete");
        }

        let exited = ledger
            .check_protective_exit(symbol, bar.timestamp, bar.close)
            .is_some();
        // An entry on the final bar could never close after it.
        let final_entry = index == last_index
            && signal.kind == SignalKind::Buy
            && !ledger.has_position(symbol);
        if !exited && !final_entry {
            ledger.on_signal(&signal);
        }

        let equity = ledger.realized_pnl() + ledger.unrealized_pnl(symbol, bar.close);
        equity_curve.push(EquityPoint {
            timestamp: bar.timestamp,
            equity,
        });
        signals.push(signal);
        index += 1;
    }

    let last_bar = &bars[last_index];
    ledger.force_close(symbol, last_bar.timestamp, last_bar.close);
    phase = SimulationPhase::Finished;
    debug!(symbol, ?phase, "simulation finished");

    let trades = ledger.into_trades();
    let metrics = Metrics::compute(&trades, &equity_curve);

    info!(
        symbol,
        trades = metrics.trade_count,
        total_pnl = metrics.total_pnl,
        win_rate = metrics.win_rate,
        "backtest complete"
    );

    Ok(BacktestResult {
        symbol: symbol.to_string(),
        equity_curve,
        trades,
        signals,
        first_active_index,
        metrics,
    })
}

/// Signal for the final bar, evaluated against the bar before it.
///
/// Same checks as [`run_backtest`]. On a series of exactly `min_bars` bars
/// the previous bar is still warming up and the result is `Hold`.
pub fn latest_signal(
    symbol: &str,
    bars: &[PriceBar],
    config: &StrategyConfig,
) -> Result<Signal, SigtraderError> {
    validate_strategy_config(config)?;
    validate_bars(symbol, bars, config)?;

    let indicators = IndicatorSet::compute(bars, config);
    let last = bars.len() - 1;
    let current = indicators.snapshot(last, &bars[last]);
    let previous = last
        .checked_sub(1)
        .map(|i| indicators.snapshot(i, &bars[i]));
    Ok(evaluate_signal(symbol, &current, previous.as_ref(), config))
}


#[cfg(test)]
mod tests {
    use super::fixtures::{fast_config, DIP_AND_RALLY};
    use super::*;
    use crate::domain::indicator::test_support::make_bars;
    use crate::domain::position::ExitReason;
    use crate::domain::strategy::PositionSizing;
    use approx::assert_relative_eq;

    #[test]
    fn dip_and_rally_round_trip() {
        let bars = make_bars(&DIP_AND_RALLY);
        let result = run_backtest("RELIANCE", &bars, &fast_config()).unwrap();

        assert_eq!(result.trades.len(), 1);
        let trade = &result.trades[0];
        assert_eq!(trade.entry_timestamp, bars[14].timestamp);
        assert_eq!(trade.exit_timestamp, bars[22].timestamp);
        assert_relative_eq!(trade.entry_price, 115.0);
        assert_relative_eq!(trade.exit_price, 133.0);
        assert_relative_eq!(trade.pnl, 18.0);
        assert_eq!(trade.holding_bars, 8);
        assert_eq!(trade.exit_reason, ExitReason::Signal);

        assert_eq!(result.signals[14].kind, SignalKind::Buy);
        assert_eq!(result.signals[22].kind, SignalKind::Sell);
        assert_eq!(result.first_active_index, Some(7));
    }

    #[test]
    fn latest_signal_reads_final_bar() {
        let config = fast_config();
        let buy_bars = make_bars(&DIP_AND_RALLY[..15]);
        let signal = latest_signal("RELIANCE", &buy_bars, &config).unwrap();
        assert_eq!(signal.kind, SignalKind::Buy);
        assert_eq!(signal.timestamp, buy_bars[14].timestamp);
        assert_relative_eq!(signal.reference_price, 115.0);

        let sell_bars = make_bars(&DIP_AND_RALLY[..23]);
        assert_eq!(
            latest_signal("RELIANCE", &sell_bars, &config).unwrap().kind,
            SignalKind::Sell
        );

        let hold_bars = make_bars(&DIP_AND_RALLY[..20]);
        assert_eq!(
            latest_signal("RELIANCE", &hold_bars, &config).unwrap().kind,
            SignalKind::Hold
        );
    }

    #[test]
    fn latest_signal_needs_warm_series() {
        let bars = make_bars(&DIP_AND_RALLY[..5]);
        assert!(matches!(
            latest_signal("RELIANCE", &bars, &fast_config()),
            Err(SigtraderError::InsufficientData { .. })
        ));
    }

    #[test]
    fn buy_on_final_bar_is_not_opened() {
        let bars = make_bars(&DIP_AND_RALLY[..15]);
        let result = run_backtest("RELIANCE", &bars, &fast_config()).unwrap();
        assert_eq!(result.signals[14].kind, SignalKind::Buy);
        assert!(result.trades.is_empty());
        assert_relative_eq!(result.equity_curve[14].equity, 0.0);
    }

    #[test]
    fn equity_curve_one_point_per_bar() {
        let bars = make_bars(&DIP_AND_RALLY);
        let result = run_backtest("RELIANCE", &bars, &fast_config()).unwrap();

        assert_eq!(result.equity_curve.len(), bars.len());
        assert_eq!(result.signals.len(), bars.len());
        for (point, bar) in result.equity_curve.iter().zip(&bars) {
            assert_eq!(point.timestamp, bar.timestamp);
        }
        assert_relative_eq!(result.equity_curve[14].equity, 0.0);
        assert_relative_eq!(result.equity_curve[20].equity, 24.0);
        assert_relative_eq!(result.equity_curve[25].equity, 18.0);
        assert_relative_eq!(result.metrics.max_drawdown, 6.0);
        assert_eq!(result.metrics.max_drawdown_duration, 5);
    }

    #[test]
    fn open_position_force_closed_at_last_bar() {
        let bars = make_bars(&DIP_AND_RALLY[..20]);
        let result = run_backtest("RELIANCE", &bars, &fast_config()).unwrap();

        assert_eq!(result.trades.len(), 1);
        let trade = &result.trades[0];
        assert_eq!(trade.exit_reason, ExitReason::EndOfData);
        assert_eq!(trade.exit_timestamp, bars[19].timestamp);
        assert_relative_eq!(trade.pnl, 20.0);
        assert_relative_eq!(result.equity_curve[19].equity, result.metrics.total_pnl);
    }

    #[test]
    fn take_profit_exits_before_signal() {
        let bars = make_bars(&DIP_AND_RALLY);
        let config = StrategyConfig {
            take_profit_pct: Some(0.1),
            ..fast_config()
        };
        let result = run_backtest("RELIANCE", &bars, &config).unwrap();

        assert_eq!(result.trades.len(), 1);
        let trade = &result.trades[0];
        assert_eq!(trade.exit_reason, ExitReason::TakeProfit);
        assert_eq!(trade.exit_timestamp, bars[17].timestamp);
        assert_relative_eq!(trade.pnl, 12.0);
        assert_eq!(trade.holding_bars, 3);
    }

    #[test]
    fn fixed_notional_scales_pnl() {
        let bars = make_bars(&DIP_AND_RALLY);
        let config = StrategyConfig {
            position_sizing: PositionSizing::FixedNotional(1_150.0),
            ..fast_config()
        };
        let result = run_backtest("RELIANCE", &bars, &config).unwrap();
        assert_relative_eq!(result.trades[0].quantity, 10.0);
        assert_relative_eq!(result.metrics.total_pnl, 180.0, epsilon = 1e-9);
    }

    #[test]
    fn flat_series_never_trades() {
        let bars = make_bars(&[100.0; 30]);
        let result = run_backtest("FLAT", &bars, &fast_config()).unwrap();
        assert!(result.trades.is_empty());
        assert_eq!(result.metrics.win_rate, 0.0);
        assert!(result.equity_curve.iter().all(|p| p.equity == 0.0));
    }

    #[test]
    fn insufficient_data_rejected() {
        let config = fast_config();
        let bars = make_bars(&DIP_AND_RALLY[..config.min_bars() - 1]);
        match run_backtest("SHORT", &bars, &config) {
            Err(SigtraderError::InsufficientData { bars, minimum, .. }) => {
                assert_eq!(bars, 7);
                assert_eq!(minimum, 8);
            }
            other => panic!("expected InsufficientData, got {other:?}"),
        }
    }

    #[test]
    fn series_of_exactly_min_bars_is_accepted() {
        let config = StrategyConfig::default();
        let closes: Vec<f64> = (0..config.min_bars()).map(|i| 100.0 + i as f64).collect();
        let result = run_backtest("EDGE", &make_bars(&closes), &config).unwrap();
        assert_eq!(result.signals.len(), 50);
        assert_eq!(result.first_active_index, Some(49));
        assert!(result.signals.iter().all(|s| s.kind == SignalKind::Hold));
        assert!(result.trades.is_empty());

        let latest = latest_signal("EDGE", &make_bars(&closes), &config).unwrap();
        assert_eq!(latest.kind, SignalKind::Hold);
    }

    #[test]
    fn huge_filter_period_is_insufficient_data() {
        let config = StrategyConfig {
            use_sma_filter: true,
            sma_period: usize::MAX,
            ..fast_config()
        };
        let bars = make_bars(&DIP_AND_RALLY);
        assert!(matches!(
            run_backtest("HUGE", &bars, &config),
            Err(SigtraderError::InsufficientData { minimum: usize::MAX, .. })
        ));

        let config = StrategyConfig {
            use_adx_filter: true,
            adx_period: usize::MAX / 2 + 1,
            ..fast_config()
        };
        assert!(matches!(
            latest_signal("HUGE", &bars, &config),
            Err(SigtraderError::InsufficientData { .. })
        ));
    }

    #[test]
    fn non_monotonic_timestamps_rejected() {
        let mut bars = make_bars(&DIP_AND_RALLY);
        bars[5].timestamp = bars[4].timestamp;
        match run_backtest("DUP", &bars, &fast_config()) {
            Err(SigtraderError::NonMonotonicTimestamp { index, .. }) => assert_eq!(index, 5),
            other => panic!("expected NonMonotonicTimestamp, got {other:?}"),
        }
    }

    #[test]
    fn non_positive_price_rejected() {
        let mut bars = make_bars(&DIP_AND_RALLY);
        bars[3].low = 0.0;
        assert!(matches!(
            run_backtest("ZERO", &bars, &fast_config()),
            Err(SigtraderError::InvalidPrice { index: 3, .. })
        ));
    }

    #[test]
    fn invalid_config_checked_first() {
        let config = StrategyConfig {
            use_adx_filter: true,
            adx_period: 0,
            ..fast_config()
        };
        assert!(matches!(
            run_backtest("ANY", &[], &config),
            Err(SigtraderError::InvalidConfig { .. })
        ));
    }
}
