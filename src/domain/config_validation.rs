//! Strategy configuration validation.
//!
//! Runs eagerly, before a backtest touches any bar.

use crate::domain::error::SigtraderError;
use crate::domain::strategy::{PositionSizing, StrategyConfig};

pub fn validate_strategy_config(config: &StrategyConfig) -> Result<(), SigtraderError> {
    validate_core_periods(config)?;
    validate_rsi_thresholds(config)?;
    validate_filters(config)?;
    validate_position_sizing(config.position_sizing)?;
    validate_protective_exits(config)?;
    Ok(())
}

fn require_positive_period(field: &str, value: usize) -> Result<(), SigtraderError> {
    if value == 0 {
        return Err(SigtraderError::invalid_config(field, "period must be positive"));
    }
    Ok(())
}

fn require_positive(field: &str, value: f64) -> Result<(), SigtraderError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(SigtraderError::invalid_config(field, "must be positive"));
    }
    Ok(())
}

fn validate_core_periods(config: &StrategyConfig) -> Result<(), SigtraderError> {
    require_positive_period("rsi_period", config.rsi_period)?;
    require_positive_period("ema_fast_period", config.ema_fast_period)?;
    require_positive_period("ema_slow_period", config.ema_slow_period)?;
    Ok(())
}

fn validate_rsi_thresholds(config: &StrategyConfig) -> Result<(), SigtraderError> {
    for (field, value) in [
        ("rsi_oversold", config.rsi_oversold),
        ("rsi_overbought", config.rsi_overbought),
    ] {
        if !(0.0..=100.0).contains(&value) {
            return Err(SigtraderError::invalid_config(
                field,
                "must be between 0 and 100",
            ));
        }
    }
    Ok(())
}

fn validate_filters(config: &StrategyConfig) -> Result<(), SigtraderError> {
    if config.use_sma_filter {
        require_positive_period("sma_period", config.sma_period)?;
    }
    if config.use_adx_filter {
        require_positive_period("adx_period", config.adx_period)?;
        require_positive("adx_threshold", config.adx_threshold)?;
    }
    if config.use_macd_filter {
        require_positive_period("macd_fast", config.macd_fast)?;
        require_positive_period("macd_slow", config.macd_slow)?;
        require_positive_period("macd_signal", config.macd_signal)?;
    }
    Ok(())
}

fn validate_position_sizing(sizing: PositionSizing) -> Result<(), SigtraderError> {
    require_positive("position_sizing", sizing.value())
}

fn validate_protective_exits(config: &StrategyConfig) -> Result<(), SigtraderError> {
    if let Some(pct) = config.stop_loss_pct {
        require_positive("stop_loss_pct", pct)?;
    }
    if let Some(pct) = config.take_profit_pct {
        require_positive("take_profit_pct", pct)?;
    }
    Ok(())
}
