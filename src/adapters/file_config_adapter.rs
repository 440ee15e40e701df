//! INI file configuration adapter.

use crate::domain::error::SigtraderError;
use crate::domain::strategy::{PositionSizing, StrategyConfig};
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SigtraderError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| SigtraderError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, SigtraderError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| SigtraderError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config
            .get(section, key)
            .filter(|v| !v.trim().is_empty())
    }
}

const STRATEGY: &str = "strategy";

/// Read the `[strategy]` section. Missing keys take the defaults of
/// [`StrategyConfig::default`]; range checks are left to validation.
pub fn build_strategy_config(adapter: &dyn ConfigPort) -> Result<StrategyConfig, SigtraderError> {
    let d = StrategyConfig::default();

    let sizing_value = adapter.get_double(STRATEGY, "position_value", d.position_sizing.value())?;
    let position_sizing = match adapter.get_string(STRATEGY, "position_sizing").as_deref() {
        None | Some("fixed_quantity") => PositionSizing::FixedQuantity(sizing_value),
        Some("fixed_notional") => PositionSizing::FixedNotional(sizing_value),
        Some(other) => {
            return Err(SigtraderError::ConfigInvalid {
                section: STRATEGY.into(),
                key: "position_sizing".into(),
                reason: format!("expected fixed_quantity or fixed_notional, got `{other}`"),
            });
        }
    };

    let optional_pct = |key: &str| -> Result<Option<f64>, SigtraderError> {
        match adapter.get_string(STRATEGY, key) {
            None => Ok(None),
            Some(_) => adapter.get_double(STRATEGY, key, 0.0).map(Some),
        }
    };

    Ok(StrategyConfig {
        rsi_period: adapter.get_usize(STRATEGY, "rsi_period", d.rsi_period)?,
        rsi_oversold: adapter.get_double(STRATEGY, "rsi_oversold", d.rsi_oversold)?,
        rsi_overbought: adapter.get_double(STRATEGY, "rsi_overbought", d.rsi_overbought)?,
        ema_fast_period: adapter.get_usize(STRATEGY, "ema_fast", d.ema_fast_period)?,
        ema_slow_period: adapter.get_usize(STRATEGY, "ema_slow", d.ema_slow_period)?,
        use_sma_filter: adapter.get_bool(STRATEGY, "use_sma_filter", d.use_sma_filter)?,
        sma_period: adapter.get_usize(STRATEGY, "sma_period", d.sma_period)?,
        use_adx_filter: adapter.get_bool(STRATEGY, "use_adx_filter", d.use_adx_filter)?,
        adx_period: adapter.get_usize(STRATEGY, "adx_period", d.adx_period)?,
        adx_threshold: adapter.get_double(STRATEGY, "adx_threshold", d.adx_threshold)?,
        use_macd_filter: adapter.get_bool(STRATEGY, "use_macd_filter", d.use_macd_filter)?,
        macd_fast: adapter.get_usize(STRATEGY, "macd_fast", d.macd_fast)?,
        macd_slow: adapter.get_usize(STRATEGY, "macd_slow", d.macd_slow)?,
        macd_signal: adapter.get_usize(STRATEGY, "macd_signal", d.macd_signal)?,
        position_sizing,
        stop_loss_pct: optional_pct("stop_loss")?,
        take_profit_pct: optional_pct("take_profit")?,
    })
}
