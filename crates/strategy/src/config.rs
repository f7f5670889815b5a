use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use common::{Error, Result, Timeframe};

/// Top-level strategy config file (TOML).
///
/// Example `config/strategy.toml`:
/// ```toml
/// [strategy]
/// type = "auto"
/// name = "BTC auto 1h"
/// symbol = "BTCUSDT"
/// timeframe = "1h"
/// amount = 0.001
///
/// [strategy.params]
/// short_window = 20
/// long_window = 50
/// grid_lower = 50000.0
/// grid_upper = 60000.0
/// grid_step = 500.0
/// rsi_period = 14
/// overbought = 70
/// oversold = 30
/// adx_period = 14
/// adx_trend_threshold = 25.0
/// bb_period = 20
/// bb_deviations = 2.0
/// bbw_high = 0.10
/// bbw_low = 0.05
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StrategyFileConfig {
    pub strategy: StrategyConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StrategyConfig {
    /// Strategy type identifier: "trend", "grid", "mean" or "auto".
    #[serde(rename = "type")]
    pub strategy_type: String,
    /// Human-readable name shown in logs.
    pub name: String,
    /// Trading symbol, e.g. "BTCUSDT".
    pub symbol: String,
    /// Candle interval the strategy reads.
    pub timeframe: Timeframe,
    /// Fixed order size in base asset units.
    pub amount: f64,
    /// Indicator-specific parameters.
    #[serde(default)]
    pub params: HashMap<String, toml::Value>,
}

impl StrategyFileConfig {
    /// Load and parse a TOML strategy file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
            .map_err(|e| Error::Config(format!("failed to parse strategy config at '{path}': {e}")))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        let amount = cfg.strategy.amount;
        if !(amount.is_finite() && amount > 0.0) {
            return Err(Error::Config(format!(
                "amount must be positive and finite, got {amount}"
            )));
        }
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_file() {
        let cfg = StrategyFileConfig::parse(
            r#"
            [strategy]
            type = "trend"
            name = "BTC trend"
            symbol = "BTCUSDT"
            timeframe = "1h"
            amount = 0.01
            "#,
        )
        .unwrap();
        assert_eq!(cfg.strategy.strategy_type, "trend");
        assert_eq!(cfg.strategy.timeframe, Timeframe::H1);
        assert!(cfg.strategy.params.is_empty());
    }

    #[test]
    fn parses_params_table() {
        let cfg = StrategyFileConfig::parse(
            r#"
            [strategy]
            type = "mean"
            name = "ETH rsi"
            symbol = "ETHUSDT"
            timeframe = "15m"
            amount = 1.0

            [strategy.params]
            rsi_period = 7
            overbought = 80
            "#,
        )
        .unwrap();
        assert_eq!(cfg.strategy.params["rsi_period"].as_integer(), Some(7));
    }

    #[test]
    fn rejects_non_positive_or_infinite_amount() {
        for amount in ["0.0", "-1.0", "inf", "nan"] {
            let result = StrategyFileConfig::parse(&format!(
                r#"
                [strategy]
                type = "trend"
                name = "x"
                symbol = "BTCUSDT"
                timeframe = "1h"
                amount = {amount}
                "#
            ));
            assert!(matches!(result, Err(Error::Config(_))), "amount = {amount}");
        }
    }

    #[test]
    fn rejects_unknown_timeframe() {
        let result = StrategyFileConfig::parse(
            r#"
            [strategy]
            type = "trend"
            name = "x"
            symbol = "BTCUSDT"
            timeframe = "7m"
            amount = 1.0
            "#,
        );
        assert!(result.is_err());
    }
}
