use std::collections::HashMap;

use tracing::info;

use common::{Error, Result};

use crate::auto::{AutoParams, AutoStrategy};
use crate::config::StrategyConfig;
use crate::grid::{GridParams, GridTrading};
use crate::mean_reversion::{MeanReversion, MeanReversionParams};
use crate::trend::{TrendFollowing, TrendParams};
use crate::Strategy;

/// Most candles one `fetch_window` call can return (Binance klines cap).
pub const MAX_LOOKBACK: usize = 1_000;

// ─── Strategy builders ────────────────────────────────────────────────────────

/// Build the configured strategy. Unknown types and invalid parameters are
/// configuration errors.
pub fn build_strategy(cfg: &StrategyConfig) -> Result<Strategy> {
    let params = &cfg.params;
    let strategy = match cfg.strategy_type.as_str() {
        "trend" => Strategy::Trend(TrendFollowing::new(trend_params(params)?)?),
        "grid" => Strategy::Grid(GridTrading::new(grid_params(params)?)?),
        "mean" => Strategy::MeanReversion(MeanReversion::new(mean_params(params)?)?),
        "auto" => Strategy::Auto(AutoStrategy::new(
            auto_params(params)?,
            TrendFollowing::new(trend_params(params)?)?,
            GridTrading::new(grid_params(params)?)?,
            MeanReversion::new(mean_params(params)?)?,
        )?),
        other => {
            return Err(Error::Config(format!(
                "unknown strategy type '{other}' (expected trend, grid, mean or auto)"
            )))
        }
    };

    if strategy.lookback() > MAX_LOOKBACK {
        return Err(Error::Config(format!(
            "strategy '{}' needs {} candles per tick, exchanges serve at most {MAX_LOOKBACK}",
            cfg.name,
            strategy.lookback()
        )));
    }

    info!(
        name = %cfg.name,
        kind = strategy.kind(),
        symbol = %cfg.symbol,
        timeframe = %cfg.timeframe,
        lookback = strategy.lookback(),
        "Built strategy"
    );
    Ok(strategy)
}

fn trend_params(params: &HashMap<String, toml::Value>) -> Result<TrendParams> {
    Ok(TrendParams {
        short_window: param_usize(params, "short_window", 20)?,
        long_window: param_usize(params, "long_window", 50)?,
    })
}

fn grid_params(params: &HashMap<String, toml::Value>) -> Result<GridParams> {
    Ok(GridParams {
        lower: required_f64(params, "grid_lower")?,
        upper: required_f64(params, "grid_upper")?,
        step: required_f64(params, "grid_step")?,
    })
}

fn mean_params(params: &HashMap<String, toml::Value>) -> Result<MeanReversionParams> {
    Ok(MeanReversionParams {
        period: param_usize(params, "rsi_period", 14)?,
        overbought: param_f64(params, "overbought", 70.0)?,
        oversold: param_f64(params, "oversold", 30.0)?,
    })
}

fn auto_params(params: &HashMap<String, toml::Value>) -> Result<AutoParams> {
    Ok(AutoParams {
        adx_period: param_usize(params, "adx_period", 14)?,
        adx_trend_threshold: param_f64(params, "adx_trend_threshold", 25.0)?,
        bb_period: param_usize(params, "bb_period", 20)?,
        bb_deviations: param_f64(params, "bb_deviations", 2.0)?,
        bbw_high: param_f64(params, "bbw_high", 0.10)?,
        bbw_low: param_f64(params, "bbw_low", 0.05)?,
    })
}

/// Numeric parameter; integers are accepted where a float is expected.
fn as_f64(value: &toml::Value) -> Option<f64> {
    value
        .as_float()
        .or_else(|| value.as_integer().map(|v| v as f64))
}

fn param_f64(params: &HashMap<String, toml::Value>, key: &str, default: f64) -> Result<f64> {
    match params.get(key) {
        None => Ok(default),
        Some(v) => as_f64(v)
            .ok_or_else(|| Error::Config(format!("parameter '{key}' must be a number, got {v}"))),
    }
}

fn required_f64(params: &HashMap<String, toml::Value>, key: &str) -> Result<f64> {
    let v = params
        .get(key)
        .ok_or_else(|| Error::Config(format!("missing required parameter '{key}'")))?;
    as_f64(v).ok_or_else(|| Error::Config(format!("parameter '{key}' must be a number, got {v}")))
}

fn param_usize(params: &HashMap<String, toml::Value>, key: &str, default: usize) -> Result<usize> {
    match params.get(key) {
        None => Ok(default),
        Some(v) => v
            .as_integer()
            .and_then(|i| usize::try_from(i).ok())
            .ok_or_else(|| {
                Error::Config(format!(
                    "parameter '{key}' must be a non-negative integer, got {v}"
                ))
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StrategyFileConfig;

    fn config(kind: &str, params: &str) -> StrategyConfig {
        let text = format!(
            r#"
            [strategy]
            type = "{kind}"
            name = "test"
            symbol = "BTCUSDT"
            timeframe = "1h"
            amount = 0.5

            [strategy.params]
            {params}
            "#
        );
        StrategyFileConfig::parse(&text).unwrap().strategy
    }

    const GRID: &str = "grid_lower = 50000\ngrid_upper = 60000.0\ngrid_step = 500";

    #[test]
    fn builds_trend_with_defaults() {
        match build_strategy(&config("trend", "")).unwrap() {
            Strategy::Trend(t) => {
                assert_eq!(t.params().short_window, 20);
                assert_eq!(t.params().long_window, 50);
            }
            other => panic!("expected trend, got {}", other.kind()),
        }
    }

    #[test]
    fn builds_grid_from_integer_bounds() {
        match build_strategy(&config("grid", GRID)).unwrap() {
            Strategy::Grid(g) => {
                assert_eq!(g.params().lower, 50_000.0);
                assert_eq!(g.levels().len(), 21);
            }
            other => panic!("expected grid, got {}", other.kind()),
        }
    }

    #[test]
    fn grid_without_bounds_is_rejected() {
        assert!(matches!(
            build_strategy(&config("grid", "")),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn builds_mean_with_overrides() {
        let strategy = build_strategy(&config("mean", "rsi_period = 7\noversold = 25")).unwrap();
        match strategy {
            Strategy::MeanReversion(m) => {
                assert_eq!(m.params().period, 7);
                assert_eq!(m.params().oversold, 25.0);
                assert_eq!(m.params().overbought, 70.0);
            }
            other => panic!("expected mean, got {}", other.kind()),
        }
    }

    #[test]
    fn builds_auto_with_all_sub_strategies() {
        let strategy = build_strategy(&config("auto", GRID)).unwrap();
        assert_eq!(strategy.kind(), "auto");
        // max(2 * 14, 20, 50, 14) + 1
        assert_eq!(strategy.lookback(), 51);
    }

    #[test]
    fn lookback_beyond_exchange_cap_is_rejected() {
        assert!(matches!(
            build_strategy(&config("trend", "long_window = 1500")),
            Err(Error::Config(_))
        ));
        // 2 * 600 ADX bars exceed the cap even though every window is below it.
        let params = format!("{GRID}\nadx_period = 600");
        assert!(matches!(
            build_strategy(&config("auto", &params)),
            Err(Error::Config(_))
        ));
        assert!(build_strategy(&config("trend", "long_window = 999")).is_ok());
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert!(matches!(
            build_strategy(&config("martingale", "")),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn wrongly_typed_param_is_rejected() {
        assert!(build_strategy(&config("trend", "short_window = \"fast\"")).is_err());
        assert!(build_strategy(&config("trend", "short_window = -3")).is_err());
        assert!(build_strategy(&config("mean", "overbought = true")).is_err());
    }
}
