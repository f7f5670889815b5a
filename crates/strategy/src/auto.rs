//! Regime-switching strategy.
//!
//! Classifies the market with ADX (trend strength) and Bollinger bandwidth
//! (relative volatility), then hands the window to the matching sub-strategy.
//! Sub-strategies keep their own state across regime switches.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use common::{Error, OrderSide, PriceWindow, Result};

use crate::grid::GridTrading;
use crate::indicators::{adx, bollinger_bandwidth};
use crate::mean_reversion::MeanReversion;
use crate::trend::TrendFollowing;

/// Market regime selected by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    Trend,
    Grid,
    MeanReversion,
    /// Thresholds select no regime; the tick stays quiet.
    Undetermined,
}

impl std::fmt::Display for Regime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Regime::Trend => write!(f, "trend"),
            Regime::Grid => write!(f, "grid"),
            Regime::MeanReversion => write!(f, "mean_reversion"),
            Regime::Undetermined => write!(f, "undetermined"),
        }
    }
}

/// Classifier configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AutoParams {
    pub adx_period: usize,
    pub adx_trend_threshold: f64,
    pub bb_period: usize,
    pub bb_deviations: f64,
    /// Bandwidth above this (without a trend) is a wide range → grid.
    pub bbw_high: f64,
    /// Bandwidth at or below this is a tight range → mean reversion.
    pub bbw_low: f64,
}

impl AutoParams {
    pub fn validate(&self) -> Result<()> {
        if self.adx_period == 0 || self.bb_period == 0 {
            return Err(Error::Config("adx_period and bb_period must be >= 1".into()));
        }
        if !(self.bbw_low <= self.bbw_high) {
            return Err(Error::Config(format!(
                "bbw_low ({}) must not exceed bbw_high ({})",
                self.bbw_low, self.bbw_high
            )));
        }
        Ok(())
    }
}

/// Threshold rule. ADX is checked first, so a strong trend wins regardless
/// of bandwidth.
pub fn classify_regime(adx: f64, bbw: f64, params: &AutoParams) -> Regime {
    if adx > params.adx_trend_threshold {
        Regime::Trend
    } else if bbw > params.bbw_high {
        Regime::Grid
    } else if bbw <= params.bbw_low {
        Regime::MeanReversion
    } else {
        Regime::Undetermined
    }
}

#[derive(Debug, Clone)]
pub struct AutoStrategy {
    params: AutoParams,
    trend: TrendFollowing,
    grid: GridTrading,
    mean_reversion: MeanReversion,
    last_regime: Option<Regime>,
}

impl AutoStrategy {
    pub fn new(
        params: AutoParams,
        trend: TrendFollowing,
        grid: GridTrading,
        mean_reversion: MeanReversion,
    ) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            trend,
            grid,
            mean_reversion,
            last_regime: None,
        })
    }

    pub fn params(&self) -> &AutoParams {
        &self.params
    }

    pub fn trend(&self) -> &TrendFollowing {
        &self.trend
    }

    pub fn grid(&self) -> &GridTrading {
        &self.grid
    }

    pub fn mean_reversion(&self) -> &MeanReversion {
        &self.mean_reversion
    }

    /// Regime used on the most recent tick.
    pub fn last_regime(&self) -> Option<Regime> {
        self.last_regime
    }

    /// Candles to request per tick: enough for the classifier and for every
    /// sub-strategy, since the same window is handed down.
    pub fn lookback(&self) -> usize {
        (2 * self.params.adx_period)
            .max(self.params.bb_period)
            .max(self.trend.params().long_window)
            .max(self.mean_reversion.params().period)
            + 1
    }

    pub fn classify(&self, window: &PriceWindow) -> Result<Regime> {
        window.require((2 * self.params.adx_period).max(self.params.bb_period))?;
        let closes = window.closes();
        let adx = adx(
            &window.highs(),
            &window.lows(),
            &closes,
            self.params.adx_period,
        )?;
        let bbw = bollinger_bandwidth(&closes, self.params.bb_period, self.params.bb_deviations)?;
        let regime = classify_regime(adx, bbw, &self.params);
        debug!(adx, bbw, %regime, "Regime classified");
        Ok(regime)
    }

    /// Classify, falling back to grid when the window cannot be classified,
    /// then dispatch.
    pub fn evaluate(&mut self, window: &PriceWindow) -> Result<Option<OrderSide>> {
        let regime = self.classify(window).unwrap_or_else(|e| {
            warn!(error = %e, "Regime classification failed, defaulting to grid");
            Regime::Grid
        });
        self.dispatch(regime, window)
    }

    /// Run the sub-strategy for `regime` on `window`. Only that sub-strategy's
    /// state changes.
    pub fn dispatch(&mut self, regime: Regime, window: &PriceWindow) -> Result<Option<OrderSide>> {
        self.last_regime = Some(regime);
        match regime {
            Regime::Trend => self.trend.evaluate(window),
            Regime::Grid => self.grid.evaluate(window),
            Regime::MeanReversion => self.mean_reversion.evaluate(window),
            Regime::Undetermined => Ok(None),
        }
    }
}
