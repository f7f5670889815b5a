use serde::{Deserialize, Serialize};
use tracing::debug;

use common::{Error, OrderSide, PriceWindow, Result};

use crate::indicators::rsi;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeanReversionParams {
    pub period: usize,
    pub overbought: f64,
    pub oversold: f64,
}

impl MeanReversionParams {
    pub fn validate(&self) -> Result<()> {
        if self.period == 0 {
            return Err(Error::Config("RSI period must be >= 1".into()));
        }
        if !(self.oversold < self.overbought) {
            return Err(Error::Config(format!(
                "oversold ({}) must be below overbought ({})",
                self.oversold, self.overbought
            )));
        }
        Ok(())
    }
}

/// RSI threshold rule: sell above `overbought`, buy below `oversold`.
pub fn step(params: &MeanReversionParams, closes: &[f64]) -> Result<Option<OrderSide>> {
    let value = rsi(closes, params.period)?;
    debug!(rsi = value, "Mean-reversion snapshot");

    if value > params.overbought {
        Ok(Some(OrderSide::Sell))
    } else if value < params.oversold {
        Ok(Some(OrderSide::Buy))
    } else {
        Ok(None)
    }
}

/// Stateless RSI mean-reversion strategy.
#[derive(Debug, Clone)]
pub struct MeanReversion {
    params: MeanReversionParams,
}

impl MeanReversion {
    pub fn new(params: MeanReversionParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &MeanReversionParams {
        &self.params
    }

    pub fn lookback(&self) -> usize {
        self.params.period + 1
    }

    pub fn evaluate(&self, window: &PriceWindow) -> Result<Option<OrderSide>> {
        window.require(self.params.period + 1)?;
        step(&self.params, &window.closes())
    }
}
