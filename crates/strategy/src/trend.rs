use serde::{Deserialize, Serialize};
use tracing::debug;

use common::{Error, OrderSide, PriceWindow, Result};

use crate::indicators::sma;

/// Last side the trend strategy acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendPosition {
    #[default]
    Flat,
    Long,
    Short,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendParams {
    pub short_window: usize,
    pub long_window: usize,
}

impl TrendParams {
    pub fn validate(&self) -> Result<()> {
        if self.short_window == 0 || self.short_window >= self.long_window {
            return Err(Error::Config(format!(
                "trend windows must satisfy 0 < short_window < long_window, got {} / {}",
                self.short_window, self.long_window
            )));
        }
        Ok(())
    }
}

/// One trend-following step: SMA crossover with hysteresis on `position`.
///
/// A side is emitted only when the crossover direction differs from the
/// position already held, so a persisting crossover fires once.
pub fn step(
    params: &TrendParams,
    position: TrendPosition,
    closes: &[f64],
) -> Result<(TrendPosition, Option<OrderSide>)> {
    let short_sma = sma(closes, params.short_window)?;
    let long_sma = sma(closes, params.long_window)?;
    debug!(short_sma, long_sma, ?position, "Trend snapshot");

    if short_sma > long_sma && position != TrendPosition::Long {
        Ok((TrendPosition::Long, Some(OrderSide::Buy)))
    } else if short_sma < long_sma && position != TrendPosition::Short {
        Ok((TrendPosition::Short, Some(OrderSide::Sell)))
    } else {
        Ok((position, None))
    }
}

/// SMA crossover strategy.
#[derive(Debug, Clone)]
pub struct TrendFollowing {
    params: TrendParams,
    position: TrendPosition,
}

impl TrendFollowing {
    pub fn new(params: TrendParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            position: TrendPosition::Flat,
        })
    }

    pub fn params(&self) -> &TrendParams {
        &self.params
    }

    pub fn position(&self) -> TrendPosition {
        self.position
    }

    /// Candles to request per tick.
    pub fn lookback(&self) -> usize {
        self.params.long_window + 1
    }

    pub fn evaluate(&mut self, window: &PriceWindow) -> Result<Option<OrderSide>> {
        window.require(self.params.long_window)?;
        let (next, side) = step(&self.params, self.position, &window.closes())?;
        self.position = next;
        Ok(side)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAMS: TrendParams = TrendParams {
        short_window: 2,
        long_window: 4,
    };

    #[test]
    fn rising_prices_go_long_once() {
        let closes = [10.0, 10.0, 10.0, 11.0, 12.0];
        let (pos, side) = step(&PARAMS, TrendPosition::Flat, &closes).unwrap();
        assert_eq!(pos, TrendPosition::Long);
        assert_eq!(side, Some(OrderSide::Buy));

        let (pos, side) = step(&PARAMS, pos, &closes).unwrap();
        assert_eq!(pos, TrendPosition::Long);
        assert_eq!(side, None);
    }

    #[test]
    fn falling_prices_flip_long_to_short() {
        let closes = [12.0, 12.0, 12.0, 11.0, 10.0];
        let (pos, side) = step(&PARAMS, TrendPosition::Long, &closes).unwrap();
        assert_eq!(pos, TrendPosition::Short);
        assert_eq!(side, Some(OrderSide::Sell));
    }

    #[test]
    fn equal_averages_hold() {
        let closes = [10.0; 5];
        let (pos, side) = step(&PARAMS, TrendPosition::Short, &closes).unwrap();
        assert_eq!(pos, TrendPosition::Short);
        assert_eq!(side, None);
    }

    #[test]
    fn short_window_fails_with_insufficient_data() {
        let result = step(&PARAMS, TrendPosition::Flat, &[1.0, 2.0, 3.0]);
        assert!(matches!(result, Err(Error::InsufficientData { .. })));
    }

    #[test]
    fn failed_evaluation_keeps_position() {
        let mut trend = TrendFollowing::new(PARAMS).unwrap();
        trend.position = TrendPosition::Long;
        assert!(trend.evaluate(&PriceWindow::default()).is_err());
        assert_eq!(trend.position(), TrendPosition::Long);
    }

    #[test]
    fn rejects_inverted_windows() {
        let params = TrendParams {
            short_window: 50,
            long_window: 20,
        };
        assert!(TrendFollowing::new(params).is_err());
    }

    #[test]
    fn lookback_covers_long_window() {
        let trend = TrendFollowing::new(PARAMS).unwrap();
        assert_eq!(trend.lookback(), 5);
    }
}
