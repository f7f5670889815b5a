use serde::{Deserialize, Serialize};
use tracing::debug;

use common::{Error, OrderSide, PriceWindow, Result};

/// Upper bound on generated levels; a tiny step over a wide range is a config mistake.
const MAX_LEVELS: usize = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridParams {
    pub lower: f64,
    pub upper: f64,
    pub step: f64,
}

impl GridParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.step > 0.0) || !self.lower.is_finite() || !self.upper.is_finite() {
            return Err(Error::Config(format!(
                "grid step must be positive and bounds finite, got lower={} upper={} step={}",
                self.lower, self.upper, self.step
            )));
        }
        if self.lower > self.upper {
            return Err(Error::Config(format!(
                "grid lower bound {} is above upper bound {}",
                self.lower, self.upper
            )));
        }
        if (self.upper - self.lower) / self.step >= MAX_LEVELS as f64 {
            return Err(Error::Config(format!(
                "grid step {} yields more than {MAX_LEVELS} levels",
                self.step
            )));
        }
        Ok(())
    }

    /// Ascending levels from `lower` to `upper` inclusive.
    ///
    /// Each level is computed from its index so long grids do not drift.
    pub fn levels(&self) -> Vec<f64> {
        let count = ((self.upper - self.lower) / self.step + 1e-9).floor() as usize;
        (0..=count)
            .map(|i| self.lower + i as f64 * self.step)
            .collect()
    }
}

/// Index of the greatest level `<= price`, or the lowest level when the
/// price is below the whole grid.
pub fn level_index(levels: &[f64], price: f64) -> usize {
    levels.partition_point(|&level| level <= price).saturating_sub(1)
}

/// One grid step. Returns the level to record and the side to emit.
///
/// The first observation only records a baseline. Moving up a level sells,
/// moving down a level buys.
pub fn step(levels: &[f64], last: Option<usize>, price: f64) -> (usize, Option<OrderSide>) {
    let level = level_index(levels, price);
    let side = match last {
        None => None,
        Some(prev) if level > prev => Some(OrderSide::Sell),
        Some(prev) if level < prev => Some(OrderSide::Buy),
        Some(_) => None,
    };
    (level, side)
}

/// Range-trading strategy over a fixed price grid.
#[derive(Debug, Clone)]
pub struct GridTrading {
    params: GridParams,
    levels: Vec<f64>,
    last_level: Option<usize>,
}

impl GridTrading {
    pub fn new(params: GridParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            levels: params.levels(),
            params,
            last_level: None,
        })
    }

    pub fn params(&self) -> &GridParams {
        &self.params
    }

    pub fn levels(&self) -> &[f64] {
        &self.levels
    }

    /// Price of the most recently recorded level, `None` before the first tick.
    pub fn last_level(&self) -> Option<f64> {
        self.last_level.map(|i| self.levels[i])
    }

    /// Greatest grid level `<= price`, or the lowest level below the grid.
    pub fn current_level(&self, price: f64) -> f64 {
        self.levels[level_index(&self.levels, price)]
    }

    /// Candles to request per tick. Only the latest close is read.
    pub fn lookback(&self) -> usize {
        2
    }

    pub fn evaluate(&mut self, window: &PriceWindow) -> Result<Option<OrderSide>> {
        let price = window.last_close().ok_or(Error::InsufficientData {
            required: 1,
            available: 0,
        })?;
        let (level, side) = step(&self.levels, self.last_level, price);
        debug!(
            price,
            level = self.levels[level],
            last_level = ?self.last_level(),
            "Grid snapshot"
        );
        self.last_level = Some(level);
        Ok(side)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn btc_grid() -> GridTrading {
        GridTrading::new(GridParams {
            lower: 50_000.0,
            upper: 60_000.0,
            step: 500.0,
        })
        .unwrap()
    }

    #[test]
    fn levels_are_inclusive_of_both_bounds() {
        let grid = btc_grid();
        assert_eq!(grid.levels().len(), 21);
        assert_eq!(grid.levels()[0], 50_000.0);
        assert_eq!(*grid.levels().last().unwrap(), 60_000.0);
    }

    #[test]
    fn levels_stop_before_overshooting_upper() {
        let params = GridParams {
            lower: 0.0,
            upper: 1.0,
            step: 0.3,
        };
        let levels = params.levels();
        assert_eq!(levels.len(), 4);
        assert!(*levels.last().unwrap() <= 1.0);
    }

    #[test]
    fn current_level_is_floor_or_lowest() {
        let grid = btc_grid();
        assert_eq!(grid.current_level(50_100.0), 50_000.0);
        assert_eq!(grid.current_level(50_500.0), 50_500.0);
        assert_eq!(grid.current_level(49_000.0), 50_000.0);
        assert_eq!(grid.current_level(75_000.0), 60_000.0);
    }

    #[test]
    fn baseline_then_sell_up_then_buy_down() {
        let grid = btc_grid();
        let levels = grid.levels();

        let (last, side) = step(levels, None, 50_100.0);
        assert_eq!(side, None);
        let (last, side) = step(levels, Some(last), 50_600.0);
        assert_eq!(side, Some(OrderSide::Sell));
        let (_, side) = step(levels, Some(last), 50_100.0);
        assert_eq!(side, Some(OrderSide::Buy));
    }

    #[test]
    fn moving_within_a_level_is_quiet() {
        let levels = btc_grid().levels().to_vec();
        let (last, _) = step(&levels, None, 51_010.0);
        let (_, side) = step(&levels, Some(last), 51_490.0);
        assert_eq!(side, None);
    }

    #[test]
    fn rejects_bad_params() {
        let bad = [
            GridParams { lower: 10.0, upper: 5.0, step: 1.0 },
            GridParams { lower: 0.0, upper: 5.0, step: 0.0 },
            GridParams { lower: 0.0, upper: 5.0, step: -1.0 },
            GridParams { lower: 0.0, upper: 1e9, step: 1.0 },
        ];
        for params in bad {
            assert!(GridTrading::new(params).is_err(), "accepted {params:?}");
        }
    }

    #[test]
    fn empty_window_is_insufficient_and_keeps_state() {
        let mut grid = btc_grid();
        assert!(grid.evaluate(&PriceWindow::default()).is_err());
        assert_eq!(grid.last_level(), None);
    }
}
