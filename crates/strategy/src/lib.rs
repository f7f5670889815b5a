pub mod auto;
pub mod config;
pub mod generator;
pub mod grid;
pub mod indicators;
pub mod mean_reversion;
pub mod registry;
pub mod trend;

pub use auto::{classify_regime, AutoParams, AutoStrategy, Regime};
pub use config::{StrategyConfig, StrategyFileConfig};
pub use generator::SignalGenerator;
pub use grid::{GridParams, GridTrading};
pub use mean_reversion::{MeanReversion, MeanReversionParams};
pub use registry::build_strategy;
pub use trend::{TrendFollowing, TrendParams, TrendPosition};

use common::{OrderSide, PriceWindow, Result};

/// The closed set of strategies the engine can run.
///
/// Every variant maps a fresh price window plus its own state to an optional
/// trade side. `Auto` owns one of each of the others.
#[derive(Debug, Clone)]
pub enum Strategy {
    Trend(TrendFollowing),
    Grid(GridTrading),
    MeanReversion(MeanReversion),
    Auto(AutoStrategy),
}

impl Strategy {
    /// Short identifier matching the config `type` key.
    pub fn kind(&self) -> &'static str {
        match self {
            Strategy::Trend(_) => "trend",
            Strategy::Grid(_) => "grid",
            Strategy::MeanReversion(_) => "mean",
            Strategy::Auto(_) => "auto",
        }
    }

    /// Number of candles to fetch before each evaluation.
    pub fn lookback(&self) -> usize {
        match self {
            Strategy::Trend(s) => s.lookback(),
            Strategy::Grid(s) => s.lookback(),
            Strategy::MeanReversion(s) => s.lookback(),
            Strategy::Auto(s) => s.lookback(),
        }
    }

    /// Evaluate one window. State is only updated when evaluation succeeds.
    pub fn evaluate(&mut self, window: &PriceWindow) -> Result<Option<OrderSide>> {
        match self {
            Strategy::Trend(s) => s.evaluate(window),
            Strategy::Grid(s) => s.evaluate(window),
            Strategy::MeanReversion(s) => s.evaluate(window),
            Strategy::Auto(s) => s.evaluate(window),
        }
    }
}
