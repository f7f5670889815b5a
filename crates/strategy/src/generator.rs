use std::sync::Arc;

use tracing::{debug, info, warn};

use common::{ExchangeClient, PriceWindow, Result, Signal, Timeframe};

use crate::auto::Regime;
use crate::config::StrategyConfig;
use crate::registry::build_strategy;
use crate::Strategy;

/// Binds one strategy to its market and exchange, and turns each tick into
/// at most one `Signal`.
///
/// `generate_signal` never fails: fetch errors, short windows and indicator
/// errors are logged and become a quiet tick.
pub struct SignalGenerator {
    name: String,
    symbol: String,
    timeframe: Timeframe,
    amount: f64,
    strategy: Strategy,
    exchange: Arc<dyn ExchangeClient>,
}

impl SignalGenerator {
    pub fn new(
        cfg: &StrategyConfig,
        strategy: Strategy,
        exchange: Arc<dyn ExchangeClient>,
    ) -> Self {
        Self {
            name: cfg.name.clone(),
            symbol: cfg.symbol.clone(),
            timeframe: cfg.timeframe,
            amount: cfg.amount,
            strategy,
            exchange,
        }
    }

    /// Build the configured strategy and bind it to `exchange`.
    pub fn from_config(cfg: &StrategyConfig, exchange: Arc<dyn ExchangeClient>) -> Result<Self> {
        let strategy = build_strategy(cfg)?;
        Ok(Self::new(cfg, strategy, exchange))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    /// Fetch the latest window, run the strategy and return the resulting
    /// signal, if any.
    pub async fn generate_signal(&mut self) -> Option<Signal> {
        let exchange = self.exchange.as_ref();
        let lookback = self.strategy.lookback();
        let outcome = match fetch(exchange, &self.symbol, self.timeframe, lookback).await {
            Some(window) => self.strategy.evaluate(&window),
            None => match &mut self.strategy {
                // No data to classify with: fall back to the grid regime,
                // which only needs the latest close.
                Strategy::Auto(auto) => {
                    warn!(name = %self.name, "Falling back to grid regime after fetch failure");
                    let limit = auto.grid().lookback();
                    let window = fetch(exchange, &self.symbol, self.timeframe, limit).await?;
                    auto.dispatch(Regime::Grid, &window)
                }
                _ => return None,
            },
        };

        match outcome {
            Ok(Some(side)) => {
                let signal = Signal::new(side, self.symbol.clone(), self.amount);
                info!(
                    name = %self.name,
                    symbol = %self.symbol,
                    side = %side,
                    amount = self.amount,
                    "Signal generated"
                );
                Some(signal)
            }
            Ok(None) => {
                debug!(name = %self.name, "No signal this tick");
                None
            }
            Err(e) => {
                warn!(name = %self.name, error = %e, "Strategy evaluation failed, skipping tick");
                None
            }
        }
    }
}

async fn fetch(
    exchange: &dyn ExchangeClient,
    symbol: &str,
    timeframe: Timeframe,
    limit: usize,
) -> Option<PriceWindow> {
    match exchange.fetch_window(symbol, timeframe, limit).await {
        Ok(window) => Some(window),
        Err(e) => {
            warn!(
                symbol,
                timeframe = %timeframe,
                limit,
                error = %e,
                "Failed to fetch price window"
            );
            None
        }
    }
}
