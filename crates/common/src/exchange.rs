use async_trait::async_trait;

use crate::{Fill, Order, PriceWindow, Result, Timeframe};

/// Abstraction over the exchange connection.
///
/// `BinanceClient` implements this for live trading.
/// `PaperClient` implements this for simulation.
///
/// Strategies only ever call `fetch_window`; `submit_order` is reserved for
/// the `OrderExecutor` in `crates/engine`.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Fetch the most recent `limit` candles for `symbol`, oldest first.
    async fn fetch_window(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<PriceWindow>;

    /// Submit a market order and return the fill confirmation.
    async fn submit_order(&self, order: &Order) -> Result<Fill>;
}
