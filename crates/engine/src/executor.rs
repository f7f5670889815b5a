use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use common::{ExchangeClient, Fill, Order, Signal};

/// Receives signals from the engine and submits them as market orders.
///
/// This is the ONLY component that calls `ExchangeClient::submit_order`.
/// A failed submission is logged and the loop carries on.
pub struct OrderExecutor {
    signal_rx: mpsc::Receiver<Signal>,
    client: Arc<dyn ExchangeClient>,
}

impl OrderExecutor {
    pub fn new(signal_rx: mpsc::Receiver<Signal>, client: Arc<dyn ExchangeClient>) -> Self {
        Self { signal_rx, client }
    }

    /// Run the executor loop until the signal channel closes and every queued
    /// signal is handled. Call from `tokio::spawn`. Returns the number of fills.
    pub async fn run(mut self) -> usize {
        info!("OrderExecutor running");
        let mut filled = 0;
        while let Some(signal) = self.signal_rx.recv().await {
            if self.execute(&signal).await.is_some() {
                filled += 1;
            }
        }
        warn!(filled, "OrderExecutor: signal channel closed");
        filled
    }

    /// Submit one signal. Returns the fill, or `None` if submission failed.
    pub async fn execute(&self, signal: &Signal) -> Option<Fill> {
        let order = Order::from(signal);
        info!(symbol = %order.symbol, side = %order.side, qty = order.quantity, "Executing order");

        match self.client.submit_order(&order).await {
            Ok(fill) => {
                info!(
                    symbol = %fill.symbol,
                    price = fill.fill_price,
                    qty = fill.quantity,
                    "Order filled"
                );
                Some(fill)
            }
            Err(e) => {
                error!(symbol = %order.symbol, error = %e, "Order submission failed");
                None
            }
        }
    }
}
