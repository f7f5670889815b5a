use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use common::{
    Candle, Error, ExchangeClient, Fill, Order, OrderSide, PriceWindow, Result, Timeframe,
};

/// Simulated exchange client for paper trading.
///
/// Fills are simulated at the latest known close with configurable slippage.
/// No real orders are ever sent. Candles come either from an upstream client
/// (real market data) or from an in-memory feed filled with `push_candle`.
pub struct PaperClient {
    /// Source of market data. `None` serves candles from `feeds`.
    market_data: Option<Arc<dyn ExchangeClient>>,
    /// In-memory candles per symbol, oldest first.
    feeds: Arc<RwLock<HashMap<String, Vec<Candle>>>>,
    /// Latest known price per symbol, refreshed on every fetch.
    prices: Arc<RwLock<HashMap<String, f64>>>,
    /// Slippage in basis points applied to all fills.
    slippage_bps: f64,
}

impl PaperClient {
    /// Keep at most this many candles per in-memory feed.
    const MAX_FEED_LEN: usize = 1_000;

    pub fn new(slippage_bps: f64) -> Self {
        info!(slippage_bps = slippage_bps, "PaperClient initialized");
        Self {
            market_data: None,
            feeds: Arc::new(RwLock::new(HashMap::new())),
            prices: Arc::new(RwLock::new(HashMap::new())),
            slippage_bps,
        }
    }

    /// Paper trade against live candles from `upstream`.
    pub fn with_market_data(upstream: Arc<dyn ExchangeClient>, slippage_bps: f64) -> Self {
        Self {
            market_data: Some(upstream),
            ..Self::new(slippage_bps)
        }
    }

    /// Append a candle to the in-memory feed for `symbol`.
    pub async fn push_candle(&self, symbol: &str, candle: Candle) {
        let mut feeds = self.feeds.write().await;
        let feed = feeds.entry(symbol.to_string()).or_default();
        feed.push(candle);
        if feed.len() > Self::MAX_FEED_LEN {
            feed.remove(0);
        }
        drop(feeds);
        self.update_price(symbol, candle.close).await;
    }

    /// Override the price used for the next fill on `symbol`.
    pub async fn update_price(&self, symbol: &str, price: f64) {
        self.prices.write().await.insert(symbol.to_string(), price);
    }
}

#[async_trait]
impl ExchangeClient for PaperClient {
    async fn fetch_window(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<PriceWindow> {
        let window = match &self.market_data {
            Some(upstream) => upstream.fetch_window(symbol, timeframe, limit).await?,
            None => {
                let feeds = self.feeds.read().await;
                let feed = feeds
                    .get(symbol)
                    .filter(|f| !f.is_empty())
                    .ok_or_else(|| {
                        Error::Exchange(format!("PaperClient has no candles for '{symbol}'"))
                    })?;
                let start = feed.len().saturating_sub(limit);
                PriceWindow::new(feed[start..].to_vec())
            }
        };

        if let Some(close) = window.last_close() {
            self.update_price(symbol, close).await;
        }
        Ok(window)
    }

    async fn submit_order(&self, order: &Order) -> Result<Fill> {
        let prices = self.prices.read().await;
        let mid_price = prices.get(&order.symbol).copied().ok_or_else(|| {
            Error::Exchange(format!(
                "PaperClient has no price for '{}'. Fetch a window first.",
                order.symbol
            ))
        })?;
        drop(prices);

        // Apply slippage: buys pay more, sells receive less
        let fill_price = match order.side {
            OrderSide::Buy => mid_price * (1.0 + self.slippage_bps / 10_000.0),
            OrderSide::Sell => mid_price * (1.0 - self.slippage_bps / 10_000.0),
        };

        debug!(
            symbol = %order.symbol,
            side = ?order.side,
            mid = mid_price,
            fill = fill_price,
            qty = order.quantity,
            "Paper fill simulated"
        );

        Ok(Fill {
            order_id: order.id.clone(),
            symbol: order.symbol.clone(),
            side: order.side,
            fill_price,
            quantity: order.quantity,
            timestamp: Utc::now(),
        })
    }
}
