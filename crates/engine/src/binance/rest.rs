use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use sha2::Sha256;
use tracing::debug;

use common::{Error, ExchangeClient, Fill, Order, PriceWindow, Result, Timeframe};

use super::kline::parse_klines;

const BASE_URL: &str = "https://api.binance.com";

/// Binance caps a single klines request at this many candles.
const MAX_KLINES: usize = 1_000;

/// Upper bound on a single REST round trip, connect through body.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// REST API client for Binance spot. Used for candle fetches and order placement.
pub struct BinanceClient {
    api_key: String,
    secret: String,
    base_url: String,
    http: Client,
}

impl BinanceClient {
    pub fn new(api_key: impl Into<String>, secret: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, secret, BASE_URL)
    }

    /// Point the client at another host (testnet, local proxy).
    pub fn with_base_url(
        api_key: impl Into<String>,
        secret: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        Self::with_timeout(api_key, secret, base_url, REQUEST_TIMEOUT)
    }

    /// Like `with_base_url`, with a custom per-request timeout.
    pub fn with_timeout(
        api_key: impl Into<String>,
        secret: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .use_rustls_tls()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            api_key: api_key.into(),
            secret: secret.into(),
            base_url: base_url.into(),
            http,
        })
    }

    fn sign(&self, query: &str) -> Result<String> {
        type HmacSha256 = Hmac<Sha256>;
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| Error::Other(format!("invalid HMAC key: {e}")))?;
        mac.update(query.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    async fn public_get(&self, path: &str, query: &str) -> Result<String> {
        let url = format!("{}{path}?{query}", self.base_url);

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::Exchange(format!("HTTP {status}: {body}")));
        }
        Ok(body)
    }

    async fn signed_post(&self, path: &str, params: &str) -> Result<String> {
        let ts = Utc::now().timestamp_millis();
        let query = format!("{params}&timestamp={ts}");
        let signature = self.sign(&query)?;
        let body = format!("{query}&signature={signature}");
        let url = format!("{}{path}", self.base_url);

        let resp = self
            .http
            .post(&url)
            .header("X-MBX-APIKEY", &self.api_key)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::Exchange(format!("HTTP {status}: {text}")));
        }
        Ok(text)
    }
}

#[async_trait]
impl ExchangeClient for BinanceClient {
    async fn fetch_window(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<PriceWindow> {
        let limit = limit.clamp(1, MAX_KLINES);
        let query = format!("symbol={symbol}&interval={timeframe}&limit={limit}");

        debug!(symbol, timeframe = %timeframe, limit, "Fetching klines from Binance");
        let body = self.public_get("/api/v3/klines", &query).await?;
        Ok(PriceWindow::new(parse_klines(&body)?))
    }

    async fn submit_order(&self, order: &Order) -> Result<Fill> {
        let side = order.side.to_string();
        let params = format!(
            "symbol={}&side={}&type=MARKET&quantity={}&newClientOrderId={}&newOrderRespType=FULL",
            order.symbol, side, order.quantity, order.id
        );

        debug!(symbol = %order.symbol, side = %side, "Submitting order to Binance");
        let body = self.signed_post("/api/v3/order", &params).await?;

        let resp: OrderResponse =
            serde_json::from_str(&body).map_err(|e| Error::Exchange(e.to_string()))?;

        Ok(Fill {
            order_id: resp.client_order_id.clone(),
            symbol: order.symbol.clone(),
            side: order.side,
            fill_price: resp.average_price(),
            quantity: resp.executed_qty.parse().unwrap_or(order.quantity),
            timestamp: Utc::now(),
        })
    }
}

// ─── Response types ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderResponse {
    client_order_id: String,
    #[serde(default)]
    executed_qty: String,
    #[serde(default, rename = "cummulativeQuoteQty")]
    cumulative_quote_qty: String,
    #[serde(default)]
    fills: Vec<FillDetail>,
}

impl OrderResponse {
    /// Volume-weighted fill price; falls back to quote/base totals, then 0.
    fn average_price(&self) -> f64 {
        let (notional, qty) = self.fills.iter().fold((0.0, 0.0), |(n, q), f| {
            let price = f.price.parse::<f64>().unwrap_or(0.0);
            let qty = f.qty.parse::<f64>().unwrap_or(0.0);
            (n + price * qty, q + qty)
        });
        if qty > 0.0 {
            return notional / qty;
        }

        let executed = self.executed_qty.parse::<f64>().unwrap_or(0.0);
        let quote = self.cumulative_quote_qty.parse::<f64>().unwrap_or(0.0);
        if executed > 0.0 {
            quote / executed
        } else {
            0.0
        }
    }
}

#[derive(Deserialize)]
struct FillDetail {
    price: String,
    qty: String,
}
