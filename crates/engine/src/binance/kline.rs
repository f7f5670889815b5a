use chrono::{TimeZone, Utc};
use serde_json::Value;

use common::{Candle, Error, Result};

// ─── Binance kline JSON parsing ──────────────────────────────────────────────
//
// `GET /api/v3/klines` returns an array of arrays:
// [open_time_ms, "open", "high", "low", "close", "volume", close_time_ms, ...]

/// Parse a full klines response body into candles, oldest first.
pub fn parse_klines(body: &str) -> Result<Vec<Candle>> {
    let rows: Vec<Vec<Value>> = serde_json::from_str(body)?;
    rows.iter().map(|row| parse_kline_row(row)).collect()
}

fn parse_kline_row(row: &[Value]) -> Result<Candle> {
    if row.len() < 6 {
        return Err(Error::Exchange(format!(
            "kline row has {} fields, expected at least 6",
            row.len()
        )));
    }

    let open_time_ms = row[0]
        .as_i64()
        .ok_or_else(|| Error::Exchange(format!("kline open time is not an integer: {}", row[0])))?;
    let timestamp = Utc
        .timestamp_millis_opt(open_time_ms)
        .single()
        .ok_or_else(|| Error::Exchange(format!("kline open time out of range: {open_time_ms}")))?;

    Ok(Candle {
        timestamp,
        open: decimal_field(&row[1], "open")?,
        high: decimal_field(&row[2], "high")?,
        low: decimal_field(&row[3], "low")?,
        close: decimal_field(&row[4], "close")?,
        volume: decimal_field(&row[5], "volume")?,
    })
}

/// Binance encodes prices and quantities as decimal strings.
fn decimal_field(value: &Value, name: &str) -> Result<f64> {
    value
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| Error::Exchange(format!("kline {name} is not a decimal string: {value}")))
}
