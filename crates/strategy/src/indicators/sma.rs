use common::{Error, Result};

/// Simple moving average of the last `window` values in `closes` (oldest first).
pub fn sma(closes: &[f64], window: usize) -> Result<f64> {
    if window == 0 || closes.len() < window {
        return Err(Error::InsufficientData {
            required: window.max(1),
            available: closes.len(),
        });
    }
    let tail = &closes[closes.len() - window..];
    Ok(tail.iter().sum::<f64>() / window as f64)
}
