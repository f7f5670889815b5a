use common::{Error, Result};

/// Bollinger bandwidth: `(upper - lower) / middle` over the last `window` closes.
///
/// Middle band is the SMA, the outer bands sit `deviations` population
/// standard deviations away. The result is dimensionless relative volatility.
/// A zero middle band yields 0 rather than a non-finite value.
pub fn bollinger_bandwidth(closes: &[f64], window: usize, deviations: f64) -> Result<f64> {
    if window == 0 || closes.len() < window {
        return Err(Error::InsufficientData {
            required: window.max(1),
            available: closes.len(),
        });
    }

    let tail = &closes[closes.len() - window..];
    let n = window as f64;
    let middle = tail.iter().sum::<f64>() / n;
    let variance = tail.iter().map(|c| (c - middle).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    if middle == 0.0 {
        return Ok(0.0);
    }

    let upper = middle + deviations * std_dev;
    let lower = middle - deviations * std_dev;
    Ok((upper - lower) / middle)
}
