//! ADX: Average Directional Index (Wilder).
//!
//! 1. True range, +DM and -DM from each pair of consecutive bars
//! 2. Wilder-smooth TR, +DM and -DM (seed = mean of the first `window` values,
//!    then `s = (s * (window - 1) + x) / window`)
//! 3. +DI = 100 * +DM / TR, -DI = 100 * -DM / TR
//! 4. DX = 100 * |+DI - -DI| / (+DI + -DI)
//! 5. ADX = Wilder-smoothed DX
//!
//! Needs `2 * window` bars: `window` changes to seed the DI smoothing, then
//! `window` DX values to seed the ADX smoothing.

use common::{Error, Result};

/// Latest ADX value for the given OHLC series (oldest first).
pub fn adx(highs: &[f64], lows: &[f64], closes: &[f64], window: usize) -> Result<f64> {
    if highs.len() != lows.len() || highs.len() != closes.len() {
        return Err(Error::Other(format!(
            "ADX input length mismatch: highs={}, lows={}, closes={}",
            highs.len(),
            lows.len(),
            closes.len()
        )));
    }

    let required = 2 * window.max(1);
    if window == 0 || closes.len() < required {
        return Err(Error::InsufficientData {
            required,
            available: closes.len(),
        });
    }

    let n = closes.len();
    let mut tr = Vec::with_capacity(n - 1);
    let mut plus_dm = Vec::with_capacity(n - 1);
    let mut minus_dm = Vec::with_capacity(n - 1);

    for i in 1..n {
        let up = highs[i] - highs[i - 1];
        let down = lows[i - 1] - lows[i];
        let prev_close = closes[i - 1];

        tr.push(
            (highs[i] - lows[i])
                .max((highs[i] - prev_close).abs())
                .max((lows[i] - prev_close).abs()),
        );
        plus_dm.push(if up > down && up > 0.0 { up } else { 0.0 });
        minus_dm.push(if down > up && down > 0.0 { down } else { 0.0 });
    }

    let smooth_tr = wilder_smooth(&tr, window);
    let smooth_plus = wilder_smooth(&plus_dm, window);
    let smooth_minus = wilder_smooth(&minus_dm, window);

    let dx: Vec<f64> = smooth_tr
        .iter()
        .zip(&smooth_plus)
        .zip(&smooth_minus)
        .map(|((&tr, &plus), &minus)| {
            if tr == 0.0 {
                return 0.0;
            }
            let plus_di = 100.0 * plus / tr;
            let minus_di = 100.0 * minus / tr;
            let di_sum = plus_di + minus_di;
            if di_sum == 0.0 {
                0.0
            } else {
                100.0 * (plus_di - minus_di).abs() / di_sum
            }
        })
        .collect();

    wilder_smooth(&dx, window)
        .last()
        .copied()
        .ok_or(Error::InsufficientData {
            required,
            available: n,
        })
}

/// Wilder smoothing. Output starts at input index `period - 1`, so it has
/// `values.len() - period + 1` entries (empty when the input is too short).
fn wilder_smooth(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }

    let p = period as f64;
    let seed = values[..period].iter().sum::<f64>() / p;

    let mut out = Vec::with_capacity(values.len() - period + 1);
    out.push(seed);
    let mut prev = seed;
    for &x in &values[period..] {
        prev = (prev * (p - 1.0) + x) / p;
        out.push(prev);
    }
    out
}
