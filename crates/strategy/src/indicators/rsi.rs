use common::{Error, Result};

/// Added to the average loss so a loss-free window saturates toward 100
/// instead of dividing by zero.
const EPSILON: f64 = 1e-9;

/// RSI (Relative Strength Index) over the last `period` price changes.
///
/// Gains and losses are plain means over the window (no Wilder smoothing),
/// so the value depends only on the last `period + 1` closes.
/// Fails with `InsufficientData` if there are fewer than `period + 1` values.
pub fn rsi(closes: &[f64], period: usize) -> Result<f64> {
    if period == 0 || closes.len() < period + 1 {
        return Err(Error::InsufficientData {
            required: period + 1,
            available: closes.len(),
        });
    }

    let tail = &closes[closes.len() - (period + 1)..];
    let (gains, losses) = tail
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold((0.0, 0.0), |(up, down), change| {
            if change > 0.0 {
                (up + change, down)
            } else {
                (up, down - change)
            }
        });

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;

    let rs = avg_gain / (avg_loss + EPSILON);
    Ok(100.0 - 100.0 / (1.0 + rs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rsi_errors_when_insufficient_data() {
        // Need at least period+1 = 15 values
        let prices = vec![100.0; 14];
        assert!(matches!(
            rsi(&prices, 14),
            Err(Error::InsufficientData { required: 15, available: 14 })
        ));
    }

    #[test]
    fn rsi_accepts_exactly_period_plus_one() {
        let prices: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        assert!(rsi(&prices, 14).is_ok());
    }

    #[test]
    fn rsi_all_gains_returns_100() {
        // Strictly increasing prices → RSI saturates at 100
        let prices = vec![10.0, 11.0, 12.0, 13.0, 14.0];
        let value = rsi(&prices, 3).unwrap();
        assert!((value - 100.0).abs() < 1e-6, "Expected ~100, got {value}");
    }

    #[test]
    fn rsi_all_losses_returns_0() {
        let prices = vec![14.0, 13.0, 12.0, 11.0, 10.0];
        let value = rsi(&prices, 3).unwrap();
        assert!(value.abs() < 1e-6, "Expected ~0, got {value}");
    }

    #[test]
    fn rsi_flat_series_returns_0() {
        let value = rsi(&[5.0; 10], 5).unwrap();
        assert!(value.abs() < 1e-9, "Expected 0, got {value}");
    }

    #[test]
    fn rsi_balanced_moves_sit_at_50() {
        // +2, -2, +2, -2 → equal average gain and loss
        let prices = vec![10.0, 12.0, 10.0, 12.0, 10.0];
        let value = rsi(&prices, 4).unwrap();
        assert!((value - 50.0).abs() < 1e-6, "Expected ~50, got {value}");
    }

    #[test]
    fn rsi_ignores_history_beyond_period() {
        // A crash long before the window must not affect the result.
        let mut prices = vec![500.0, 100.0];
        prices.extend([10.0, 11.0, 12.0, 13.0]);
        let with_history = rsi(&prices, 3).unwrap();
        let without = rsi(&[10.0, 11.0, 12.0, 13.0], 3).unwrap();
        assert!((with_history - without).abs() < 1e-12);
    }

    #[test]
    fn rsi_known_value_in_range() {
        let prices = vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.15, 43.61, 44.33, 44.83, 45.10,
            45.15, 44.34, 44.09,
        ];
        let v = rsi(&prices, 14).unwrap();
        assert!((0.0..=100.0).contains(&v), "RSI out of range: {v}");
    }
}
