//! Relative Strength Index (RSI) indicator.

/// Default RSI look-back.
pub const RSI_PERIOD: usize = 14;

/// RSI over a trailing window of close-to-close changes.
///
/// The change into bar 0 is unknown and counts as neither gain nor loss, so the
/// first defined value sits at index `period - 1`. Averages are simple means over
/// the window (not Wilder smoothing). A window with gains and no losses reads 100;
/// a window with neither (0/0) is `None`.
pub fn rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; closes.len()];
    }

    let mut gains = Vec::with_capacity(closes.len());
    let mut losses = Vec::with_capacity(closes.len());
    for i in 0..closes.len() {
        let change = if i == 0 { 0.0 } else { closes[i] - closes[i - 1] };
        if change > 0.0 {
            gains.push(change);
            losses.push(0.0);
        } else {
            gains.push(0.0);
            losses.push(-change);
        }
    }

    (0..closes.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            let start = i + 1 - period;
            let avg_gain = gains[start..=i].iter().sum::<f64>() / period as f64;
            let avg_loss = losses[start..=i].iter().sum::<f64>() / period as f64;

            if avg_loss == 0.0 {
                return (avg_gain > 0.0).then_some(100.0);
            }

            let rs = avg_gain / avg_loss;
            Some(100.0 - (100.0 / (1.0 + rs)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uptrend_with_pullbacks(count: usize) -> Vec<f64> {
        (0..count)
            .map(|i| 100.0 + i as f64 - if i % 5 == 0 { 1.5 } else { 0.0 })
            .collect()
    }

    fn downtrend_with_bounces(count: usize) -> Vec<f64> {
        (0..count)
            .map(|i| 200.0 - i as f64 + if i % 5 == 0 { 1.5 } else { 0.0 })
            .collect()
    }

    #[test]
    fn test_rsi_first_defined_index() {
        let closes = downtrend_with_bounces(30);
        let result = rsi(&closes, RSI_PERIOD);
        assert!(result[..13].iter().all(Option::is_none));
        assert!(result[13].is_some());
    }

    #[test]
    fn test_rsi_constant_series_is_undefined() {
        let closes = vec![50.0; 40];
        assert!(rsi(&closes, RSI_PERIOD).iter().all(Option::is_none));
    }

    #[test]
    fn test_rsi_loss_free_window_is_100() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let result = rsi(&closes, RSI_PERIOD);
        assert!(result[..13].iter().all(Option::is_none));
        assert!(result[13..].iter().all(|v| *v == Some(100.0)));
    }

    #[test]
    fn test_rsi_flat_then_rising_window() {
        // 14 flat bars are 0/0; one gain in the window makes it 100
        let mut closes = vec![50.0; 14];
        closes.push(51.0);
        let result = rsi(&closes, RSI_PERIOD);
        assert_eq!(result[13], None);
        assert_eq!(result[14], Some(100.0));
    }

    #[test]
    fn test_rsi_uptrend_high_value() {
        let closes = uptrend_with_pullbacks(60);
        let value = rsi(&closes, RSI_PERIOD)[59].unwrap();
        assert!(value > 80.0, "RSI in uptrend should be > 80, got {}", value);
    }

    #[test]
    fn test_rsi_downtrend_low_value() {
        let closes = downtrend_with_bounces(60);
        let value = rsi(&closes, RSI_PERIOD)[59].unwrap();
        assert!(value < 20.0, "RSI in downtrend should be < 20, got {}", value);
    }

    #[test]
    fn test_rsi_value_range() {
        let closes: Vec<f64> = (0..80).map(|i| 100.0 + (i as f64 * 0.7).sin() * 3.0).collect();
        for value in rsi(&closes, RSI_PERIOD).into_iter().flatten() {
            assert!((0.0..=100.0).contains(&value));
        }
    }

    #[test]
    fn test_rsi_known_value() {
        // Window of 3 changes: +2, -1, +1 -> avg gain 1, avg loss 1/3 -> RS 3 -> RSI 75
        let closes = vec![10.0, 12.0, 11.0, 12.0];
        let result = rsi(&closes, 3);
        assert_eq!(result[1], None);
        let value = result[3].unwrap();
        assert!((value - 75.0).abs() < 1e-9);
    }
}
