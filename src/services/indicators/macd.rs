//! MACD (Moving Average Convergence Divergence) indicator.

use super::ema::ema;

pub const FAST_PERIOD: usize = 12;
pub const SLOW_PERIOD: usize = 26;
pub const SIGNAL_PERIOD: usize = 9;

/// MACD line and its signal line, aligned with the input.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    /// EMA(12) - EMA(26)
    pub macd: Vec<f64>,
    /// EMA(9) of the MACD line
    pub signal: Vec<f64>,
}

/// Shows the relationship between two EMAs:
/// - MACD Line = EMA(12) - EMA(26)
/// - Signal Line = EMA(9) of MACD Line
///
/// All three EMAs use the plain recurrence from the first data point, so every
/// position is defined.
pub fn macd(closes: &[f64]) -> MacdSeries {
    let fast = ema(closes, FAST_PERIOD);
    let slow = ema(closes, SLOW_PERIOD);

    let macd_line: Vec<f64> = fast.iter().zip(slow.iter()).map(|(f, s)| f - s).collect();
    let signal_line = ema(&macd_line, SIGNAL_PERIOD);

    MacdSeries {
        macd: macd_line,
        signal: signal_line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macd_starts_at_zero() {
        let closes: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
        let result = macd(&closes);
        assert_eq!(result.macd[0], 0.0);
        assert_eq!(result.signal[0], 0.0);
        assert_eq!(result.macd.len(), closes.len());
    }

    #[test]
    fn test_macd_positive_in_uptrend() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64 * 1.5).collect();
        let result = macd(&closes);
        assert!(result.macd[59] > 0.0);
        assert!(result.signal[59] > 0.0);
    }

    #[test]
    fn test_macd_negative_in_downtrend() {
        let closes: Vec<f64> = (0..60).map(|i| 200.0 - i as f64 * 1.5).collect();
        let result = macd(&closes);
        assert!(result.macd[59] < 0.0);
    }

    #[test]
    fn test_macd_flat_series_is_zero() {
        let closes = vec![75.0; 40];
        let result = macd(&closes);
        assert!(result.macd.iter().all(|v| v.abs() < 1e-12));
    }
}
