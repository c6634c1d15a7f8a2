//! Bollinger Bands indicator.

use super::sma::sma;

pub const BB_PERIOD: usize = 20;
pub const BB_STD_MULTIPLIER: f64 = 2.0;

/// Band series aligned with the input.
#[derive(Debug, Clone, PartialEq)]
pub struct BollingerSeries {
    pub middle: Vec<Option<f64>>,
    pub upper: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

/// Trailing sample standard deviation (n - 1 denominator).
pub fn rolling_std(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period < 2 {
        return vec![None; values.len()];
    }

    (0..values.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            let window = &values[i + 1 - period..=i];
            let mean = window.iter().sum::<f64>() / period as f64;
            let variance =
                window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (period - 1) as f64;
            Some(variance.sqrt())
        })
        .collect()
}

/// Consists of:
/// - Middle band: SMA(20)
/// - Upper band: SMA + 2 * StdDev
/// - Lower band: SMA - 2 * StdDev
pub fn bollinger(closes: &[f64], period: usize, multiplier: f64) -> BollingerSeries {
    let middle = sma(closes, period);
    let std_dev = rolling_std(closes, period);

    let band = |sign: f64| -> Vec<Option<f64>> {
        middle
            .iter()
            .zip(std_dev.iter())
            .map(|(m, s)| Some(m.as_ref()? + sign * multiplier * s.as_ref()?))
            .collect()
    };

    let upper = band(1.0);
    let lower = band(-1.0);

    BollingerSeries {
        middle,
        upper,
        lower,
    }
}
