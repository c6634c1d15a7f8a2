//! Exponential Moving Average (EMA).
//!
//! Two flavours are needed:
//! - [`ema`]: the plain recurrence seeded with the first value, used by MACD and
//!   its signal line.
//! - [`ema_adjusted`]: bias-corrected weighting over the whole available prefix,
//!   used for EMA_20.

/// Smoothing factor for a span.
pub fn alpha(span: usize) -> f64 {
    2.0 / (span as f64 + 1.0)
}

/// Recursive EMA: `y[0] = x[0]`, `y[i] = a * x[i] + (1 - a) * y[i - 1]`.
pub fn ema(values: &[f64], span: usize) -> Vec<f64> {
    let a = alpha(span);
    let mut out = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;

    for &x in values {
        let next = match prev {
            Some(p) => a * x + (1.0 - a) * p,
            None => x,
        };
        out.push(next);
        prev = Some(next);
    }

    out
}

/// Bias-corrected EMA.
///
/// `y[i] = sum(w_k * x[i - k]) / sum(w_k)` with `w_k = (1 - a)^k`, so the first
/// value equals the first input and early values average the full prefix.
pub fn ema_adjusted(values: &[f64], span: usize) -> Vec<f64> {
    let decay = 1.0 - alpha(span);
    let mut numerator = 0.0;
    let mut denominator = 0.0;

    values
        .iter()
        .map(|&x| {
            numerator = x + decay * numerator;
            denominator = 1.0 + decay * denominator;
            numerator / denominator
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_alpha() {
        assert!(approx(alpha(20), 2.0 / 21.0));
        assert!(approx(alpha(1), 1.0));
    }

    #[test]
    fn test_ema_seeded_with_first_value() {
        let result = ema(&[10.0, 20.0], 3);
        // alpha = 0.5
        assert!(approx(result[0], 10.0));
        assert!(approx(result[1], 15.0));
    }

    #[test]
    fn test_ema_adjusted_first_values() {
        let result = ema_adjusted(&[10.0, 20.0], 3);
        // weights 1 and 0.5: (20 + 0.5 * 10) / 1.5
        assert!(approx(result[0], 10.0));
        assert!(approx(result[1], 25.0 / 1.5));
    }

    #[test]
    fn test_ema_constant_series() {
        let values = vec![42.0; 50];
        assert!(ema(&values, 12).iter().all(|v| approx(*v, 42.0)));
        assert!(ema_adjusted(&values, 20).iter().all(|v| approx(*v, 42.0)));
    }

    #[test]
    fn test_ema_adjusted_converges_to_recursive() {
        let values: Vec<f64> = (0..400).map(|i| (i as f64 * 0.1).sin() * 5.0 + 50.0).collect();
        let plain = ema(&values, 20);
        let adjusted = ema_adjusted(&values, 20);
        assert!((plain[399] - adjusted[399]).abs() < 1e-6);
    }

    #[test]
    fn test_ema_empty_input() {
        assert!(ema(&[], 12).is_empty());
        assert!(ema_adjusted(&[], 12).is_empty());
    }
}
