//! Simple Moving Average (SMA).

/// Trailing simple mean over `period` values.
///
/// Position `i` holds the mean of `values[i + 1 - period..=i]`; positions before
/// the window is full are `None`.
pub fn sma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }

    (0..values.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            let window = &values[i + 1 - period..=i];
            Some(window.iter().sum::<f64>() / period as f64)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sma_undefined_until_window_full() {
        let values: Vec<f64> = (1..=5).map(|v| v as f64).collect();
        let result = sma(&values, 3);
        assert_eq!(result, vec![None, None, Some(2.0), Some(3.0), Some(4.0)]);
    }

    #[test]
    fn test_sma_short_series_all_undefined() {
        let values = vec![10.0; 19];
        assert!(sma(&values, 20).iter().all(Option::is_none));
    }

    #[test]
    fn test_sma_constant_series_is_exact() {
        let values = vec![100.0; 30];
        let result = sma(&values, 20);
        assert_eq!(result[19], Some(100.0));
        assert_eq!(result[29], Some(100.0));
    }

    #[test]
    fn test_sma_zero_period() {
        assert_eq!(sma(&[1.0, 2.0], 0), vec![None, None]);
    }
}
