//! Label Generator.
//!
//! Training targets come from the forward return over a fixed horizon. Rows
//! near the end of a series have no future price and receive no label.

use crate::types::Label;

/// Bars to look ahead.
pub const LABEL_HORIZON: usize = 5;

/// Absolute return beyond which a move counts as Buy or Sell.
pub const LABEL_THRESHOLD: f64 = 0.02;

/// `close[i + horizon] / close[i] - 1`, undefined past the end or on a zero close.
pub fn future_returns(closes: &[f64], horizon: usize) -> Vec<Option<f64>> {
    (0..closes.len())
        .map(|i| {
            let future = closes.get(i + horizon)?;
            let current = closes[i];
            if current == 0.0 {
                return None;
            }
            Some(future / current - 1.0)
        })
        .collect()
}

/// Strictly above the threshold buys, strictly below its negation sells.
pub fn label_for_return(ret: f64, threshold: f64) -> Label {
    if ret > threshold {
        Label::Buy
    } else if ret < -threshold {
        Label::Sell
    } else {
        Label::Hold
    }
}

/// One label per bar; `None` where the horizon runs past the series.
pub fn generate_labels(closes: &[f64], horizon: usize, threshold: f64) -> Vec<Option<Label>> {
    future_returns(closes, horizon)
        .into_iter()
        .map(|ret| ret.map(|r| label_for_return(r, threshold)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buy_label_on_rally() {
        let closes = [100.0, 100.0, 100.0, 100.0, 100.0, 103.0, 100.0];
        let labels = generate_labels(&closes, LABEL_HORIZON, LABEL_THRESHOLD);
        assert_eq!(labels[0], Some(Label::Buy));
        assert_eq!(labels[1], Some(Label::Hold));
        assert_eq!(labels[2], None);
        assert_eq!(labels.len(), closes.len());
    }

    #[test]
    fn test_sell_label_on_drop() {
        let closes = [100.0, 100.0, 100.0, 100.0, 100.0, 97.0, 100.0];
        let labels = generate_labels(&closes, LABEL_HORIZON, LABEL_THRESHOLD);
        assert_eq!(labels[0], Some(Label::Sell));
    }

    #[test]
    fn test_threshold_is_exclusive() {
        assert_eq!(label_for_return(0.02, LABEL_THRESHOLD), Label::Hold);
        assert_eq!(label_for_return(-0.02, LABEL_THRESHOLD), Label::Hold);
        assert_eq!(label_for_return(0.0201, LABEL_THRESHOLD), Label::Buy);
        assert_eq!(label_for_return(-0.0201, LABEL_THRESHOLD), Label::Sell);
    }

    #[test]
    fn test_last_horizon_rows_unlabelled() {
        let closes: Vec<f64> = (0..20).map(|i| 50.0 + i as f64).collect();
        let labels = generate_labels(&closes, LABEL_HORIZON, LABEL_THRESHOLD);
        assert!(labels[..15].iter().all(Option::is_some));
        assert!(labels[15..].iter().all(Option::is_none));
    }

    #[test]
    fn test_short_series_has_no_labels() {
        let labels = generate_labels(&[1.0, 2.0, 3.0], LABEL_HORIZON, LABEL_THRESHOLD);
        assert_eq!(labels, vec![None, None, None]);
    }

    #[test]
    fn test_zero_close_has_no_return() {
        let closes = [0.0, 1.0, 1.0, 1.0, 1.0, 1.0];
        assert_eq!(future_returns(&closes, LABEL_HORIZON)[0], None);
    }
}
