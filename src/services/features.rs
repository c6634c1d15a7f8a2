//! Feature Builder.
//!
//! Selects twelve indicator columns, z-scores them with batch statistics, and
//! hands fixed-order vectors to the classifier. The statistics fitted on the
//! training batch travel with the model and are reused verbatim at inference.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::indicators::{IndicatorName, IndicatorSet};

/// Number of model inputs.
pub const FEATURE_COUNT: usize = 12;

/// Model input columns, in order.
pub const FEATURE_COLUMNS: [IndicatorName; FEATURE_COUNT] = [
    IndicatorName::Rsi,
    IndicatorName::Sma20,
    IndicatorName::Sma50,
    IndicatorName::Ema20,
    IndicatorName::Macd,
    IndicatorName::SignalLine,
    IndicatorName::BbMiddle,
    IndicatorName::BbUpper,
    IndicatorName::BbLower,
    IndicatorName::VolumeRatio,
    IndicatorName::PriceToSma20,
    IndicatorName::PriceToSma50,
];

/// Feature column names, in order.
pub fn feature_names() -> Vec<String> {
    FEATURE_COLUMNS
        .iter()
        .map(|c| c.as_str().to_string())
        .collect()
}

/// Unnormalised feature values for one row; `None` marks an undefined indicator.
pub type RawFeatureRow = [Option<f64>; FEATURE_COUNT];

#[derive(Debug, Error, PartialEq)]
pub enum FeatureError {
    #[error("feature {feature} is undefined at row {index}")]
    UndefinedFeature { feature: &'static str, index: usize },

    #[error("no rows to build features from")]
    EmptySeries,

    #[error("normalization statistics cover {actual} columns, expected {expected}")]
    StatsMismatch { expected: usize, actual: usize },
}

/// Normalised model input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Mean and sample standard deviation of one feature column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub mean: f64,
    /// Zero when the column is constant or has fewer than two values.
    pub std: f64,
}

impl ColumnStats {
    fn fit(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self { mean: 0.0, std: 0.0 };
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std = if values.len() < 2 {
            0.0
        } else {
            (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
        };
        Self { mean, std }
    }

    /// Z-score; 0 for a zero-variance column or a missing value.
    pub fn z_score(&self, value: Option<f64>) -> f64 {
        match value {
            Some(v) if self.std > 0.0 && self.std.is_finite() => {
                let z = (v - self.mean) / self.std;
                if z.is_finite() {
                    z
                } else {
                    0.0
                }
            }
            _ => 0.0,
        }
    }
}

/// Per-column statistics fitted on a training batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationStats {
    pub columns: Vec<ColumnStats>,
}

impl NormalizationStats {
    /// Fit on the defined values of each column.
    pub fn fit(rows: &[RawFeatureRow]) -> Result<Self, FeatureError> {
        if rows.is_empty() {
            return Err(FeatureError::EmptySeries);
        }

        let columns = (0..FEATURE_COUNT)
            .map(|col| {
                let values: Vec<f64> = rows.iter().filter_map(|row| row[col]).collect();
                ColumnStats::fit(&values)
            })
            .collect();

        Ok(Self { columns })
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    fn check_width(&self) -> Result<(), FeatureError> {
        if self.columns.len() != FEATURE_COUNT {
            return Err(FeatureError::StatsMismatch {
                expected: FEATURE_COUNT,
                actual: self.columns.len(),
            });
        }
        Ok(())
    }

    /// Normalise a row, substituting 0 for anything undefined.
    pub fn normalize(&self, row: &RawFeatureRow) -> Result<FeatureVector, FeatureError> {
        self.check_width()?;
        Ok(FeatureVector(
            row.iter()
                .zip(self.columns.iter())
                .map(|(value, stats)| stats.z_score(*value))
                .collect(),
        ))
    }
}

/// Raw feature row at `index`.
pub fn raw_row(indicators: &IndicatorSet, index: usize) -> RawFeatureRow {
    let mut row = [None; FEATURE_COUNT];
    for (slot, column) in row.iter_mut().zip(FEATURE_COLUMNS.iter()) {
        *slot = indicators.value(*column, index);
    }
    row
}

/// Raw feature rows for every bar.
pub fn raw_rows(indicators: &IndicatorSet) -> Vec<RawFeatureRow> {
    (0..indicators.len())
        .map(|i| raw_row(indicators, i))
        .collect()
}

/// True when every feature in the row is defined.
pub fn is_complete(row: &RawFeatureRow) -> bool {
    row.iter().all(Option::is_some)
}

/// Fit statistics on a batch and normalise every row of it.
pub fn fit_transform(
    rows: &[RawFeatureRow],
) -> Result<(Vec<FeatureVector>, NormalizationStats), FeatureError> {
    let stats = NormalizationStats::fit(rows)?;
    let vectors = rows
        .iter()
        .map(|row| stats.normalize(row))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((vectors, stats))
}

/// Feature vector for the final bar using persisted training statistics.
///
/// Any undefined feature on that bar is an error: inference never substitutes
/// a neutral value for missing history.
pub fn latest_vector(
    indicators: &IndicatorSet,
    stats: &NormalizationStats,
) -> Result<FeatureVector, FeatureError> {
    let index = indicators
        .len()
        .checked_sub(1)
        .ok_or(FeatureError::EmptySeries)?;
    let row = raw_row(indicators, index);

    if let Some(pos) = row.iter().position(Option::is_none) {
        return Err(FeatureError::UndefinedFeature {
            feature: FEATURE_COLUMNS[pos].as_str(),
            index,
        });
    }

    stats.normalize(&row)
}
