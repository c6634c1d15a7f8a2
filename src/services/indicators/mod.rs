//! Technical indicator implementations.
//!
//! Every indicator is a trailing computation over the close or volume column and
//! produces one value per input bar. Positions whose window is not yet full hold
//! `None`; that is not an error.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod volume;

pub use bollinger::{bollinger, rolling_std, BollingerSeries};
pub use ema::{ema, ema_adjusted};
pub use macd::{macd, MacdSeries};
pub use rsi::rsi;
pub use sma::sma;
pub use volume::{volume_indicators, VolumeSeries};

use crate::types::PriceSeries;
use serde::Serialize;

/// Names of the series an [`IndicatorSet`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum IndicatorName {
    Rsi,
    Sma20,
    Sma50,
    Ema20,
    Macd,
    SignalLine,
    BbMiddle,
    BbUpper,
    BbLower,
    VolumeSma,
    VolumeRatio,
    PriceToSma20,
    PriceToSma50,
}

impl IndicatorName {
    pub const ALL: [IndicatorName; 13] = [
        IndicatorName::Rsi,
        IndicatorName::Sma20,
        IndicatorName::Sma50,
        IndicatorName::Ema20,
        IndicatorName::Macd,
        IndicatorName::SignalLine,
        IndicatorName::BbMiddle,
        IndicatorName::BbUpper,
        IndicatorName::BbLower,
        IndicatorName::VolumeSma,
        IndicatorName::VolumeRatio,
        IndicatorName::PriceToSma20,
        IndicatorName::PriceToSma50,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorName::Rsi => "RSI",
            IndicatorName::Sma20 => "SMA_20",
            IndicatorName::Sma50 => "SMA_50",
            IndicatorName::Ema20 => "EMA_20",
            IndicatorName::Macd => "MACD",
            IndicatorName::SignalLine => "Signal_Line",
            IndicatorName::BbMiddle => "BB_middle",
            IndicatorName::BbUpper => "BB_upper",
            IndicatorName::BbLower => "BB_lower",
            IndicatorName::VolumeSma => "Volume_SMA",
            IndicatorName::VolumeRatio => "Volume_Ratio",
            IndicatorName::PriceToSma20 => "Price_to_SMA20",
            IndicatorName::PriceToSma50 => "Price_to_SMA50",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|n| n.as_str() == s)
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// Parallel indicator series aligned index-for-index with a [`PriceSeries`].
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSet {
    len: usize,
    series: [Vec<Option<f64>>; 13],
}

impl IndicatorSet {
    /// Compute every indicator for the series.
    pub fn compute(series: &PriceSeries) -> Self {
        Self::from_columns(&series.closes(), &series.volumes())
    }

    /// Compute from raw close and volume columns of equal length.
    pub fn from_columns(closes: &[f64], volumes: &[f64]) -> Self {
        let len = closes.len();
        let defined = |v: Vec<f64>| -> Vec<Option<f64>> { v.into_iter().map(Some).collect() };

        let sma20 = sma(closes, 20);
        let sma50 = sma(closes, 50);
        let macd_series = macd(closes);
        let bands = bollinger(closes, bollinger::BB_PERIOD, bollinger::BB_STD_MULTIPLIER);
        let vol = volume_indicators(volumes, volume::VOLUME_SMA_PERIOD);

        let price_to_sma20 = ratio(closes, &sma20);
        let price_to_sma50 = ratio(closes, &sma50);

        let series = [
            rsi(closes, rsi::RSI_PERIOD),
            sma20,
            sma50,
            defined(ema_adjusted(closes, 20)),
            defined(macd_series.macd),
            defined(macd_series.signal),
            bands.middle,
            bands.upper,
            bands.lower,
            vol.sma,
            vol.ratio,
            price_to_sma20,
            price_to_sma50,
        ];

        Self { len, series }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Full aligned series for an indicator.
    pub fn get(&self, name: IndicatorName) -> &[Option<f64>] {
        &self.series[name.slot()]
    }

    /// Value at `index`, `None` when undefined or out of range.
    pub fn value(&self, name: IndicatorName, index: usize) -> Option<f64> {
        self.get(name).get(index).copied().flatten()
    }

    /// Value at the final bar.
    pub fn last(&self, name: IndicatorName) -> Option<f64> {
        self.len.checked_sub(1).and_then(|i| self.value(name, i))
    }
}

/// `numerator[i] / denominator[i]`, undefined when the divisor is undefined or zero.
fn ratio(numerator: &[f64], denominator: &[Option<f64>]) -> Vec<Option<f64>> {
    numerator
        .iter()
        .zip(denominator.iter())
        .map(|(n, d)| match d {
            Some(d) if *d != 0.0 => Some(n / d),
            _ => None,
        })
        .collect()
}
