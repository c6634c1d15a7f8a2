use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single OHLCV bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    pub fn is_finite(&self) -> bool {
        [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Bar interval of a price series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BarInterval {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "15m")]
    #[default]
    FifteenMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "1d")]
    OneDay,
}

impl BarInterval {
    /// Parse from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "1m" => Some(Self::OneMinute),
            "15m" => Some(Self::FifteenMinutes),
            "1h" => Some(Self::OneHour),
            "1d" => Some(Self::OneDay),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneMinute => "1m",
            Self::FifteenMinutes => "15m",
            Self::OneHour => "1h",
            Self::OneDay => "1d",
        }
    }

    /// Alpaca timeframe parameter for this interval.
    pub fn alpaca_timeframe(&self) -> &'static str {
        match self {
            Self::OneMinute => "1Min",
            Self::FifteenMinutes => "15Min",
            Self::OneHour => "1Hour",
            Self::OneDay => "1Day",
        }
    }

    /// Interval length in seconds.
    pub fn seconds(&self) -> i64 {
        match self {
            Self::OneMinute => 60,
            Self::FifteenMinutes => 900,
            Self::OneHour => 3600,
            Self::OneDay => 86400,
        }
    }
}

/// Reasons a bar sequence cannot form a [`PriceSeries`].
#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("price series for {0} is empty")]
    Empty(String),

    #[error("price series for {symbol} is not strictly increasing at bar {index}")]
    NotIncreasing { symbol: String, index: usize },

    #[error("price series for {symbol} has a non-finite value at bar {index}")]
    NonFinite { symbol: String, index: usize },
}

/// Ordered, immutable bar history for one symbol.
///
/// Timestamps are strictly increasing, every price and volume is finite, and the
/// series always holds at least one bar.
#[derive(Debug, Clone, Serialize)]
pub struct PriceSeries {
    symbol: String,
    interval: BarInterval,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(
        symbol: impl Into<String>,
        interval: BarInterval,
        bars: Vec<PriceBar>,
    ) -> Result<Self, SeriesError> {
        let symbol = symbol.into();
        if bars.is_empty() {
            return Err(SeriesError::Empty(symbol));
        }
        if let Some(pos) = bars
            .windows(2)
            .position(|w| w[1].timestamp <= w[0].timestamp)
        {
            return Err(SeriesError::NotIncreasing {
                symbol,
                index: pos + 1,
            });
        }
        if let Some(index) = bars.iter().position(|b| !b.is_finite()) {
            return Err(SeriesError::NonFinite { symbol, index });
        }

        Ok(Self {
            symbol,
            interval,
            bars,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn interval(&self) -> BarInterval {
        self.interval
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Always false for a constructed series.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume).collect()
    }

    pub fn last(&self) -> &PriceBar {
        // Non-empty by construction.
        &self.bars[self.bars.len() - 1]
    }
}
