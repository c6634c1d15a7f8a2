use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Three-way training label attached to a historical row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Label {
    Sell,
    Hold,
    Buy,
}

impl Label {
    /// All labels in class-index order.
    pub const ALL: [Label; 3] = [Label::Sell, Label::Hold, Label::Buy];

    pub fn as_i8(self) -> i8 {
        match self {
            Label::Sell => -1,
            Label::Hold => 0,
            Label::Buy => 1,
        }
    }

    pub fn from_i8(value: i8) -> Option<Self> {
        match value {
            -1 => Some(Label::Sell),
            0 => Some(Label::Hold),
            1 => Some(Label::Buy),
            _ => None,
        }
    }

    /// Position of this label in [`Label::ALL`].
    pub fn index(self) -> usize {
        match self {
            Label::Sell => 0,
            Label::Hold => 1,
            Label::Buy => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Label::ALL.get(index).copied()
    }
}

impl From<Label> for i8 {
    fn from(label: Label) -> Self {
        label.as_i8()
    }
}

impl TryFrom<i8> for Label {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        Label::from_i8(value).ok_or_else(|| format!("invalid label {}", value))
    }
}

/// Signal name exposed to consumers.
///
/// The mapping {-1: Sell, 0: Hold, 1: Buy} is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    Buy,
    Hold,
    Sell,
}

impl SignalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Buy => "Buy",
            SignalKind::Hold => "Hold",
            SignalKind::Sell => "Sell",
        }
    }
}

impl From<Label> for SignalKind {
    fn from(label: Label) -> Self {
        match label {
            Label::Sell => SignalKind::Sell,
            Label::Hold => SignalKind::Hold,
            Label::Buy => SignalKind::Buy,
        }
    }
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One inference result for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub symbol: String,
    pub signal: SignalKind,
    /// Max class probability as a percentage, rounded to 2 decimals.
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
    pub current_price: f64,
    pub volume: f64,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
}

impl Signal {
    pub fn is_high_confidence(&self, threshold: f64) -> bool {
        self.confidence >= threshold
    }
}

/// Keep only signals at or above `threshold` percent confidence.
pub fn filter_high_confidence(signals: Vec<Signal>, threshold: f64) -> Vec<Signal> {
    signals
        .into_iter()
        .filter(|s| s.is_high_confidence(threshold))
        .collect()
}
