//! External collaborators: market data, brokerage and the LLM.
//!
//! Each collaborator sits behind a narrow async trait so the services can be
//! exercised against in-memory stubs.

pub mod alpaca;
pub mod openrouter;

pub use alpaca::AlpacaClient;
pub use openrouter::OpenRouterClient;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::types::{
    AccountSummary, BarInterval, Order, OrderRequest, Position, PriceSeries, SeriesError, Signal,
};

/// Market data failures.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("no data returned for {0}")]
    NoData(String),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("failed to parse provider response: {0}")]
    Parse(String),

    #[error("invalid series: {0}")]
    InvalidSeries(#[from] SeriesError),
}

/// Brokerage failures.
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("brokerage returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("failed to parse brokerage response: {0}")]
    Parse(String),
}

/// LLM failures.
#[derive(Debug, Error)]
pub enum NarrativeError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("LLM API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("LLM response had no content")]
    EmptyResponse,

    #[error("no API key configured")]
    MissingApiKey,
}

/// Source of historical bars.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Complete series for `[start, end]`; an empty result is `NoData`.
    async fn fetch_series(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval: BarInterval,
    ) -> Result<PriceSeries, ProviderError>;
}

/// Paper trading account.
#[async_trait]
pub trait Brokerage: Send + Sync {
    async fn account(&self) -> Result<AccountSummary, BrokerError>;

    async fn positions(&self) -> Result<Vec<Position>, BrokerError>;

    /// Open position for a symbol; `None` when flat.
    async fn position(&self, symbol: &str) -> Result<Option<Position>, BrokerError>;

    async fn submit_order(&self, order: &OrderRequest) -> Result<Order, BrokerError>;

    /// `status` is `None` for every order regardless of state.
    async fn orders(&self, status: Option<&str>, limit: usize) -> Result<Vec<Order>, BrokerError>;
}

/// Aggregate of a signal batch handed to the market summary prompt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketStats {
    pub total: usize,
    pub buy: usize,
    pub sell: usize,
    pub average_confidence: f64,
}

impl MarketStats {
    pub fn from_signals(signals: &[Signal]) -> Self {
        use crate::types::SignalKind;

        let total = signals.len();
        let buy = signals
            .iter()
            .filter(|s| s.signal == SignalKind::Buy)
            .count();
        let sell = signals
            .iter()
            .filter(|s| s.signal == SignalKind::Sell)
            .count();
        let average_confidence = if total == 0 {
            0.0
        } else {
            signals.iter().map(|s| s.confidence).sum::<f64>() / total as f64
        };

        Self {
            total,
            buy,
            sell,
            average_confidence,
        }
    }
}

/// Turns signals into prose.
#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    async fn suggestion(&self, signal: &Signal) -> Result<String, NarrativeError>;

    async fn market_summary(&self, stats: &MarketStats) -> Result<String, NarrativeError>;

    async fn chat(&self, prompt: &str) -> Result<String, NarrativeError>;
}
