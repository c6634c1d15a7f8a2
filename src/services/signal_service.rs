//! Signal Service.
//!
//! Orchestrates fetch, indicators, features and prediction for one symbol or
//! for the configured universe. A failed symbol never aborts a batch. Results
//! are cached per symbol for a short TTL and tied to the model that produced
//! them; reloading the model clears the cache.

use std::sync::Arc;

use chrono::{Duration, Utc};
use dashmap::DashMap;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::features::{self, FeatureError};
use super::indicators::{IndicatorName, IndicatorSet};
use super::ml::{LoadedModel, ModelError, ModelInfo, SignalClassifier};
use crate::sources::{PriceProvider, ProviderError};
use crate::types::{filter_high_confidence, BarInterval, PriceSeries, Signal, SignalKind};

/// Per-symbol inference failure.
#[derive(Debug, Error)]
pub enum SignalError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Feature(#[from] FeatureError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Fetch window and cache settings.
#[derive(Debug, Clone)]
pub struct SignalServiceConfig {
    pub symbols: Vec<String>,
    pub lookback_days: i64,
    pub interval: BarInterval,
    pub cache_ttl_secs: i64,
}

impl Default for SignalServiceConfig {
    fn default() -> Self {
        Self {
            symbols: Vec::new(),
            lookback_days: 60,
            interval: BarInterval::FifteenMinutes,
            cache_ttl_secs: 30,
        }
    }
}

struct CachedSignal {
    signal: Signal,
    model: Arc<LoadedModel>,
    computed_at: i64,
}

/// Build a signal from a complete series using one model snapshot.
///
/// Only the final bar is classified; an undefined feature on that bar fails
/// the call.
pub fn signal_from_series(series: &PriceSeries, model: &LoadedModel) -> Result<Signal, SignalError> {
    let indicators = IndicatorSet::compute(series);
    let vector = features::latest_vector(&indicators, model.normalization())?;
    let prediction = model.predict(&vector)?;
    let last = series.last();

    Ok(Signal {
        symbol: series.symbol().to_string(),
        signal: SignalKind::from(prediction.label),
        confidence: prediction.confidence,
        timestamp: Utc::now(),
        current_price: last.close,
        volume: last.volume,
        rsi: indicators.last(IndicatorName::Rsi),
        macd: indicators.last(IndicatorName::Macd),
    })
}

pub struct SignalService {
    provider: Arc<dyn PriceProvider>,
    classifier: Arc<SignalClassifier>,
    config: SignalServiceConfig,
    cache: DashMap<String, CachedSignal>,
}

impl SignalService {
    pub fn new(
        provider: Arc<dyn PriceProvider>,
        classifier: Arc<SignalClassifier>,
        config: SignalServiceConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            provider,
            classifier,
            config,
            cache: DashMap::new(),
        })
    }

    pub fn symbols(&self) -> &[String] {
        &self.config.symbols
    }

    pub fn model_info(&self) -> ModelInfo {
        self.classifier.info()
    }

    /// Signal for one symbol, served from cache inside the TTL.
    pub async fn signal_for(&self, symbol: &str) -> Result<Signal, SignalError> {
        // Snapshot first so an unloaded model fails before any network I/O.
        let model = self.classifier.current()?;
        self.signal_with(&model, symbol).await
    }

    async fn signal_with(
        &self,
        model: &Arc<LoadedModel>,
        symbol: &str,
    ) -> Result<Signal, SignalError> {
        let symbol = symbol.to_uppercase();
        let now = Utc::now().timestamp_millis();

        if let Some(cached) = self.cache.get(&symbol) {
            // Entries computed by a replaced model are stale even inside the TTL.
            if Arc::ptr_eq(&cached.model, model)
                && now - cached.computed_at < self.config.cache_ttl_secs * 1000
            {
                return Ok(cached.signal.clone());
            }
        }

        let end = Utc::now();
        let start = end - Duration::days(self.config.lookback_days);
        let series = self
            .provider
            .fetch_series(&symbol, start, end, self.config.interval)
            .await?;

        debug!("Classifying {} from {} bars", symbol, series.len());
        let signal = signal_from_series(&series, model)?;

        self.cache.insert(
            symbol,
            CachedSignal {
                signal: signal.clone(),
                model: Arc::clone(model),
                computed_at: now,
            },
        );

        Ok(signal)
    }

    /// Signals for every configured symbol.
    ///
    /// A failed symbol is logged and skipped; an unloaded model fails the
    /// whole batch.
    pub async fn signals(&self) -> Result<Vec<Signal>, ModelError> {
        let model = self.classifier.current()?;
        let mut signals = Vec::with_capacity(self.config.symbols.len());

        for symbol in &self.config.symbols {
            match self.signal_with(&model, symbol).await {
                Ok(signal) => signals.push(signal),
                Err(e) => warn!("Skipping {}: {}", symbol, e),
            }
        }

        Ok(signals)
    }

    /// Batch signals with `confidence >= threshold`.
    pub async fn high_confidence(&self, threshold: f64) -> Result<Vec<Signal>, ModelError> {
        Ok(filter_high_confidence(self.signals().await?, threshold))
    }

    /// Reload the model and drop every cached signal.
    pub fn reload_model(&self) -> Result<ModelInfo, ModelError> {
        self.classifier.reload()?;
        self.clear_cache();
        info!("Model reloaded, signal cache cleared");
        Ok(self.classifier.info())
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}
