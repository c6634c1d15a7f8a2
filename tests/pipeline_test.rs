//! Price series to signal, end to end

mod common;

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tempfile::tempdir;

use common::{linear, series_from, uptrend};
use tradegenie::services::features::{self, ColumnStats, NormalizationStats, FEATURE_COUNT};
use tradegenie::services::labels::generate_labels;
use tradegenie::services::ml::{
    round_confidence, FileModelStore, ForestConfig, LoadedModel, ModelArtifact, ModelError,
    ModelStore, ModelTrainer, ProbabilisticClassifier, SignalClassifier,
};
use tradegenie::services::signal_service::signal_from_series;
use tradegenie::services::{
    FeatureError, IndicatorSet, SignalError, SignalService, SignalServiceConfig,
};
use tradegenie::sources::{PriceProvider, ProviderError};
use tradegenie::types::{BarInterval, Label, PriceSeries, SignalKind};

struct Stub(Vec<f64>);

impl ProbabilisticClassifier for Stub {
    fn n_features(&self) -> usize {
        FEATURE_COUNT
    }

    fn predict_proba(&self, _features: &[f64]) -> Vec<f64> {
        self.0.clone()
    }
}

struct EmptyStore;

impl ModelStore for EmptyStore {
    fn load(&self) -> Result<ModelArtifact, ModelError> {
        Err(ModelError::ArtifactMissing(PathBuf::from("memory")))
    }

    fn save(&self, _artifact: &ModelArtifact) -> Result<(), ModelError> {
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

fn identity_stats() -> NormalizationStats {
    NormalizationStats {
        columns: vec![ColumnStats { mean: 0.0, std: 1.0 }; FEATURE_COUNT],
    }
}

fn stub_model(probabilities: Vec<f64>) -> LoadedModel {
    LoadedModel::new(Arc::new(Stub(probabilities)), identity_stats()).unwrap()
}

fn wavy(n: usize, phase: f64) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let t = i as f64 + phase;
            100.0 + 8.0 * (t / 6.0).sin() + 3.0 * (t / 2.3).cos()
        })
        .collect()
}

#[test]
fn test_sixty_bar_uptrend_signal() {
    let closes = uptrend(60);
    let series = series_from("AAPL", BarInterval::FifteenMinutes, &closes);
    let model = stub_model(vec![0.2, 0.3333, 0.4667]);

    let signal = signal_from_series(&series, &model).unwrap();

    assert_eq!(signal.symbol, "AAPL");
    assert_eq!(signal.signal, SignalKind::Buy);
    assert_eq!(signal.current_price, closes[59]);
    assert_eq!(signal.confidence, round_confidence(0.4667));
    assert_eq!(signal.confidence, 46.67);
    assert!(signal.rsi.unwrap() > 50.0);
    assert!(signal.macd.unwrap() > 0.0);
}

#[test]
fn test_strictly_rising_series_yields_signal() {
    let closes = linear(60);
    let series = series_from("NVDA", BarInterval::FifteenMinutes, &closes);
    let model = stub_model(vec![0.2, 0.3333, 0.4667]);

    let signal = signal_from_series(&series, &model).unwrap();

    assert_eq!(signal.signal, SignalKind::Buy);
    assert_eq!(signal.confidence, 46.67);
    assert_eq!(signal.current_price, 159.0);
    assert_eq!(signal.rsi, Some(100.0));
    assert!(signal.macd.unwrap() > 0.0);
}

#[test]
fn test_stub_sell_maps_to_sell() {
    let series = series_from("TSLA", BarInterval::FifteenMinutes, &uptrend(60));
    let model = stub_model(vec![0.61, 0.29, 0.10]);

    let signal = signal_from_series(&series, &model).unwrap();
    assert_eq!(signal.signal, SignalKind::Sell);
    assert_eq!(signal.confidence, 61.0);
}

#[test]
fn test_insufficient_history_fails_inference() {
    // SMA_50 is still undefined on the last of 45 bars.
    let series = series_from("AMD", BarInterval::FifteenMinutes, &uptrend(45));
    let err = signal_from_series(&series, &stub_model(vec![0.2, 0.2, 0.6])).unwrap_err();
    assert!(matches!(
        err,
        SignalError::Feature(FeatureError::UndefinedFeature { feature: "SMA_50", .. })
    ));
}

#[test]
fn test_label_examples() {
    let buy = generate_labels(&[100.0, 100.0, 100.0, 100.0, 100.0, 103.0, 100.0], 5, 0.02);
    assert_eq!(buy[0], Some(Label::Buy));

    let sell = generate_labels(&[100.0, 100.0, 100.0, 100.0, 100.0, 97.0, 100.0], 5, 0.02);
    assert_eq!(sell[0], Some(Label::Sell));

    // The last five rows have no future and stay unlabelled.
    assert!(sell[2..].iter().all(Option::is_none));
}

#[test]
fn test_constant_column_normalizes_to_zero() {
    let closes = uptrend(80);
    let indicators = IndicatorSet::from_columns(&closes, &vec![1_000.0; 80]);
    let rows: Vec<_> = features::raw_rows(&indicators)
        .into_iter()
        .filter(features::is_complete)
        .collect();
    assert!(rows.len() > 2);

    // Flat volume keeps Volume_Ratio at exactly 1.0 on every row.
    let (vectors, stats) = features::fit_transform(&rows).unwrap();
    let col = features::FEATURE_COLUMNS
        .iter()
        .position(|c| c.as_str() == "Volume_Ratio")
        .unwrap();
    assert_eq!(stats.columns[col].std, 0.0);
    assert!(vectors.iter().all(|v| v.values()[col] == 0.0));
}

struct MapProvider {
    calls: AtomicUsize,
}

#[async_trait]
impl PriceProvider for MapProvider {
    async fn fetch_series(
        &self,
        symbol: &str,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
        interval: BarInterval,
    ) -> Result<PriceSeries, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match symbol {
            "DELISTED" => Err(ProviderError::NoData(symbol.to_string())),
            "SHORT" => Ok(series_from(symbol, interval, &uptrend(30))),
            _ => Ok(series_from(symbol, interval, &uptrend(60))),
        }
    }
}

#[tokio::test]
async fn test_batch_with_one_failure_yields_n_minus_one() {
    let classifier = Arc::new(SignalClassifier::with_model(
        Arc::new(EmptyStore),
        stub_model(vec![0.1, 0.7, 0.2]),
    ));
    let provider = Arc::new(MapProvider {
        calls: AtomicUsize::new(0),
    });
    let symbols = ["AAPL", "MSFT", "DELISTED", "NVDA", "META"];
    let service = SignalService::new(
        provider.clone(),
        classifier,
        SignalServiceConfig {
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        },
    );

    let signals = service.signals().await.unwrap();
    assert_eq!(signals.len(), symbols.len() - 1);
    assert!(signals.iter().all(|s| s.symbol != "DELISTED"));
    assert!(signals.iter().all(|s| s.signal == SignalKind::Hold));
    assert_eq!(provider.calls.load(Ordering::SeqCst), symbols.len());
}

#[tokio::test]
async fn test_short_history_symbol_is_skipped_in_batch() {
    let classifier = Arc::new(SignalClassifier::with_model(
        Arc::new(EmptyStore),
        stub_model(vec![0.1, 0.2, 0.7]),
    ));
    let service = SignalService::new(
        Arc::new(MapProvider {
            calls: AtomicUsize::new(0),
        }),
        classifier,
        SignalServiceConfig {
            symbols: vec!["SHORT".to_string(), "AAPL".to_string()],
            ..Default::default()
        },
    );

    let signals = service.signals().await.unwrap();
    assert_eq!(signals.len(), 1);
    assert_eq!(signals[0].symbol, "AAPL");
}

#[test]
fn test_trained_artifact_serves_predictions() {
    let dir = tempdir().unwrap();
    let store = Arc::new(FileModelStore::new(dir.path().join("model.json")));

    let trainer = ModelTrainer::new(ForestConfig {
        n_trees: 12,
        max_depth: 6,
        ..Default::default()
    });
    let training = vec![
        series_from("AAPL", BarInterval::OneDay, &wavy(180, 0.0)),
        series_from("MSFT", BarInterval::OneDay, &wavy(180, 2.5)),
    ];
    let outcome = trainer.train_series(&training).unwrap();
    store.save(&outcome.artifact).unwrap();

    let classifier = SignalClassifier::new(store);
    assert!(!classifier.is_loaded());
    classifier.load().unwrap();
    let model = classifier.current().unwrap();

    // Inference reuses the persisted training statistics.
    assert_eq!(model.normalization(), &outcome.artifact.normalization);

    let live = series_from("AAPL", BarInterval::FifteenMinutes, &wavy(90, 7.0));
    let signal = signal_from_series(&live, &model).unwrap();
    assert!(signal.confidence > 33.0 && signal.confidence <= 100.0);
    assert_eq!(signal.current_price, live.last().close);

    let info = classifier.info();
    assert!(info.loaded);
    assert_eq!(info.model_type, "RandomForest");
    assert_eq!(info.feature_names.len(), FEATURE_COUNT);
}

#[tokio::test]
async fn test_batch_without_model_fails_before_fetching() {
    let provider = Arc::new(MapProvider {
        calls: AtomicUsize::new(0),
    });
    let service = SignalService::new(
        provider.clone(),
        Arc::new(SignalClassifier::new(Arc::new(EmptyStore))),
        SignalServiceConfig {
            symbols: vec!["AAPL".to_string(), "MSFT".to_string()],
            ..Default::default()
        },
    );

    assert!(matches!(service.signals().await, Err(ModelError::NotLoaded)));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}
