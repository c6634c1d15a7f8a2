//! Classifier Wrapper.
//!
//! Owns the serving model behind an explicit load/reload API. Callers take a
//! snapshot ([`SignalClassifier::current`]) for the duration of one
//! prediction, so a concurrent reload never swaps the model mid-call.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::artifact::{ModelArtifact, ModelStore, MODEL_TYPE};
use super::forest::argmax;
use super::{ModelError, ProbabilisticClassifier};
use crate::services::features::{feature_names, FeatureVector, NormalizationStats};
use crate::types::Label;

/// Output of one prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: Label,
    /// Max class probability as a percentage, rounded to 2 decimals.
    pub confidence: f64,
    /// Ordered Sell, Hold, Buy.
    pub probabilities: Vec<f64>,
}

/// A ready-to-serve model: classifier plus the statistics its inputs were
/// normalised with.
pub struct LoadedModel {
    classifier: Arc<dyn ProbabilisticClassifier>,
    normalization: NormalizationStats,
    model_type: String,
    trained_at: Option<DateTime<Utc>>,
}

impl LoadedModel {
    pub fn new(
        classifier: Arc<dyn ProbabilisticClassifier>,
        normalization: NormalizationStats,
    ) -> Result<Self, ModelError> {
        if normalization.width() != classifier.n_features() {
            return Err(ModelError::NormalizationMismatch {
                expected: classifier.n_features(),
                actual: normalization.width(),
            });
        }
        Ok(Self {
            classifier,
            normalization,
            model_type: "Custom".to_string(),
            trained_at: None,
        })
    }

    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, ModelError> {
        artifact.validate()?;
        Ok(Self {
            classifier: Arc::new(artifact.forest),
            normalization: artifact.normalization,
            model_type: artifact.model_type,
            trained_at: Some(artifact.trained_at),
        })
    }

    pub fn normalization(&self) -> &NormalizationStats {
        &self.normalization
    }

    pub fn predict(&self, features: &FeatureVector) -> Result<Prediction, ModelError> {
        let expected = self.classifier.n_features();
        if features.len() != expected {
            return Err(ModelError::DimensionMismatch {
                expected,
                actual: features.len(),
            });
        }

        let probabilities = self.classifier.predict_proba(features.values());
        if probabilities.len() != Label::ALL.len() {
            return Err(ModelError::ArtifactCorrupt(format!(
                "classifier returned {} probabilities",
                probabilities.len()
            )));
        }

        let best = argmax(&probabilities);
        let label = Label::from_index(best).ok_or(ModelError::UnknownClass(best as i8))?;
        let confidence = round_confidence(probabilities[best]);

        Ok(Prediction {
            label,
            confidence,
            probabilities,
        })
    }
}

/// `round(p * 100, 2)`
pub fn round_confidence(probability: f64) -> f64 {
    (probability * 100.0 * 100.0).round() / 100.0
}

/// Snapshot of the serving model for the info endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub loaded: bool,
    pub model_type: String,
    pub last_updated: Option<DateTime<Utc>>,
    pub feature_names: Vec<String>,
    pub source: String,
}

/// Injected, reloadable model holder.
pub struct SignalClassifier {
    store: Arc<dyn ModelStore>,
    model: RwLock<Option<Arc<LoadedModel>>>,
}

impl SignalClassifier {
    /// Uninitialised classifier; call [`load`](Self::load) before predicting.
    pub fn new(store: Arc<dyn ModelStore>) -> Self {
        Self {
            store,
            model: RwLock::new(None),
        }
    }

    /// Classifier that is ready immediately with the given model.
    pub fn with_model(store: Arc<dyn ModelStore>, model: LoadedModel) -> Self {
        Self {
            store,
            model: RwLock::new(Some(Arc::new(model))),
        }
    }

    /// Load from the store, replacing any current model only on success.
    pub fn load(&self) -> Result<(), ModelError> {
        let artifact = self.store.load()?;
        let model = LoadedModel::from_artifact(artifact)?;
        self.install(model);
        info!("Model ready ({})", self.store.location());
        Ok(())
    }

    /// Load at startup; a missing or corrupt artifact leaves the classifier
    /// uninitialised instead of failing the process.
    pub fn try_load(&self) -> bool {
        match self.load() {
            Ok(()) => true,
            Err(e) => {
                warn!("Model not loaded from {}: {}", self.store.location(), e);
                false
            }
        }
    }

    /// Explicit reload from the store.
    pub fn reload(&self) -> Result<(), ModelError> {
        info!("Reloading model from {}", self.store.location());
        self.load()
    }

    pub fn install(&self, model: LoadedModel) {
        if let Ok(mut guard) = self.model.write() {
            *guard = Some(Arc::new(model));
        }
    }

    /// Current model, or `NotLoaded`.
    pub fn current(&self) -> Result<Arc<LoadedModel>, ModelError> {
        self.model
            .read()
            .ok()
            .and_then(|guard| guard.clone())
            .ok_or(ModelError::NotLoaded)
    }

    pub fn is_loaded(&self) -> bool {
        self.current().is_ok()
    }

    pub fn predict(&self, features: &FeatureVector) -> Result<Prediction, ModelError> {
        self.current()?.predict(features)
    }

    pub fn info(&self) -> ModelInfo {
        match self.current() {
            Ok(model) => ModelInfo {
                loaded: true,
                model_type: model.model_type.clone(),
                last_updated: model.trained_at,
                feature_names: feature_names(),
                source: self.store.location(),
            },
            Err(_) => ModelInfo {
                loaded: false,
                model_type: MODEL_TYPE.to_string(),
                last_updated: None,
                feature_names: feature_names(),
                source: self.store.location(),
            },
        }
    }
}
