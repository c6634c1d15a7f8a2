//! Classifier Wrapper and its training pipeline.
//!
//! Two independent lifecycles live here: the serving side
//! ([`SignalClassifier`]) loads a persisted [`ModelArtifact`] and answers
//! predictions, while the training side ([`ModelTrainer`]) fits a new forest
//! and writes a fresh artifact through a [`ModelStore`].

pub mod artifact;
pub mod classifier;
pub mod forest;
pub mod metrics;
pub mod trainer;

pub use artifact::{FileModelStore, ModelArtifact, ModelStore, ARTIFACT_FORMAT_VERSION};
pub use classifier::{round_confidence, LoadedModel, ModelInfo, Prediction, SignalClassifier};
pub use forest::{ForestConfig, RandomForest};
pub use metrics::{ClassMetrics, ClassificationReport};
pub use trainer::{ModelTrainer, TrainingOutcome, TrainingSample};

use std::path::PathBuf;

use thiserror::Error;

use super::features::FeatureError;
use crate::types::Label;

/// Anything that turns a feature vector into class probabilities.
///
/// Probabilities are ordered like [`Label::ALL`] (Sell, Hold, Buy).
pub trait ProbabilisticClassifier: Send + Sync {
    /// Width of the feature vectors the model was fitted on.
    fn n_features(&self) -> usize;

    fn predict_proba(&self, features: &[f64]) -> Vec<f64>;
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model is not loaded")]
    NotLoaded,

    #[error("feature vector has {actual} values, model expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("training set is empty")]
    EmptyTrainingSet,

    #[error("training set contains only {0:?} samples")]
    SingleClass(Label),

    #[error("normalization statistics cover {actual} columns, model expects {expected}")]
    NormalizationMismatch { expected: usize, actual: usize },

    #[error("unknown class {0}")]
    UnknownClass(i8),

    #[error("model artifact not found at {0}")]
    ArtifactMissing(PathBuf),

    #[error("model artifact is corrupt: {0}")]
    ArtifactCorrupt(String),

    #[error("feature error: {0}")]
    Feature(#[from] FeatureError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
