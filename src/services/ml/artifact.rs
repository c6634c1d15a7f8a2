//! Persisted model artifact and the store that reads and writes it.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::forest::RandomForest;
use super::{ModelError, ProbabilisticClassifier};
use crate::services::features::{feature_names, NormalizationStats, FEATURE_COUNT};
use crate::types::Label;

pub const ARTIFACT_FORMAT_VERSION: u32 = 1;
pub const MODEL_TYPE: &str = "RandomForest";

/// Everything inference needs: the fitted forest plus the training batch's
/// normalization statistics and the feature layout it was fitted on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub model_type: String,
    pub trained_at: DateTime<Utc>,
    pub feature_names: Vec<String>,
    pub classes: Vec<Label>,
    pub normalization: NormalizationStats,
    pub forest: RandomForest,
}

impl ModelArtifact {
    pub fn new(forest: RandomForest, normalization: NormalizationStats) -> Self {
        Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            model_type: MODEL_TYPE.to_string(),
            trained_at: Utc::now(),
            feature_names: feature_names(),
            classes: Label::ALL.to_vec(),
            normalization,
            forest,
        }
    }

    /// Reject artifacts whose layout differs from the current feature set.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ModelError::ArtifactCorrupt(format!(
                "unsupported format version {}",
                self.format_version
            )));
        }
        if self.model_type != MODEL_TYPE {
            return Err(ModelError::ArtifactCorrupt(format!(
                "unsupported model type {}",
                self.model_type
            )));
        }
        if self.feature_names != feature_names() {
            return Err(ModelError::ArtifactCorrupt(format!(
                "feature layout {:?} does not match the current feature set",
                self.feature_names
            )));
        }
        if self.classes != Label::ALL {
            return Err(ModelError::ArtifactCorrupt(format!(
                "class order {:?} does not match Sell, Hold, Buy",
                self.classes
            )));
        }
        if self.normalization.width() != FEATURE_COUNT {
            return Err(ModelError::NormalizationMismatch {
                expected: FEATURE_COUNT,
                actual: self.normalization.width(),
            });
        }
        if self.forest.n_features() != FEATURE_COUNT {
            return Err(ModelError::DimensionMismatch {
                expected: FEATURE_COUNT,
                actual: self.forest.n_features(),
            });
        }
        if self.forest.n_classes() != Label::ALL.len() {
            return Err(ModelError::ArtifactCorrupt(format!(
                "forest has {} classes",
                self.forest.n_classes()
            )));
        }
        self.forest.validate().map_err(ModelError::ArtifactCorrupt)
    }
}

/// Model artifact persistence.
pub trait ModelStore: Send + Sync {
    /// Fails if the artifact is missing or corrupt.
    fn load(&self) -> Result<ModelArtifact, ModelError>;

    fn save(&self, artifact: &ModelArtifact) -> Result<(), ModelError>;

    /// Human-readable location for logs.
    fn location(&self) -> String;
}

/// JSON file store.
///
/// Saves write a sibling `.tmp` file and rename it over the target, so a
/// reader never observes a half-written artifact.
#[derive(Debug, Clone)]
pub struct FileModelStore {
    path: PathBuf,
}

impl FileModelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl ModelStore for FileModelStore {
    fn load(&self) -> Result<ModelArtifact, ModelError> {
        if !self.path.exists() {
            return Err(ModelError::ArtifactMissing(self.path.clone()));
        }

        let contents = fs::read_to_string(&self.path)?;
        let artifact: ModelArtifact = serde_json::from_str(&contents)
            .map_err(|e| ModelError::ArtifactCorrupt(e.to_string()))?;
        artifact.validate()?;

        info!(
            "Loaded {} model from {} (trained {})",
            artifact.model_type,
            self.path.display(),
            artifact.trained_at
        );
        Ok(artifact)
    }

    fn save(&self, artifact: &ModelArtifact) -> Result<(), ModelError> {
        let json = serde_json::to_string(artifact)
            .map_err(|e| ModelError::ArtifactCorrupt(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.tmp_path();
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;

        info!("Saved model artifact to {}", self.path.display());
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
