//! Offline training: price history to a persisted model artifact.

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use super::artifact::{ModelArtifact, ModelStore};
use super::forest::{ForestConfig, RandomForest};
use super::metrics::ClassificationReport;
use super::ModelError;
use crate::services::features::{self, FeatureVector, NormalizationStats, RawFeatureRow};
use crate::services::indicators::IndicatorSet;
use crate::services::labels::{generate_labels, LABEL_HORIZON, LABEL_THRESHOLD};
use crate::sources::PriceProvider;
use crate::types::{BarInterval, Label, PriceSeries};

/// One normalised row and its label.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSample {
    pub features: FeatureVector,
    pub label: Label,
}

/// Result of a completed training run.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub artifact: ModelArtifact,
    pub report: ClassificationReport,
    pub train_size: usize,
    pub test_size: usize,
    pub symbols: Vec<String>,
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ModelTrainer {
    forest: ForestConfig,
    test_fraction: f64,
    split_seed: u64,
    horizon: usize,
    threshold: f64,
}

impl Default for ModelTrainer {
    fn default() -> Self {
        Self {
            forest: ForestConfig::default(),
            test_fraction: 0.2,
            split_seed: 42,
            horizon: LABEL_HORIZON,
            threshold: LABEL_THRESHOLD,
        }
    }
}

impl ModelTrainer {
    pub fn new(forest: ForestConfig) -> Self {
        Self {
            forest,
            ..Default::default()
        }
    }

    /// Raw feature rows of a series paired with their labels, keeping only
    /// rows where every feature and the label are defined.
    pub fn labelled_rows(&self, series: &PriceSeries) -> Vec<(RawFeatureRow, Label)> {
        let indicators = IndicatorSet::compute(series);
        let labels = generate_labels(&series.closes(), self.horizon, self.threshold);

        features::raw_rows(&indicators)
            .into_iter()
            .zip(labels)
            .filter_map(|(row, label)| {
                let label = label?;
                features::is_complete(&row).then_some((row, label))
            })
            .collect()
    }

    /// Fit normalization on the whole batch and turn rows into samples.
    pub fn build_samples(
        &self,
        rows: &[(RawFeatureRow, Label)],
    ) -> Result<(Vec<TrainingSample>, NormalizationStats), ModelError> {
        if rows.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }

        let raw: Vec<RawFeatureRow> = rows.iter().map(|(row, _)| *row).collect();
        let (vectors, stats) = features::fit_transform(&raw)?;

        let samples = vectors
            .into_iter()
            .zip(rows.iter())
            .map(|(features, (_, label))| TrainingSample {
                features,
                label: *label,
            })
            .collect();

        Ok((samples, stats))
    }

    /// Train on a shuffled 80/20 split and log the held-out report.
    pub fn fit(
        &self,
        samples: &[TrainingSample],
    ) -> Result<(RandomForest, ClassificationReport, usize, usize), ModelError> {
        let first = samples.first().ok_or(ModelError::EmptyTrainingSet)?;
        if samples.iter().all(|s| s.label == first.label) {
            return Err(ModelError::SingleClass(first.label));
        }

        let mut order: Vec<usize> = (0..samples.len()).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.split_seed);
        order.shuffle(&mut rng);

        let test_size = ((samples.len() as f64 * self.test_fraction).ceil() as usize)
            .min(samples.len() - 1);
        let (test_idx, train_idx) = order.split_at(test_size);

        let train_x: Vec<Vec<f64>> = train_idx
            .iter()
            .map(|&i| samples[i].features.values().to_vec())
            .collect();
        let train_y: Vec<usize> = train_idx.iter().map(|&i| samples[i].label.index()).collect();

        info!(
            "Training random forest: {} trees, depth {}, {} train / {} test rows",
            self.forest.n_trees,
            self.forest.max_depth,
            train_idx.len(),
            test_idx.len()
        );

        let mut forest = RandomForest::new(self.forest.clone(), Label::ALL.len());
        forest.fit(&train_x, &train_y)?;

        let actual: Vec<Label> = test_idx.iter().map(|&i| samples[i].label).collect();
        let predicted: Vec<Label> = test_idx
            .iter()
            .map(|&i| {
                let class = forest.predict_one(samples[i].features.values());
                Label::from_index(class).ok_or(ModelError::UnknownClass(class as i8))
            })
            .collect::<Result<_, _>>()?;

        let report = ClassificationReport::compute(&actual, &predicted);
        report.log();

        Ok((forest, report, train_idx.len(), test_idx.len()))
    }

    /// Full pipeline over already-fetched series.
    pub fn train_series(&self, series: &[PriceSeries]) -> Result<TrainingOutcome, ModelError> {
        let mut rows = Vec::new();
        let mut symbols = Vec::new();

        for s in series {
            let symbol_rows = self.labelled_rows(s);
            if symbol_rows.is_empty() {
                warn!("{} produced no complete training rows", s.symbol());
                continue;
            }
            debug!("{}: {} training rows", s.symbol(), symbol_rows.len());
            symbols.push(s.symbol().to_string());
            rows.extend(symbol_rows);
        }

        let (samples, stats) = self.build_samples(&rows)?;
        let (forest, report, train_size, test_size) = self.fit(&samples)?;

        Ok(TrainingOutcome {
            artifact: ModelArtifact::new(forest, stats),
            report,
            train_size,
            test_size,
            symbols,
            skipped: Vec::new(),
        })
    }

    /// Fetch every symbol, train, and persist the artifact.
    ///
    /// Symbols whose fetch fails are skipped; the run fails only when nothing
    /// usable remains.
    pub async fn train_universe(
        &self,
        provider: &dyn PriceProvider,
        store: &dyn ModelStore,
        symbols: &[String],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval: BarInterval,
    ) -> Result<TrainingOutcome, ModelError> {
        let mut series = Vec::new();
        let mut skipped = Vec::new();

        for symbol in symbols {
            match provider.fetch_series(symbol, start, end, interval).await {
                Ok(s) => series.push(s),
                Err(e) => {
                    warn!("Skipping {} in training: {}", symbol, e);
                    skipped.push(symbol.clone());
                }
            }
        }

        let mut outcome = self.train_series(&series)?;
        outcome.skipped = skipped;

        store.save(&outcome.artifact)?;
        info!(
            "Training complete: {} symbols, accuracy {:.2}, saved to {}",
            outcome.symbols.len(),
            outcome.report.accuracy,
            store.location()
        );

        Ok(outcome)
    }
}
