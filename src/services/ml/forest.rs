//! Random forest classifier.
//!
//! Gini-split decision trees grown on bootstrap samples, one tree per rayon
//! task. Class probabilities are the average of the leaf distributions, so a
//! forest over `n` classes always returns `n` probabilities summing to one.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::{ModelError, ProbabilisticClassifier};

/// Decision tree configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TreeConfig {
    /// Maximum depth of tree
    pub max_depth: usize,
    /// Minimum samples required to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf node
    pub min_samples_leaf: usize,
    /// Features considered per split (None = all)
    pub max_features: Option<usize>,
    pub seed: u64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            seed: 42,
        }
    }
}

/// Tree node
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TreeNode {
    Leaf {
        class_probs: Vec<f64>,
        n_samples: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        n_samples: usize,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    pub fn n_leaves(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split { left, right, .. } => left.n_leaves() + right.n_leaves(),
        }
    }

    fn validate(&self, n_features: usize, n_classes: usize) -> Result<(), String> {
        match self {
            TreeNode::Leaf { class_probs, .. } => {
                if class_probs.len() != n_classes {
                    return Err(format!(
                        "leaf has {} class probabilities, expected {}",
                        class_probs.len(),
                        n_classes
                    ));
                }
                Ok(())
            }
            TreeNode::Split {
                feature,
                left,
                right,
                ..
            } => {
                if *feature >= n_features {
                    return Err(format!(
                        "split on feature {} but model has {} features",
                        feature, n_features
                    ));
                }
                left.validate(n_features, n_classes)?;
                right.validate(n_features, n_classes)
            }
        }
    }
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// Single classification tree over class indices `0..n_classes`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecisionTree {
    config: TreeConfig,
    n_classes: usize,
    n_features: usize,
    root: Option<TreeNode>,
    feature_importances: Vec<f64>,
}

impl DecisionTree {
    pub fn new(config: TreeConfig, n_classes: usize) -> Self {
        Self {
            config,
            n_classes,
            n_features: 0,
            root: None,
            feature_importances: Vec::new(),
        }
    }

    /// Train on the rows named by `indices` (repeats allowed).
    pub fn fit(&mut self, features: &[Vec<f64>], labels: &[usize], indices: &[usize]) {
        self.n_features = features.first().map(Vec::len).unwrap_or(0);
        self.feature_importances = vec![0.0; self.n_features];

        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        self.root = Some(self.build_tree(features, labels, indices, 0, &mut rng));

        normalize_in_place(&mut self.feature_importances);
    }

    fn build_tree(
        &mut self,
        features: &[Vec<f64>],
        labels: &[usize],
        indices: &[usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let n = indices.len();
        let counts = self.class_counts(labels, indices);
        let impurity = gini(&counts, n);

        if depth >= self.config.max_depth || n < self.config.min_samples_split || impurity < 1e-10
        {
            return self.leaf(&counts, n);
        }

        let Some(split) = self.find_best_split(features, labels, indices, &counts, impurity, rng)
        else {
            return self.leaf(&counts, n);
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| features[i][split.feature] <= split.threshold);

        self.feature_importances[split.feature] += split.gain * n as f64;

        let left = self.build_tree(features, labels, &left_idx, depth + 1, rng);
        let right = self.build_tree(features, labels, &right_idx, depth + 1, rng);

        TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            n_samples: n,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Sweep each candidate feature in sorted order, updating class counts
    /// incrementally; thresholds sit at midpoints between distinct values.
    fn find_best_split(
        &self,
        features: &[Vec<f64>],
        labels: &[usize],
        indices: &[usize],
        counts: &[usize],
        parent_impurity: f64,
        rng: &mut ChaCha8Rng,
    ) -> Option<BestSplit> {
        let n = indices.len();
        let max_features = self
            .config
            .max_features
            .unwrap_or(self.n_features)
            .clamp(1, self.n_features.max(1));

        let mut candidates: Vec<usize> = (0..self.n_features).collect();
        candidates.shuffle(rng);
        candidates.truncate(max_features);

        let mut best: Option<BestSplit> = None;
        let mut best_gain = 0.0;

        for feature in candidates {
            let mut sorted = indices.to_vec();
            sorted.sort_by(|&a, &b| features[a][feature].total_cmp(&features[b][feature]));

            let mut left_counts = vec![0usize; self.n_classes];
            let mut right_counts = counts.to_vec();

            for k in 0..n.saturating_sub(1) {
                let class = labels[sorted[k]];
                left_counts[class] += 1;
                right_counts[class] -= 1;

                let value = features[sorted[k]][feature];
                let next = features[sorted[k + 1]][feature];
                if next <= value {
                    continue;
                }

                let n_left = k + 1;
                let n_right = n - n_left;
                if n_left < self.config.min_samples_leaf || n_right < self.config.min_samples_leaf
                {
                    continue;
                }

                let weighted = (n_left as f64 * gini(&left_counts, n_left)
                    + n_right as f64 * gini(&right_counts, n_right))
                    / n as f64;
                let gain = parent_impurity - weighted;

                if gain > best_gain {
                    best_gain = gain;
                    let mut threshold = (value + next) / 2.0;
                    if threshold >= next {
                        threshold = value;
                    }
                    best = Some(BestSplit {
                        feature,
                        threshold,
                        gain,
                    });
                }
            }
        }

        best
    }

    fn class_counts(&self, labels: &[usize], indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        for &i in indices {
            counts[labels[i]] += 1;
        }
        counts
    }

    fn leaf(&self, counts: &[usize], n: usize) -> TreeNode {
        let class_probs = if n == 0 {
            vec![1.0 / self.n_classes as f64; self.n_classes]
        } else {
            counts.iter().map(|&c| c as f64 / n as f64).collect()
        };
        TreeNode::Leaf {
            class_probs,
            n_samples: n,
        }
    }

    /// Leaf distribution reached by `features`.
    pub fn predict_proba_one(&self, features: &[f64]) -> Vec<f64> {
        let mut node = match &self.root {
            Some(root) => root,
            None => return vec![1.0 / self.n_classes as f64; self.n_classes],
        };

        loop {
            match node {
                TreeNode::Leaf { class_probs, .. } => return class_probs.clone(),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    let value = features.get(*feature).copied().unwrap_or(0.0);
                    node = if value <= *threshold { &**left } else { &**right };
                }
            }
        }
    }

    pub fn root(&self) -> Option<&TreeNode> {
        self.root.as_ref()
    }

    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    fn validate(&self, n_features: usize, n_classes: usize) -> Result<(), String> {
        if self.n_classes != n_classes {
            return Err(format!(
                "tree has {} classes, forest has {}",
                self.n_classes, n_classes
            ));
        }
        match &self.root {
            Some(root) => root.validate(n_features, n_classes),
            None => Err("tree was never fitted".to_string()),
        }
    }
}

/// Random Forest configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForestConfig {
    /// Number of trees in the forest
    pub n_trees: usize,
    /// Maximum depth of each tree
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features per split (floor of sqrt of total if None)
    pub max_features: Option<usize>,
    /// Bootstrap sampling
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
            seed: 42,
        }
    }
}

/// Random Forest model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RandomForest {
    config: ForestConfig,
    n_classes: usize,
    n_features: usize,
    trees: Vec<DecisionTree>,
    feature_importances: Vec<f64>,
}

impl RandomForest {
    pub fn new(config: ForestConfig, n_classes: usize) -> Self {
        Self {
            config,
            n_classes,
            n_features: 0,
            trees: Vec::new(),
            feature_importances: Vec::new(),
        }
    }

    /// Train the random forest on class indices.
    pub fn fit(&mut self, features: &[Vec<f64>], labels: &[usize]) -> Result<(), ModelError> {
        if features.is_empty() || features.len() != labels.len() {
            return Err(ModelError::EmptyTrainingSet);
        }

        let n_features = features[0].len();
        if let Some(row) = features.iter().find(|row| row.len() != n_features) {
            return Err(ModelError::DimensionMismatch {
                expected: n_features,
                actual: row.len(),
            });
        }
        if let Some(&class) = labels.iter().find(|&&c| c >= self.n_classes) {
            return Err(ModelError::UnknownClass(class as i8));
        }

        let n_samples = features.len();
        let max_features = self
            .config
            .max_features
            .unwrap_or_else(|| ((n_features as f64).sqrt() as usize).max(1));

        let trees: Vec<DecisionTree> = (0..self.config.n_trees)
            .into_par_iter()
            .map(|i| {
                let tree_seed = self.config.seed.wrapping_add(i as u64);
                let tree_config = TreeConfig {
                    max_depth: self.config.max_depth,
                    min_samples_split: self.config.min_samples_split,
                    min_samples_leaf: self.config.min_samples_leaf,
                    max_features: Some(max_features),
                    seed: tree_seed,
                };

                let indices: Vec<usize> = if self.config.bootstrap {
                    bootstrap_indices(n_samples, tree_seed)
                } else {
                    (0..n_samples).collect()
                };

                let mut tree = DecisionTree::new(tree_config, self.n_classes);
                tree.fit(features, labels, &indices);
                tree
            })
            .collect();

        self.n_features = n_features;
        self.trees = trees;

        self.feature_importances = vec![0.0; n_features];
        for tree in &self.trees {
            for (total, imp) in self
                .feature_importances
                .iter_mut()
                .zip(tree.feature_importances())
            {
                *total += imp;
            }
        }
        normalize_in_place(&mut self.feature_importances);

        Ok(())
    }

    /// Predict the most probable class index; ties go to the lower index.
    pub fn predict_one(&self, features: &[f64]) -> usize {
        argmax(&self.predict_proba_one(features))
    }

    /// Mean leaf distribution across trees.
    pub fn predict_proba_one(&self, features: &[f64]) -> Vec<f64> {
        if self.trees.is_empty() {
            return vec![1.0 / self.n_classes as f64; self.n_classes];
        }

        let mut totals = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (total, p) in totals.iter_mut().zip(tree.predict_proba_one(features)) {
                *total += p;
            }
        }

        let n = self.trees.len() as f64;
        totals.iter_mut().for_each(|t| *t /= n);
        totals
    }

    /// Predict for multiple samples
    pub fn predict(&self, features: &[Vec<f64>]) -> Vec<usize> {
        features.par_iter().map(|f| self.predict_one(f)).collect()
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    /// Structural check run on deserialised forests.
    pub fn validate(&self) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features, self.n_classes)
                .map_err(|e| format!("tree {}: {}", i, e))?;
        }
        Ok(())
    }
}

impl ProbabilisticClassifier for RandomForest {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, features: &[f64]) -> Vec<f64> {
        self.predict_proba_one(features)
    }
}

fn bootstrap_indices(n: usize, seed: u64) -> Vec<usize> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n).map(|_| rng.gen_range(0..n)).collect()
}

fn gini(counts: &[usize], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}

fn normalize_in_place(values: &mut [f64]) {
    let sum: f64 = values.iter().sum();
    if sum > 0.0 {
        values.iter_mut().for_each(|v| *v /= sum);
    }
}

/// Index of the largest value, first one on ties.
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}
