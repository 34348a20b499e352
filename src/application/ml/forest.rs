//! Gini decision trees bagged into a random forest.
//!
//! The movement classifier needs calibrated class probabilities, which it
//! gets by averaging the leaf class distributions across trees. Trees are
//! grown in parallel and seeded deterministically, so a fit with the same
//! data and seed reproduces the same model.

use rand::Rng;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features considered per split; `None` means sqrt of the total.
    pub max_features: Option<usize>,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 5,
            min_samples_leaf: 2,
            max_features: None,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TreeNode {
    feature_idx: Option<usize>,
    threshold: Option<f64>,
    /// Class distribution at this node; leaves answer with it directly.
    class_probs: Vec<f64>,
    left: Option<Box<TreeNode>>,
    right: Option<Box<TreeNode>>,
}

impl TreeNode {
    fn leaf(class_probs: Vec<f64>) -> Self {
        Self {
            feature_idx: None,
            threshold: None,
            class_probs,
            left: None,
            right: None,
        }
    }

    fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DecisionTree {
    root: TreeNode,
}

struct TreeBuilder<'a> {
    x: &'a [Vec<f64>],
    y: &'a [usize],
    n_classes: usize,
    config: &'a ForestConfig,
    max_features: usize,
}

impl<'a> TreeBuilder<'a> {
    fn build(&self, indices: &[usize], depth: usize, rng: &mut ChaCha8Rng) -> TreeNode {
        let probs = self.class_probabilities(indices);
        let impurity = gini(&probs);

        if depth >= self.config.max_depth
            || indices.len() < self.config.min_samples_split
            || impurity < 1e-10
        {
            return TreeNode::leaf(probs);
        }

        match self.find_best_split(indices, impurity, rng) {
            Some((feature_idx, threshold, left_idx, right_idx)) => {
                if left_idx.len() < self.config.min_samples_leaf
                    || right_idx.len() < self.config.min_samples_leaf
                {
                    return TreeNode::leaf(probs);
                }
                let left = self.build(&left_idx, depth + 1, rng);
                let right = self.build(&right_idx, depth + 1, rng);
                TreeNode {
                    feature_idx: Some(feature_idx),
                    threshold: Some(threshold),
                    class_probs: probs,
                    left: Some(Box::new(left)),
                    right: Some(Box::new(right)),
                }
            }
            None => TreeNode::leaf(probs),
        }
    }

    fn find_best_split(
        &self,
        indices: &[usize],
        parent_impurity: f64,
        rng: &mut ChaCha8Rng,
    ) -> Option<(usize, f64, Vec<usize>, Vec<usize>)> {
        let n_features = self.x[0].len();
        let mut feature_indices: Vec<usize> = (0..n_features).collect();
        feature_indices.shuffle(rng);
        feature_indices.truncate(self.max_features);

        let mut best_gain = 0.0;
        let mut best: Option<(usize, f64, Vec<usize>, Vec<usize>)> = None;

        for &feature_idx in &feature_indices {
            let mut values: Vec<f64> = indices
                .iter()
                .map(|&i| self.x[i][feature_idx])
                .collect();
            values.sort_by(|a, b| a.total_cmp(b));
            values.dedup();

            for pair in values.windows(2) {
                let threshold = (pair[0] + pair[1]) / 2.0;
                let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .partition(|&&i| self.x[i][feature_idx] <= threshold);
                if left_idx.is_empty() || right_idx.is_empty() {
                    continue;
                }

                let left_impurity = gini(&self.class_probabilities(&left_idx));
                let right_impurity = gini(&self.class_probabilities(&right_idx));
                let n_left = left_idx.len() as f64;
                let n_right = right_idx.len() as f64;
                let weighted =
                    (n_left * left_impurity + n_right * right_impurity) / (n_left + n_right);
                let gain = parent_impurity - weighted;

                if gain > best_gain {
                    best_gain = gain;
                    best = Some((feature_idx, threshold, left_idx, right_idx));
                }
            }
        }

        best
    }

    fn class_probabilities(&self, indices: &[usize]) -> Vec<f64> {
        let mut counts = vec![0usize; self.n_classes];
        for &i in indices {
            counts[self.y[i]] += 1;
        }
        let n = indices.len().max(1) as f64;
        counts.iter().map(|&c| c as f64 / n).collect()
    }
}

fn gini(probs: &[f64]) -> f64 {
    1.0 - probs.iter().map(|p| p * p).sum::<f64>()
}

impl DecisionTree {
    fn predict_proba_one(&self, features: &[f64]) -> &[f64] {
        let mut node = &self.root;
        while !node.is_leaf() {
            let feature_idx = node.feature_idx.expect("split node has a feature");
            let threshold = node.threshold.expect("split node has a threshold");
            node = if features[feature_idx] <= threshold {
                node.left.as_ref().expect("split node has a left child")
            } else {
                node.right.as_ref().expect("split node has a right child")
            };
        }
        &node.class_probs
    }
}

/// Bagged forest of Gini trees with averaged class probabilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    config: ForestConfig,
    n_classes: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn fit(config: ForestConfig, n_classes: usize, x: &[Vec<f64>], y: &[usize]) -> Self {
        assert_eq!(x.len(), y.len(), "feature/label row count mismatch");
        assert!(!x.is_empty(), "cannot fit forest on an empty matrix");
        assert!(
            y.iter().all(|&label| label < n_classes),
            "label outside class range"
        );

        let n_samples = x.len();
        let n_features = x[0].len();
        let max_features = config
            .max_features
            .unwrap_or_else(|| (n_features as f64).sqrt().ceil() as usize)
            .clamp(1, n_features);

        let trees: Vec<DecisionTree> = (0..config.n_trees)
            .into_par_iter()
            .map(|tree_idx| {
                let mut rng = ChaCha8Rng::seed_from_u64(config.seed.wrapping_add(tree_idx as u64));
                let indices: Vec<usize> = (0..n_samples)
                    .map(|_| rng.random_range(0..n_samples))
                    .collect();
                let builder = TreeBuilder {
                    x,
                    y,
                    n_classes,
                    config: &config,
                    max_features,
                };
                DecisionTree {
                    root: builder.build(&indices, 0, &mut rng),
                }
            })
            .collect();

        Self {
            config,
            n_classes,
            trees,
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Averaged class probabilities for one sample.
    pub fn predict_proba_one(&self, features: &[f64]) -> Vec<f64> {
        if self.trees.is_empty() {
            return vec![1.0 / self.n_classes as f64; self.n_classes];
        }
        let mut probs = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (acc, p) in probs.iter_mut().zip(tree.predict_proba_one(features)) {
                *acc += p;
            }
        }
        let n = self.trees.len() as f64;
        for p in &mut probs {
            *p /= n;
        }
        probs
    }

    /// Majority class (argmax of the averaged probabilities).
    pub fn predict_one(&self, features: &[f64]) -> usize {
        self.predict_proba_one(features)
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(class, _)| class)
            .unwrap_or(0)
    }

    pub fn predict(&self, x: &[Vec<f64>]) -> Vec<usize> {
        x.iter().map(|row| self.predict_one(row)).collect()
    }

    pub fn seed(&self) -> u64 {
        self.config.seed
    }
}
