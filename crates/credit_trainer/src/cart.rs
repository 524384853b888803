//! CART (Classification and Regression Tree) builder
//!
//! Exact-greedy classification trees with Gini impurity. Nodes are
//! emitted in pre-order, so every child index is greater than its parent's.

use credit_core::classifier::{ClassTree, Node};

use crate::deterministic::LcgRng;

/// Training parameters for a single tree
#[derive(Clone, Debug)]
pub struct TreeConfig {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features examined per split; `None` examines all of them
    pub max_features: Option<usize>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 20,
            min_samples_split: 5,
            min_samples_leaf: 2,
            max_features: None,
        }
    }
}

/// Split candidate with the weighted child impurity it achieves
#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    impurity: f64,
}

/// Build a classification tree over a (possibly repeated) sample of rows
pub struct CartBuilder<'a> {
    config: TreeConfig,
    features: &'a [Vec<f64>],
    targets: &'a [usize],
    n_classes: usize,
    feature_count: usize,
}

impl<'a> CartBuilder<'a> {
    pub fn new(
        features: &'a [Vec<f64>],
        targets: &'a [usize],
        n_classes: usize,
        config: TreeConfig,
    ) -> Self {
        let feature_count = features.first().map_or(0, Vec::len);
        Self {
            config,
            features,
            targets,
            n_classes,
            feature_count,
        }
    }

    /// Build tree and return nodes
    pub fn build(&self, sample: &[usize], rng: &mut LcgRng) -> ClassTree {
        let mut nodes = Vec::new();
        self.build_node(sample, 0, &mut nodes, rng);
        ClassTree::new(nodes)
    }

    /// Recursively build tree nodes
    fn build_node(
        &self,
        indices: &[usize],
        depth: usize,
        nodes: &mut Vec<Node>,
        rng: &mut LcgRng,
    ) -> i32 {
        let current_idx = nodes.len() as i32;
        let counts = self.class_counts(indices);

        // Check stopping conditions
        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        if pure
            || depth >= self.config.max_depth
            || indices.len() < self.config.min_samples_split
            || indices.len() < 2 * self.config.min_samples_leaf
        {
            nodes.push(Node::leaf(current_idx, self.distribution(&counts)));
            return current_idx;
        }

        let parent_impurity = gini(&counts, indices.len());
        let split = match self.find_best_split(indices, rng) {
            Some(s) if s.impurity < parent_impurity - f64::EPSILON => s,
            _ => {
                nodes.push(Node::leaf(current_idx, self.distribution(&counts)));
                return current_idx;
            }
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| self.features[i][split.feature_idx] <= split.threshold);

        // Reserve space for current node
        nodes.push(Node::internal(
            current_idx,
            split.feature_idx as i32,
            split.threshold,
            -1,
            -1,
        ));

        let left_idx = self.build_node(&left_indices, depth + 1, nodes, rng);
        let right_idx = self.build_node(&right_indices, depth + 1, nodes, rng);

        let node = &mut nodes[current_idx as usize];
        node.left = left_idx;
        node.right = right_idx;

        current_idx
    }

    /// Best split over a random subset of features
    fn find_best_split(&self, indices: &[usize], rng: &mut LcgRng) -> Option<SplitCandidate> {
        let k = self
            .config
            .max_features
            .unwrap_or(self.feature_count)
            .clamp(1, self.feature_count.max(1));
        let mut candidates = rng.sample_indices(self.feature_count, k);
        // Deterministic tie-breaking: lower feature index wins on equal impurity.
        candidates.sort_unstable();

        let mut best: Option<SplitCandidate> = None;
        for feature_idx in candidates {
            if let Some(candidate) = self.best_threshold(indices, feature_idx) {
                if best.map_or(true, |b| candidate.impurity < b.impurity) {
                    best = Some(candidate);
                }
            }
        }
        best
    }

    /// Sweep the sorted feature values, scoring every boundary between distinct values
    fn best_threshold(&self, indices: &[usize], feature_idx: usize) -> Option<SplitCandidate> {
        let mut order: Vec<(f64, usize)> = indices
            .iter()
            .map(|&i| (self.features[i][feature_idx], self.targets[i]))
            .collect();
        order.sort_by(|a, b| a.0.total_cmp(&b.0));

        let n = order.len();
        if n < 2 {
            return None;
        }
        let min_leaf = self.config.min_samples_leaf.max(1);
        let mut left = vec![0usize; self.n_classes];
        let mut right = self.class_counts(indices);
        let mut best: Option<SplitCandidate> = None;

        for pos in 0..n - 1 {
            let (value, class) = order[pos];
            left[class] += 1;
            right[class] -= 1;

            let n_left = pos + 1;
            let n_right = n - n_left;
            let next_value = order[pos + 1].0;
            if value == next_value || n_left < min_leaf || n_right < min_leaf {
                continue;
            }

            let impurity = (n_left as f64 * gini(&left, n_left)
                + n_right as f64 * gini(&right, n_right))
                / n as f64;
            if best.map_or(true, |b| impurity < b.impurity) {
                best = Some(SplitCandidate {
                    feature_idx,
                    threshold: value + (next_value - value) / 2.0,
                    impurity,
                });
            }
        }
        best
    }

    fn class_counts(&self, indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        for &i in indices {
            counts[self.targets[i]] += 1;
        }
        counts
    }

    fn distribution(&self, counts: &[usize]) -> Vec<f64> {
        let total: usize = counts.iter().sum();
        if total == 0 {
            return vec![1.0 / self.n_classes as f64; self.n_classes];
        }
        counts.iter().map(|&c| c as f64 / total as f64).collect()
    }
}

/// Gini impurity of a class histogram
pub fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let n = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}
