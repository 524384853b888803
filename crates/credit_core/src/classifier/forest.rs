//! Random forest of classification trees
//!
//! Each leaf stores a class distribution; the forest probability vector is the
//! mean of the leaf distributions reached in every tree, so it sums to 1 by
//! construction.

use super::ProbabilisticClassifier;
use crate::errors::{CreditCoreError, Result};
use serde::{Deserialize, Serialize};

/// A decision tree node (internal or leaf)
///
/// For internal nodes `feature_idx >= 0`, `left`/`right` index child nodes and
/// `leaf` is `None`. Leaves carry `feature_idx == -1` and a class distribution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    /// Node ID (for reference, not used in traversal)
    pub id: i32,
    /// Left child index (-1 for leaf nodes)
    pub left: i32,
    /// Right child index (-1 for leaf nodes)
    pub right: i32,
    /// Feature index to split on (-1 for leaf nodes)
    pub feature_idx: i32,
    /// Go left when `feature <= threshold`
    pub threshold: f64,
    /// Class distribution (Some for leaf nodes)
    pub leaf: Option<Vec<f64>>,
}

impl Node {
    /// Create a new internal (split) node
    pub fn internal(id: i32, feature_idx: i32, threshold: f64, left: i32, right: i32) -> Self {
        Self {
            id,
            left,
            right,
            feature_idx,
            threshold,
            leaf: None,
        }
    }

    /// Create a new leaf node
    pub fn leaf(id: i32, distribution: Vec<f64>) -> Self {
        Self {
            id,
            left: -1,
            right: -1,
            feature_idx: -1,
            threshold: 0.0,
            leaf: Some(distribution),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.leaf.is_some()
    }
}

/// A single classification tree (node 0 is the root)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassTree {
    pub nodes: Vec<Node>,
}

impl ClassTree {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Walk to the leaf reached by `features` and return its distribution
    pub fn evaluate(&self, features: &[f64]) -> Result<&[f64]> {
        let mut idx = 0usize;
        // A validated tree reaches a leaf in at most `nodes.len()` steps.
        for _ in 0..=self.nodes.len() {
            let node = self.nodes.get(idx).ok_or_else(|| {
                CreditCoreError::ClassificationFailed(format!("node index {} out of range", idx))
            })?;

            if let Some(distribution) = &node.leaf {
                return Ok(distribution);
            }

            let value = usize::try_from(node.feature_idx)
                .ok()
                .and_then(|f| features.get(f))
                .ok_or_else(|| {
                    CreditCoreError::ClassificationFailed(format!(
                        "node {} splits on missing feature {}",
                        node.id, node.feature_idx
                    ))
                })?;

            let next = if *value <= node.threshold {
                node.left
            } else {
                node.right
            };
            idx = usize::try_from(next).map_err(|_| {
                CreditCoreError::ClassificationFailed(format!(
                    "internal node {} has no child",
                    node.id
                ))
            })?;
        }
        Err(CreditCoreError::ClassificationFailed(
            "tree traversal did not terminate".into(),
        ))
    }

    /// Validate structure against the model dimensions
    pub fn validate(&self, n_features: usize, n_classes: usize) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(corrupt("tree has no nodes".into()));
        }
        let len = self.nodes.len();
        for (idx, node) in self.nodes.iter().enumerate() {
            match &node.leaf {
                Some(distribution) => {
                    if distribution.len() != n_classes {
                        return Err(corrupt(format!(
                            "leaf {} has {} classes, expected {}",
                            idx,
                            distribution.len(),
                            n_classes
                        )));
                    }
                    if distribution.iter().any(|p| !p.is_finite() || *p < 0.0) {
                        return Err(corrupt(format!("leaf {} has invalid probabilities", idx)));
                    }
                    let total: f64 = distribution.iter().sum();
                    if (total - 1.0).abs() > super::PROBABILITY_TOLERANCE {
                        return Err(corrupt(format!("leaf {} sums to {}", idx, total)));
                    }
                }
                None => {
                    if node.feature_idx < 0 || node.feature_idx as usize >= n_features {
                        return Err(corrupt(format!(
                            "node {} splits on feature {} outside 0..{}",
                            idx, node.feature_idx, n_features
                        )));
                    }
                    if !node.threshold.is_finite() {
                        return Err(corrupt(format!("node {} has a non-finite threshold", idx)));
                    }
                    for child in [node.left, node.right] {
                        // Children always follow their parent, which rules out cycles.
                        if child <= idx as i32 || child as usize >= len {
                            return Err(corrupt(format!(
                                "node {} has invalid child index {}",
                                idx, child
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match nodes.get(idx) {
                Some(node) if !node.is_leaf() => {
                    1 + walk(nodes, node.left as usize).max(walk(nodes, node.right as usize))
                }
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }
}

/// Ensemble of classification trees
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForestModel {
    pub n_features: usize,
    pub n_classes: usize,
    pub trees: Vec<ClassTree>,
}

impl ForestModel {
    pub fn new(n_features: usize, n_classes: usize, trees: Vec<ClassTree>) -> Self {
        Self {
            n_features,
            n_classes,
            trees,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.trees.is_empty() {
            return Err(corrupt("forest has no trees".into()));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features, self.n_classes)
                .map_err(|e| corrupt(format!("tree {} validation failed: {}", i, e)))?;
        }
        Ok(())
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }
}

impl ProbabilisticClassifier for ForestModel {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>> {
        if self.trees.is_empty() {
            return Err(CreditCoreError::ClassificationFailed(
                "forest has no trees".into(),
            ));
        }
        let mut probabilities = vec![0.0; self.n_classes];
        for tree in &self.trees {
            let distribution = tree.evaluate(features)?;
            for (acc, p) in probabilities.iter_mut().zip(distribution) {
                *acc += p;
            }
        }
        let n = self.trees.len() as f64;
        for p in &mut probabilities {
            *p /= n;
        }
        Ok(probabilities)
    }
}

fn corrupt(msg: String) -> CreditCoreError {
    CreditCoreError::ArtifactCorrupt(msg)
}
