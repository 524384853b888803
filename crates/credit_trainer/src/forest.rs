//! Random forest trainer
//!
//! Each tree sees its own bootstrap sample and its own RNG stream derived
//! from the forest seed, so the result depends only on the data and the
//! configuration.

use credit_core::classifier::ClassTree;
use credit_core::ForestModel;
use tracing::{debug, info};

use crate::cart::{CartBuilder, TreeConfig};
use crate::deterministic::LcgRng;
use crate::errors::{Result, TrainerError};

/// Random forest training configuration
#[derive(Clone, Debug)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features examined per split; `None` uses √n_features
    pub max_features: Option<usize>,
    pub seed: i64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 20,
            min_samples_split: 5,
            min_samples_leaf: 2,
            max_features: None,
            seed: 42,
        }
    }
}

pub struct RandomForestTrainer {
    config: ForestConfig,
}

impl RandomForestTrainer {
    pub fn new(config: ForestConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    /// Fit a forest on a scaled design matrix
    pub fn train(
        &self,
        features: &[Vec<f64>],
        targets: &[usize],
        n_classes: usize,
    ) -> Result<ForestModel> {
        if features.is_empty() {
            return Err(TrainerError::Training("no training rows".into()));
        }
        if features.len() != targets.len() {
            return Err(TrainerError::Training(format!(
                "{} feature rows but {} targets",
                features.len(),
                targets.len()
            )));
        }
        if self.config.n_trees == 0 {
            return Err(TrainerError::Training("forest needs at least one tree".into()));
        }

        let n_features = features[0].len();
        let max_features = self
            .config
            .max_features
            .unwrap_or_else(|| (n_features as f64).sqrt().floor().max(1.0) as usize);
        let tree_config = TreeConfig {
            max_depth: self.config.max_depth,
            min_samples_split: self.config.min_samples_split,
            min_samples_leaf: self.config.min_samples_leaf,
            max_features: Some(max_features),
        };
        info!(
            trees = self.config.n_trees,
            max_features,
            rows = features.len(),
            "training random forest"
        );

        let builder = CartBuilder::new(features, targets, n_classes, tree_config);
        let trees: Vec<ClassTree> = (0..self.config.n_trees)
            .map(|tree_idx| {
                let mut rng = LcgRng::derive(self.config.seed, tree_idx as u64);
                let sample = rng.bootstrap(features.len());
                let tree = builder.build(&sample, &mut rng);
                debug!(tree = tree_idx, nodes = tree.nodes.len(), depth = tree.depth(), "tree built");
                tree
            })
            .collect();

        let model = ForestModel::new(n_features, n_classes, trees);
        model.validate()?;
        Ok(model)
    }
}
