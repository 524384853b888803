//! Encoder fitting
//!
//! Fits categorical encoders, target decoder and scaler on a cleaned
//! dataset, then produces the scaled matrix through the same
//! [`credit_core::assemble_raw`] used at serving time.

use credit_core::schema::{self, FieldSource};
use credit_core::{assemble_raw, CategoricalEncoder, EncoderRegistry, StandardScaler, TargetDecoder};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::dataset::Dataset;
use crate::errors::{Result, TrainerError};

/// Scaled design matrix plus the fitted registry
#[derive(Clone, Debug)]
pub struct PreparedData {
    pub registry: EncoderRegistry,
    pub features: Vec<Vec<f64>>,
    pub targets: Vec<usize>,
}

impl PreparedData {
    pub fn n_classes(&self) -> usize {
        self.registry.target.n_classes()
    }
}

pub fn fit_encoders(dataset: &Dataset) -> BTreeMap<String, CategoricalEncoder> {
    schema::categorical_fields()
        .map(|spec| {
            let encoder = CategoricalEncoder::fit(
                dataset
                    .rows
                    .iter()
                    .filter_map(|row| row.categorical(spec.name)),
            );
            debug!(column = spec.name, classes = encoder.len(), "fitted categorical encoder");
            (spec.name.to_string(), encoder)
        })
        .collect()
}

pub fn prepare(dataset: &Dataset) -> Result<PreparedData> {
    if dataset.is_empty() {
        return Err(TrainerError::Dataset("cannot fit encoders on an empty dataset".into()));
    }

    let categorical = fit_encoders(dataset);
    let target = TargetDecoder::fit(&dataset.labels);
    info!(classes = ?target.classes, "fitted target decoder");

    let targets = dataset
        .labels
        .iter()
        .map(|label| {
            target
                .index_of(label)
                .ok_or_else(|| TrainerError::Training(format!("label '{}' not in decoder", label)))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut features = dataset
        .rows
        .iter()
        .map(|row| assemble_raw(row, &categorical).map(|raw| raw.values))
        .collect::<credit_core::Result<Vec<_>>>()?;

    let scaler = StandardScaler::fit(&features)?;
    for row in &mut features {
        scaler.transform(row)?;
    }

    let registry = EncoderRegistry {
        feature_names: schema::feature_names(),
        categorical,
        scaler,
        target,
    };
    // Refuse registries the serving side would reject at load time.
    registry.validate()?;

    Ok(PreparedData {
        registry,
        features,
        targets,
    })
}
