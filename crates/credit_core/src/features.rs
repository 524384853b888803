//! Feature builder: applicant record → scaled, ordered feature vector
//!
//! Steps, all driven by [`crate::schema::FEATURE_SCHEMA`]:
//! 1. read each column through its training-time name
//! 2. encode categorical columns (unseen values fall back to code 0)
//! 3. compute engineered columns
//! 4. assemble in frozen order
//! 5. apply the standard scaler
//!
//! Steps 1–4 are shared with the trainer through [`assemble_raw`], which is
//! what keeps serving-time encoding identical to training-time encoding.

use crate::encoders::CategoricalEncoder;
use crate::errors::{CreditCoreError, Result};
use crate::registry::EncoderRegistry;
use crate::schema::{self, FieldKind, FieldSource, FEATURE_COUNT, FEATURE_SCHEMA};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

/// Model-ready numeric features in schema order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value of a named column
    pub fn get(&self, name: &str) -> Option<f64> {
        schema::position(name).and_then(|idx| self.0.get(idx).copied())
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

impl From<Vec<f64>> for FeatureVector {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

/// Unscaled assembly of one row
#[derive(Debug, Clone, PartialEq)]
pub struct RawFeatures {
    pub values: Vec<f64>,
    /// Categorical columns whose value was outside the training vocabulary
    pub fallbacks: Vec<&'static str>,
}

/// Assemble the unscaled feature row for any field source.
///
/// Used by the serving path and by the trainer when fitting the scaler.
pub fn assemble_raw<S>(
    source: &S,
    encoders: &BTreeMap<String, CategoricalEncoder>,
) -> Result<RawFeatures>
where
    S: FieldSource + ?Sized,
{
    let mut values = Vec::with_capacity(FEATURE_COUNT);
    let mut fallbacks = Vec::new();

    for spec in FEATURE_SCHEMA.iter() {
        let value = match spec.kind {
            FieldKind::Numeric => source.numeric(spec.name).ok_or_else(|| {
                CreditCoreError::InvalidInput(format!("missing numeric column '{}'", spec.name))
            })?,
            FieldKind::Categorical => {
                let encoder = encoders.get(spec.name).ok_or_else(|| {
                    CreditCoreError::SchemaMismatch(format!(
                        "no encoder fitted for categorical column '{}'",
                        spec.name
                    ))
                })?;
                let raw = source.categorical(spec.name).ok_or_else(|| {
                    CreditCoreError::InvalidInput(format!(
                        "missing categorical column '{}'",
                        spec.name
                    ))
                })?;
                let (code, fell_back) = encoder.encode_or_fallback(raw);
                if fell_back {
                    fallbacks.push(spec.name);
                }
                code as f64
            }
            FieldKind::Engineered(feature) => feature.compute(source)?,
        };

        if !value.is_finite() {
            return Err(CreditCoreError::InvalidInput(format!(
                "column '{}' is not finite",
                spec.name
            )));
        }
        values.push(value);
    }

    Ok(RawFeatures { values, fallbacks })
}

/// Feature vector plus the columns that used the unseen-category fallback
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltFeatures {
    pub vector: FeatureVector,
    pub fallbacks: Vec<&'static str>,
}

/// Builds scaled feature vectors against a loaded registry
#[derive(Debug, Clone)]
pub struct FeatureBuilder {
    registry: Arc<EncoderRegistry>,
}

impl FeatureBuilder {
    /// Bind to a registry, refusing one whose schema disagrees with the builder
    pub fn new(registry: Arc<EncoderRegistry>) -> Result<Self> {
        registry.verify_schema()?;
        Ok(Self { registry })
    }

    pub fn registry(&self) -> &EncoderRegistry {
        &self.registry
    }

    /// Build the scaled vector and report fallback columns
    pub fn build_with_report<S>(&self, source: &S) -> Result<BuiltFeatures>
    where
        S: FieldSource + ?Sized,
    {
        let RawFeatures {
            mut values,
            fallbacks,
        } = assemble_raw(source, &self.registry.categorical)?;

        for field in &fallbacks {
            warn!(field = %field, "unseen category, substituting fallback code");
        }

        self.registry.scaler.transform(&mut values)?;
        Ok(BuiltFeatures {
            vector: FeatureVector(values),
            fallbacks,
        })
    }

    pub fn build<S>(&self, source: &S) -> Result<FeatureVector>
    where
        S: FieldSource + ?Sized,
    {
        self.build_with_report(source).map(|b| b.vector)
    }
}

/// Build a scaled feature vector for one record
pub fn build<S>(record: &S, registry: &EncoderRegistry) -> Result<FeatureVector>
where
    S: FieldSource + ?Sized,
{
    registry.verify_schema()?;
    let mut raw = assemble_raw(record, &registry.categorical)?;
    registry.scaler.transform(&mut raw.values)?;
    Ok(FeatureVector(raw.values))
}
