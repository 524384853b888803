//! Fitted encoders: categorical vocabularies, standard scaler, target decoder
//!
//! All three are fitted once at training time and serialized into the
//! artifact bundle; serving only reads them.

use crate::errors::{CreditCoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Code substituted for values outside the training vocabulary
pub const UNSEEN_CATEGORY_CODE: u32 = 0;

/// Closed string → integer vocabulary.
///
/// Classes are kept sorted; a value's code is its index in that order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalEncoder {
    pub classes: Vec<String>,
}

impl CategoricalEncoder {
    /// Fit a vocabulary from observed values
    pub fn fit<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let classes: BTreeSet<String> = values
            .into_iter()
            .map(|v| v.as_ref().to_string())
            .collect();
        Self {
            classes: classes.into_iter().collect(),
        }
    }

    /// Code for a known value
    pub fn encode(&self, value: &str) -> Option<u32> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(value))
            .ok()
            .map(|idx| idx as u32)
    }

    /// Code for a value, substituting [`UNSEEN_CATEGORY_CODE`] when unseen.
    ///
    /// The flag is `true` when the fallback was used.
    pub fn encode_or_fallback(&self, value: &str) -> (u32, bool) {
        match self.encode(value) {
            Some(code) => (code, false),
            None => (UNSEEN_CATEGORY_CODE, true),
        }
    }

    pub fn decode(&self, code: u32) -> Option<&str> {
        self.classes.get(code as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn validate(&self, field: &str) -> Result<()> {
        if self.classes.is_empty() {
            return Err(CreditCoreError::ArtifactCorrupt(format!(
                "encoder for '{}' has an empty vocabulary",
                field
            )));
        }
        if self.classes.windows(2).any(|w| w[0] >= w[1]) {
            return Err(CreditCoreError::ArtifactCorrupt(format!(
                "encoder for '{}' is not sorted and deduplicated",
                field
            )));
        }
        Ok(())
    }
}

/// Per-feature affine standardization: `(x - mean) / scale`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Fit column means and population standard deviations.
    ///
    /// Columns with zero variance get a scale of 1.
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self> {
        let width = rows.first().map(Vec::len).ok_or_else(|| {
            CreditCoreError::InvalidInput("cannot fit scaler on an empty matrix".into())
        })?;
        if rows.iter().any(|r| r.len() != width) {
            return Err(CreditCoreError::InvalidInput(
                "cannot fit scaler on a ragged matrix".into(),
            ));
        }

        let n = rows.len() as f64;
        let mut mean = vec![0.0; width];
        for row in rows {
            for (m, v) in mean.iter_mut().zip(row) {
                *m += v;
            }
        }
        for m in &mut mean {
            *m /= n;
        }

        let mut variance = vec![0.0; width];
        for row in rows {
            for ((var, v), m) in variance.iter_mut().zip(row).zip(&mean) {
                *var += (v - m) * (v - m);
            }
        }
        let scale = variance
            .into_iter()
            .map(|var| {
                let std = (var / n).sqrt();
                if std > f64::EPSILON && std.is_finite() {
                    std
                } else {
                    1.0
                }
            })
            .collect();

        Ok(Self { mean, scale })
    }

    pub fn width(&self) -> usize {
        self.mean.len()
    }

    /// Standardize a row in place
    pub fn transform(&self, row: &mut [f64]) -> Result<()> {
        if row.len() != self.width() {
            return Err(CreditCoreError::SchemaMismatch(format!(
                "scaler expects {} columns, got {}",
                self.width(),
                row.len()
            )));
        }
        for ((v, m), s) in row.iter_mut().zip(&self.mean).zip(&self.scale) {
            *v = (*v - m) / s;
        }
        Ok(())
    }

    pub fn validate(&self, expected_width: usize) -> Result<()> {
        if self.mean.len() != expected_width || self.scale.len() != expected_width {
            return Err(CreditCoreError::SchemaMismatch(format!(
                "scaler has {} means and {} scales, expected {}",
                self.mean.len(),
                self.scale.len(),
                expected_width
            )));
        }
        if self.mean.iter().any(|m| !m.is_finite()) {
            return Err(CreditCoreError::ArtifactCorrupt(
                "scaler mean contains non-finite values".into(),
            ));
        }
        if self.scale.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(CreditCoreError::ArtifactCorrupt(
                "scaler scale must be positive and finite".into(),
            ));
        }
        Ok(())
    }
}

/// Class index → label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetDecoder {
    pub classes: Vec<String>,
}

impl TargetDecoder {
    /// Fit from observed target labels; indices follow sorted order
    pub fn fit<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let CategoricalEncoder { classes } = CategoricalEncoder::fit(labels);
        Self { classes }
    }

    pub fn decode(&self, index: usize) -> Option<&str> {
        self.classes.get(index).map(String::as_str)
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.classes.iter().position(|c| c == label)
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }
}
