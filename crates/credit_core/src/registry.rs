//! Encoder registry and versioned artifact bundles
//!
//! A bundle is a directory named `<kind>_<YYYYMMDD>_<HHMMSS>` holding:
//! - `model.json`: the serialized classifier
//! - `encoders.json`: the [`EncoderRegistry`]
//! - `metrics.json`: optional held-out evaluation metrics
//!
//! When several bundles exist the latest timestamp wins. The timestamp part of
//! the directory name is the version exposed for observability. Everything is
//! validated against the shared schema before the bundle is handed out, and
//! nothing in a loaded bundle is mutated afterwards.

use crate::classifier::{ClassifierModel, ProbabilisticClassifier};
use crate::encoders::{CategoricalEncoder, StandardScaler, TargetDecoder};
use crate::errors::{CreditCoreError, Result};
use crate::schema::{self, FEATURE_COUNT};
use crate::scoring::CreditLabel;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument};

pub const MODEL_FILE: &str = "model.json";
pub const ENCODERS_FILE: &str = "encoders.json";
pub const METRICS_FILE: &str = "metrics.json";

/// `chrono` format of the version suffix in bundle names
pub const VERSION_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Training-time encoders consumed by the feature builder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderRegistry {
    /// Column order the scaler was fitted on
    pub feature_names: Vec<String>,
    /// Training-time column name → vocabulary
    pub categorical: BTreeMap<String, CategoricalEncoder>,
    pub scaler: StandardScaler,
    pub target: TargetDecoder,
}

impl EncoderRegistry {
    /// Check recorded columns, categorical set and scaler width against the schema
    pub fn verify_schema(&self) -> Result<()> {
        schema::verify_feature_names(&self.feature_names)?;
        schema::verify_categorical_set(self.categorical.keys().map(String::as_str))?;
        if self.scaler.width() != FEATURE_COUNT {
            return Err(CreditCoreError::SchemaMismatch(format!(
                "scaler fitted on {} columns, builder produces {}",
                self.scaler.width(),
                FEATURE_COUNT
            )));
        }
        Ok(())
    }

    /// Full structural validation performed at load time
    pub fn validate(&self) -> Result<()> {
        self.verify_schema()?;
        for (field, encoder) in &self.categorical {
            encoder.validate(field)?;
        }
        self.scaler.validate(FEATURE_COUNT)?;

        let expected: BTreeSet<&str> = CreditLabel::ALL.iter().map(|l| l.as_str()).collect();
        let recorded: BTreeSet<&str> = self.target.classes.iter().map(String::as_str).collect();
        if recorded != expected || self.target.n_classes() != expected.len() {
            return Err(CreditCoreError::SchemaMismatch(format!(
                "target classes {:?} do not match {:?}",
                self.target.classes, expected
            )));
        }
        Ok(())
    }
}

/// Held-out evaluation recorded by the trainer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

/// Loaded, validated, read-only artifact bundle
#[derive(Debug, Clone)]
pub struct ArtifactBundle {
    /// Directory name, e.g. `random_forest_20250115_103000`
    pub name: String,
    /// Version suffix, e.g. `20250115_103000`
    pub version: String,
    pub path: PathBuf,
    /// blake3 over the canonical JSON of model and encoders
    pub fingerprint: String,
    pub registry: Arc<EncoderRegistry>,
    pub classifier: Arc<ClassifierModel>,
    pub metrics: Option<EvaluationMetrics>,
}

impl ArtifactBundle {
    /// Load the latest bundle under `models_dir`
    pub fn load_latest(models_dir: &Path, prefix: Option<&str>) -> Result<Self> {
        let path = resolve_latest(models_dir, prefix)?;
        Self::load(&path)
    }

    /// Load one bundle directory
    #[instrument(skip_all, fields(path = %bundle_dir.display()))]
    pub fn load(bundle_dir: &Path) -> Result<Self> {
        if !bundle_dir.is_dir() {
            return Err(missing(bundle_dir));
        }
        let name = bundle_dir
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| missing(bundle_dir))?
            .to_string();
        let version = parse_bundle_name(&name)
            .map(|(_, version)| version.to_string())
            .ok_or_else(|| {
                CreditCoreError::ArtifactCorrupt(format!(
                    "bundle name '{}' does not follow <kind>_{}",
                    name, VERSION_FORMAT
                ))
            })?;

        let model_text = read_required(&bundle_dir.join(MODEL_FILE))?;
        let encoders_text = read_required(&bundle_dir.join(ENCODERS_FILE))?;

        let classifier: ClassifierModel = parse(&model_text, MODEL_FILE)?;
        let registry: EncoderRegistry = parse(&encoders_text, ENCODERS_FILE)?;

        classifier.validate()?;
        registry.validate()?;
        if classifier.n_features() != FEATURE_COUNT {
            return Err(CreditCoreError::SchemaMismatch(format!(
                "classifier expects {} features, builder produces {}",
                classifier.n_features(),
                FEATURE_COUNT
            )));
        }
        if classifier.n_classes() != registry.target.n_classes() {
            return Err(CreditCoreError::SchemaMismatch(format!(
                "classifier predicts {} classes, target decoder knows {}",
                classifier.n_classes(),
                registry.target.n_classes()
            )));
        }

        let metrics_path = bundle_dir.join(METRICS_FILE);
        let metrics = if metrics_path.is_file() {
            Some(parse(&fs::read_to_string(&metrics_path)?, METRICS_FILE)?)
        } else {
            None
        };

        let fingerprint = fingerprint(&model_text, &encoders_text)?;
        info!(
            bundle = %name,
            version = %version,
            kind = classifier.kind(),
            fingerprint = %fingerprint,
            "artifact bundle loaded"
        );

        Ok(Self {
            name,
            version,
            path: bundle_dir.to_path_buf(),
            fingerprint,
            registry: Arc::new(registry),
            classifier: Arc::new(classifier),
            metrics,
        })
    }
}

/// Split `<kind>_<YYYYMMDD>_<HHMMSS>` into kind and version
pub fn parse_bundle_name(name: &str) -> Option<(&str, &str)> {
    let mut parts = name.rsplitn(3, '_');
    let time = parts.next()?;
    let date = parts.next()?;
    let kind = parts.next()?;
    let digits = |s: &str, n: usize| s.len() == n && s.bytes().all(|b| b.is_ascii_digit());
    if kind.is_empty() || !digits(date, 8) || !digits(time, 6) {
        return None;
    }
    let version = &name[kind.len() + 1..];
    Some((kind, version))
}

/// Pick the newest bundle directory by version, optionally restricted to a kind
pub fn resolve_latest(models_dir: &Path, prefix: Option<&str>) -> Result<PathBuf> {
    if !models_dir.is_dir() {
        return Err(missing(models_dir));
    }

    let mut best: Option<(String, String, PathBuf)> = None;
    for entry in fs::read_dir(models_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let Some((kind, version)) = parse_bundle_name(&name) else {
            debug!(entry = %name, "skipping non-bundle directory");
            continue;
        };
        if prefix.is_some_and(|p| p != kind) {
            continue;
        }
        let candidate = (version.to_string(), name.clone(), entry.path());
        if best
            .as_ref()
            .map_or(true, |b| (&candidate.0, &candidate.1) > (&b.0, &b.1))
        {
            best = Some(candidate);
        }
    }

    best.map(|(_, _, path)| path).ok_or_else(|| missing(models_dir))
}

/// Write a new bundle directory and return its path
pub fn save_bundle(
    models_dir: &Path,
    kind: &str,
    created_at: DateTime<Utc>,
    registry: &EncoderRegistry,
    classifier: &ClassifierModel,
    metrics: Option<&EvaluationMetrics>,
) -> Result<PathBuf> {
    let name = format!("{}_{}", kind, created_at.format(VERSION_FORMAT));
    let dir = models_dir.join(&name);
    fs::create_dir_all(&dir)?;

    fs::write(dir.join(MODEL_FILE), serde_json::to_string_pretty(classifier)?)?;
    fs::write(dir.join(ENCODERS_FILE), serde_json::to_string_pretty(registry)?)?;
    if let Some(metrics) = metrics {
        fs::write(dir.join(METRICS_FILE), serde_json::to_string_pretty(metrics)?)?;
    }

    info!(bundle = %name, path = %dir.display(), "artifact bundle written");
    Ok(dir)
}

/// Hash of the canonical (sorted-key, compact) JSON of model and encoders
fn fingerprint(model_text: &str, encoders_text: &str) -> Result<String> {
    let mut hasher = blake3::Hasher::new();
    for text in [model_text, encoders_text] {
        let value: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| CreditCoreError::ArtifactCorrupt(e.to_string()))?;
        hasher.update(serde_json::to_string(&value)?.as_bytes());
    }
    Ok(hex::encode(hasher.finalize().as_bytes()))
}

fn read_required(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(missing(path));
    }
    Ok(fs::read_to_string(path)?)
}

fn parse<T: DeserializeOwned>(text: &str, file: &str) -> Result<T> {
    serde_json::from_str(text)
        .map_err(|e| CreditCoreError::ArtifactCorrupt(format!("{}: {}", file, e)))
}

fn missing(path: &Path) -> CreditCoreError {
    CreditCoreError::ArtifactMissing {
        location: path.display().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundle_names_split_into_kind_and_version() {
        assert_eq!(
            parse_bundle_name("random_forest_20250115_103000"),
            Some(("random_forest", "20250115_103000"))
        );
        assert_eq!(
            parse_bundle_name("logistic_20240101_000000"),
            Some(("logistic", "20240101_000000"))
        );
        assert_eq!(parse_bundle_name("random_forest"), None);
        assert_eq!(parse_bundle_name("_20250115_103000"), None);
        assert_eq!(parse_bundle_name("forest_2025011_103000"), None);
        assert_eq!(parse_bundle_name("forest_20250115_10300a"), None);
    }

    #[test]
    fn latest_version_wins() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "random_forest_20250115_103000",
            "random_forest_20250301_090000",
            "logistic_20250201_120000",
            "scratch",
        ] {
            fs::create_dir(dir.path().join(name)).unwrap();
        }
        fs::write(dir.path().join("random_forest_20991231_000000"), "file").unwrap();

        let latest = resolve_latest(dir.path(), None).unwrap();
        assert!(latest.ends_with("random_forest_20250301_090000"));

        let logistic = resolve_latest(dir.path(), Some("logistic")).unwrap();
        assert!(logistic.ends_with("logistic_20250201_120000"));
    }

    #[test]
    fn empty_directory_is_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_latest(dir.path(), None).unwrap_err();
        assert!(matches!(err, CreditCoreError::ArtifactMissing { .. }));

        let err = resolve_latest(&dir.path().join("absent"), None).unwrap_err();
        assert!(matches!(err, CreditCoreError::ArtifactMissing { .. }));
    }

    #[test]
    fn bundle_without_model_file_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = dir.path().join("random_forest_20250115_103000");
        fs::create_dir(&bundle).unwrap();
        fs::write(bundle.join(ENCODERS_FILE), "{}").unwrap();
        let err = ArtifactBundle::load(&bundle).unwrap_err();
        assert!(matches!(err, CreditCoreError::ArtifactMissing { .. }));
    }

    #[test]
    fn unparseable_model_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = dir.path().join("random_forest_20250115_103000");
        fs::create_dir(&bundle).unwrap();
        fs::write(bundle.join(MODEL_FILE), "{\"kind\": \"random_forest\"").unwrap();
        fs::write(bundle.join(ENCODERS_FILE), "{}").unwrap();
        let err = ArtifactBundle::load(&bundle).unwrap_err();
        assert!(matches!(err, CreditCoreError::ArtifactCorrupt(_)));
        assert!(err.is_configuration_error());
    }

    #[test]
    fn misnamed_bundle_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = dir.path().join("random_forest_latest");
        fs::create_dir(&bundle).unwrap();
        let err = ArtifactBundle::load(&bundle).unwrap_err();
        assert!(matches!(err, CreditCoreError::ArtifactCorrupt(_)));
        assert!(err.to_string().contains("random_forest_latest"));
    }

    #[test]
    fn fingerprint_ignores_formatting() {
        let a = fingerprint("{\"b\":1,\"a\":2}", "[]").unwrap();
        let b = fingerprint("{\n  \"a\": 2,\n  \"b\": 1\n}", "[ ]").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        let c = fingerprint("{\"a\":3,\"b\":1}", "[]").unwrap();
        assert_ne!(a, c);
    }
}
