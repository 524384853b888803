//! Request file parsing

use anyhow::{Context, Result};
use credit_core::ApplicantRecord;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Batch payload: a bare array or an object wrapping it
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BatchInput {
    List(Vec<ApplicantRecord>),
    Wrapped { predictions: Vec<ApplicantRecord> },
}

pub fn read_applicant(path: &Path) -> Result<ApplicantRecord> {
    let text = read(path)?;
    parse_applicant(&text).with_context(|| format!("invalid applicant in {}", path.display()))
}

pub fn read_batch(path: &Path) -> Result<Vec<ApplicantRecord>> {
    let text = read(path)?;
    parse_batch(&text).with_context(|| format!("invalid batch in {}", path.display()))
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Parse and validate one applicant
pub fn parse_applicant(text: &str) -> Result<ApplicantRecord> {
    let record: ApplicantRecord = serde_json::from_str(text)?;
    record.validate()?;
    Ok(record)
}

/// Parse and validate every applicant of a batch
pub fn parse_batch(text: &str) -> Result<Vec<ApplicantRecord>> {
    let records = match serde_json::from_str::<BatchInput>(text)? {
        BatchInput::List(records) => records,
        BatchInput::Wrapped { predictions } => predictions,
    };
    for (index, record) in records.iter().enumerate() {
        record
            .validate()
            .with_context(|| format!("record {} failed validation", index))?;
    }
    Ok(records)
}
