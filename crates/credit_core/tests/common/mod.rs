//! Shared fixtures for integration tests

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use credit_core::classifier::{ClassTree, Node};
use credit_core::schema::*;
use credit_core::{
    save_bundle, CategoricalEncoder, ClassifierModel, EncoderRegistry, EvaluationMetrics,
    ForestModel, StandardScaler, TargetDecoder,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub fn registry() -> EncoderRegistry {
    let mut categorical = BTreeMap::new();
    categorical.insert(
        OCCUPATION.to_string(),
        CategoricalEncoder::fit(["Doctor", "Engineer", "Lawyer", "Teacher"]),
    );
    categorical.insert(
        TYPE_OF_LOAN.to_string(),
        CategoricalEncoder::fit(["Auto Loan, Personal Loan", "Mortgage Loan", "Unknown"]),
    );
    categorical.insert(
        CREDIT_MIX.to_string(),
        CategoricalEncoder::fit(["Bad", "Good", "Standard"]),
    );
    categorical.insert(
        CREDIT_HISTORY_AGE.to_string(),
        CategoricalEncoder::fit(["5 Years and 2 Months", "22 Years and 1 Months"]),
    );
    categorical.insert(
        PAYMENT_OF_MIN_AMOUNT.to_string(),
        CategoricalEncoder::fit(["NM", "No", "Yes"]),
    );
    categorical.insert(
        PAYMENT_BEHAVIOUR.to_string(),
        CategoricalEncoder::fit([
            "High_spent_Small_value_payments",
            "Low_spent_Medium_value_payments",
        ]),
    );
    EncoderRegistry {
        feature_names: feature_names(),
        categorical,
        scaler: StandardScaler {
            mean: vec![0.0; FEATURE_COUNT],
            scale: vec![1.0; FEATURE_COUNT],
        },
        target: TargetDecoder::fit(["Good", "Poor", "Standard"]),
    }
}

/// Poor when payments are late, else Good or Standard by debt load
pub fn forest() -> ClassifierModel {
    let payment = position(PAYMENT_SCORE).unwrap() as i32;
    let debt = position(DEBT_INCOME_RATIO).unwrap() as i32;
    let tree = ClassTree::new(vec![
        Node::internal(0, payment, 50.0, 1, 2),
        Node::leaf(1, vec![0.1, 0.8, 0.1]),
        Node::internal(2, debt, 0.5, 3, 4),
        Node::leaf(3, vec![0.7, 0.1, 0.2]),
        Node::leaf(4, vec![0.2, 0.2, 0.6]),
    ]);
    ClassifierModel::RandomForest(ForestModel::new(FEATURE_COUNT, 3, vec![tree]))
}

pub fn write_bundle(dir: &Path) -> PathBuf {
    let created = Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap();
    let metrics = EvaluationMetrics {
        accuracy: 0.81,
        precision: 0.8,
        recall: 0.81,
        f1_score: 0.8,
    };
    save_bundle(dir, "random_forest", created, &registry(), &forest(), Some(&metrics)).unwrap()
}
