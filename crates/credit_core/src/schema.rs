//! Shared feature schema
//!
//! Single ordered declaration of every model input column. Both the
//! training-side fitting code and the serving-side feature builder walk this
//! table, so the renaming from applicant field names to training column names,
//! the categorical set and the column order cannot drift apart. Artifact
//! bundles are checked against it when they are loaded.

use crate::errors::{CreditCoreError, Result};
use std::collections::BTreeSet;

/// Number of columns in a model-ready feature vector
pub const FEATURE_COUNT: usize = 25;

/// Number of applicant-supplied fields
pub const INPUT_FIELD_COUNT: usize = 22;

/// How a column obtains its raw value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Numeric input copied as-is
    Numeric,
    /// String input encoded through the matching categorical encoder
    Categorical,
    /// Derived from other numeric inputs
    Engineered(Engineered),
}

/// Engineered columns computed from renamed inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engineered {
    DebtIncomeRatio,
    TotalCreditUsage,
    PaymentScore,
}

/// One schema column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Training-time column name
    pub name: &'static str,
    /// Applicant record field name (`None` for engineered columns)
    pub input: Option<&'static str>,
    pub kind: FieldKind,
}

impl FieldSpec {
    const fn numeric(name: &'static str, input: &'static str) -> Self {
        Self {
            name,
            input: Some(input),
            kind: FieldKind::Numeric,
        }
    }

    const fn categorical(name: &'static str, input: &'static str) -> Self {
        Self {
            name,
            input: Some(input),
            kind: FieldKind::Categorical,
        }
    }

    const fn engineered(name: &'static str, feature: Engineered) -> Self {
        Self {
            name,
            input: None,
            kind: FieldKind::Engineered(feature),
        }
    }

    pub fn is_categorical(&self) -> bool {
        self.kind == FieldKind::Categorical
    }
}

pub const AGE: &str = "Age";
pub const OCCUPATION: &str = "Occupation";
pub const ANNUAL_INCOME: &str = "Annual_Income";
pub const MONTHLY_INHAND_SALARY: &str = "Monthly_Inhand_Salary";
pub const NUM_BANK_ACCOUNTS: &str = "Num_Bank_Accounts";
pub const NUM_CREDIT_CARD: &str = "Num_Credit_Card";
pub const INTEREST_RATE: &str = "Interest_Rate";
pub const NUM_OF_LOAN: &str = "Num_of_Loan";
pub const TYPE_OF_LOAN: &str = "Type_of_Loan";
pub const DELAY_FROM_DUE_DATE: &str = "Delay_from_due_date";
pub const NUM_OF_DELAYED_PAYMENT: &str = "Num_of_Delayed_Payment";
pub const CHANGED_CREDIT_LIMIT: &str = "Changed_Credit_Limit";
pub const NUM_CREDIT_INQUIRIES: &str = "Num_Credit_Inquiries";
pub const CREDIT_MIX: &str = "Credit_Mix";
pub const OUTSTANDING_DEBT: &str = "Outstanding_Debt";
pub const CREDIT_UTILIZATION_RATIO: &str = "Credit_Utilization_Ratio";
pub const CREDIT_HISTORY_AGE: &str = "Credit_History_Age";
pub const PAYMENT_OF_MIN_AMOUNT: &str = "Payment_of_Min_Amount";
pub const TOTAL_EMI_PER_MONTH: &str = "Total_EMI_per_month";
pub const AMOUNT_INVESTED_MONTHLY: &str = "Amount_invested_monthly";
pub const PAYMENT_BEHAVIOUR: &str = "Payment_Behaviour";
pub const MONTHLY_BALANCE: &str = "Monthly_Balance";
pub const DEBT_INCOME_RATIO: &str = "Debt_Income_Ratio";
pub const TOTAL_CREDIT_USAGE: &str = "Total_Credit_Usage";
pub const PAYMENT_SCORE: &str = "Payment_Score";

/// Target column in training data
pub const TARGET: &str = "Credit_Score";

/// Frozen column order of the feature vector
pub const FEATURE_SCHEMA: [FieldSpec; FEATURE_COUNT] = [
    FieldSpec::numeric(AGE, "age"),
    FieldSpec::categorical(OCCUPATION, "occupation"),
    FieldSpec::numeric(ANNUAL_INCOME, "annual_income"),
    FieldSpec::numeric(MONTHLY_INHAND_SALARY, "monthly_inhand_salary"),
    FieldSpec::numeric(NUM_BANK_ACCOUNTS, "num_bank_accounts"),
    FieldSpec::numeric(NUM_CREDIT_CARD, "num_credit_card"),
    FieldSpec::numeric(INTEREST_RATE, "interest_rate"),
    FieldSpec::numeric(NUM_OF_LOAN, "num_of_loan"),
    FieldSpec::categorical(TYPE_OF_LOAN, "type_of_loan"),
    FieldSpec::numeric(DELAY_FROM_DUE_DATE, "delay_from_due_date"),
    FieldSpec::numeric(NUM_OF_DELAYED_PAYMENT, "num_of_delayed_payment"),
    FieldSpec::numeric(CHANGED_CREDIT_LIMIT, "changed_credit_limit"),
    FieldSpec::numeric(NUM_CREDIT_INQUIRIES, "num_credit_inquiries"),
    FieldSpec::categorical(CREDIT_MIX, "credit_mix"),
    FieldSpec::numeric(OUTSTANDING_DEBT, "outstanding_debt"),
    FieldSpec::numeric(CREDIT_UTILIZATION_RATIO, "credit_utilization_ratio"),
    FieldSpec::categorical(CREDIT_HISTORY_AGE, "credit_history_age"),
    FieldSpec::categorical(PAYMENT_OF_MIN_AMOUNT, "payment_of_min_amount"),
    FieldSpec::numeric(TOTAL_EMI_PER_MONTH, "total_emi_per_month"),
    FieldSpec::numeric(AMOUNT_INVESTED_MONTHLY, "amount_invested_monthly"),
    FieldSpec::categorical(PAYMENT_BEHAVIOUR, "payment_behaviour"),
    FieldSpec::numeric(MONTHLY_BALANCE, "monthly_balance"),
    FieldSpec::engineered(DEBT_INCOME_RATIO, Engineered::DebtIncomeRatio),
    FieldSpec::engineered(TOTAL_CREDIT_USAGE, Engineered::TotalCreditUsage),
    FieldSpec::engineered(PAYMENT_SCORE, Engineered::PaymentScore),
];

/// Read access to raw column values by training-time name.
///
/// Implemented by the serving-side applicant record and by training rows.
pub trait FieldSource {
    fn numeric(&self, name: &str) -> Option<f64>;
    fn categorical(&self, name: &str) -> Option<&str>;
}

/// Column names in frozen order
pub fn feature_names() -> Vec<String> {
    FEATURE_SCHEMA.iter().map(|f| f.name.to_string()).collect()
}

/// Categorical columns in schema order
pub fn categorical_fields() -> impl Iterator<Item = &'static FieldSpec> {
    FEATURE_SCHEMA.iter().filter(|f| f.is_categorical())
}

/// Applicant-supplied columns in schema order
pub fn input_fields() -> impl Iterator<Item = &'static FieldSpec> {
    FEATURE_SCHEMA.iter().filter(|f| f.input.is_some())
}

/// Position of a column in the feature vector
pub fn position(name: &str) -> Option<usize> {
    FEATURE_SCHEMA.iter().position(|f| f.name == name)
}

/// Training-time name for an applicant field
pub fn canonical_name(input: &str) -> Option<&'static str> {
    FEATURE_SCHEMA
        .iter()
        .find(|f| f.input == Some(input))
        .map(|f| f.name)
}

/// Applicant field name for a training-time column
pub fn input_name(canonical: &str) -> Option<&'static str> {
    FEATURE_SCHEMA
        .iter()
        .find(|f| f.name == canonical)
        .and_then(|f| f.input)
}

/// Check a recorded column list against the frozen order.
pub fn verify_feature_names(names: &[String]) -> Result<()> {
    if names.len() != FEATURE_COUNT {
        return Err(CreditCoreError::SchemaMismatch(format!(
            "expected {} columns, artifact records {}",
            FEATURE_COUNT,
            names.len()
        )));
    }
    for (idx, (recorded, spec)) in names.iter().zip(FEATURE_SCHEMA.iter()).enumerate() {
        if recorded != spec.name {
            return Err(CreditCoreError::SchemaMismatch(format!(
                "column {} is '{}' in the artifact but '{}' in the builder",
                idx, recorded, spec.name
            )));
        }
    }
    Ok(())
}

/// Check a set of fitted categorical encoders against the schema.
pub fn verify_categorical_set<'a, I>(names: I) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let recorded: BTreeSet<&str> = names.into_iter().collect();
    let expected: BTreeSet<&str> = categorical_fields().map(|f| f.name).collect();
    if recorded != expected {
        let missing: Vec<&str> = expected.difference(&recorded).copied().collect();
        let extra: Vec<&str> = recorded.difference(&expected).copied().collect();
        return Err(CreditCoreError::SchemaMismatch(format!(
            "categorical encoders differ (missing: {:?}, unexpected: {:?})",
            missing, extra
        )));
    }
    Ok(())
}

/// `outstanding_debt / (annual_income + 1)`
pub fn debt_income_ratio(outstanding_debt: f64, annual_income: f64) -> f64 {
    outstanding_debt / (annual_income + 1.0)
}

/// `num_credit_card * credit_utilization_ratio`
pub fn total_credit_usage(num_credit_card: f64, credit_utilization_ratio: f64) -> f64 {
    num_credit_card * credit_utilization_ratio
}

/// `clip(100 - delayed_payments * 5, 0, 100)`
pub fn payment_score(num_of_delayed_payment: f64) -> f64 {
    (100.0 - num_of_delayed_payment * 5.0).clamp(0.0, 100.0)
}

impl Engineered {
    /// Compute the engineered value from renamed numeric inputs.
    pub fn compute<S: FieldSource + ?Sized>(&self, source: &S) -> Result<f64> {
        let value = |name: &str| {
            source.numeric(name).ok_or_else(|| {
                CreditCoreError::InvalidInput(format!("missing numeric column '{}'", name))
            })
        };
        Ok(match self {
            Engineered::DebtIncomeRatio => {
                debt_income_ratio(value(OUTSTANDING_DEBT)?, value(ANNUAL_INCOME)?)
            }
            Engineered::TotalCreditUsage => {
                total_credit_usage(value(NUM_CREDIT_CARD)?, value(CREDIT_UTILIZATION_RATIO)?)
            }
            Engineered::PaymentScore => payment_score(value(NUM_OF_DELAYED_PAYMENT)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_shape_is_frozen() {
        assert_eq!(FEATURE_SCHEMA.len(), FEATURE_COUNT);
        assert_eq!(input_fields().count(), INPUT_FIELD_COUNT);
        assert_eq!(categorical_fields().count(), 6);
        assert_eq!(position(AGE), Some(0));
        assert_eq!(position(MONTHLY_BALANCE), Some(21));
        assert_eq!(position(PAYMENT_SCORE), Some(24));
    }

    #[test]
    fn names_are_unique() {
        let names: BTreeSet<&str> = FEATURE_SCHEMA.iter().map(|f| f.name).collect();
        assert_eq!(names.len(), FEATURE_COUNT);
        let inputs: BTreeSet<&str> = FEATURE_SCHEMA.iter().filter_map(|f| f.input).collect();
        assert_eq!(inputs.len(), INPUT_FIELD_COUNT);
    }

    #[test]
    fn renaming_table_round_trips() {
        assert_eq!(canonical_name("total_emi_per_month"), Some(TOTAL_EMI_PER_MONTH));
        assert_eq!(input_name(DELAY_FROM_DUE_DATE), Some("delay_from_due_date"));
        assert_eq!(input_name(PAYMENT_SCORE), None);
        assert_eq!(canonical_name("credit_score"), None);
    }

    #[test]
    fn verify_accepts_frozen_order() {
        assert!(verify_feature_names(&feature_names()).is_ok());
    }

    #[test]
    fn verify_rejects_reordered_columns() {
        let mut names = feature_names();
        names.swap(0, 1);
        let err = verify_feature_names(&names).unwrap_err();
        assert!(matches!(err, CreditCoreError::SchemaMismatch(_)));
    }

    #[test]
    fn verify_rejects_wrong_width() {
        let mut names = feature_names();
        names.pop();
        assert!(verify_feature_names(&names).is_err());
    }

    #[test]
    fn categorical_set_must_match_exactly() {
        let names: Vec<&str> = categorical_fields().map(|f| f.name).collect();
        assert!(verify_categorical_set(names.iter().copied()).is_ok());
        assert!(verify_categorical_set(names.iter().copied().skip(1)).is_err());
        let mut extra = names.clone();
        extra.push("Name");
        assert!(verify_categorical_set(extra).is_err());
    }

    #[test]
    fn division_guard_handles_zero_income() {
        let ratio = debt_income_ratio(25_000.0, 0.0);
        assert_eq!(ratio, 25_000.0);
        assert!(ratio.is_finite());
    }

    #[test]
    fn payment_score_is_clipped() {
        assert_eq!(payment_score(0.0), 100.0);
        assert_eq!(payment_score(1.0), 95.0);
        assert_eq!(payment_score(20.0), 0.0);
        assert_eq!(payment_score(35.0), 0.0);
    }
}
