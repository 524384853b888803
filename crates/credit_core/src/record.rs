//! Applicant record supplied by callers

use crate::errors::{CreditCoreError, Result};
use crate::schema::{self, FieldSource};
use serde::{Deserialize, Serialize};

/// Minimum applicant age
pub const MIN_AGE: u32 = 18;
/// Maximum applicant age
pub const MAX_AGE: u32 = 100;

/// Raw applicant attributes as submitted on the single and batch paths
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicantRecord {
    // Personal
    pub age: u32,
    pub occupation: String,

    // Financial
    pub annual_income: f64,
    pub monthly_inhand_salary: f64,
    pub num_bank_accounts: u32,
    pub num_credit_card: u32,
    pub interest_rate: f64,
    pub num_of_loan: u32,
    pub type_of_loan: String,

    // Payment history
    pub delay_from_due_date: i32,
    pub num_of_delayed_payment: u32,
    pub changed_credit_limit: f64,
    pub num_credit_inquiries: u32,

    // Credit mix and debt
    pub credit_mix: String,
    pub outstanding_debt: f64,
    pub credit_utilization_ratio: f64,

    // History and behaviour
    pub credit_history_age: String,
    pub payment_of_min_amount: String,
    pub total_emi_per_month: f64,
    pub amount_invested_monthly: f64,
    pub payment_behaviour: String,
    pub monthly_balance: f64,
}

impl ApplicantRecord {
    /// Enforce the declared field bounds.
    ///
    /// Callers run this before handing records to the pipeline; the same
    /// checks apply to single and batch submissions.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_AGE..=MAX_AGE).contains(&self.age) {
            return Err(invalid(format!(
                "age must be between {} and {}, got {}",
                MIN_AGE, MAX_AGE, self.age
            )));
        }

        let floats = [
            ("annual_income", self.annual_income),
            ("monthly_inhand_salary", self.monthly_inhand_salary),
            ("interest_rate", self.interest_rate),
            ("changed_credit_limit", self.changed_credit_limit),
            ("outstanding_debt", self.outstanding_debt),
            ("credit_utilization_ratio", self.credit_utilization_ratio),
            ("total_emi_per_month", self.total_emi_per_month),
            ("amount_invested_monthly", self.amount_invested_monthly),
            ("monthly_balance", self.monthly_balance),
        ];
        for (name, value) in floats {
            if !value.is_finite() {
                return Err(invalid(format!("{} must be a finite number", name)));
            }
        }

        positive("annual_income", self.annual_income)?;
        positive("monthly_inhand_salary", self.monthly_inhand_salary)?;
        percentage("interest_rate", self.interest_rate)?;
        percentage("credit_utilization_ratio", self.credit_utilization_ratio)?;
        non_negative("outstanding_debt", self.outstanding_debt)?;
        non_negative("total_emi_per_month", self.total_emi_per_month)?;
        non_negative("amount_invested_monthly", self.amount_invested_monthly)?;

        let texts = [
            ("occupation", &self.occupation),
            ("type_of_loan", &self.type_of_loan),
            ("credit_mix", &self.credit_mix),
            ("credit_history_age", &self.credit_history_age),
            ("payment_of_min_amount", &self.payment_of_min_amount),
            ("payment_behaviour", &self.payment_behaviour),
        ];
        for (name, value) in texts {
            if value.trim().is_empty() {
                return Err(invalid(format!("{} must not be empty", name)));
            }
        }

        Ok(())
    }

    fn numeric_input(&self, input: &str) -> Option<f64> {
        let value = match input {
            "age" => self.age as f64,
            "annual_income" => self.annual_income,
            "monthly_inhand_salary" => self.monthly_inhand_salary,
            "num_bank_accounts" => self.num_bank_accounts as f64,
            "num_credit_card" => self.num_credit_card as f64,
            "interest_rate" => self.interest_rate,
            "num_of_loan" => self.num_of_loan as f64,
            "delay_from_due_date" => self.delay_from_due_date as f64,
            "num_of_delayed_payment" => self.num_of_delayed_payment as f64,
            "changed_credit_limit" => self.changed_credit_limit,
            "num_credit_inquiries" => self.num_credit_inquiries as f64,
            "outstanding_debt" => self.outstanding_debt,
            "credit_utilization_ratio" => self.credit_utilization_ratio,
            "total_emi_per_month" => self.total_emi_per_month,
            "amount_invested_monthly" => self.amount_invested_monthly,
            "monthly_balance" => self.monthly_balance,
            _ => return None,
        };
        Some(value)
    }

    fn text_input(&self, input: &str) -> Option<&str> {
        let value = match input {
            "occupation" => &self.occupation,
            "type_of_loan" => &self.type_of_loan,
            "credit_mix" => &self.credit_mix,
            "credit_history_age" => &self.credit_history_age,
            "payment_of_min_amount" => &self.payment_of_min_amount,
            "payment_behaviour" => &self.payment_behaviour,
            _ => return None,
        };
        Some(value.as_str())
    }
}

impl FieldSource for ApplicantRecord {
    fn numeric(&self, name: &str) -> Option<f64> {
        schema::input_name(name).and_then(|input| self.numeric_input(input))
    }

    fn categorical(&self, name: &str) -> Option<&str> {
        schema::input_name(name).and_then(|input| self.text_input(input))
    }
}

fn invalid(msg: String) -> CreditCoreError {
    CreditCoreError::InvalidInput(msg)
}

fn positive(name: &str, value: f64) -> Result<()> {
    if value <= 0.0 {
        return Err(invalid(format!("{} must be greater than 0, got {}", name, value)));
    }
    Ok(())
}

fn non_negative(name: &str, value: f64) -> Result<()> {
    if value < 0.0 {
        return Err(invalid(format!("{} must not be negative, got {}", name, value)));
    }
    Ok(())
}

fn percentage(name: &str, value: f64) -> Result<()> {
    if !(0.0..=100.0).contains(&value) {
        return Err(invalid(format!(
            "{} must be between 0 and 100, got {}",
            name, value
        )));
    }
    Ok(())
}

/// Applicant used in documentation and tests
pub fn sample_applicant() -> ApplicantRecord {
    ApplicantRecord {
        age: 35,
        occupation: "Engineer".into(),
        annual_income: 120_000.0,
        monthly_inhand_salary: 8_500.0,
        num_bank_accounts: 3,
        num_credit_card: 2,
        interest_rate: 12.5,
        num_of_loan: 2,
        type_of_loan: "Auto Loan, Personal Loan".into(),
        delay_from_due_date: 5,
        num_of_delayed_payment: 1,
        changed_credit_limit: 5.0,
        num_credit_inquiries: 2,
        credit_mix: "Good".into(),
        outstanding_debt: 25_000.0,
        credit_utilization_ratio: 35.5,
        credit_history_age: "5 Years and 2 Months".into(),
        payment_of_min_amount: "Yes".into(),
        total_emi_per_month: 2_500.0,
        amount_invested_monthly: 1_500.0,
        payment_behaviour: "Low_spent_Medium_value_payments".into(),
        monthly_balance: 15_000.0,
    }
}
