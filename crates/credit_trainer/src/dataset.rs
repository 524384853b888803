//! CSV dataset loading and cleaning
//!
//! Reads the raw credit dataset by column name. Only the schema's input
//! columns and the target are used; identifier columns (`ID`,
//! `Customer_ID`, `Name`, `SSN`, `Month`) and anything else are ignored.
//!
//! Cleaning rules:
//! - numeric cells: strip `_` and `,`, parse; unparseable or missing cells
//!   are filled with the column median
//! - categorical cells: missing → `"Unknown"`
//! - rows without a target label are dropped

use credit_core::schema::{self, FieldKind, FieldSource, TARGET};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::errors::{Result, TrainerError};

/// Placeholder for missing categorical values
pub const MISSING_CATEGORY: &str = "Unknown";

/// Columns dropped before training
pub const IDENTIFIER_COLUMNS: [&str; 5] = ["ID", "Customer_ID", "Name", "SSN", "Month"];

/// One cleaned training row, keyed by schema column name
#[derive(Clone, Debug, PartialEq)]
pub struct TrainingRow {
    pub numeric: BTreeMap<&'static str, f64>,
    pub categorical: BTreeMap<&'static str, String>,
}

impl FieldSource for TrainingRow {
    fn numeric(&self, name: &str) -> Option<f64> {
        self.numeric.get(name).copied()
    }

    fn categorical(&self, name: &str) -> Option<&str> {
        self.categorical.get(name).map(String::as_str)
    }
}

/// Cleaned dataset with one label per row
#[derive(Clone, Debug)]
pub struct Dataset {
    pub rows: Vec<TrainingRow>,
    pub labels: Vec<String>,
}

impl Dataset {
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            TrainerError::Dataset(format!("failed to open {}: {}", path.display(), e))
        })?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(false)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let column = |name: &str| headers.iter().position(|h| h == name);

        let mut columns = Vec::new();
        for spec in schema::input_fields() {
            let idx = column(spec.name).ok_or_else(|| {
                TrainerError::Dataset(format!("missing required column '{}'", spec.name))
            })?;
            columns.push((spec, idx));
        }
        let target_idx = column(TARGET)
            .ok_or_else(|| TrainerError::Dataset(format!("missing target column '{}'", TARGET)))?;

        let ignored: Vec<&str> = headers
            .iter()
            .filter(|h| IDENTIFIER_COLUMNS.contains(h))
            .collect();
        debug!(?ignored, "identifier columns ignored");

        let mut raw_numeric: BTreeMap<&'static str, Vec<Option<f64>>> = BTreeMap::new();
        let mut categorical_rows: Vec<BTreeMap<&'static str, String>> = Vec::new();
        let mut labels = Vec::new();
        let mut dropped = 0usize;

        for record in csv_reader.records() {
            let record = record?;
            let label = record.get(target_idx).unwrap_or_default();
            if is_missing(label) {
                dropped += 1;
                continue;
            }
            labels.push(label.to_string());

            let mut categorical = BTreeMap::new();
            for (spec, idx) in &columns {
                let cell = record.get(*idx).unwrap_or_default();
                match spec.kind {
                    FieldKind::Categorical => {
                        let value = if is_missing(cell) { MISSING_CATEGORY } else { cell };
                        categorical.insert(spec.name, value.to_string());
                    }
                    _ => raw_numeric
                        .entry(spec.name)
                        .or_default()
                        .push(parse_numeric(cell)),
                }
            }
            categorical_rows.push(categorical);
        }

        if labels.is_empty() {
            return Err(TrainerError::Dataset("dataset has no labelled rows".into()));
        }
        if dropped > 0 {
            warn!(dropped, "rows without a target label dropped");
        }

        let mut filled: BTreeMap<&'static str, Vec<f64>> = BTreeMap::new();
        for (name, cells) in raw_numeric {
            let missing = cells.iter().filter(|c| c.is_none()).count();
            let fill = median(cells.iter().flatten().copied()).unwrap_or(0.0);
            if missing > 0 {
                info!(column = name, missing, median = fill, "filled missing values with median");
            }
            filled.insert(name, cells.into_iter().map(|c| c.unwrap_or(fill)).collect());
        }

        let rows = categorical_rows
            .into_iter()
            .enumerate()
            .map(|(i, categorical)| TrainingRow {
                numeric: filled.iter().map(|(name, col)| (*name, col[i])).collect(),
                categorical,
            })
            .collect();

        Ok(Self { rows, labels })
    }

    /// Get number of samples
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if dataset is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row count per label
    pub fn label_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for label in &self.labels {
            *counts.entry(label.as_str()).or_default() += 1;
        }
        counts
    }
}

fn is_missing(cell: &str) -> bool {
    cell.is_empty() || matches!(cell, "NA" | "NaN" | "nan" | "null")
}

/// Parse a raw numeric cell after stripping `_` and `,`
pub fn parse_numeric(cell: &str) -> Option<f64> {
    let cleaned: String = cell.chars().filter(|c| *c != '_' && *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Median of the values (mean of the two middle values for even counts)
pub fn median<I: IntoIterator<Item = f64>>(values: I) -> Option<f64> {
    let mut sorted: Vec<f64> = values.into_iter().collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    Some(if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use credit_core::schema::{ANNUAL_INCOME, CREDIT_MIX, NUM_OF_DELAYED_PAYMENT, OCCUPATION};

    const HEADER: &str = "ID,Customer_ID,Month,Name,Age,SSN,Occupation,Annual_Income,Monthly_Inhand_Salary,Num_Bank_Accounts,Num_Credit_Card,Interest_Rate,Num_of_Loan,Type_of_Loan,Delay_from_due_date,Num_of_Delayed_Payment,Changed_Credit_Limit,Num_Credit_Inquiries,Credit_Mix,Outstanding_Debt,Credit_Utilization_Ratio,Credit_History_Age,Payment_of_Min_Amount,Total_EMI_per_month,Amount_invested_monthly,Payment_Behaviour,Monthly_Balance,Credit_Score";

    fn csv(rows: &[&str]) -> String {
        let mut text = String::from(HEADER);
        for row in rows {
            text.push('\n');
            text.push_str(row);
        }
        text
    }

    #[test]
    fn test_load_and_clean() {
        let text = csv(&[
            "0x1,C1,January,Aaron,23,821-00,Scientist,19114.12,1824.8,3,4,3,4,Auto Loan,3,7,11.27,4,Good,809.98,26.8,22 Years and 1 Months,No,49.57,80.4,High_spent_Small_value_payments,312.49,Good",
            "0x2,C1,February,Aaron,23_,821-00,,\"34,847.84\",,3,4,3,4,Auto Loan,-1,_,11.27,4,_,809.98,31.9,,No,49.57,118.3,Low_spent_Large_value_payments,284.63,Standard",
            "0x3,C2,March,Rick,28,004-07,Teacher,30000,2500,2,4,6,1,,3,9,6.27,4,Good,605.03,24.4,26 Years and 7 Months,NM,18.8,40.4,Low_spent_Small_value_payments,484.59,Poor",
        ]);
        let dataset = Dataset::from_reader(text.as_bytes()).unwrap();

        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.labels, vec!["Good", "Standard", "Poor"]);

        let second = &dataset.rows[1];
        assert_eq!(second.numeric(schema::AGE), Some(23.0));
        assert_eq!(second.numeric(ANNUAL_INCOME), Some(34_847.84));
        assert_eq!(second.categorical(OCCUPATION), Some(MISSING_CATEGORY));
        // "_" is kept verbatim for categoricals; only empty cells are missing.
        assert_eq!(second.categorical(CREDIT_MIX), Some("_"));
        // median of 7 and 9
        assert_eq!(second.numeric(NUM_OF_DELAYED_PAYMENT), Some(8.0));
    }

    #[test]
    fn test_unlabelled_rows_are_dropped() {
        let text = csv(&[
            "0x1,C1,January,Aaron,23,821-00,Scientist,19114.12,1824.8,3,4,3,4,Auto Loan,3,7,11.27,4,Good,809.98,26.8,22 Years and 1 Months,No,49.57,80.4,High_spent_Small_value_payments,312.49,",
            "0x3,C2,March,Rick,28,004-07,Teacher,30000,2500,2,4,6,1,,3,9,6.27,4,Good,605.03,24.4,26 Years and 7 Months,NM,18.8,40.4,Low_spent_Small_value_payments,484.59,Poor",
        ]);
        let dataset = Dataset::from_reader(text.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.label_counts().get("Poor"), Some(&1));
    }

    #[test]
    fn test_missing_column_is_reported() {
        let text = "Age,Occupation,Credit_Score\n30,Doctor,Good\n";
        let err = Dataset::from_reader(text.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("missing required column"));
    }

    #[test]
    fn test_numeric_cleaning() {
        assert_eq!(parse_numeric("1_000"), Some(1000.0));
        assert_eq!(parse_numeric("12,500.5"), Some(12_500.5));
        assert_eq!(parse_numeric("_"), None);
        assert_eq!(parse_numeric("abc"), None);
        assert_eq!(parse_numeric("-3"), Some(-3.0));
    }

    #[test]
    fn test_median() {
        assert_eq!(median([3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median([4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(median(Vec::new()), None);
    }
}
