//! Feature row handed to the model

use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Training-time column names
pub mod columns {
    pub const STATE: &str = "State";
    pub const SECTOR: &str = "Sector";
    pub const PRESENT_STATUS: &str = "Present Status";
    pub const APPROVED_COST: &str = "Approved Cost";
    pub const TOTAL_FINANCIAL_EXPENDITURE: &str = "Total Financial Expenditure";
    pub const UC_RECEIVED: &str = "U.C. Received";
    pub const SANCTIONED_DATE: &str = "Sanctioned Date";
    pub const SCHEDULED_COMPLETION_DATE: &str = "Scheduled Completion Date";

    pub const PLANNED_DURATION_DAYS: &str = "Planned_Duration_days";
    pub const ELAPSED_DAYS: &str = "Elapsed_Days";
    pub const DELAY_FLAG: &str = "Delay_Flag";
    pub const FUR: &str = "FUR";
    pub const EPR: &str = "EPR";
    pub const UCEG: &str = "UCEG";
    pub const SDR: &str = "SDR";
}

/// A single cell of the feature row
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Number(f64),
    Text(String),
    Date(NaiveDate),
}

impl FeatureValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FeatureValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Textual form for string-typed model inputs. Dates use the request format.
    pub fn as_text(&self) -> Option<String> {
        match self {
            FeatureValue::Text(s) => Some(s.clone()),
            FeatureValue::Date(d) => Some(d.format("%d-%m-%Y").to_string()),
            FeatureValue::Number(_) => None,
        }
    }
}

impl From<f64> for FeatureValue {
    fn from(value: f64) -> Self {
        FeatureValue::Number(value)
    }
}

impl From<&str> for FeatureValue {
    fn from(value: &str) -> Self {
        FeatureValue::Text(value.to_string())
    }
}

impl From<NaiveDate> for FeatureValue {
    fn from(value: NaiveDate) -> Self {
        FeatureValue::Date(value)
    }
}

/// Column name to value mapping for one project.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureRow {
    values: BTreeMap<String, FeatureValue>,
}

impl FeatureRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<FeatureValue>) {
        self.values.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&FeatureValue> {
        self.values.get(column)
    }

    /// Numeric value of a column, if present and numeric
    pub fn number(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(FeatureValue::as_f64)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_access() {
        let mut row = FeatureRow::new();
        row.insert(columns::FUR, 0.5);
        row.insert(columns::STATE, "KERALA");

        assert_eq!(row.len(), 2);
        assert_eq!(row.number(columns::FUR), Some(0.5));
        assert_eq!(row.number(columns::STATE), None);
        assert!(row.contains(columns::STATE));
        assert!(!row.contains(columns::SDR));
    }

    #[test]
    fn test_date_text_form() {
        let date = NaiveDate::from_ymd_opt(2020, 3, 24).unwrap();
        assert_eq!(
            FeatureValue::Date(date).as_text().as_deref(),
            Some("24-03-2020")
        );
        assert_eq!(FeatureValue::Number(1.0).as_text(), None);
    }
}
