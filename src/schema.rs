//! Model input schema and feature row reconciliation

use crate::types::features::{FeatureRow, FeatureValue};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Columns the model's preprocessing stage expects, split by transformer group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelSchema {
    /// Columns routed to the numeric transformer
    #[serde(default)]
    pub numeric: Vec<String>,
    /// Columns routed to the categorical encoder
    #[serde(default)]
    pub categorical: Vec<String>,
}

impl ModelSchema {
    pub fn new(numeric: Vec<String>, categorical: Vec<String>) -> Self {
        Self {
            numeric,
            categorical,
        }
    }

    /// Load a schema sidecar file: `{"numeric": [...], "categorical": [...]}`
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read schema file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse schema file {}", path.display()))
    }

    /// Expected columns in transformer order: numeric first, then categorical.
    pub fn expected_columns(&self) -> Vec<String> {
        self.numeric
            .iter()
            .chain(self.categorical.iter())
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.numeric.len() + self.categorical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Make sure every expected column is present in `row`, filling gaps with 0.
///
/// Columns already in the row are left untouched.
pub fn reconcile(mut row: FeatureRow, expected_columns: &[String]) -> FeatureRow {
    for column in expected_columns {
        if !row.contains(column) {
            debug!(column = %column, "Expected column missing from feature row, filling with 0");
            row.insert(column.as_str(), FeatureValue::Number(0.0));
        }
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::features::columns;

    fn expected() -> Vec<String> {
        ["Approved Cost", "FUR", "Project_Age_Bucket", "State", "Agency"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn partial_row() -> FeatureRow {
        let mut row = FeatureRow::new();
        row.insert(columns::APPROVED_COST, 33.69);
        row.insert(columns::FUR, 0.97);
        row.insert(columns::STATE, "ARUNACHAL PRADESH");
        row.insert(columns::SECTOR, "Transport and Communication");
        row
    }

    #[test]
    fn test_missing_columns_filled_with_zero() {
        let row = reconcile(partial_row(), &expected());

        for column in expected() {
            assert!(row.contains(&column), "{column}");
        }
        assert_eq!(row.number("Project_Age_Bucket"), Some(0.0));
        assert_eq!(row.number("Agency"), Some(0.0));
    }

    #[test]
    fn test_existing_columns_untouched() {
        let row = reconcile(partial_row(), &expected());

        assert_eq!(row.number(columns::FUR), Some(0.97));
        assert_eq!(
            row.get(columns::STATE),
            Some(&FeatureValue::Text("ARUNACHAL PRADESH".to_string()))
        );
        // Columns outside the schema are kept
        assert!(row.contains(columns::SECTOR));
        assert_eq!(row.len(), 6);
    }

    #[test]
    fn test_reconcile_idempotent() {
        let once = reconcile(partial_row(), &expected());
        let twice = reconcile(once.clone(), &expected());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_schema() {
        let row = reconcile(partial_row(), &[]);
        assert_eq!(row, partial_row());
    }

    #[test]
    fn test_expected_columns_order() {
        let schema = ModelSchema::new(
            vec!["FUR".to_string(), "SDR".to_string()],
            vec!["State".to_string()],
        );
        assert_eq!(schema.expected_columns(), vec!["FUR", "SDR", "State"]);
        assert_eq!(schema.len(), 3);
        assert_eq!(schema.categorical, vec!["State"]);
    }

    #[test]
    fn test_schema_from_json_file() {
        let path =
            std::env::temp_dir().join(format!("dpr-schema-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"{"numeric": ["Approved Cost", "FUR"], "categorical": ["State", "Sector"]}"#,
        )
        .unwrap();

        let schema = ModelSchema::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(schema.numeric, vec!["Approved Cost", "FUR"]);
        assert_eq!(schema.categorical, vec!["State", "Sector"]);
    }
}
