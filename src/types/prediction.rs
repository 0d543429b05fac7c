//! Prediction output data structures

use serde::{Deserialize, Serialize};
use std::fmt;

/// Risk classification returned to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLabel {
    Low,
    Medium,
    High,
    /// Class index outside the trained label set
    Unknown,
}

impl RiskLabel {
    /// Map the model's class index to a label.
    pub fn from_class(class: i64) -> Self {
        match class {
            0 => RiskLabel::Low,
            1 => RiskLabel::Medium,
            2 => RiskLabel::High,
            _ => RiskLabel::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLabel::Low => "Low",
            RiskLabel::Medium => "Medium",
            RiskLabel::High => "High",
            RiskLabel::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a successful `/predict` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub prediction: RiskLabel,
}

/// Body of a failed request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
}

/// One entry of a `/predict/batch` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatchItem {
    Prediction(PredictionResponse),
    Error(ErrorResponse),
}
