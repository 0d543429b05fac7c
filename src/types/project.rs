//! Project record data structures for DPR risk classification

use crate::error::PredictError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Progress status of a project as reported in the DPR
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentStatus {
    Completed,
    Ongoing,
    NotStarted,
    Delayed,
}

impl PresentStatus {
    /// Literal used in the training data
    pub fn as_str(&self) -> &'static str {
        match self {
            PresentStatus::Completed => "Completed",
            PresentStatus::Ongoing => "Ongoing",
            PresentStatus::NotStarted => "Not Started",
            PresentStatus::Delayed => "Delayed",
        }
    }
}

impl FromStr for PresentStatus {
    type Err = PredictError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Completed" => Ok(PresentStatus::Completed),
            "Ongoing" => Ok(PresentStatus::Ongoing),
            "Not Started" | "NotStarted" => Ok(PresentStatus::NotStarted),
            "Delayed" => Ok(PresentStatus::Delayed),
            other => Err(PredictError::UnrecognizedStatus(other.to_string())),
        }
    }
}

impl fmt::Display for PresentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw prediction request as received over the wire.
///
/// The status is kept as free text so an unknown value surfaces as
/// [`PredictError::UnrecognizedStatus`] instead of a body rejection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRequest {
    #[serde(rename = "State")]
    pub state: String,

    #[serde(rename = "Sector")]
    pub sector: String,

    #[serde(rename = "Present_Status", alias = "Present Status")]
    pub present_status: String,

    /// Sanctioned budget ceiling
    #[serde(rename = "Approved_Cost", alias = "Approved Cost")]
    pub approved_cost: f64,

    #[serde(
        rename = "Total_Financial_Expenditure",
        alias = "Total Financial Expenditure"
    )]
    pub total_financial_expenditure: f64,

    /// Funds covered by utilization certificates
    #[serde(rename = "UC_Received", alias = "U.C. Received")]
    pub uc_received: f64,

    /// DD-MM-YYYY
    #[serde(rename = "Sanctioned_Date", alias = "Sanctioned Date")]
    pub sanctioned_date: String,

    /// DD-MM-YYYY
    #[serde(
        rename = "Scheduled_Completion_Date",
        alias = "Scheduled Completion Date"
    )]
    pub scheduled_completion_date: String,
}

/// Validated project record, ready for feature derivation.
///
/// Dates stay textual here; they are parsed (and rejected) by the feature
/// deriver.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectRecord {
    pub state: String,
    pub sector: String,
    pub present_status: PresentStatus,
    pub approved_cost: f64,
    pub total_financial_expenditure: f64,
    pub uc_received: f64,
    pub sanctioned_date: String,
    pub scheduled_completion_date: String,
}

impl TryFrom<ProjectRequest> for ProjectRecord {
    type Error = PredictError;

    fn try_from(req: ProjectRequest) -> Result<Self, Self::Error> {
        let present_status = req.present_status.parse()?;

        check_amount("Approved_Cost", req.approved_cost)?;
        check_amount("Total_Financial_Expenditure", req.total_financial_expenditure)?;
        check_amount("UC_Received", req.uc_received)?;

        Ok(Self {
            state: req.state,
            sector: req.sector,
            present_status,
            approved_cost: req.approved_cost,
            total_financial_expenditure: req.total_financial_expenditure,
            uc_received: req.uc_received,
            sanctioned_date: req.sanctioned_date,
            scheduled_completion_date: req.scheduled_completion_date,
        })
    }
}

fn check_amount(field: &'static str, value: f64) -> Result<(), PredictError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(PredictError::InvalidAmount { field, value })
    }
}

impl ProjectRequest {
    /// Sample request taken from a completed Arunachal Pradesh transport project
    pub fn sample() -> Self {
        Self {
            state: "ARUNACHAL PRADESH".to_string(),
            sector: "Transport and Communication".to_string(),
            present_status: "Completed".to_string(),
            approved_cost: 33.69,
            total_financial_expenditure: 32.8254,
            uc_received: 32.8254,
            sanctioned_date: "24-03-2020".to_string(),
            scheduled_completion_date: "24-01-2023".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_deserialization() {
        let json = r#"{
            "State": "ARUNACHAL PRADESH",
            "Sector": "Transport and Communication",
            "Present_Status": "Completed",
            "Approved_Cost": 33.69,
            "Total_Financial_Expenditure": 32.8254,
            "UC_Received": 32.8254,
            "Sanctioned_Date": "24-03-2020",
            "Scheduled_Completion_Date": "24-01-2023"
        }"#;

        let req: ProjectRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.state, "ARUNACHAL PRADESH");
        assert_eq!(req.approved_cost, 33.69);
        assert_eq!(req.scheduled_completion_date, "24-01-2023");

        let record = ProjectRecord::try_from(req).unwrap();
        assert_eq!(record.present_status, PresentStatus::Completed);
    }

    #[test]
    fn test_training_column_aliases() {
        let json = r#"{
            "State": "ASSAM",
            "Sector": "Energy",
            "Present Status": "Not Started",
            "Approved Cost": 10.0,
            "Total Financial Expenditure": 0.0,
            "U.C. Received": 0.0,
            "Sanctioned Date": "01-01-2024",
            "Scheduled Completion Date": "01-01-2026"
        }"#;

        let req: ProjectRequest = serde_json::from_str(json).unwrap();
        let record = ProjectRecord::try_from(req).unwrap();
        assert_eq!(record.present_status, PresentStatus::NotStarted);
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("Ongoing".parse::<PresentStatus>().unwrap(), PresentStatus::Ongoing);
        assert_eq!("NotStarted".parse::<PresentStatus>().unwrap(), PresentStatus::NotStarted);
        assert_eq!(PresentStatus::NotStarted.as_str(), "Not Started");

        let err = "completed".parse::<PresentStatus>().unwrap_err();
        assert!(matches!(err, PredictError::UnrecognizedStatus(ref s) if s == "completed"));
    }

    #[test]
    fn test_unrecognized_status_rejected() {
        let mut req = ProjectRequest::sample();
        req.present_status = "Abandoned".to_string();
        // Malformed dates must not mask the status error
        req.sanctioned_date = "not a date".to_string();

        let err = ProjectRecord::try_from(req).unwrap_err();
        assert!(matches!(err, PredictError::UnrecognizedStatus(_)));
    }

    #[test]
    fn test_invalid_amounts_rejected() {
        let mut req = ProjectRequest::sample();
        req.uc_received = -1.0;
        let err = ProjectRecord::try_from(req).unwrap_err();
        assert!(matches!(err, PredictError::InvalidAmount { field: "UC_Received", .. }));

        let mut req = ProjectRequest::sample();
        req.approved_cost = f64::NAN;
        assert!(ProjectRecord::try_from(req).is_err());
    }

    #[test]
    fn test_zero_cost_passes_validation() {
        // Zero cost is a feature-derivation concern, not a validation one
        let mut req = ProjectRequest::sample();
        req.approved_cost = 0.0;
        assert!(ProjectRecord::try_from(req).is_ok());
    }
}
