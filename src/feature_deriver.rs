//! Feature derivation for DPR risk model inference.
//!
//! Turns a validated [`ProjectRecord`] into the feature row used during model
//! training: the raw fields under their training-time column names plus the
//! schedule and fund-utilization indicators.

use crate::config::ZeroDivisionPolicy;
use crate::error::PredictError;
use crate::types::features::{columns, FeatureRow};
use crate::types::project::{PresentStatus, ProjectRecord};
use chrono::NaiveDate;
use tracing::warn;

/// Date format of the request's date fields
pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// Upper bound applied to the schedule delay ratio
pub const SDR_CAP: f64 = 10.0;

/// Derives model features from project records.
#[derive(Debug, Clone, Default)]
pub struct FeatureDeriver {
    zero_division: ZeroDivisionPolicy,
}

impl FeatureDeriver {
    pub fn new(zero_division: ZeroDivisionPolicy) -> Self {
        Self { zero_division }
    }

    /// Derive the feature row for `record` as of `now`.
    pub fn derive(&self, record: &ProjectRecord, now: NaiveDate) -> Result<FeatureRow, PredictError> {
        let sanctioned = parse_date("Sanctioned_Date", &record.sanctioned_date)?;
        let scheduled = parse_date("Scheduled_Completion_Date", &record.scheduled_completion_date)?;

        let planned_duration_days = (scheduled - sanctioned).num_days();
        let elapsed_days = (now - sanctioned).num_days();
        let delayed = now > scheduled && record.present_status != PresentStatus::Completed;

        let cost = record.approved_cost;
        let fur = self.ratio(record.uc_received, cost, columns::APPROVED_COST)?;
        let epr = self.ratio(record.total_financial_expenditure, cost, columns::APPROVED_COST)?;
        let uceg = self.ratio(
            (record.uc_received - record.total_financial_expenditure).abs(),
            cost,
            columns::APPROVED_COST,
        )?;
        let sdr = self
            .ratio(
                elapsed_days as f64,
                planned_duration_days as f64,
                columns::PLANNED_DURATION_DAYS,
            )?
            .min(SDR_CAP);

        let mut row = FeatureRow::new();

        row.insert(columns::STATE, record.state.as_str());
        row.insert(columns::SECTOR, record.sector.as_str());
        row.insert(columns::PRESENT_STATUS, record.present_status.as_str());
        row.insert(columns::APPROVED_COST, cost);
        row.insert(
            columns::TOTAL_FINANCIAL_EXPENDITURE,
            record.total_financial_expenditure,
        );
        row.insert(columns::UC_RECEIVED, record.uc_received);
        row.insert(columns::SANCTIONED_DATE, sanctioned);
        row.insert(columns::SCHEDULED_COMPLETION_DATE, scheduled);

        row.insert(columns::PLANNED_DURATION_DAYS, planned_duration_days as f64);
        row.insert(columns::ELAPSED_DAYS, elapsed_days as f64);
        row.insert(columns::DELAY_FLAG, if delayed { 1.0 } else { 0.0 });
        row.insert(columns::FUR, fur);
        row.insert(columns::EPR, epr);
        row.insert(columns::UCEG, uceg);
        row.insert(columns::SDR, sdr);

        Ok(row)
    }

    /// Names of the derived (engineered) columns, in derivation order.
    pub fn derived_columns() -> [&'static str; 7] {
        [
            columns::PLANNED_DURATION_DAYS,
            columns::ELAPSED_DAYS,
            columns::DELAY_FLAG,
            columns::FUR,
            columns::EPR,
            columns::UCEG,
            columns::SDR,
        ]
    }

    fn ratio(
        &self,
        numerator: f64,
        denominator: f64,
        denominator_name: &'static str,
    ) -> Result<f64, PredictError> {
        if denominator != 0.0 {
            return Ok(numerator / denominator);
        }

        match self.zero_division {
            ZeroDivisionPolicy::Reject => Err(PredictError::DivisionByZero(denominator_name)),
            ZeroDivisionPolicy::Zero => {
                warn!(denominator = denominator_name, "Zero denominator, substituting 0.0");
                Ok(0.0)
            }
        }
    }
}

/// Parse a DD-MM-YYYY date field. Surrounding whitespace is not accepted.
pub fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, PredictError> {
    let invalid = || PredictError::InvalidDateFormat {
        field,
        value: value.to_string(),
    };

    if value.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| invalid())
}
