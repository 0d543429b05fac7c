//! Request-to-prediction pipeline

use crate::config::ZeroDivisionPolicy;
use crate::error::PredictError;
use crate::feature_deriver::FeatureDeriver;
use crate::models::inference::{infer, RiskModel};
use crate::schema::reconcile;
use crate::types::prediction::RiskLabel;
use crate::types::project::{ProjectRecord, ProjectRequest};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::debug;

/// Runs validation, feature derivation, schema reconciliation and inference
/// for one request at a time against a shared model.
#[derive(Clone)]
pub struct Predictor {
    model: Arc<dyn RiskModel>,
    deriver: FeatureDeriver,
    expected_columns: Arc<Vec<String>>,
}

impl Predictor {
    pub fn new(model: Arc<dyn RiskModel>, zero_division: ZeroDivisionPolicy) -> Self {
        let expected_columns = Arc::new(model.schema().expected_columns());
        Self {
            model,
            deriver: FeatureDeriver::new(zero_division),
            expected_columns,
        }
    }

    pub fn expected_columns(&self) -> &[String] {
        &self.expected_columns
    }

    /// Classify one project as of `now`.
    pub fn predict(&self, request: ProjectRequest, now: NaiveDate) -> Result<RiskLabel, PredictError> {
        let record = ProjectRecord::try_from(request)?;
        let row = self.deriver.derive(&record, now)?;
        let row = reconcile(row, &self.expected_columns);

        debug!(
            state = %record.state,
            status = %record.present_status,
            columns = row.len(),
            "Feature row ready"
        );

        infer(&row, self.model.as_ref())
    }

    /// Classify each project independently; one result per request.
    pub fn predict_batch(
        &self,
        requests: Vec<ProjectRequest>,
        now: NaiveDate,
    ) -> Vec<Result<RiskLabel, PredictError>> {
        requests.into_iter().map(|r| self.predict(r, now)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::schema::ModelSchema;
    use crate::types::features::{columns, FeatureRow};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Records the rows it is given and scores by delay flag and EPR
    struct RecordingModel {
        schema: ModelSchema,
        rows: Mutex<Vec<FeatureRow>>,
        calls: AtomicUsize,
    }

    impl RecordingModel {
        fn new() -> Self {
            Self {
                schema: ModelSchema::new(
                    vec![
                        columns::APPROVED_COST.to_string(),
                        columns::FUR.to_string(),
                        columns::EPR.to_string(),
                        columns::UCEG.to_string(),
                        columns::SDR.to_string(),
                        columns::DELAY_FLAG.to_string(),
                        "Revised_Cost".to_string(),
                    ],
                    vec![
                        columns::STATE.to_string(),
                        columns::SECTOR.to_string(),
                        columns::PRESENT_STATUS.to_string(),
                        "Implementing_Agency".to_string(),
                    ],
                ),
                rows: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl RiskModel for RecordingModel {
        fn schema(&self) -> &ModelSchema {
            &self.schema
        }

        fn predict(&self, row: &FeatureRow) -> Result<i64, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.rows.lock().unwrap().push(row.clone());

            let delayed = row.number(columns::DELAY_FLAG).unwrap_or(0.0) > 0.0;
            let epr = row.number(columns::EPR).unwrap_or(0.0);
            Ok(match (delayed, epr < 0.5) {
                (false, _) => 0,
                (true, false) => 1,
                (true, true) => 2,
            })
        }
    }

    fn now() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 1).unwrap()
    }

    #[test]
    fn test_sample_project_end_to_end() {
        let model = Arc::new(RecordingModel::new());
        let predictor = Predictor::new(model.clone(), ZeroDivisionPolicy::Reject);

        let label = predictor.predict(ProjectRequest::sample(), now()).unwrap();
        assert_eq!(label, RiskLabel::Low);

        let rows = model.rows.lock().unwrap();
        let row = &rows[0];
        assert_eq!(row.number(columns::PLANNED_DURATION_DAYS), Some(1036.0));
        assert_eq!(row.number(columns::DELAY_FLAG), Some(0.0));
        assert!((row.number(columns::FUR).unwrap() - 0.9746).abs() < 1e-4);
        assert!((row.number(columns::EPR).unwrap() - 0.9746).abs() < 1e-4);
        assert!(row.number(columns::UCEG).unwrap().abs() < 1e-12);

        // Columns the derivation does not produce are zero-filled
        assert_eq!(row.number("Revised_Cost"), Some(0.0));
        assert_eq!(row.number("Implementing_Agency"), Some(0.0));
        for column in predictor.expected_columns() {
            assert!(row.contains(column), "{column}");
        }
    }

    #[test]
    fn test_delayed_projects_score_higher() {
        let predictor = Predictor::new(Arc::new(RecordingModel::new()), ZeroDivisionPolicy::Reject);

        let mut ongoing = ProjectRequest::sample();
        ongoing.present_status = "Ongoing".to_string();
        assert_eq!(predictor.predict(ongoing.clone(), now()).unwrap(), RiskLabel::Medium);

        ongoing.total_financial_expenditure = 5.0;
        assert_eq!(predictor.predict(ongoing, now()).unwrap(), RiskLabel::High);
    }

    #[test]
    fn test_unrecognized_status_stops_before_model() {
        let model = Arc::new(RecordingModel::new());
        let predictor = Predictor::new(model.clone(), ZeroDivisionPolicy::Reject);

        let mut request = ProjectRequest::sample();
        request.present_status = "On Hold".to_string();

        let err = predictor.predict(request, now()).unwrap_err();
        assert!(matches!(err, PredictError::UnrecognizedStatus(_)));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_bad_date_stops_before_model() {
        let model = Arc::new(RecordingModel::new());
        let predictor = Predictor::new(model.clone(), ZeroDivisionPolicy::Reject);

        let mut request = ProjectRequest::sample();
        request.sanctioned_date = "2020-03-24".to_string();

        let err = predictor.predict(request, now()).unwrap_err();
        assert!(matches!(err, PredictError::InvalidDateFormat { .. }));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_zero_cost_policy() {
        let mut request = ProjectRequest::sample();
        request.approved_cost = 0.0;

        let strict = Predictor::new(Arc::new(RecordingModel::new()), ZeroDivisionPolicy::Reject);
        assert!(matches!(
            strict.predict(request.clone(), now()),
            Err(PredictError::DivisionByZero(_))
        ));

        let lenient = Predictor::new(Arc::new(RecordingModel::new()), ZeroDivisionPolicy::Zero);
        assert!(lenient.predict(request, now()).is_ok());
    }

    #[test]
    fn test_batch_results_are_independent() {
        let model = Arc::new(RecordingModel::new());
        let predictor = Predictor::new(model.clone(), ZeroDivisionPolicy::Reject);

        let mut bad = ProjectRequest::sample();
        bad.scheduled_completion_date = "24/01/2023".to_string();

        let results = predictor.predict_batch(
            vec![ProjectRequest::sample(), bad, ProjectRequest::sample()],
            now(),
        );

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(PredictError::InvalidDateFormat { .. })));
        assert!(results[2].is_ok());
        assert_eq!(model.calls.load(Ordering::SeqCst), 2);
    }
}
