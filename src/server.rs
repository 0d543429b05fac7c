//! HTTP interface: routes, handlers and error mapping

use crate::error::PredictError;
use crate::metrics::{MetricsSnapshot, PredictionMetrics};
use crate::pipeline::Predictor;
use crate::types::prediction::{BatchItem, ErrorResponse, PredictionResponse};
use crate::types::project::ProjectRequest;
use axum::extract::{Json, State};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub predictor: Predictor,
    pub metrics: Arc<PredictionMetrics>,
    pub max_batch_size: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_columns: usize,
}

/// Error returned by a handler
#[derive(Debug)]
pub enum ApiError {
    Predict(PredictError),
    BatchTooLarge { size: usize, limit: usize },
    Internal(String),
}

impl From<PredictError> for ApiError {
    fn from(err: PredictError) -> Self {
        ApiError::Predict(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Predict(e) if e.is_client_error() => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Predict(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BatchTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorResponse {
        match self {
            ApiError::Predict(e) => error_body(e),
            ApiError::BatchTooLarge { size, limit } => ErrorResponse {
                error: format!("batch of {size} records exceeds the limit of {limit}"),
                kind: "batch_too_large".to_string(),
            },
            ApiError::Internal(message) => ErrorResponse {
                error: message.clone(),
                kind: "internal".to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

fn error_body(err: &PredictError) -> ErrorResponse {
    ErrorResponse {
        error: err.to_string(),
        kind: err.kind().to_string(),
    }
}

/// Build the application router
pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/predict", post(predict))
        .route("/predict/batch", post(predict_batch))
        .route("/metrics", get(metrics))
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(parsed))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "DPR risk classifier API running!".to_string(),
    })
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        model_columns: state.predictor.expected_columns().len(),
    })
}

pub async fn metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

pub async fn predict(
    State(state): State<AppState>,
    Json(request): Json<ProjectRequest>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let request_id = Uuid::new_v4();
    let start_time = Instant::now();
    let predictor = state.predictor.clone();
    let now = today();

    let result = tokio::task::spawn_blocking(move || predictor.predict(request, now))
        .await
        .map_err(|e| {
            error!(request_id = %request_id, error = %e, "Prediction task failed");
            ApiError::Internal("prediction task failed".to_string())
        })?;

    let processing_time = start_time.elapsed();
    match result {
        Ok(label) => {
            state.metrics.record_prediction(processing_time, label);
            info!(
                request_id = %request_id,
                prediction = %label,
                processing_time_us = processing_time.as_micros(),
                "Prediction served"
            );
            Ok(Json(PredictionResponse { prediction: label }))
        }
        Err(e) => {
            state.metrics.record_error(processing_time, e.kind());
            log_failure(&request_id, &e);
            Err(e.into())
        }
    }
}

pub async fn predict_batch(
    State(state): State<AppState>,
    Json(requests): Json<Vec<ProjectRequest>>,
) -> Result<Json<Vec<BatchItem>>, ApiError> {
    if requests.len() > state.max_batch_size {
        return Err(ApiError::BatchTooLarge {
            size: requests.len(),
            limit: state.max_batch_size,
        });
    }

    let request_id = Uuid::new_v4();
    let start_time = Instant::now();
    let size = requests.len();
    let predictor = state.predictor.clone();
    let now = today();

    let results = tokio::task::spawn_blocking(move || predictor.predict_batch(requests, now))
        .await
        .map_err(|e| {
            error!(request_id = %request_id, error = %e, "Batch prediction task failed");
            ApiError::Internal("prediction task failed".to_string())
        })?;

    // Per-record latency is the batch time spread evenly
    let per_item = start_time.elapsed() / size.max(1) as u32;
    let items: Vec<BatchItem> = results
        .into_iter()
        .map(|result| match result {
            Ok(label) => {
                state.metrics.record_prediction(per_item, label);
                BatchItem::Prediction(PredictionResponse { prediction: label })
            }
            Err(e) => {
                state.metrics.record_error(per_item, e.kind());
                log_failure(&request_id, &e);
                BatchItem::Error(error_body(&e))
            }
        })
        .collect();

    info!(
        request_id = %request_id,
        size = size,
        failed = items.iter().filter(|i| matches!(i, BatchItem::Error(_))).count(),
        processing_time_us = start_time.elapsed().as_micros(),
        "Batch prediction served"
    );

    Ok(Json(items))
}

fn log_failure(request_id: &Uuid, err: &PredictError) {
    if err.is_client_error() {
        debug!(request_id = %request_id, kind = err.kind(), error = %err, "Rejected prediction request");
    } else {
        error!(request_id = %request_id, error = %err, "Model invocation failed");
    }
}
