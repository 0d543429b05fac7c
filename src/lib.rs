//! DPR Risk Classifier Library
//!
//! Classifies the risk level of Delayed Project Reports (DPR) as Low, Medium
//! or High from project metadata and financial progress, using a model
//! exported from the training pipeline.

pub mod config;
pub mod error;
pub mod feature_deriver;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod schema;
pub mod server;
pub mod types;

pub use config::AppConfig;
pub use error::{ModelError, PredictError};
pub use feature_deriver::FeatureDeriver;
pub use models::inference::{infer, OnnxRiskModel, RiskModel};
pub use pipeline::Predictor;
pub use schema::{reconcile, ModelSchema};
pub use types::{FeatureRow, ProjectRecord, ProjectRequest, RiskLabel};
