//! Type definitions for the DPR risk classifier

pub mod features;
pub mod prediction;
pub mod project;

pub use features::{FeatureRow, FeatureValue};
pub use prediction::{BatchItem, ErrorResponse, PredictionResponse, RiskLabel};
pub use project::{PresentStatus, ProjectRecord, ProjectRequest};
