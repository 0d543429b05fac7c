//! Model loading and inference

pub mod inference;
pub mod loader;

pub use inference::{infer, OnnxRiskModel, RiskModel};
pub use loader::{LoadedModel, ModelLoader};
