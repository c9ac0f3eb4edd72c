//! Inference orchestration.

pub mod evaluation;
pub mod orchestrator;

pub use evaluation::RegressionReport;
pub use orchestrator::{InferenceContext, InferenceResult, Orchestrator};
