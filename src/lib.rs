pub mod adapters;
pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod features;
pub mod inference;
pub mod ml;
pub mod services;
pub mod storage;

pub use config::AppConfig;
pub use error::{Hc50Error, Result, StorageFailure};
pub use features::{FeatureMatrix, FeatureNormalizer, NormalizationStatistics, StatisticsSource};
pub use inference::{InferenceContext, InferenceResult, Orchestrator};
pub use ml::{AutoEncoder, ModelDims, ModelMode, WeightsBlob};
pub use storage::BlobStore;
