//! Worker bootstrap: wires storage, normalization and the model from config.

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::adapters::{HttpBlobStore, LocalBlobStore, MemoryBlobStore};
use crate::config::{
    AppConfig, ModelConfig, NormalizationConfig, NormalizationMode, StorageBackend, StorageConfig,
};
use crate::error::{Hc50Error, Result};
use crate::features::{BatchStatistics, FeatureNormalizer, FixedStatistics};
use crate::inference::InferenceContext;
use crate::ml::AutoEncoder;
use crate::storage::BlobStore;

pub fn build_store(config: &StorageConfig) -> Result<Arc<dyn BlobStore>> {
    let store: Arc<dyn BlobStore> = match config.backend {
        StorageBackend::Local => Arc::new(LocalBlobStore::new(&config.root)),
        StorageBackend::Http => {
            let base_url = config.base_url.as_deref().ok_or_else(|| {
                Hc50Error::Validation("storage.base_url is required for the http backend".into())
            })?;
            Arc::new(HttpBlobStore::new(
                base_url,
                config.bucket.as_deref(),
                Duration::from_secs(config.timeout_secs),
            )?)
        }
        StorageBackend::Memory => {
            warn!("using in-memory storage; uploads are lost on restart");
            Arc::new(MemoryBlobStore::new())
        }
    };
    info!(backend = store.name(), "storage configured");
    Ok(store)
}

pub fn build_normalizer(config: &NormalizationConfig) -> Result<FeatureNormalizer> {
    let normalizer = match config.mode {
        NormalizationMode::Batch => FeatureNormalizer::new(Arc::new(BatchStatistics)),
        NormalizationMode::Fixed => {
            let path = config.statistics_path.as_ref().ok_or_else(|| {
                Hc50Error::Validation("normalization.statistics_path is required".into())
            })?;
            FeatureNormalizer::new(Arc::new(FixedStatistics::from_file(path)?))
        }
    };
    info!(source = normalizer.source_name(), "normalization configured");
    Ok(normalizer)
}

/// Load the weights once; any failure here is a `ModelLoad` error.
pub fn load_model(config: &ModelConfig) -> Result<Arc<AutoEncoder>> {
    AutoEncoder::from_file(&config.weights_path, config.dims(), config.drop_rate).map(Arc::new)
}

pub fn build_context(config: &AppConfig) -> Result<InferenceContext> {
    config
        .validate()
        .map_err(|errors| Hc50Error::Validation(errors.join("; ")))?;

    let store = build_store(&config.storage)?;
    let normalizer = build_normalizer(&config.normalization)?;
    let model = load_model(&config.model)?;
    Ok(InferenceContext::new(store, model, normalizer))
}
