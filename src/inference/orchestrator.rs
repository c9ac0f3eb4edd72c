//! Request pipeline: fetch → normalize → evaluate → assemble.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, Instrument};
use uuid::Uuid;

use crate::error::{Hc50Error, Result};
use crate::features::{FeatureNormalizer, NormalizedBatch};
use crate::ml::AutoEncoder;
use crate::storage::BlobStore;

/// Process-wide collaborators, built once at startup and shared by every request.
#[derive(Clone)]
pub struct InferenceContext {
    pub store: Arc<dyn BlobStore>,
    pub model: Arc<AutoEncoder>,
    pub normalizer: FeatureNormalizer,
}

impl InferenceContext {
    pub fn new(
        store: Arc<dyn BlobStore>,
        model: Arc<AutoEncoder>,
        normalizer: FeatureNormalizer,
    ) -> Self {
        Self {
            store,
            model,
            normalizer,
        }
    }
}

/// One prediction per input row, in input row order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InferenceResult {
    pub predictions: Vec<f64>,
}

impl InferenceResult {
    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }
}

#[derive(Clone)]
pub struct Orchestrator {
    ctx: InferenceContext,
}

impl Orchestrator {
    pub fn new(ctx: InferenceContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &InferenceContext {
        &self.ctx
    }

    /// Predict every row of the table stored under `file_key`.
    ///
    /// Storage failures are not retried here.
    pub async fn predict(&self, file_key: &str) -> Result<InferenceResult> {
        let span = tracing::info_span!(
            "predict",
            request_id = %Uuid::new_v4(),
            key = file_key,
            store = self.ctx.store.name()
        );

        async {
            let raw = self.ctx.store.fetch_bytes(file_key).await?;
            debug!(bytes = raw.len(), "fetched upload");

            // Normalization and the forward pass are CPU-bound; keep them off the runtime.
            let this = self.clone();
            let span = tracing::Span::current();
            let result = tokio::task::spawn_blocking(move || {
                span.in_scope(|| this.predict_bytes(&raw))
            })
            .await
            .map_err(|e| Hc50Error::Internal(format!("prediction task failed: {e}")))??;

            info!(rows = result.len(), "prediction complete");
            Ok::<_, Hc50Error>(result)
        }
        .instrument(span)
        .await
    }

    /// Run the pipeline over raw CSV bytes.
    pub fn predict_bytes(&self, raw: &[u8]) -> Result<InferenceResult> {
        self.run(raw).map(|(_, result)| result)
    }

    /// Like [`predict_bytes`](Self::predict_bytes), also returning the normalized batch.
    pub fn run(&self, raw: &[u8]) -> Result<(NormalizedBatch, InferenceResult)> {
        let batch = self.ctx.normalizer.normalize(raw)?;
        let predictions = self.ctx.model.predict_batch(&batch.matrix)?;
        Ok((batch, InferenceResult { predictions }))
    }
}
