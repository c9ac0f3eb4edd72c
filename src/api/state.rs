use axum::extract::FromRef;
use std::sync::Arc;
use tracing::error;

use crate::error::{Hc50Error, Result};
use crate::inference::{InferenceContext, Orchestrator};
use crate::services::{HealthState, Metrics, ModelStatus};

/// Shared application state for API handlers
#[derive(Clone)]
pub struct AppState {
    /// Prediction pipeline; `None` when the model failed to load
    pub orchestrator: Option<Orchestrator>,

    /// Health and readiness state
    pub health: Arc<HealthState>,

    /// Request counters (shared with `health`)
    pub metrics: Arc<Metrics>,
}

impl AppState {
    /// State for a worker whose model loaded.
    pub fn ready(ctx: InferenceContext) -> Self {
        let metrics = Arc::new(Metrics::new());
        let health = HealthState::new(Arc::clone(&metrics), ModelStatus::Ready)
            .with_storage_backend(ctx.store.name());
        Self {
            orchestrator: Some(Orchestrator::new(ctx)),
            health: Arc::new(health),
            metrics,
        }
    }

    /// State for a worker that cannot serve predictions.
    pub fn not_ready(reason: impl Into<String>) -> Self {
        let metrics = Arc::new(Metrics::new());
        let health = HealthState::new(Arc::clone(&metrics), ModelStatus::Failed(reason.into()));
        Self {
            orchestrator: None,
            health: Arc::new(health),
            metrics,
        }
    }

    /// Build from the outcome of a bootstrap attempt.
    pub fn from_bootstrap(result: Result<InferenceContext>) -> Self {
        match result {
            Ok(ctx) => Self::ready(ctx),
            Err(e) => {
                error!("worker not ready: {}", e);
                Self::not_ready(e.to_string())
            }
        }
    }

    pub fn orchestrator(&self) -> Result<&Orchestrator> {
        self.orchestrator
            .as_ref()
            .ok_or_else(|| Hc50Error::ModelNotReady("model failed to load".to_string()))
    }
}

impl FromRef<AppState> for Arc<HealthState> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.health)
    }
}
