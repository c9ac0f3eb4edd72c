//! Liveness, readiness and metrics endpoints.
//!
//! Readiness tracks the model: a worker whose weights failed to load stays
//! alive (so the failure is observable) but never reports ready.

use crate::services::Metrics;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Health status for a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Outcome of loading the model at bootstrap; fixed for the worker's lifetime
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelStatus {
    Ready,
    Failed(String),
}

/// Component health check result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Overall system health response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub components: Vec<ComponentHealth>,
}

/// Shared state for health endpoints
pub struct HealthState {
    /// When the worker started
    pub started_at: DateTime<Utc>,
    /// Model load outcome
    model: ModelStatus,
    /// Storage backend name, if one is configured
    storage_backend: Option<&'static str>,
    /// Request counters
    pub metrics: Arc<Metrics>,
}

impl HealthState {
    pub fn new(metrics: Arc<Metrics>, model: ModelStatus) -> Self {
        Self {
            started_at: Utc::now(),
            model,
            storage_backend: None,
            metrics,
        }
    }

    pub fn with_storage_backend(mut self, name: &'static str) -> Self {
        self.storage_backend = Some(name);
        self
    }

    pub fn is_ready(&self) -> bool {
        self.model == ModelStatus::Ready
    }

    /// Get overall health status
    pub fn get_health(&self) -> HealthResponse {
        let mut components = Vec::new();

        let model_health = match &self.model {
            ModelStatus::Ready => ComponentHealth {
                name: "model".to_string(),
                status: HealthStatus::Healthy,
                message: None,
            },
            ModelStatus::Failed(reason) => ComponentHealth {
                name: "model".to_string(),
                status: HealthStatus::Unhealthy,
                message: Some(reason.clone()),
            },
        };
        let overall_status = model_health.status;
        components.push(model_health);

        components.push(ComponentHealth {
            name: "storage".to_string(),
            status: if self.storage_backend.is_some() {
                HealthStatus::Healthy
            } else {
                HealthStatus::Unhealthy
            },
            message: Some(self.storage_backend.unwrap_or("unconfigured").to_string()),
        });

        HealthResponse {
            status: overall_status,
            timestamp: Utc::now(),
            uptime_seconds: self.uptime_seconds(),
            components,
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        (Utc::now() - self.started_at).num_seconds().max(0) as u64
    }
}

/// Full health check endpoint
pub async fn health_handler(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    let health = state.get_health();
    let status_code = match health.status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status_code, Json(health))
}

/// Liveness probe - is the process alive?
pub async fn liveness_handler() -> impl IntoResponse {
    StatusCode::OK
}

/// Readiness probe - can the worker serve predictions?
pub async fn readiness_handler(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    if state.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// Prometheus metrics endpoint
pub async fn metrics_handler(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    let ready = if state.is_ready() { 1 } else { 0 };
    let body = format!(
        r#"# HELP hc50_up Model readiness (1=ready, 0=not ready)
# TYPE hc50_up gauge
hc50_up {}

# HELP hc50_uptime_seconds Uptime in seconds
# TYPE hc50_uptime_seconds counter
hc50_uptime_seconds {}

{}"#,
        ready,
        state.uptime_seconds(),
        state.metrics.prometheus(),
    );

    (
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; charset=utf-8",
        )],
        body,
    )
}
