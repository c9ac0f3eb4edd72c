use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::api::{handlers, state::AppState};
use crate::services::health;

pub fn create_router(state: AppState) -> Router {
    // Callers are browser clients on other origins
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Prediction endpoints
        .route("/", post(handlers::predict))
        .route("/predict", post(handlers::predict))
        // Health endpoints
        .route("/health", get(health::health_handler))
        .route("/healthz", get(health::liveness_handler))
        .route("/readyz", get(health::readiness_handler))
        .route("/metrics", get(health::metrics_handler))
        // Add state and CORS
        .with_state(state)
        .layer(cors)
}
