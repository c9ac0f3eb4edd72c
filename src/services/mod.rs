pub mod bootstrap;
pub mod health;
pub mod metrics;

pub use bootstrap::{build_context, build_normalizer, build_store, load_model};
pub use health::{ComponentHealth, HealthResponse, HealthState, HealthStatus, ModelStatus};
pub use metrics::Metrics;
