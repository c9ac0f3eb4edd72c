use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Hc50Error, StorageFailure};

/// Request counters for observability
#[derive(Debug, Default)]
pub struct Metrics {
    /// Prediction requests received
    pub requests: AtomicU64,
    /// Requests that returned predictions
    pub requests_succeeded: AtomicU64,
    /// Rows predicted across all requests
    pub rows_predicted: AtomicU64,
    /// Failures reading the upload
    pub storage_failures: AtomicU64,
    /// Rejected uploads (bad CSV, width mismatch, bad request body)
    pub malformed_inputs: AtomicU64,
    /// Requests refused because the model is not loaded
    pub not_ready: AtomicU64,
    /// Any other failure
    pub internal_failures: AtomicU64,
}

impl Metrics {
    /// Create a new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_requests(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self, rows: usize) {
        self.requests_succeeded.fetch_add(1, Ordering::Relaxed);
        self.rows_predicted.fetch_add(rows as u64, Ordering::Relaxed);
    }

    pub fn record_failure(&self, err: &Hc50Error) {
        let counter = match err {
            Hc50Error::StorageFetch {
                kind: StorageFailure::InvalidKey,
                ..
            } => &self.malformed_inputs,
            Hc50Error::StorageFetch { .. } => &self.storage_failures,
            Hc50Error::MalformedInput(_) | Hc50Error::Validation(_) | Hc50Error::Json(_) => {
                &self.malformed_inputs
            }
            Hc50Error::ModelLoad(_) | Hc50Error::ModelNotReady(_) => &self.not_ready,
            _ => &self.internal_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Export counters in Prometheus format
    pub fn prometheus(&self) -> String {
        format!(
            r#"# HELP hc50_requests_total Prediction requests received
# TYPE hc50_requests_total counter
hc50_requests_total {}

# HELP hc50_requests_succeeded_total Prediction requests answered with predictions
# TYPE hc50_requests_succeeded_total counter
hc50_requests_succeeded_total {}

# HELP hc50_rows_predicted_total Descriptor rows predicted
# TYPE hc50_rows_predicted_total counter
hc50_rows_predicted_total {}

# HELP hc50_request_failures_total Failed prediction requests by class
# TYPE hc50_request_failures_total counter
hc50_request_failures_total{{class="storage"}} {}
hc50_request_failures_total{{class="malformed_input"}} {}
hc50_request_failures_total{{class="not_ready"}} {}
hc50_request_failures_total{{class="internal"}} {}
"#,
            self.requests.load(Ordering::Relaxed),
            self.requests_succeeded.load(Ordering::Relaxed),
            self.rows_predicted.load(Ordering::Relaxed),
            self.storage_failures.load(Ordering::Relaxed),
            self.malformed_inputs.load(Ordering::Relaxed),
            self.not_ready.load(Ordering::Relaxed),
            self.internal_failures.load(Ordering::Relaxed),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_are_classified() {
        let m = Metrics::new();
        m.record_failure(&Hc50Error::MalformedInput("x".into()));
        m.record_failure(&Hc50Error::storage_fetch("k", StorageFailure::NotFound, "gone"));
        m.record_failure(&Hc50Error::storage_fetch("../k", StorageFailure::InvalidKey, "bad"));
        m.record_failure(&Hc50Error::Internal("boom".into()));

        assert_eq!(m.malformed_inputs.load(Ordering::Relaxed), 2);
        assert_eq!(m.storage_failures.load(Ordering::Relaxed), 1);
        assert_eq!(m.internal_failures.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn prometheus_output() {
        let m = Metrics::new();
        m.inc_requests();
        m.record_success(42);
        let text = m.prometheus();
        assert!(text.contains("hc50_requests_total 1"));
        assert!(text.contains("hc50_rows_predicted_total 42"));
        assert!(text.contains(r#"hc50_request_failures_total{class="storage"} 0"#));
    }
}
