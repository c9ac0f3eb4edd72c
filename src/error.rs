use thiserror::Error;

/// Why a storage read failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageFailure {
    /// No object is stored under the key.
    NotFound,
    /// The key itself is unusable (empty, absolute, path traversal).
    InvalidKey,
    /// Transport or filesystem failure.
    Io,
}

/// Main error type for the prediction service
#[derive(Error, Debug)]
pub enum Hc50Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Network errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Storage errors
    #[error("Storage fetch failed for key {key}: {reason}")]
    StorageFetch {
        key: String,
        kind: StorageFailure,
        reason: String,
    },

    #[error("Storage write failed for key {key}: {reason}")]
    StorageWrite { key: String, reason: String },

    // Input errors
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    // Model errors
    #[error("Model load error: {0}")]
    ModelLoad(String),

    #[error("Model not ready: {0}")]
    ModelNotReady(String),

    // Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for Hc50Error
pub type Result<T> = std::result::Result<T, Hc50Error>;

impl Hc50Error {
    pub fn storage_fetch(key: &str, kind: StorageFailure, reason: impl Into<String>) -> Self {
        Self::StorageFetch {
            key: key.to_string(),
            kind,
            reason: reason.into(),
        }
    }

    /// Stable message shown to HTTP callers.
    ///
    /// Never includes column names, file paths or upstream error text.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::StorageFetch {
                kind: StorageFailure::NotFound,
                ..
            } => "uploaded file not found",
            Self::StorageFetch {
                kind: StorageFailure::InvalidKey,
                ..
            } => "invalid file name",
            Self::StorageFetch { .. } => "uploaded file could not be read",
            Self::MalformedInput(_) => "input file is not a valid descriptor table",
            Self::Validation(_) | Self::Json(_) => "invalid request",
            Self::ModelLoad(_) | Self::ModelNotReady(_) => "model is not available",
            _ => "internal error",
        }
    }

    /// HTTP status code for this error at the invocation boundary.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::StorageFetch {
                kind: StorageFailure::NotFound,
                ..
            } => 404,
            Self::StorageFetch {
                kind: StorageFailure::InvalidKey,
                ..
            } => 400,
            Self::StorageFetch { .. } => 502,
            Self::MalformedInput(_) | Self::Validation(_) | Self::Json(_) => 400,
            Self::ModelLoad(_) | Self::ModelNotReady(_) => 503,
            _ => 500,
        }
    }
}

impl From<csv::Error> for Hc50Error {
    fn from(err: csv::Error) -> Self {
        Hc50Error::MalformedInput(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_messages_hide_details() {
        let err = Hc50Error::MalformedInput("column `SpMax_L` is not numeric".to_string());
        assert_eq!(err.status_code(), 400);
        assert!(!err.public_message().contains("SpMax_L"));
    }

    #[test]
    fn storage_failures_map_to_distinct_statuses() {
        let missing = Hc50Error::storage_fetch("a.csv", StorageFailure::NotFound, "no such key");
        let io = Hc50Error::storage_fetch("a.csv", StorageFailure::Io, "connection reset");
        assert_eq!(missing.status_code(), 404);
        assert_eq!(io.status_code(), 502);
        assert_ne!(missing.public_message(), io.public_message());
    }
}
