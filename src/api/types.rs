use serde::{Deserialize, Serialize};

// ============================================================================
// Prediction Types
// ============================================================================

/// Body of a prediction request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    /// Storage key of the uploaded CSV
    #[serde(rename = "fileName")]
    pub file_name: String,
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
