use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, warn};

use crate::api::{
    state::AppState,
    types::{ErrorResponse, PredictRequest},
};
use crate::error::{Hc50Error, Result};
use crate::inference::InferenceResult;

/// Error wrapper rendering the stable public message.
pub struct ApiError(pub Hc50Error);

impl From<Hc50Error> for ApiError {
    fn from(err: Hc50Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!("prediction failed: {}", self.0);
        } else {
            warn!("prediction rejected: {}", self.0);
        }
        let body = ErrorResponse {
            error: self.0.public_message().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Browsers may post the body as `text/plain` to skip preflight, so the
/// body is parsed as JSON regardless of content type.
fn parse_request(body: &[u8]) -> Result<PredictRequest> {
    let req: PredictRequest = serde_json::from_slice(body)
        .map_err(|e| Hc50Error::Validation(format!("invalid request body: {e}")))?;
    if req.file_name.trim().is_empty() {
        return Err(Hc50Error::Validation("fileName must not be empty".to_string()));
    }
    Ok(req)
}

/// POST /predict
pub async fn predict(
    State(state): State<AppState>,
    body: Bytes,
) -> std::result::Result<Json<InferenceResult>, ApiError> {
    state.metrics.inc_requests();

    let outcome = async {
        let req = parse_request(&body)?;
        state.orchestrator()?.predict(&req.file_name).await
    }
    .await;

    match outcome {
        Ok(result) => {
            state.metrics.record_success(result.len());
            Ok(Json(result))
        }
        Err(e) => {
            state.metrics.record_failure(&e);
            Err(ApiError(e))
        }
    }
}
