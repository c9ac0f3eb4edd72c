mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use common::{context, write_weights, SCENARIO_CSV};
use hc50::adapters::{start_api_server_background, MemoryBlobStore};
use hc50::api::{create_router, AppState};
use hc50::config::AppConfig;
use hc50::ml::ModelDims;
use hc50::services::build_context;
use hc50::storage::{BlobStore, CSV_CONTENT_TYPE};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

const DIMS: ModelDims = ModelDims {
    input: 5,
    hidden: 6,
    latent: 3,
};

const ORIGIN: &str = "https://lab.example.org";

async fn ready_app() -> (Router, Arc<MemoryBlobStore>) {
    let store = Arc::new(MemoryBlobStore::new());
    store
        .put_bytes("scenario.csv", SCENARIO_CSV.as_bytes().to_vec(), CSV_CONTENT_TYPE)
        .await
        .expect("seed upload");
    let app = create_router(AppState::ready(context(Arc::clone(&store), DIMS)));
    (app, store)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<&str>,
) -> (StatusCode, axum::http::HeaderMap, String) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::ORIGIN, ORIGIN);
    let request = match body {
        Some(payload) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .expect("failed to build json request"),
        None => builder.body(Body::empty()).expect("failed to build empty request"),
    };

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router request failed");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    (status, headers, String::from_utf8_lossy(&bytes).to_string())
}

fn allow_origin(headers: &axum::http::HeaderMap) -> Option<&str> {
    headers
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .and_then(|v| v.to_str().ok())
}

#[tokio::test]
async fn predict_returns_ordered_json_array() {
    let (app, _store) = ready_app().await;

    let (status, headers, body) = send(
        &app,
        Method::POST,
        "/predict",
        Some(r#"{"fileName": "scenario.csv"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(allow_origin(&headers), Some("*"));

    let predictions: Vec<f64> = serde_json::from_str(&body).expect("body is a JSON array");
    assert_eq!(predictions.len(), 3);

    // Matches the in-process pipeline exactly.
    let orchestrator = hc50::Orchestrator::new(context(Arc::new(MemoryBlobStore::new()), DIMS));
    let direct = orchestrator.predict_bytes(SCENARIO_CSV.as_bytes()).unwrap();
    assert_eq!(predictions, direct.predictions);
}

#[tokio::test]
async fn root_route_accepts_text_plain_bodies() {
    let (app, _store) = ready_app().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from(r#"{"fileName":"scenario.csv"}"#))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value.as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn preflight_allows_any_origin() {
    let (app, _store) = ready_app().await;
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/predict")
        .header(header::ORIGIN, ORIGIN)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert!(response.status().is_success());
    assert_eq!(allow_origin(response.headers()), Some("*"));
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));
}

#[tokio::test]
async fn missing_upload_is_not_found() {
    let (app, _store) = ready_app().await;
    let (status, headers, body) = send(
        &app,
        Method::POST,
        "/predict",
        Some(r#"{"fileName": "does-not-exist.csv"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(allow_origin(&headers), Some("*"));
    let value: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["error"], "uploaded file not found");
}

#[tokio::test]
async fn path_traversal_key_is_rejected() {
    let (app, _store) = ready_app().await;
    let (status, _, body) = send(
        &app,
        Method::POST,
        "/predict",
        Some(r#"{"fileName": "../config/default.toml"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
}

#[tokio::test]
async fn malformed_upload_hides_parser_details() {
    let (app, store) = ready_app().await;
    store
        .put_bytes(
            "broken.csv",
            b"CAS,HC50,SpMax_L,b,c,d,e\nx,1,oops,1,1,1,1\n".to_vec(),
            CSV_CONTENT_TYPE,
        )
        .await
        .unwrap();

    let (status, _, body) = send(
        &app,
        Method::POST,
        "/predict",
        Some(r#"{"fileName": "broken.csv"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!body.contains("SpMax_L"), "{body}");
    assert!(!body.contains("oops"), "{body}");
    let value: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["error"], "input file is not a valid descriptor table");
}

#[tokio::test]
async fn invalid_request_body_is_bad_request() {
    let (app, _store) = ready_app().await;
    for body in ["{}", "not json", r#"{"fileName": ""}"#] {
        let (status, _, _) = send(&app, Method::POST, "/predict", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body:?}");
    }
}

#[tokio::test]
async fn worker_with_bad_weights_is_not_ready() {
    let dir = tempfile::tempdir().unwrap();
    let weights = write_weights(dir.path(), DIMS);
    // Configured for the full-width model; the blob has a 5-wide l1.
    let config = AppConfig::default_config(&weights);
    let app = create_router(AppState::from_bootstrap(build_context(&config)));

    let (status, _, _) = send(&app, Method::GET, "/readyz", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, _, _) = send(&app, Method::GET, "/healthz", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, body) = send(
        &app,
        Method::POST,
        "/predict",
        Some(r#"{"fileName": "scenario.csv"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let value: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["error"], "model is not available");
}

#[tokio::test]
async fn ready_worker_reports_health() {
    let (app, _store) = ready_app().await;

    let (status, _, _) = send(&app, Method::GET, "/readyz", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    let value: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["status"], "healthy");
}

#[tokio::test]
async fn metrics_count_outcomes() {
    let (app, _store) = ready_app().await;

    send(&app, Method::POST, "/predict", Some(r#"{"fileName": "scenario.csv"}"#)).await;
    send(&app, Method::POST, "/predict", Some(r#"{"fileName": "gone.csv"}"#)).await;
    send(&app, Method::POST, "/predict", Some("nope")).await;

    let (status, _, body) = send(&app, Method::GET, "/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("hc50_requests_total 3"), "{body}");
    assert!(body.contains("hc50_requests_succeeded_total 1"), "{body}");
    assert!(body.contains("hc50_rows_predicted_total 3"), "{body}");
    assert!(body.contains(r#"hc50_request_failures_total{class="storage"} 1"#), "{body}");
    assert!(
        body.contains(r#"hc50_request_failures_total{class="malformed_input"} 1"#),
        "{body}"
    );
}

#[tokio::test]
async fn serves_over_real_http() {
    let store = Arc::new(MemoryBlobStore::new());
    store
        .put_bytes("scenario.csv", SCENARIO_CSV.as_bytes().to_vec(), CSV_CONTENT_TYPE)
        .await
        .unwrap();
    let state = AppState::ready(context(Arc::clone(&store), DIMS));
    let (addr, handle) = start_api_server_background(state, "127.0.0.1:0".parse().unwrap())
        .await
        .expect("server should bind");

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/"))
        .header("Origin", ORIGIN)
        .json(&serde_json::json!({ "fileName": "scenario.csv" }))
        .send()
        .await
        .expect("request should reach the server");

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
    let predictions: Vec<f64> = response.json().await.unwrap();
    assert_eq!(predictions.len(), 3);

    handle.abort();
}
