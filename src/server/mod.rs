//! HTTP boundary (axum).
//!
//! ## Endpoints
//!
//! - `GET /` - bootstrap status: which targets loaded, which artifacts failed
//! - `POST /predict` - predictions for one record or an array of records
//!
//! Handlers are thin: they parse the body, hand it to the `Dispatcher` on the
//! blocking pool, and map the outcome to a status code and JSON body.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::dispatch::{Dispatcher, PredictError};
use crate::error::AppError;
use crate::report::StatusReport;

/// Largest accepted request body.
pub const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// State shared by all handlers. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    dispatcher: Dispatcher,
    status: Arc<StatusReport>,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher, status: StatusReport) -> Self {
        Self {
            dispatcher,
            status: Arc::new(status),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(status_handler))
        .route("/predict", post(predict_handler))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn status_handler(State(state): State<AppState>) -> (StatusCode, Json<StatusReport>) {
    let code = if state.status.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (code, Json(state.status.as_ref().clone()))
}

async fn predict_handler(State(state): State<AppState>, body: Bytes) -> Response {
    if let Err(e) = state.dispatcher.ensure_available() {
        error!(error = %e, "prediction requested with no models loaded");
        return e.into_response();
    }

    // Parse regardless of Content-Type; clients often omit it.
    let value: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "rejected malformed JSON body");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": format!("Invalid JSON body: {e}") })),
            )
                .into_response();
        }
    };

    let dispatcher = state.dispatcher.clone();
    match tokio::task::spawn_blocking(move || dispatcher.predict(&value)).await {
        Ok(Ok(predictions)) => (StatusCode::OK, Json(predictions)).into_response(),
        Ok(Err(e)) => {
            if e.is_client_error() {
                warn!(error = %e, "rejected prediction request");
            } else {
                error!(error = %e, "prediction request failed");
            }
            e.into_response()
        }
        Err(join_err) => {
            error!(error = %join_err, "prediction task panicked");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Prediction failed: internal error during inference" })),
            )
                .into_response()
        }
    }
}

impl IntoResponse for PredictError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        match self {
            PredictError::Unavailable {
                missing,
                download_errors,
            } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "No models loaded",
                    "missing": missing,
                    "download_errors": download_errors,
                })),
            )
                .into_response(),
            PredictError::MissingColumns(cols) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "Missing input columns",
                    "missing_columns": cols,
                })),
            )
                .into_response(),
            PredictError::InvalidPayload(_) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": message })),
            )
                .into_response(),
            PredictError::Inference(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": message })),
            )
                .into_response(),
        }
    }
}

/// Bind `addr` and serve until Ctrl-C.
///
/// Builds its own tokio runtime so the caller (and the blocking bootstrap
/// before it) can stay synchronous.
pub fn run(addr: SocketAddr, state: AppState) -> Result<(), AppError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::runtime(format!("Failed to start async runtime: {e}")))?;

    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| AppError::runtime(format!("Failed to bind {addr}: {e}")))?;
        info!(%addr, "listening");
        axum::serve(listener, router(state))
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| AppError::runtime(format!("Server error: {e}")))
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl-C; serving until killed");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::Utc;
    use tower::ServiceExt;

    use crate::data::sample_record;
    use crate::domain::{FeatureSchema, default_targets};
    use crate::math::FeatureTable;
    use crate::models::linear::LinearModel;
    use crate::models::{ModelError, Regressor};
    use crate::registry::{BootstrapReport, ModelRegistry};

    struct PanickingModel;

    impl Regressor for PanickingModel {
        fn kind(&self) -> &'static str {
            "panicking"
        }

        fn predict(&self, _table: &FeatureTable) -> Result<Vec<f64>, ModelError> {
            panic!("model exploded");
        }
    }

    fn linear(intercept: f64) -> Box<dyn Regressor> {
        Box::new(LinearModel::new(intercept, vec![0.0; 15], 15).unwrap())
    }

    fn healthy_state() -> AppState {
        let mut registry = ModelRegistry::new();
        let mut report = BootstrapReport::default();
        for (i, t) in default_targets().into_iter().enumerate() {
            registry = registry.with_model(t.name.clone(), linear(i as f64));
            report.loaded.push(t.name);
        }
        let status = StatusReport::new(&report, Utc::now());
        AppState::new(
            Dispatcher::new(registry, FeatureSchema::default(), report),
            status,
        )
    }

    fn empty_state() -> AppState {
        let report = BootstrapReport::default();
        let status = StatusReport::new(&report, Utc::now());
        AppState::new(
            Dispatcher::new(ModelRegistry::new(), FeatureSchema::default(), report),
            status,
        )
    }

    async fn call(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post(body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/predict")
            .header("content-type", "application/json")
            .body(body.into())
            .unwrap()
    }

    #[tokio::test]
    async fn full_record_returns_three_bare_numbers() {
        let app = router(healthy_state());
        let (status, body) = call(&app, post(sample_record().to_string())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["Fuel_flow_mf_kg/s"], json!(0.0));
        assert_eq!(body["GT_Turbine_decay_state_coefficient"], json!(1.0));
        assert_eq!(body["GT_Compressor_decay_state_coefficient"], json!(2.0));
    }

    #[tokio::test]
    async fn batch_returns_arrays() {
        let app = router(healthy_state());
        let batch = json!([sample_record(), sample_record()]);
        let (status, body) = call(&app, post(batch.to_string())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["Fuel_flow_mf_kg/s"], json!([0.0, 0.0]));
    }

    #[tokio::test]
    async fn partial_record_is_bad_request() {
        let app = router(healthy_state());
        let (status, body) = call(&app, post(r#"{"Lever_position": 3.144}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing input columns");
        let missing = body["missing_columns"].as_array().unwrap();
        assert_eq!(missing.len(), 14);
        assert_eq!(missing[0], "Ship_speed_v");
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request_even_without_content_type() {
        let app = router(healthy_state());
        let req = Request::builder()
            .method("POST")
            .uri("/predict")
            .body(Body::from("{oops"))
            .unwrap();
        let (status, body) = call(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid JSON body"));
    }

    #[tokio::test]
    async fn empty_registry_is_server_error_and_server_keeps_answering() {
        let app = router(empty_state());
        for _ in 0..2 {
            let (status, body) = call(&app, post(sample_record().to_string())).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body["error"], "No models loaded");
            assert!(body["missing"].is_array());
        }
    }

    #[tokio::test]
    async fn empty_registry_wins_over_malformed_json() {
        let app = router(empty_state());
        let (status, body) = call(&app, post("{oops")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "No models loaded");
    }

    #[tokio::test]
    async fn panicking_model_is_contained() {
        let registry = ModelRegistry::new().with_model("boom", Box::new(PanickingModel));
        let report = BootstrapReport::default();
        let status = StatusReport::new(&report, Utc::now());
        let app = router(AppState::new(
            Dispatcher::new(registry, FeatureSchema::default(), report),
            status,
        ));
        for _ in 0..2 {
            let (status, body) = call(&app, post(sample_record().to_string())).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert!(body["error"].as_str().unwrap().starts_with("Prediction failed"));
        }
    }

    #[tokio::test]
    async fn status_reflects_bootstrap_health() {
        let req = || Request::builder().uri("/").body(Body::empty()).unwrap();

        let (status, body) = call(&router(healthy_state()), req()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["models_loaded"].as_array().unwrap().len(), 3);

        let mut report = BootstrapReport::default();
        report.failures.push(crate::registry::LoadFailure {
            target: "t".into(),
            file: "t.json".into(),
            cause: crate::registry::FailureCause::Fetch(crate::data::FetchError::NotFound {
                location: "./t.json".into(),
            }),
        });
        let status_report = StatusReport::new(&report, Utc::now());
        let app = router(AppState::new(
            Dispatcher::new(ModelRegistry::new(), FeatureSchema::default(), report),
            status_report,
        ));
        let (status, body) = call(&app, req()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["missing_files"], json!(["t.json"]));
        assert_eq!(body["download_errors"], json!([]));
    }
}
