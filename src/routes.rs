use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::{
    engine::AdmissionEngine,
    error::AppError,
    types::{OptionsResponse, PredictionRequest, PredictionResponse},
};

pub type AppState = Arc<AdmissionEngine>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/options", get(options))
        .route("/metrics", get(metrics))
        .route("/health", get(health_check))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn predict(
    State(engine): State<AppState>,
    payload: Result<Json<PredictionRequest>, JsonRejection>,
) -> Result<Json<PredictionResponse>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::InvalidInput(e.body_text()))?;
    info!("Received prediction request");

    let response = engine.predict(request)?;
    Ok(Json(response))
}

pub async fn options(State(engine): State<AppState>) -> Json<OptionsResponse> {
    Json(engine.options())
}

pub async fn metrics(State(engine): State<AppState>) -> String {
    engine.metrics().format()
}

pub async fn health_check(State(engine): State<AppState>) -> Json<Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "service": "admission-engine",
        "version": env!("CARGO_PKG_VERSION"),
        "model_version": engine.model_version(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fixtures::{engine, request};
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    async fn json_body(resp: axum::response::Response) -> Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(body: &Value) -> Request<Body> {
        Request::post("/predict")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_predict_returns_label_and_probabilities() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(Arc::new(engine(dir.path())));

        let body = serde_json::to_value(request()).unwrap();
        let resp = app.oneshot(post_json(&body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let json = json_body(resp).await;
        assert_eq!(json["label"], "Tidak Diterima");
        assert_eq!(json["accepted"], false);
        assert_eq!(json["accepted_probability"], 0.25);
        assert_eq!(json["probabilities"].as_array().unwrap().len(), 2);
        assert_eq!(json["criteria"]["home_distance"], "Jauh");
        assert_eq!(json["applicant"]["student_id"], "0123456789");
    }

    #[tokio::test]
    async fn test_predict_rejects_empty_name() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(Arc::new(engine(dir.path())));

        let mut body = serde_json::to_value(request()).unwrap();
        body["name"] = Value::String(String::new());
        let resp = app.oneshot(post_json(&body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let json = json_body(resp).await;
        assert_eq!(json["status"], 400);
    }

    #[tokio::test]
    async fn test_predict_rejects_unknown_option() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(Arc::new(engine(dir.path())));

        let mut body = serde_json::to_value(request()).unwrap();
        body["criteria"]["economic_status"] = Value::String("Kaya".to_string());
        let resp = app.oneshot(post_json(&body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_predict_rejects_malformed_body() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(Arc::new(engine(dir.path())));

        let body = serde_json::json!({ "name": "Siti", "student_id": "1" });
        let resp = app.oneshot(post_json(&body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_options_lists_all_criteria() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(Arc::new(engine(dir.path())));

        let req = Request::get("/options").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let json = json_body(resp).await;
        let criteria = json["criteria"].as_array().unwrap();
        assert_eq!(criteria.len(), 6);
        assert_eq!(criteria[0]["criterion"], "report_score");
        assert_eq!(criteria[0]["options"], serde_json::json!(["Rendah", "Sedang", "Tinggi"]));
    }

    #[tokio::test]
    async fn test_health_and_metrics() {
        let dir = tempfile::tempdir().unwrap();
        let state = Arc::new(engine(dir.path()));

        let req = Request::get("/health").body(Body::empty()).unwrap();
        let resp = router(Arc::clone(&state)).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await["status"], "healthy");

        state.predict(request()).unwrap();
        let req = Request::get("/metrics").body(Body::empty()).unwrap();
        let resp = router(state).oneshot(req).await.unwrap();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("requests_total 1\n"));
    }
}
