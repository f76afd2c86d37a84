//! Routes: health check and no-show prediction.

use std::sync::Arc;

use axum::extract::State;
use axum::http::Method;
use axum::routing::{get, post};
use axum::{Json, Router};
use medinsight_core::{FeatureVector, PredictionRequest, PredictionResponse};
use medinsight_ml::ModelService;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::error::ApiError;
use crate::extract::JsonBody;

const RUNNING_STATUS: &str = "ML Service is running";

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub fn router(service: Arc<ModelService>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/", get(health))
        .route("/predict/no-show", post(predict_no_show))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(service)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: RUNNING_STATUS,
    })
}

async fn predict_no_show(
    State(service): State<Arc<ModelService>>,
    JsonBody(request): JsonBody<PredictionRequest>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let features = FeatureVector::from(&request);

    let probability = service.score(&features).await?;
    let response = PredictionResponse::from_probability(probability);
    debug!(
        ?features,
        probability,
        risk = %response.risk_level,
        "scored appointment"
    );
    Ok(Json(response))
}
