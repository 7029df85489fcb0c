//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::sensor::EntityState;

use super::dto::{ErrorResponse, SensorListResponse};
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/sensors", get(list_sensors))
        .route("/sensors/:entity_id", get(get_sensor))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// All sensor states.
async fn list_sensors(State(state): State<AppState>) -> Json<SensorListResponse> {
    Json(SensorListResponse {
        sensors: state.states().await,
    })
}

/// One sensor state by entity id.
async fn get_sensor(
    State(state): State<AppState>,
    Path(entity_id): Path<String>,
) -> Result<Json<EntityState>, AppError> {
    state
        .state(&entity_id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound {
            message: format!("Unknown sensor: {entity_id}"),
        })
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    NotFound { message: String },
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
        };

        debug!(%status, %message, "request failed");

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
