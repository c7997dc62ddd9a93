use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Utc;
use serde_json::json;

use crate::models::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

pub async fn health(State(state): State<AppState>) -> Response {
    let timestamp = Utc::now().to_rfc3339();

    match state.store.ping().await {
        Ok(()) => Json(json!({
            "status": "healthy",
            "timestamp": timestamp,
            "service": "clinic-booking-system",
            "database": {
                "status": "connected",
                "message": "Data store connection successful",
            },
        }))
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "health check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "status": "unhealthy",
                    "error": "Health check failed",
                    "timestamp": timestamp,
                })),
            )
                .into_response()
        }
    }
}
