use crate::server::router::ShelfState;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use tracing::error;

/// GET /health
pub async fn health(State(state): State<ShelfState>) -> impl IntoResponse {
    match state.books.storage().ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "message": "Book Management Application is running",
                "database": "ok",
            })),
        ),
        Err(e) => {
            error!(error = %e, "health check: database unreachable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "message": "Book Management Application is running",
                    "database": "unavailable",
                })),
            )
        }
    }
}
