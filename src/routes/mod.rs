use axum::{http::StatusCode, http::Uri, response::IntoResponse, Json};
use serde_json::json;

pub mod auth;
pub mod health;
pub mod jobs;
pub mod users;

/// Fallback for anything outside the route table.
pub async fn not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "message": format!("{} route not found", uri),
        })),
    )
}
