use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::config::get_config;

#[axum::debug_handler]
pub async fn health() -> impl IntoResponse {
    let body = json!({
        "status": "ok",
        "environment": get_config().environment,
    });
    (StatusCode::OK, Json(body))
}
