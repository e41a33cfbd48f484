use std::collections::BTreeMap;

use axum::{
    extract::{Multipart, Path, Query, State},
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        job_dto::{CreateJobPayload, UpdateJobPayload},
        response::ApiResponse,
    },
    error::Result,
    models::{job::JobStats, user::User},
    services::job_service::ResumeUpload,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/v1/jobs",
    params(
        ("sort" = Option<String>, Query, description = "Comma-separated columns, `-` prefix for descending"),
        ("fields" = Option<String>, Query, description = "Comma-separated projection"),
        ("search" = Option<String>, Query, description = "Title search term"),
        ("page" = Option<u32>, Query, description = "Page number"),
        ("limit" = Option<u32>, Query, description = "Items per page, capped at 100")
    ),
    responses(
        (status = 200, description = "List of jobs", body = Json<serde_json::Value>)
    )
)]
#[axum::debug_handler]
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Result<impl IntoResponse> {
    let jobs = state.job_service.list(&params).await?;
    Ok(Json(ApiResponse::list(jobs)))
}

#[utoipa::path(
    get,
    path = "/api/v1/jobs/{zipcode}/{distance}",
    params(
        ("zipcode" = String, Path, description = "Center of the search"),
        ("distance" = f64, Path, description = "Radius in miles")
    ),
    responses(
        (status = 200, description = "Jobs inside the radius", body = Json<serde_json::Value>),
        (status = 502, description = "Geocoder unavailable")
    )
)]
#[axum::debug_handler]
pub async fn jobs_in_radius(
    State(state): State<AppState>,
    Path((zipcode, distance)): Path<(String, f64)>,
) -> Result<impl IntoResponse> {
    let jobs = state.job_service.jobs_in_radius(&zipcode, distance).await?;
    Ok(Json(ApiResponse::list(jobs)))
}

#[utoipa::path(
    get,
    path = "/api/v1/job/{id}",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Job found", body = Json<serde_json::Value>),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let job = state.job_service.get_by_id(id).await?;
    Ok(Json(ApiResponse::data(job)))
}

#[utoipa::path(
    get,
    path = "/api/v1/job/{id}/{slug}",
    params(
        ("id" = Uuid, Path, description = "Job ID"),
        ("slug" = String, Path, description = "Job slug")
    ),
    responses(
        (status = 200, description = "Job found", body = Json<serde_json::Value>),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn get_job_by_slug(
    State(state): State<AppState>,
    Path((id, slug)): Path<(Uuid, String)>,
) -> Result<impl IntoResponse> {
    let job = state.job_service.get_by_id_and_slug(id, &slug).await?;
    Ok(Json(ApiResponse::data(job)))
}

#[utoipa::path(
    get,
    path = "/api/v1/stats/{topic}",
    params(
        ("topic" = String, Path, description = "Title search term")
    ),
    responses(
        (status = 200, description = "Aggregates per experience bracket", body = Json<serde_json::Value>)
    )
)]
#[axum::debug_handler]
pub async fn job_stats(
    State(state): State<AppState>,
    Path(topic): Path<String>,
) -> Result<impl IntoResponse> {
    let stats = state.job_service.stats(&topic).await?;
    Ok(Json(stats_body(&topic, stats)))
}

/// An empty aggregate is informational, not a failure.
fn stats_body(topic: &str, stats: Vec<JobStats>) -> ApiResponse<Vec<JobStats>> {
    if stats.is_empty() {
        return ApiResponse::message(format!("no stats found for - {}", topic));
    }
    ApiResponse::data(stats)
}

#[utoipa::path(
    post,
    path = "/api/v1/job/new",
    request_body = CreateJobPayload,
    responses(
        (status = 200, description = "Job created", body = Json<serde_json::Value>),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Role not allowed")
    )
)]
#[axum::debug_handler]
pub async fn create_job(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<CreateJobPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let job = state.job_service.create(&user, payload).await?;
    Ok(Json(ApiResponse::message_with_data("job created", job)))
}

#[utoipa::path(
    put,
    path = "/api/v1/job/{id}",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    request_body = UpdateJobPayload,
    responses(
        (status = 200, description = "Job updated", body = Json<serde_json::Value>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn update_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(payload): Json<UpdateJobPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let job = state.job_service.update(id, &user, payload).await?;
    Ok(Json(ApiResponse::message_with_data("job is updated", job)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/job/{id}",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Job deleted", body = Json<serde_json::Value>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<impl IntoResponse> {
    let job = state.job_service.delete(id, &user).await?;
    Ok(Json(ApiResponse::message_with_data("job is deleted", job)))
}

#[utoipa::path(
    put,
    path = "/api/v1/job/{id}/apply",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Application filed", body = Json<serde_json::Value>),
        (status = 400, description = "Window closed, duplicate or bad upload"),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn apply_to_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<User>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        upload = Some(ResumeUpload { filename, bytes });
        break;
    }

    let resume = state.job_service.apply(id, &user, upload).await?;
    Ok(Json(ApiResponse::message_with_data(
        "applied to job successfully",
        resume,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stats_carry_a_message_instead_of_failing() {
        let body = serde_json::to_value(stats_body("nonexistent", Vec::new())).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "no stats found for - nonexistent");
        assert!(body.get("data").is_none());
    }

    #[test]
    fn populated_stats_return_data() {
        use rust_decimal::Decimal;

        let stats = vec![JobStats {
            experience: "NO EXPERIENCE".to_string(),
            total_jobs: 3,
            avg_positions: 1.5,
            avg_salary: Decimal::new(60_000, 0),
            min_salary: Decimal::new(40_000, 0),
            max_salary: Decimal::new(80_000, 0),
        }];
        let body = serde_json::to_value(stats_body("engineer", stats)).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["data"][0]["totalJobs"], 3);
        assert!(body.get("message").is_none());
    }
}
