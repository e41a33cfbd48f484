use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    http::{header::SET_COOKIE, HeaderMap, HeaderValue},
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        response::ApiResponse,
        user_dto::{UpdateMePayload, UpdatePasswordPayload},
    },
    error::{Error, Result},
    middleware::auth::expired_auth_cookie,
    models::user::User,
    AppState,
};

#[axum::debug_handler]
pub async fn me(Extension(user): Extension<User>) -> Result<impl IntoResponse> {
    Ok(Json(ApiResponse::data(user)))
}

#[axum::debug_handler]
pub async fn update_me(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<UpdateMePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let updated = state.user_service.update_profile(user.id, payload).await?;
    Ok(Json(ApiResponse::data(updated)))
}

#[axum::debug_handler]
pub async fn update_password(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<UpdatePasswordPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let updated = state
        .user_service
        .update_password(&user, &payload.current_password, &payload.new_password)
        .await?;
    super::auth::send_token(updated.id)
}

/// Removes the account, its applications and the resumes they carried, plus
/// resumes received by postings it owned. The session cookie is dropped in
/// the same response.
#[axum::debug_handler]
pub async fn delete_me(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<impl IntoResponse> {
    state.user_service.delete_account(user.id).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        SET_COOKIE,
        HeaderValue::from_str(&expired_auth_cookie())
            .map_err(|e| Error::Internal(e.to_string()))?,
    );
    Ok((
        headers,
        Json(ApiResponse::<()>::message("your account has been deleted")),
    ))
}

#[axum::debug_handler]
pub async fn applied_jobs(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<impl IntoResponse> {
    let jobs = state.job_service.applied_jobs(user.id).await?;
    Ok(Json(ApiResponse::list(jobs)))
}

#[axum::debug_handler]
pub async fn published_jobs(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<impl IntoResponse> {
    let jobs = state.job_service.published_jobs(user.id).await?;
    Ok(Json(ApiResponse::list(jobs)))
}

#[axum::debug_handler]
pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Result<impl IntoResponse> {
    let users = state.user_service.list(&params).await?;
    Ok(Json(ApiResponse::list(users)))
}

#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.user_service.delete_account(id).await?;
    Ok(Json(ApiResponse::<()>::message("user is deleted")))
}
