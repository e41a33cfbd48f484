use axum::{
    extract::{Path, State},
    http::{header::SET_COOKIE, HeaderMap, HeaderValue},
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::get_config,
    dto::{
        auth_dto::{
            ForgotPasswordPayload, LoginPayload, RegisterPayload, ResetPasswordPayload,
            TokenResponse,
        },
        response::ApiResponse,
    },
    error::{Error, Result},
    middleware::auth::{auth_cookie, expired_auth_cookie, issue_jwt},
    models::user::Role,
    AppState,
};

/// Issues a JWT and hands it out twice, as a session cookie and in the body.
pub(crate) fn send_token(user_id: Uuid) -> Result<(HeaderMap, Json<TokenResponse>)> {
    let token = issue_jwt(user_id)?;
    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, header_value(&auth_cookie(&token))?);
    Ok((headers, Json(TokenResponse::new(token))))
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| Error::Internal(e.to_string()))
}

#[utoipa::path(
    post,
    path = "/api/v1/register",
    request_body = RegisterPayload,
    responses(
        (status = 200, description = "Account created, token issued", body = Json<TokenResponse>),
        (status = 400, description = "Invalid payload or email taken")
    )
)]
#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    if payload.role == Some(Role::Admin) {
        return Err(Error::BadRequest(
            "role admin can not be self assigned".to_string(),
        ));
    }
    let user = state.user_service.register(payload).await?;
    send_token(user.id)
}

#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Token issued", body = Json<TokenResponse>),
        (status = 400, description = "Missing email or password"),
        (status = 401, description = "Invalid email or password")
    )
)]
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse> {
    let (Some(email), Some(password)) = (payload.email, payload.password) else {
        return Err(Error::BadRequest(
            "Please enter email and password".to_string(),
        ));
    };
    let user = state.user_service.login(&email, &password).await?;
    send_token(user.id)
}

#[utoipa::path(
    get,
    path = "/api/v1/logout",
    responses(
        (status = 200, description = "Session cookie dropped")
    )
)]
#[axum::debug_handler]
pub async fn logout() -> Result<impl IntoResponse> {
    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, header_value(&expired_auth_cookie())?);
    Ok((
        headers,
        Json(ApiResponse::<()>::message("logged out successfully")),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/password/forgot",
    request_body = ForgotPasswordPayload,
    responses(
        (status = 200, description = "Recovery mail sent"),
        (status = 404, description = "No account with that email"),
        (status = 502, description = "Mail could not be delivered")
    )
)]
#[axum::debug_handler]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let (user, token) = state.user_service.create_reset_token(&payload.email).await?;
    let reset_url = format!("{}/api/v1/password/reset/{}", get_config().app_url, token);

    // A reset token nobody received must not stay live.
    if let Err(err) = state
        .mail_service
        .send_password_recovery(&user.email, &reset_url)
        .await
    {
        state.user_service.clear_reset_token(user.id).await?;
        return Err(err);
    }

    Ok(Json(ApiResponse::<()>::message(format!(
        "email sent successfully to {}",
        user.email
    ))))
}

#[utoipa::path(
    put,
    path = "/api/v1/password/reset/{token}",
    params(
        ("token" = String, Path, description = "Reset token from the recovery mail")
    ),
    request_body = ResetPasswordPayload,
    responses(
        (status = 200, description = "Password replaced, token issued", body = Json<TokenResponse>),
        (status = 400, description = "Token invalid or expired")
    )
)]
#[axum::debug_handler]
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(payload): Json<ResetPasswordPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user = state
        .user_service
        .reset_password(&token, &payload.password)
        .await?;
    send_token(user.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_cookie_is_a_valid_header_value() {
        assert!(header_value("token=abc.def.ghi; Max-Age=604800; Path=/; HttpOnly").is_ok());
        assert!(header_value("bad\nvalue").is_err());
    }
}
