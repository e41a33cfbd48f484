use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::warn;
use uuid::Uuid;

use crate::config::get_config;
use crate::error::{CredentialFault, Error, Result};
use crate::models::user::{Role, User};
use crate::utils::token::Claims;
use crate::AppState;

pub const AUTH_COOKIE: &str = "token";

const LOGIN_FIRST: &str = "Login first to access this resource";

pub fn issue_jwt(user_id: Uuid) -> Result<String> {
    let config = get_config();
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now.timestamp() as usize,
        exp: (now + Duration::days(config.jwt_expires_days)).timestamp() as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )?;
    Ok(token)
}

pub fn verify_jwt(token: &str) -> Result<Claims> {
    let config = get_config();
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .map_err(|err| {
        warn!(error = %err, "rejected credential");
        Error::from(err)
    })?;
    Ok(data.claims)
}

/// `Set-Cookie` value carrying a freshly issued token.
pub fn auth_cookie(token: &str) -> String {
    let config = get_config();
    let max_age = config.cookie_expires_days * 24 * 60 * 60;
    format!(
        "{}={}; Max-Age={}; Path=/; HttpOnly",
        AUTH_COOKIE, token, max_age
    )
}

/// `Set-Cookie` value that drops the session cookie.
pub fn expired_auth_cookie() -> String {
    format!("{}=none; Max-Age=0; Path=/; HttpOnly", AUTH_COOKIE)
}

fn bearer_token(req: &Request) -> Option<String> {
    req.headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.to_string())
}

/// Resolves the caller from the `token` cookie, falling back to an
/// `Authorization: Bearer` header, and stores the account on the request.
/// Role guards and handlers downstream read that account; a token whose
/// account no longer exists is treated the same as no token.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    let jar = CookieJar::from_headers(req.headers());
    let token = jar
        .get(AUTH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
        .or_else(|| bearer_token(&req));

    let Some(token) = token else {
        return Err(Error::Unauthenticated(LOGIN_FIRST.to_string()));
    };

    let claims = verify_jwt(&token)?;
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| Error::InvalidCredential(CredentialFault::Malformed))?;

    let user = state
        .user_service
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| Error::Unauthenticated(LOGIN_FIRST.to_string()))?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

fn current_user(req: &Request) -> Result<&User> {
    req.extensions()
        .get::<User>()
        .ok_or_else(|| Error::Unauthenticated(LOGIN_FIRST.to_string()))
}

fn forbidden(role: Role) -> Error {
    Error::Forbidden(format!(
        "Role({}) is not allowed to access this resource",
        role
    ))
}

pub async fn require_employer(req: Request, next: Next) -> Result<Response> {
    let user = current_user(&req)?;
    if !user.role.can_post_jobs() {
        return Err(forbidden(user.role));
    }
    Ok(next.run(req).await)
}

pub async fn require_applicant(req: Request, next: Next) -> Result<Response> {
    let user = current_user(&req)?;
    if !user.role.can_apply() {
        return Err(forbidden(user.role));
    }
    Ok(next.run(req).await)
}

pub async fn require_admin(req: Request, next: Next) -> Result<Response> {
    let user = current_user(&req)?;
    if !user.role.is_admin() {
        return Err(forbidden(user.role));
    }
    Ok(next.run(req).await)
}
