use std::collections::BTreeMap;
use std::path::Path;

use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::get_config;
use crate::dto::auth_dto::RegisterPayload;
use crate::dto::user_dto::UpdateMePayload;
use crate::error::{Error, Result};
use crate::models::user::{Role, User};
use crate::query::{ListQuery, USERS};
use crate::services::job_service::remove_resume_files;
use crate::utils::crypto::{hash_password, verify_password};
use crate::utils::token::{generate_reset_token, sha256_hex};

/// How long a password reset link stays valid.
const RESET_TOKEN_TTL_MINUTES: i64 = 30;

#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// A taken email fails on the unique index and surfaces as a duplicate
    /// key error rather than a lookup race.
    pub async fn register(&self, payload: RegisterPayload) -> Result<User> {
        let role = payload.role.unwrap_or(Role::User);
        let password_hash =
            hash_password(&payload.password).map_err(|e| Error::Internal(e.to_string()))?;

        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (name, email, password_hash, role)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(&payload.name)
        .bind(&payload.email)
        .bind(&password_hash)
        .bind(role)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Unknown account and wrong password answer identically so the response
    /// does not reveal which one it was.
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let Some(user) = self.find_by_email(email).await? else {
            return Err(Error::Unauthenticated(
                "Invalid email or password".to_string(),
            ));
        };
        let matched = verify_password(password, &user.password_hash)
            .map_err(|e| Error::Internal(e.to_string()))?;
        if !matched {
            return Err(Error::Unauthenticated(
                "Invalid email or password".to_string(),
            ));
        }
        Ok(user)
    }

    pub async fn update_password(
        &self,
        user: &User,
        current_password: &str,
        new_password: &str,
    ) -> Result<User> {
        let matched = verify_password(current_password, &user.password_hash)
            .map_err(|e| Error::Internal(e.to_string()))?;
        if !matched {
            return Err(Error::Unauthenticated(
                "old password is incorrect".to_string(),
            ));
        }

        let password_hash =
            hash_password(new_password).map_err(|e| Error::Internal(e.to_string()))?;
        let updated = sqlx::query_as::<_, User>(
            "UPDATE users SET password_hash = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(user.id)
        .bind(&password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }

    pub async fn update_profile(&self, id: Uuid, payload: UpdateMePayload) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(payload.name)
        .bind(payload.email)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Stores a reset digest with a short expiry and hands back the plain
    /// token for the recovery mail. Only the digest is persisted.
    pub async fn create_reset_token(&self, email: &str) -> Result<(User, String)> {
        let Some(user) = self.find_by_email(email).await? else {
            return Err(Error::NotFound("no user found with this email".to_string()));
        };

        let (token, digest) = generate_reset_token();
        let expire = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);
        sqlx::query(
            "UPDATE users SET reset_password_token = $2, reset_password_expire = $3, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(user.id)
        .bind(&digest)
        .bind(expire)
        .execute(&self.pool)
        .await?;

        Ok((user, token))
    }

    /// Rolls back a pending reset, used when the recovery mail cannot be
    /// delivered.
    pub async fn clear_reset_token(&self, id: Uuid) -> Result<()> {
        sqlx::query(
            "UPDATE users SET reset_password_token = NULL, reset_password_expire = NULL, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<User> {
        let digest = sha256_hex(token);
        let Some(user) = sqlx::query_as::<_, User>(
            "SELECT * FROM users
             WHERE reset_password_token = $1 AND reset_password_expire > NOW()",
        )
        .bind(&digest)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Err(Error::BadRequest(
                "password reset token is invalid or has been expired".to_string(),
            ));
        };

        let password_hash =
            hash_password(new_password).map_err(|e| Error::Internal(e.to_string()))?;
        let updated = sqlx::query_as::<_, User>(
            "UPDATE users SET
                password_hash = $2,
                reset_password_token = NULL,
                reset_password_expire = NULL,
                updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(user.id)
        .bind(&password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }

    /// Admin listing through the same pipeline the job listing uses.
    pub async fn list(&self, params: &BTreeMap<String, String>) -> Result<Vec<serde_json::Value>> {
        ListQuery::new(&USERS, params)
            .filter()
            .sort()
            .limit_fields()
            .search()
            .paginate()
            .to_sql()
            .fetch_json(&self.pool)
            .await
    }

    /// Deletes an account and the resume files tied to it: the account's own
    /// applications plus applications received by postings it owns. Rows go
    /// with the account through the FK cascade.
    pub async fn delete_account(&self, id: Uuid) -> Result<()> {
        let resumes = sqlx::query_scalar::<_, String>(
            "SELECT resume FROM job_applicants
             WHERE user_id = $1
                OR job_id IN (SELECT id FROM jobs WHERE user_id = $1)",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        remove_resume_files(Path::new(&get_config().upload_dir), &resumes).await;

        let deleted = sqlx::query_scalar::<_, Uuid>("DELETE FROM users WHERE id = $1 RETURNING id")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        if deleted.is_none() {
            return Err(Error::NotFound(format!("user not found with id: {}", id)));
        }
        Ok(())
    }
}
