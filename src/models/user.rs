use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Account roles. `employeer` keeps its historical spelling because stored
/// rows and existing clients still carry it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Employeer,
    Admin,
}

impl Role {
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Posting, editing and deleting jobs is an employer concern. Admins can
    /// step in on any posting.
    pub fn can_post_jobs(self) -> bool {
        matches!(self, Role::Employeer | Role::Admin)
    }

    /// Only plain accounts apply to jobs. Employers and admins are turned
    /// away so a posting cannot be padded by its own side.
    pub fn can_apply(self) -> bool {
        matches!(self, Role::User)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Employeer => "employeer",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    #[serde(skip_serializing, default)]
    pub reset_password_token: Option<String>,
    #[serde(skip_serializing, default)]
    pub reset_password_expire: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            role,
            reset_password_token: Some("digest".to_string()),
            reset_password_expire: Some(Utc::now()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn role_capabilities() {
        assert!(Role::Employeer.can_post_jobs());
        assert!(Role::Admin.can_post_jobs());
        assert!(!Role::User.can_post_jobs());

        assert!(Role::User.can_apply());
        assert!(!Role::Employeer.can_apply());
        assert!(!Role::Admin.can_apply());

        assert!(Role::Admin.is_admin());
        assert!(!Role::Employeer.is_admin());
    }

    #[test]
    fn role_wire_strings() {
        assert_eq!(serde_json::to_value(Role::Employeer).unwrap(), "employeer");
        assert_eq!(serde_json::to_value(Role::User).unwrap(), "user");
        assert_eq!(serde_json::to_value(Role::Admin).unwrap(), "admin");
    }

    #[test]
    fn serialized_user_hides_credentials() {
        let value = serde_json::to_value(sample_user(Role::User)).unwrap();
        let object = value.as_object().unwrap();
        assert!(object.contains_key("email"));
        assert!(!object.contains_key("passwordHash"));
        assert!(!object.contains_key("resetPasswordToken"));
        assert!(!object.contains_key("resetPasswordExpire"));
    }
}
