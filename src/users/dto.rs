use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::model::{User, UserPatch, UserRole};

/// Public projection of a user. The stored digest never crosses this
/// boundary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub is_active: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub last_login_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            is_active: user.is_active,
            first_name: user.first_name,
            last_name: user.last_name,
            phone_number: user.phone_number,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Params for the createUser operation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub role: Option<UserRole>,
}

/// Params for the updateUser operation: the target id plus the patch.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub id: Uuid,
    #[serde(flatten)]
    pub patch: UserPatch,
}

/// Envelope for createUser and updateUser. Failures populate `error`; the
/// transport still answers 200.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub error: Option<String>,
    pub user: Option<PublicUser>,
}

impl UserResponse {
    pub fn ok(user: PublicUser) -> Self {
        Self {
            error: None,
            user: Some(user),
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            error: Some(msg.into()),
            user: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        let now = OffsetDateTime::now_utc();
        User {
            id: Uuid::new_v4(),
            username: "alice".into(),
            email: "alice@example.com".into(),
            password_hash: "$2b$10$abcdefghijklmnopqrstuv".into(),
            role: UserRole::Manager,
            is_active: true,
            first_name: Some("Alice".into()),
            last_name: None,
            phone_number: None,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn projection_carries_everything_but_the_digest() {
        let user = sample_user();
        let id = user.id;
        let public = PublicUser::from(user);
        assert_eq!(public.id, id);
        assert_eq!(public.role, UserRole::Manager);

        let json = serde_json::to_string(&public).unwrap();
        assert!(!json.contains("password"));
        assert!(!json.contains("$2b$"));
    }

    #[test]
    fn projection_uses_camel_case_field_names() {
        let json = serde_json::to_value(PublicUser::from(sample_user())).unwrap();
        assert!(json.get("isActive").is_some());
        assert!(json.get("firstName").is_some());
        assert!(json.get("createdAt").is_some());
        assert!(json.get("is_active").is_none());
    }

    #[test]
    fn error_envelope_has_no_user() {
        let resp = UserResponse::error("User not found");
        assert_eq!(resp.error.as_deref(), Some("User not found"));
        assert!(resp.user.is_none());
    }
}
