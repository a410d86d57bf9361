use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Role stored with each account. Nothing enforces permissions off it yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    #[default]
    User,
    Manager,
}

/// User row as stored.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // bcrypt digest, not exposed in JSON
    pub role: UserRole,
    pub is_active: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub last_login_at: Option<OffsetDateTime>, // in the schema, never written
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Fields for a fresh insert. The password is already a digest by the time
/// this struct exists.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
}

/// Partial update. `None` leaves a field alone; empty strings count as
/// absent, while `is_active` applies whenever supplied, including `false`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub is_active: Option<bool>,
}

impl User {
    pub fn apply_patch(&mut self, patch: &UserPatch) {
        if let Some(v) = non_empty(&patch.first_name) {
            self.first_name = Some(v.to_owned());
        }
        if let Some(v) = non_empty(&patch.last_name) {
            self.last_name = Some(v.to_owned());
        }
        if let Some(v) = non_empty(&patch.phone_number) {
            self.phone_number = Some(v.to_owned());
        }
        if let Some(active) = patch.is_active {
            self.is_active = active;
        }
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}
