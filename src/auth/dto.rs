use serde::{Deserialize, Serialize};

use crate::users::dto::PublicUser;

/// Params for the login operation.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Envelope returned by login. On failure `error` is set and no token is
/// issued; on success the user comes back without the digest.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub error: Option<String>,
    pub token: Option<String>,
    pub user: Option<PublicUser>,
}

impl LoginResponse {
    pub fn ok(token: String, user: PublicUser) -> Self {
        Self {
            error: None,
            token: Some(token),
            user: Some(user),
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            error: Some(msg.into()),
            token: None,
            user: None,
        }
    }
}
