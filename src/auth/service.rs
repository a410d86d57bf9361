use tracing::{error, info, warn};

use crate::auth::dto::{LoginRequest, LoginResponse};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::token::TokenKeys;
use crate::users::store::UserStore;

/// Stateless login: look the user up with the digest, verify the attempt,
/// sign a session token. Log lines carry usernames and ids, never the
/// credential plaintext.
pub async fn login(store: &dyn UserStore, keys: &TokenKeys, req: LoginRequest) -> LoginResponse {
    let user = match store.find_by_username(&req.username).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(username = %req.username, "login: unknown username");
            return LoginResponse::error("User not found");
        }
        Err(e) => {
            error!(error = %e, "login lookup failed");
            return LoginResponse::error("Error during login");
        }
    };

    let ok = match verify_password(&req.password, &user.password_hash) {
        Ok(v) => v,
        Err(e) => {
            error!(error = %e, user_id = %user.id, "verify_password failed");
            return LoginResponse::error("Error during login");
        }
    };

    if !ok {
        warn!(username = %user.username, user_id = %user.id, "login: invalid password");
        return LoginResponse::error("Invalid password");
    }

    let token = match keys.sign(user.id, user.role) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, user_id = %user.id, "token sign failed");
            return LoginResponse::error("Error during login");
        }
    };

    info!(user_id = %user.id, username = %user.username, "user logged in");
    LoginResponse::ok(token, user.into())
}

/// Diagnostic: hash the supplied password and verify it against its own
/// digest. Returns only the bool; neither plaintext nor digest is logged.
pub fn test_password(password: &str) -> bool {
    match hash_password(password).and_then(|digest| verify_password(password, &digest)) {
        Ok(ok) => ok,
        Err(e) => {
            error!(error = %e, "password self-check failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::FromRef;

    use crate::state::AppState;
    use crate::users::dto::CreateUserRequest;
    use crate::users::model::UserRole;
    use crate::users::service::create_user;

    fn login_req(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: username.into(),
            password: password.into(),
        }
    }

    async fn seeded_state() -> (AppState, TokenKeys) {
        let state = AppState::fake();
        let resp = create_user(
            state.users.as_ref(),
            CreateUserRequest {
                username: "alice".into(),
                email: "alice@x.com".into(),
                password: "secret1".into(),
                first_name: None,
                last_name: None,
                phone_number: None,
                role: Some(UserRole::Manager),
            },
        )
        .await;
        assert!(resp.error.is_none());
        let keys = TokenKeys::from_ref(&state);
        (state, keys)
    }

    #[tokio::test]
    async fn create_then_login_issues_a_decodable_token() {
        let (state, keys) = seeded_state().await;
        let resp = login(state.users.as_ref(), &keys, login_req("alice", "secret1")).await;
        assert!(resp.error.is_none());

        let user = resp.user.expect("user in response");
        let claims = keys.decode(&resp.token.expect("token")).expect("decode");
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, UserRole::Manager);
    }

    #[tokio::test]
    async fn login_response_never_contains_the_digest() {
        let (state, keys) = seeded_state().await;
        let resp = login(state.users.as_ref(), &keys, login_req("alice", "secret1")).await;
        let json = serde_json::to_string(&resp).unwrap();
        assert!(!json.contains("password"));
        assert!(!json.contains("$2b$"));
    }

    #[tokio::test]
    async fn wrong_password_yields_error_and_no_token() {
        let (state, keys) = seeded_state().await;
        let resp = login(state.users.as_ref(), &keys, login_req("alice", "wrong")).await;
        assert_eq!(resp.error.as_deref(), Some("Invalid password"));
        assert!(resp.token.is_none());
        assert!(resp.user.is_none());
    }

    #[tokio::test]
    async fn unknown_username_yields_error_and_no_token() {
        let (state, keys) = seeded_state().await;
        let resp = login(state.users.as_ref(), &keys, login_req("nobody", "secret1")).await;
        assert_eq!(resp.error.as_deref(), Some("User not found"));
        assert!(resp.token.is_none());
    }

    #[test]
    fn test_password_self_check_passes() {
        assert!(test_password("any-password-at-all"));
    }
}
