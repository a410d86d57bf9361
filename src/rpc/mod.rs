use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::auth::dto::LoginRequest;
use crate::auth::token::TokenKeys;
use crate::state::AppState;
use crate::users::dto::{CreateUserRequest, UpdateUserRequest};
use crate::users::store::StoreError;
use crate::{auth, users};

pub mod schema;

/// Every operation arrives through one path as
/// `{"operation": <name>, "params": {...}}`. Malformed bodies are rejected
/// by deserialization before dispatch.
#[derive(Debug, Deserialize)]
#[serde(tag = "operation", content = "params", rename_all = "camelCase")]
pub enum RpcRequest {
    Users,
    User { id: Uuid },
    Login(LoginRequest),
    CreateUser(CreateUserRequest),
    UpdateUser(UpdateUserRequest),
    DeleteUser { id: Uuid },
    TestPassword { password: String },
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api", get(schema_doc).post(dispatch))
}

async fn schema_doc() -> Json<serde_json::Value> {
    Json(schema::document())
}

// Write operations answer 200 with an error field in the envelope; only the
// read operations surface store failures as protocol errors.
#[instrument(skip(state, req))]
async fn dispatch(
    State(state): State<AppState>,
    Json(req): Json<RpcRequest>,
) -> Result<Response, (StatusCode, String)> {
    let store = state.users.as_ref();
    let resp = match req {
        RpcRequest::Users => Json(users::service::list_users(store).await.map_err(internal)?)
            .into_response(),
        RpcRequest::User { id } => {
            Json(users::service::get_user(store, id).await.map_err(internal)?).into_response()
        }
        RpcRequest::Login(req) => {
            let keys = TokenKeys::from_ref(&state);
            Json(auth::service::login(store, &keys, req).await).into_response()
        }
        RpcRequest::CreateUser(req) => {
            Json(users::service::create_user(store, req).await).into_response()
        }
        RpcRequest::UpdateUser(req) => {
            Json(users::service::update_user(store, req).await).into_response()
        }
        RpcRequest::DeleteUser { id } => {
            Json(users::service::delete_user(store, id).await).into_response()
        }
        RpcRequest::TestPassword { password } => {
            Json(auth::service::test_password(&password)).into_response()
        }
    };
    Ok(resp)
}

fn internal(e: StoreError) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
