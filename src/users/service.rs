use tracing::{error, warn};
use uuid::Uuid;

use crate::auth::password::hash_password;
use crate::users::dto::{CreateUserRequest, PublicUser, UpdateUserRequest, UserResponse};
use crate::users::model::NewUser;
use crate::users::store::{StoreError, StoreResult, UserStore};
use crate::users::validate::validate_new_user;

pub async fn list_users(store: &dyn UserStore) -> StoreResult<Vec<PublicUser>> {
    Ok(store.list().await?.into_iter().map(PublicUser::from).collect())
}

pub async fn get_user(store: &dyn UserStore, id: Uuid) -> StoreResult<Option<PublicUser>> {
    Ok(store.get_by_id(id).await?.map(PublicUser::from))
}

pub async fn create_user(store: &dyn UserStore, req: CreateUserRequest) -> UserResponse {
    if let Err(msg) = validate_new_user(&req.username, &req.email, &req.password) {
        warn!(username = %req.username, "createUser rejected: {}", msg);
        return UserResponse::error(msg);
    }

    match store
        .find_by_username_or_email(&req.username, &req.email)
        .await
    {
        Ok(Some(_)) => {
            return UserResponse::error("User with this username or email already exists")
        }
        Ok(None) => {}
        Err(e) => {
            error!(error = %e, "duplicate pre-check failed");
            return UserResponse::error("Error creating user");
        }
    }

    // prepare for persistence: the plaintext stops here
    let password_hash = match hash_password(&req.password) {
        Ok(h) => h,
        Err(e) => {
            error!(error = %e, "hash_password failed");
            return UserResponse::error("Error creating user");
        }
    };

    let new = NewUser {
        username: req.username,
        email: req.email,
        password_hash,
        role: req.role.unwrap_or_default(),
        first_name: req.first_name,
        last_name: req.last_name,
        phone_number: req.phone_number,
    };

    match store.insert(new).await {
        Ok(user) => UserResponse::ok(user.into()),
        // a concurrent create can pass the pre-check; the unique index settles it
        Err(StoreError::Duplicate) => {
            UserResponse::error("User with this username or email already exists")
        }
        Err(e) => {
            error!(error = %e, "insert user failed");
            UserResponse::error("Error creating user")
        }
    }
}

pub async fn update_user(store: &dyn UserStore, req: UpdateUserRequest) -> UserResponse {
    let mut user = match store.get_by_id(req.id).await {
        Ok(Some(u)) => u,
        Ok(None) => return UserResponse::error("User not found"),
        Err(e) => {
            error!(error = %e, user_id = %req.id, "load user failed");
            return UserResponse::error("Error updating user");
        }
    };

    user.apply_patch(&req.patch);

    match store.save(&user).await {
        Ok(user) => UserResponse::ok(user.into()),
        Err(e) => {
            error!(error = %e, user_id = %req.id, "save user failed");
            UserResponse::error("Error updating user")
        }
    }
}

pub async fn delete_user(store: &dyn UserStore, id: Uuid) -> bool {
    match store.delete(id).await {
        Ok(removed) => removed,
        Err(e) => {
            error!(error = %e, user_id = %id, "delete user failed");
            false
        }
    }
}
