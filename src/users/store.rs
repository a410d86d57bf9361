use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::model::{NewUser, User};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate username or email")]
    Duplicate,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// CRUD access to the users table. Constructed once at startup and handed
/// to `AppState`; every caller goes through this trait.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn list(&self) -> StoreResult<Vec<User>>;
    async fn get_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
    /// Row includes the digest; only the login path should reach for it.
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> StoreResult<Option<User>>;
    async fn insert(&self, new: NewUser) -> StoreResult<User>;
    async fn save(&self, user: &User) -> StoreResult<User>;
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;
}

pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn list(&self) -> StoreResult<Vec<User>> {
        let rows = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, role, is_active,
                   first_name, last_name, phone_number, last_login_at,
                   created_at, updated_at
            FROM users
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn get_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, role, is_active,
                   first_name, last_name, phone_number, last_login_at,
                   created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, role, is_active,
                   first_name, last_name, phone_number, last_login_at,
                   created_at, updated_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, role, is_active,
                   first_name, last_name, phone_number, last_login_at,
                   created_at, updated_at
            FROM users
            WHERE username = $1 OR email = $2
            LIMIT 1
            "#,
        )
        .bind(username)
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn insert(&self, new: NewUser) -> StoreResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash, role,
                               first_name, last_name, phone_number)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, username, email, password_hash, role, is_active,
                      first_name, last_name, phone_number, last_login_at,
                      created_at, updated_at
            "#,
        )
        .bind(new.username)
        .bind(new.email)
        .bind(new.password_hash)
        .bind(new.role)
        .bind(new.first_name)
        .bind(new.last_name)
        .bind(new.phone_number)
        .fetch_one(&self.db)
        .await
        .map_err(unique_violation)?;
        Ok(user)
    }

    async fn save(&self, user: &User) -> StoreResult<User> {
        let updated = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET username = $2, email = $3, password_hash = $4, role = $5,
                is_active = $6, first_name = $7, last_name = $8,
                phone_number = $9, last_login_at = $10, updated_at = now()
            WHERE id = $1
            RETURNING id, username, email, password_hash, role, is_active,
                      first_name, last_name, phone_number, last_login_at,
                      created_at, updated_at
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.is_active)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone_number)
        .bind(user.last_login_at)
        .fetch_one(&self.db)
        .await
        .map_err(unique_violation)?;
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// Postgres unique_violation; the backstop for concurrent creates that both
// pass the duplicate pre-check.
fn unique_violation(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db) = e {
        if db.code().as_deref() == Some("23505") {
            return StoreError::Duplicate;
        }
    }
    StoreError::Database(e)
}

/// In-memory store with the same uniqueness rules as the users table. Backs
/// `AppState::fake()` so tests never touch a live database.
#[derive(Default)]
pub struct MemoryUserStore {
    rows: Mutex<Vec<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<User>> {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn list(&self) -> StoreResult<Vec<User>> {
        Ok(self.lock().clone())
    }

    async fn get_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.lock().iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self.lock().iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> StoreResult<Option<User>> {
        Ok(self
            .lock()
            .iter()
            .find(|u| u.username == username || u.email == email)
            .cloned())
    }

    async fn insert(&self, new: NewUser) -> StoreResult<User> {
        let mut rows = self.lock();
        if rows
            .iter()
            .any(|u| u.username == new.username || u.email == new.email)
        {
            return Err(StoreError::Duplicate);
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            role: new.role,
            is_active: true,
            first_name: new.first_name,
            last_name: new.last_name,
            phone_number: new.phone_number,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        rows.push(user.clone());
        Ok(user)
    }

    async fn save(&self, user: &User) -> StoreResult<User> {
        let mut rows = self.lock();
        let Some(slot) = rows.iter_mut().find(|u| u.id == user.id) else {
            return Err(StoreError::Database(sqlx::Error::RowNotFound));
        };
        let mut updated = user.clone();
        updated.updated_at = OffsetDateTime::now_utc();
        *slot = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut rows = self.lock();
        let before = rows.len();
        rows.retain(|u| u.id != id);
        Ok(rows.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::model::UserRole;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.into(),
            email: email.into(),
            password_hash: "$2b$10$abcdefghijklmnopqrstuv".into(),
            role: UserRole::default(),
            first_name: None,
            last_name: None,
            phone_number: None,
        }
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_username() {
        let store = MemoryUserStore::new();
        store.insert(new_user("alice", "alice@x.com")).await.unwrap();
        let err = store
            .insert(new_user("alice", "other@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate));
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_email() {
        let store = MemoryUserStore::new();
        store.insert(new_user("alice", "alice@x.com")).await.unwrap();
        let err = store
            .insert(new_user("bob", "alice@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate));
    }

    #[tokio::test]
    async fn inserted_rows_get_defaults() {
        let store = MemoryUserStore::new();
        let user = store.insert(new_user("alice", "alice@x.com")).await.unwrap();
        assert!(user.is_active);
        assert_eq!(user.role, UserRole::User);
        assert!(user.last_login_at.is_none());
    }

    #[tokio::test]
    async fn save_persists_changes_and_bumps_updated_at() {
        let store = MemoryUserStore::new();
        let mut user = store.insert(new_user("alice", "alice@x.com")).await.unwrap();
        user.is_active = false;
        let saved = store.save(&user).await.unwrap();
        assert!(!saved.is_active);
        assert!(saved.updated_at >= saved.created_at);
        let reloaded = store.get_by_id(user.id).await.unwrap().unwrap();
        assert!(!reloaded.is_active);
    }

    #[tokio::test]
    async fn delete_reports_whether_a_row_was_removed() {
        let store = MemoryUserStore::new();
        let user = store.insert(new_user("alice", "alice@x.com")).await.unwrap();
        assert!(store.delete(user.id).await.unwrap());
        assert!(!store.delete(user.id).await.unwrap());
        assert!(store.get_by_id(user.id).await.unwrap().is_none());
    }
}
