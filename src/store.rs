use axum::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    FromRow, PgPool,
};
use thiserror::Error;
use tracing::debug;

use crate::config::DbConfig;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // SHA-256 hex digest, not exposed in JSON
}

/// Store-layer error type.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already in use")]
    DuplicateEmail,

    #[error("no user matched the given id")]
    NotFound,

    #[error("store unreachable: {0}")]
    Unavailable(String),

    #[error("store error: {0}")]
    Backend(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::DuplicateEmail,
            e @ (sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed) => StoreError::Unavailable(e.to_string()),
            other => StoreError::Backend(other),
        }
    }
}

/// Persistence capability for user records. Handlers depend on this trait
/// only; the production implementation is [`PgStore`].
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Idempotently ensure the `users` table exists.
    async fn ensure_schema(&self) -> Result<(), StoreError>;

    /// Insert a new user; the store assigns the id.
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, StoreError>;

    /// All users, ascending by id.
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    /// Update name and email, and the password hash when one is supplied.
    async fn update_user(
        &self,
        id: i32,
        name: &str,
        email: &str,
        password_hash: Option<&str>,
    ) -> Result<(), StoreError>;

    async fn delete_user(&self, id: i32) -> Result<(), StoreError>;
}

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Build a lazily-connecting pool from the configured credentials.
    /// Connection failures surface on first use, not here.
    pub fn connect(config: &DbConfig) -> Self {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .database(&config.name)
            .username(&config.user)
            .password(&config.password);
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_lazy_with(options);
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id SERIAL PRIMARY KEY,
                name VARCHAR(255) NOT NULL,
                email VARCHAR(255) UNIQUE NOT NULL,
                password_hash VARCHAR(255) NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        debug!("users table verified");
        Ok(())
    }

    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, password_hash
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash
            FROM users
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn update_user(
        &self,
        id: i32,
        name: &str,
        email: &str,
        password_hash: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let result = match password_hash {
            Some(hash) => {
                sqlx::query(
                    r#"
                    UPDATE users
                    SET name = $1, email = $2, password_hash = $3
                    WHERE id = $4
                    "#,
                )
                .bind(name)
                .bind(email)
                .bind(hash)
                .bind(id)
                .execute(&mut *tx)
                .await?
            }
            None => {
                sqlx::query(
                    r#"
                    UPDATE users
                    SET name = $1, email = $2
                    WHERE id = $3
                    "#,
                )
                .bind(name)
                .bind(email)
                .bind(id)
                .execute(&mut *tx)
                .await?
            }
        };

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(StoreError::NotFound);
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete_user(&self, id: i32) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(r#"DELETE FROM users WHERE id = $1"#)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(StoreError::NotFound);
        }

        tx.commit().await?;
        Ok(())
    }
}

/// In-memory store used by tests. Ids are assigned monotonically and never
/// reused, matching SERIAL semantics.
#[derive(Default)]
pub struct MemoryStore {
    inner: std::sync::Mutex<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    next_id: i32,
    users: Vec<User>,
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        if inner.users.iter().any(|u| u.email == email) {
            return Err(StoreError::DuplicateEmail);
        }
        inner.next_id += 1;
        let user = User {
            id: inner.next_id,
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner.users.clone())
    }

    async fn update_user(
        &self,
        id: i32,
        name: &str,
        email: &str,
        password_hash: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        if inner.users.iter().any(|u| u.email == email && u.id != id) {
            return Err(StoreError::DuplicateEmail);
        }
        let user = inner
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(StoreError::NotFound)?;
        user.name = name.to_string();
        user.email = email.to_string();
        if let Some(hash) = password_hash {
            user.password_hash = hash.to_string();
        }
        Ok(())
    }

    async fn delete_user(&self, id: i32) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        let position = inner
            .users
            .iter()
            .position(|u| u.id == id)
            .ok_or(StoreError::NotFound)?;
        inner.users.remove(position);
        Ok(())
    }
}
