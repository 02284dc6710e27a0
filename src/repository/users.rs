//! Users repository (credential store)

use sqlx::{Pool, Postgres, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::user::{NewUser, User},
};

const USER_COLUMNS: &str = "id, username, email, password_hash, role, created_at";

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Insert a new user inside the caller's transaction
    pub async fn create(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: &NewUser,
        password_hash: &str,
    ) -> AppResult<User> {
        let query = format!(
            r#"
            INSERT INTO users (username, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(&user.username)
            .bind(&user.email)
            .bind(password_hash)
            .bind(user.role)
            .fetch_one(&mut **tx)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    AppError::DuplicateIdentity("Username or email already in use".to_string())
                }
                e => AppError::Database(e),
            })
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Find a user by username or email
    pub async fn find_by_identity(&self, username_or_email: &str) -> AppResult<Option<User>> {
        let query = format!(
            "SELECT {} FROM users WHERE username = $1 OR email = $1 ORDER BY id LIMIT 1",
            USER_COLUMNS
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(username_or_email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }
}
