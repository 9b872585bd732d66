//! Handle database requests.

use sqlx::{Pool, Postgres, Transaction};
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

use crate::error::{Result, ServerError};
use crate::user::User;

const UNIQUE_VIOLATION: &str = "23505";

const COLUMNS: &str = "id, email, password, firstname, lastname, phone, \
                       image, roles, verified, is_active, created_at, modified_at";

fn duplicate_email() -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(
        "email",
        ValidationError::new("email").with_message("Email already exists.".into()),
    );
    errors
}

#[derive(Clone)]
pub struct UserRepository {
    pool: Pool<Postgres>,
}

impl UserRepository {
    /// Create a new [`UserRepository`].
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Insert [`User`] into database.
    ///
    /// A taken email address surfaces as a validation error, not as a raw
    /// database failure.
    pub async fn insert(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO users (id, email, password, firstname, lastname, phone, image, roles)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password)
        .bind(&user.firstname)
        .bind(&user.lastname)
        .bind(&user.phone)
        .bind(&user.image)
        .bind(&user.roles)
        .execute(&self.pool)
        .await
        .map_err(|err| match err.as_database_error() {
            Some(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                duplicate_email().into()
            },
            _ => ServerError::from(err),
        })?;

        Ok(())
    }

    /// Find current user using `id` field.
    pub async fn find_by_id(&self, user_id: Uuid) -> Result<User> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ServerError::NotFound)
    }

    /// Find current user using `email` field.
    pub async fn find_by_email(&self, email: &str) -> Result<User> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ServerError::NotFound)
    }

    /// List every user, newest first.
    pub async fn list(&self) -> Result<Vec<User>> {
        Ok(sqlx::query_as::<_, User>(&format!(
            "SELECT {COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?)
    }

    /// Update current user.
    pub async fn update(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"UPDATE users
                SET email = $1, password = $2, firstname = $3, lastname = $4,
                    phone = $5, image = $6, roles = $7, modified_at = NOW()
                WHERE id = $8"#,
        )
        .bind(&user.email)
        .bind(&user.password)
        .bind(&user.firstname)
        .bind(&user.lastname)
        .bind(&user.phone)
        .bind(&user.image)
        .bind(&user.roles)
        .bind(user.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Mark a user as verified, inside `tx`.
    pub async fn set_verified(
        tx: &mut Transaction<'static, Postgres>,
        user_id: Uuid,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE users SET verified = TRUE, modified_at = NOW() WHERE id = $1",
        )
        .bind(user_id)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Replace a user's password hash, inside `tx`.
    pub async fn set_password(
        tx: &mut Transaction<'static, Postgres>,
        user_id: Uuid,
        phc_hash: &str,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE users SET password = $1, modified_at = NOW() WHERE id = $2",
        )
        .bind(phc_hash)
        .bind(user_id)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Delete current user.
    pub async fn delete(&self, user_id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServerError::NotFound);
        }

        Ok(())
    }
}
