//! Handle database requests for opaque tokens.

use rand::distributions::{Alphanumeric, DistString};
use rand::rngs::OsRng;
use sqlx::{Pool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{Result, ServerError};
use crate::ticket::{Purpose, Ticket};

const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Clone)]
pub struct TicketRepository {
    pool: Pool<Postgres>,
}

impl TicketRepository {
    /// Create a new [`TicketRepository`].
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Issue a new single-use token for a user.
    pub async fn issue(&self, user_id: Uuid, purpose: Purpose) -> Result<Ticket> {
        let token =
            Alphanumeric.sample_string(&mut OsRng, purpose.token_length());

        let ticket = sqlx::query_as::<_, Ticket>(
            r#"INSERT INTO tickets (token, user_id, purpose)
                VALUES ($1, $2, $3)
                RETURNING token, user_id, purpose, created_at"#,
        )
        .bind(&token)
        .bind(user_id)
        .bind(purpose)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| match err.as_database_error() {
            Some(db) if db.code().as_deref() == Some(FOREIGN_KEY_VIOLATION) => {
                ServerError::NotFound
            },
            _ => err.into(),
        })?;

        Ok(ticket)
    }

    /// Find a ticket by its opaque string.
    pub async fn find(&self, token: &str) -> Result<Ticket> {
        sqlx::query_as::<_, Ticket>(
            r#"SELECT token, user_id, purpose, created_at
                FROM tickets WHERE token = $1"#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ServerError::NotFound)
    }

    /// Claim a ticket inside `tx`, deleting it.
    ///
    /// The compare-and-delete is a single statement: two concurrent claims
    /// of the same token cannot both get a row back.
    pub async fn consume(
        tx: &mut Transaction<'static, Postgres>,
        token: &str,
    ) -> Result<Ticket> {
        sqlx::query_as::<_, Ticket>(
            r#"DELETE FROM tickets WHERE token = $1
                RETURNING token, user_id, purpose, created_at"#,
        )
        .bind(token)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(ServerError::NotFound)
    }
}
