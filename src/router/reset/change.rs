//! Spend a reset token and set a new password.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use validator::Validate;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::router::reset::request::Response;
use crate::router::{Valid, invalid_token};
use crate::ticket::{Purpose, TicketRepository};
use crate::user::UserRepository;
use crate::{AppState, ServerError};

#[derive(Debug, Serialize, Deserialize, Validate, Zeroize, ZeroizeOnDrop)]
pub struct Body {
    #[validate(length(min = 1, message = "Token must not be empty."))]
    pub token: String,
    #[validate(length(
        min = 8,
        max = 255,
        message = "Password must contain at least 8 characters."
    ))]
    pub new_password: String,
}

/// Handler to change a password after a reset was initiated.
///
/// The token is claimed and the hash replaced in one transaction.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<Json<Response>, ServerError> {
    let mut tx = state.db.postgres.begin().await?;

    let ticket = TicketRepository::consume(&mut tx, &body.token)
        .await
        .map_err(|err| match err {
            ServerError::NotFound => invalid_token().into(),
            err => err,
        })?;

    if ticket.purpose != Purpose::PasswordReset
        || !ticket.is_valid(state.config.tickets.lifespan())
    {
        return Err(invalid_token().into());
    }

    let phc_hash = state.crypto.hash_password(&body.new_password)?;
    UserRepository::set_password(&mut tx, ticket.user_id, &phc_hash).await?;
    tx.commit().await?;

    Ok(Json(Response {
        success: true,
    }))
}

#[cfg(test)]
pub(super) mod tests {
    use super::*;
    use crate::*;
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use sqlx::{Pool, Postgres};

    async fn reset_token(app: axum::Router, pool: &Pool<Postgres>) -> String {
        crate::router::login::tests::register_and_verify(
            app.clone(),
            pool,
            "user@example.com",
            "pAssw0rd!",
        )
        .await;
        make_request(
            None,
            app,
            Method::POST,
            "/reset-password",
            json!({"email": "user@example.com"}).to_string(),
        )
        .await;

        sqlx::query_scalar(
            "SELECT token FROM tickets WHERE purpose = 'PASSWORD_RESET'",
        )
        .fetch_one(pool)
        .await
        .unwrap()
    }

    #[sqlx::test]
    async fn test_change_handler(pool: Pool<Postgres>) {
        let state = router::state(pool.clone());
        let app = app(state.clone());

        let token = reset_token(app.clone(), &pool).await;

        let response = make_request(
            None,
            app.clone(),
            Method::POST,
            "/reset-password/change",
            json!({"token": token, "new_password": "n3w-pAssw0rd!"})
                .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        // Old password is out, new one is in.
        let response = make_request(
            None,
            app.clone(),
            Method::POST,
            "/login",
            json!({"email": "user@example.com", "password": "pAssw0rd!"})
                .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = make_request(
            None,
            app.clone(),
            Method::POST,
            "/login",
            json!({"email": "user@example.com", "password": "n3w-pAssw0rd!"})
                .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        // The spent token no longer validates nor changes anything.
        let response = make_request(
            None,
            app.clone(),
            Method::POST,
            "/reset-password/validate",
            json!({"token": token}).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = make_request(
            None,
            app,
            Method::POST,
            "/reset-password/change",
            json!({"token": token, "new_password": "an0ther-Pass!"})
                .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    async fn test_change_with_expired_token(pool: Pool<Postgres>) {
        let state = router::state(pool.clone());
        let app = app(state.clone());

        let token = reset_token(app.clone(), &pool).await;
        sqlx::query(
            "UPDATE tickets SET created_at = NOW() - INTERVAL '25 hours'",
        )
        .execute(&pool)
        .await
        .unwrap();

        let response = make_request(
            None,
            app.clone(),
            Method::POST,
            "/reset-password/change",
            json!({"token": token, "new_password": "n3w-pAssw0rd!"})
                .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // The original password still logs in.
        let response = make_request(
            None,
            app,
            Method::POST,
            "/login",
            json!({"email": "user@example.com", "password": "pAssw0rd!"})
                .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
