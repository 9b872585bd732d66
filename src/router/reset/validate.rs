//! Check a password reset token without spending it.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::router::reset::request::Response;
use crate::router::{Valid, invalid_token};
use crate::ticket::{Purpose, TicketRepository};
use crate::{AppState, ServerError};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(length(min = 1, message = "Token must not be empty."))]
    pub token: String,
}

/// Handler to pre-check a reset token, typically before showing the user a
/// new-password form. The token stays available for the change step.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<Json<Response>, ServerError> {
    let ticket = TicketRepository::new(state.db.postgres.clone())
        .find(&body.token)
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

    Ok(Json(Response {
        success: true,
    }))
}

#[cfg(test)]
pub(super) mod tests {
    use super::*;
    use crate::*;
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::json;
    use sqlx::{Pool, Postgres};

    #[sqlx::test]
    async fn test_validate_handler(pool: Pool<Postgres>) {
        let state = router::state(pool.clone());
        let app = app(state.clone());

        crate::router::login::tests::register_and_verify(
            app.clone(),
            &pool,
            "user@example.com",
            "pAssw0rd!",
        )
        .await;
        make_request(
            None,
            app.clone(),
            Method::POST,
            "/reset-password",
            json!({"email": "user@example.com"}).to_string(),
        )
        .await;

        let token: String = sqlx::query_scalar(
            "SELECT token FROM tickets WHERE purpose = 'PASSWORD_RESET'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();

        // Validation does not consume: both calls succeed.
        for _ in 0..2 {
            let response = make_request(
                None,
                app.clone(),
                Method::POST,
                "/reset-password/validate",
                json!({"token": token}).to_string(),
            )
            .await;
            assert_eq!(response.status(), StatusCode::OK);
        }
    }

    #[sqlx::test]
    async fn test_validate_unknown_token(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state.clone());

        let response = make_request(
            None,
            app,
            Method::POST,
            "/reset-password/validate",
            json!({"token": "000000"}).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["errors"][0]["message"], "Invalid token provided.");
    }

    #[sqlx::test]
    async fn test_validate_rejects_verification_token(pool: Pool<Postgres>) {
        let state = router::state(pool.clone());
        let app = app(state.clone());

        // Registration issues an ACCOUNT_VERIFICATION token; it must not
        // pass as a reset token.
        let response = make_request(
            None,
            app.clone(),
            Method::POST,
            "/register",
            json!({"email": "user@example.com", "password": "pAssw0rd!"})
                .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let token: String = sqlx::query_scalar("SELECT token FROM tickets")
            .fetch_one(&pool)
            .await
            .unwrap();

        let response = make_request(
            None,
            app,
            Method::POST,
            "/reset-password/validate",
            json!({"token": token}).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
