//! Start a password reset.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::mail::Template;
use crate::router::{Valid, invalid_email};
use crate::ticket::{Purpose, TicketRepository};
use crate::user::UserBuilder;
use crate::{AppState, ServerError};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(email(message = "Email must be formatted."))]
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
}

/// Handler to issue a password reset token.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<Json<Response>, ServerError> {
    let user = UserBuilder::new()
        .email(&body.email)
        .build(state.db.postgres.clone(), Arc::clone(&state.crypto))
        .find_by_email()
        .await
        .map_err(|err| match err {
            ServerError::NotFound => invalid_email().into(),
            err => err,
        })?;

    if !user.data.is_active {
        return Err(invalid_email().into());
    }

    let ticket = TicketRepository::new(state.db.postgres.clone())
        .issue(user.data.id, Purpose::PasswordReset)
        .await?;

    if let Err(err) = state
        .mail
        .publish_event(Template::PasswordReset, &user.data, &ticket.token)
        .await
    {
        tracing::error!(
            user_id = %user.data.id,
            error = %err,
            "reset mail event not published"
        );
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
    async fn test_reset_request_handler(pool: Pool<Postgres>) {
        let state = router::state(pool.clone());
        let app = app(state.clone());

        crate::router::login::tests::register_and_verify(
            app.clone(),
            &pool,
            "user@example.com",
            "pAssw0rd!",
        )
        .await;

        let response = make_request(
            None,
            app,
            Method::POST,
            "/reset-password",
            json!({"email": "user@example.com"}).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        // A short reset token joins the long verification one.
        let token: String = sqlx::query_scalar(
            "SELECT token FROM tickets WHERE purpose = 'PASSWORD_RESET'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(token.len(), 6);
    }

    #[sqlx::test]
    async fn test_reset_request_for_unknown_email(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state.clone());

        let response = make_request(
            None,
            app,
            Method::POST,
            "/reset-password",
            json!({"email": "nobody@example.com"}).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["errors"][0]["message"], "Invalid email provided.");
    }
}
