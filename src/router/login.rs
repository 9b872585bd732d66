//! Exchange credentials for a JWT pair.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use validator::Validate;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::router::Valid;
use crate::user::UserBuilder;
use crate::{AppState, ServerError};

pub const TOKEN_TYPE: &str = "Bearer";

#[derive(Debug, Validate, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Body {
    #[validate(email(message = "Email must be formatted."))]
    email: String,
    #[validate(length(
        min = 8,
        max = 255,
        message = "Password must contain at least 8 characters."
    ))]
    password: String,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub token_type: String,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
}

/// Handler to log a user in.
///
/// Unknown email, wrong password and disabled account all answer the same
/// way; an unverified account gets its own message.
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
            ServerError::NotFound => ServerError::Unauthorized,
            err => err,
        })?;

    user.authenticate(&body.password)?;

    let pair = state.token.create_pair(&user.data)?;

    Ok(Json(Response {
        token_type: TOKEN_TYPE.to_owned(),
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        expires_in: pair.expires_in,
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

    pub(crate) async fn register_and_verify(
        app: axum::Router,
        pool: &Pool<Postgres>,
        email: &str,
        password: &str,
    ) {
        let response = make_request(
            None,
            app,
            Method::POST,
            "/register",
            json!({
                "email": email,
                "password": password,
                "firstname": "Test",
                "lastname": "User",
            })
            .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        sqlx::query("UPDATE users SET verified = TRUE WHERE email = $1")
            .bind(email)
            .execute(pool)
            .await
            .unwrap();
    }

    #[sqlx::test]
    async fn test_login_before_verification(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state.clone());

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

        let response = make_request(
            None,
            app,
            Method::POST,
            "/login",
            json!({"email": "user@example.com", "password": "pAssw0rd!"})
                .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["title"], "Account not yet verified.");
    }

    #[sqlx::test]
    async fn test_login_handler(pool: Pool<Postgres>) {
        let state = router::state(pool.clone());
        let app = app(state.clone());

        register_and_verify(app.clone(), &pool, "user@example.com", "pAssw0rd!")
            .await;

        let response = make_request(
            None,
            app,
            Method::POST,
            "/login",
            json!({"email": "User@example.COM", "password": "pAssw0rd!"})
                .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: Response = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.token_type, TOKEN_TYPE);
        assert_eq!(body.expires_in, state.token.expires_in());

        let claims = state.token.decode(&body.access_token).unwrap();
        assert_eq!(claims.email, "user@example.com");
        assert_eq!(claims.roles, vec![user::Role::Candidate]);
        assert_eq!(claims.fullname, "Test User");
        assert!(state.token.decode_refresh(&body.refresh_token).is_ok());
    }

    #[sqlx::test]
    async fn test_login_with_wrong_password(pool: Pool<Postgres>) {
        let state = router::state(pool.clone());
        let app = app(state.clone());

        register_and_verify(app.clone(), &pool, "user@example.com", "pAssw0rd!")
            .await;

        let response = make_request(
            None,
            app,
            Method::POST,
            "/login",
            json!({"email": "user@example.com", "password": "wr0ngPass!"})
                .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    async fn test_login_with_disabled_account(pool: Pool<Postgres>) {
        let state = router::state(pool.clone());
        let app = app(state.clone());

        register_and_verify(app.clone(), &pool, "user@example.com", "pAssw0rd!")
            .await;
        sqlx::query("UPDATE users SET is_active = FALSE")
            .execute(&pool)
            .await
            .unwrap();

        let response = make_request(
            None,
            app,
            Method::POST,
            "/login",
            json!({"email": "user@example.com", "password": "pAssw0rd!"})
                .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
