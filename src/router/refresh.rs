//! Get a new access token with a refresh token.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::router::Valid;
use crate::router::login::TOKEN_TYPE;
use crate::user::UserBuilder;
use crate::{AppState, ServerError};

fn validate_grant_type(grant_type: &str) -> Result<(), ValidationError> {
    // As specified on OAuth2.0 spec, reject if grant_type is not valid.
    if grant_type != "refresh_token" {
        return Err(ValidationError::new("invalid_grant_type"));
    }

    Ok(())
}

#[derive(Debug, Validate, Serialize, Deserialize)]
pub struct Body {
    #[validate(length(min = 1, message = "Refresh token must not be empty."))]
    refresh_token: String,
    #[validate(custom(
        function = "validate_grant_type",
        message = "\"grant_type\" must be \"refresh_token\"."
    ))]
    grant_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    pub token_type: String,
    pub access_token: String,
    pub expires_in: u64,
}

/// Handler to renew an access token.
///
/// The user is re-read so a freshly disabled account cannot keep minting
/// access tokens from an old refresh token.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<Json<Response>, ServerError> {
    let claims = state.token.decode_refresh(&body.refresh_token)?;
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| ServerError::Unauthorized)?;

    let user = UserBuilder::new()
        .id(user_id)
        .build(state.db.postgres.clone(), Arc::clone(&state.crypto))
        .find_by_id()
        .await
        .map_err(|err| match err {
            ServerError::NotFound => ServerError::Unauthorized,
            err => err,
        })?;

    if !user.data.is_active {
        return Err(ServerError::Unauthorized);
    }

    let access_token = state.token.create_access(&user.data)?;

    Ok(Json(Response {
        token_type: TOKEN_TYPE.to_owned(),
        access_token,
        expires_in: state.token.expires_in(),
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

    async fn login(app: axum::Router) -> crate::router::login::Response {
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

        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[sqlx::test]
    async fn test_refresh_handler(pool: Pool<Postgres>) {
        let state = router::state(pool.clone());
        let app = app(state.clone());

        crate::router::login::tests::register_and_verify(
            app.clone(),
            &pool,
            "user@example.com",
            "pAssw0rd!",
        )
        .await;
        let tokens = login(app.clone()).await;

        let response = make_request(
            None,
            app,
            Method::POST,
            "/token/refresh",
            json!({
                "refresh_token": tokens.refresh_token,
                "grant_type": "refresh_token",
            })
            .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: Response = serde_json::from_slice(&body).unwrap();
        assert!(state.token.decode(&body.access_token).is_ok());
    }

    #[sqlx::test]
    async fn test_refresh_rejects_access_token(pool: Pool<Postgres>) {
        let state = router::state(pool.clone());
        let app = app(state.clone());

        crate::router::login::tests::register_and_verify(
            app.clone(),
            &pool,
            "user@example.com",
            "pAssw0rd!",
        )
        .await;
        let tokens = login(app.clone()).await;

        let response = make_request(
            None,
            app,
            Method::POST,
            "/token/refresh",
            json!({
                "refresh_token": tokens.access_token,
                "grant_type": "refresh_token",
            })
            .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    async fn test_refresh_with_wrong_grant_type(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state.clone());

        let response = make_request(
            None,
            app,
            Method::POST,
            "/token/refresh",
            json!({
                "refresh_token": "whatever",
                "grant_type": "password",
            })
            .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
