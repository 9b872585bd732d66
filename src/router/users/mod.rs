//! Users-related HTTP API.

mod delete;
mod get;
mod list;
mod update;

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use axum::routing::get;
use axum::Router;
use uuid::Uuid;

use crate::error::Result;
use crate::user::{User, UserBuilder};
use crate::{AppState, ServerError};

const BEARER: &str = "Bearer ";

/// Authenticated caller, extracted from the `Authorization` header.
///
/// The account is re-read from the store so a deleted or disabled user
/// cannot keep acting on a still-live access token.
pub struct Identity(pub User);

impl FromRequestParts<AppState> for Identity {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|header| header.to_str().ok())
            .ok_or(ServerError::Unauthorized)?;
        let token = token.strip_prefix(BEARER).unwrap_or(token);

        let claims = state
            .token
            .decode(token)
            .map_err(|_| ServerError::Unauthorized)?;
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ServerError::Unauthorized)?;

        let user = UserBuilder::new()
            .id(user_id)
            .build(state.db.postgres.clone(), Arc::clone(&state.crypto))
            .find_by_id()
            .await
            .map_err(|_| ServerError::Unauthorized)?;

        if !user.data.is_active {
            return Err(ServerError::Unauthorized);
        }

        Ok(Identity(user.data))
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        // `GET /users` goes to `list`.
        .route("/", get(list::handler))
        // `GET /users/{ID}` goes to `get`.
        // `PATCH` and `DELETE` require authorization.
        .route(
            "/{user_id}",
            get(get::handler)
                .patch(update::handler)
                .delete(delete::handler),
        )
}
