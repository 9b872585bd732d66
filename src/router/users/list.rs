//! List accounts, newest first.

use axum::Json;
use axum::extract::State;

use crate::user::{User, UserRepository};
use crate::{AppState, ServerError};

pub async fn handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>, ServerError> {
    let users = UserRepository::new(state.db.postgres.clone()).list().await?;

    Ok(Json(users))
}
