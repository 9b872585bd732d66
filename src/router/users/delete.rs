//! Delete an account.

use axum::extract::{Path, State};
use uuid::Uuid;

use crate::router::users::Identity;
use crate::user::{Role, UserRepository};
use crate::{AppState, ServerError};

/// Handler to remove a user and, by cascade, their pending tokens.
pub async fn handler(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Identity(identity): Identity,
) -> Result<(), ServerError> {
    if !identity.has_role(Role::Admin) {
        return Err(ServerError::Forbidden);
    }

    UserRepository::new(state.db.postgres.clone())
        .delete(user_id)
        .await?;

    Ok(())
}
