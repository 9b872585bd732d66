//! Redeem an account verification token.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::router::{Valid, invalid_token};
use crate::ticket::{Purpose, TicketRepository};
use crate::user::UserRepository;
use crate::{AppState, ServerError};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(length(min = 1, message = "Token must not be empty."))]
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
}

/// Handler to verify a freshly registered account.
///
/// Claiming the token and flagging the user verified commit together, so a
/// concurrent duplicate request sees either nothing or the finished state.
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

    if ticket.purpose != Purpose::AccountVerification
        || !ticket.is_valid(state.config.tickets.lifespan())
    {
        // Dropping the transaction leaves the spent or expired token in
        // place, permanently unusable.
        return Err(invalid_token().into());
    }

    UserRepository::set_verified(&mut tx, ticket.user_id).await?;
    tx.commit().await?;

    Ok(Json(Response {
        success: true,
    }))
}
