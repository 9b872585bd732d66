//! Resend the account verification email.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::mail::Template;
use crate::router::register::verify::Response;
use crate::router::{Valid, invalid_email};
use crate::ticket::{Purpose, TicketRepository};
use crate::user::UserBuilder;
use crate::{AppState, ServerError};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(email(message = "Email must be formatted."))]
    pub email: String,
}

/// Handler to issue a fresh verification token.
///
/// Already-verified accounts get a quiet success, not another token.
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

    if user.data.verified {
        return Ok(Json(Response {
            success: true,
        }));
    }

    let ticket = TicketRepository::new(state.db.postgres.clone())
        .issue(user.data.id, Purpose::AccountVerification)
        .await?;

    if let Err(err) = state
        .mail
        .publish_event(Template::AccountVerification, &user.data, &ticket.token)
        .await
    {
        tracing::error!(
            user_id = %user.data.id,
            error = %err,
            "verification mail event not published"
        );
    }

    Ok(Json(Response {
        success: true,
    }))
}
