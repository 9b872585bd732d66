//! Registration HTTP API.

pub mod resend;
pub mod verify;

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::mail::Template;
use crate::router::Valid;
use crate::ticket::{Purpose, TicketRepository};
use crate::user::{Role, User, UserBuilder};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(email(message = "Email must be formatted."))]
    pub email: String,
    #[validate(length(
        min = 8,
        max = 255,
        message = "Password must contain at least 8 characters."
    ))]
    pub password: String,
    #[validate(length(max = 255))]
    pub firstname: Option<String>,
    #[validate(length(max = 255))]
    pub lastname: Option<String>,
    #[validate(custom(
        function = "crate::router::validate_phone",
        message = "Phone number must be in international format: '+xxx...'."
    ))]
    pub phone: Option<String>,
    #[validate(url(message = "Image must be a valid URL."))]
    pub image: Option<String>,
    #[validate(length(max = 4, message = "A user holds at most 4 roles."))]
    pub roles: Option<Vec<Role>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    pub id: Uuid,
    pub email: String,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub phone: Option<String>,
    pub image: Option<String>,
    pub roles: Vec<Role>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<User> for Response {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            firstname: user.firstname,
            lastname: user.lastname,
            phone: user.phone,
            image: user.image,
            roles: user.roles,
            created_at: user.created_at,
        }
    }
}

/// Handler to create user.
///
/// The account stays locked behind email verification; the opaque token
/// leaves through the mail queue, never through this response.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<(StatusCode, Json<Response>)> {
    let user = UserBuilder::new()
        .email(&body.email)
        .password(&body.password)
        .firstname(body.firstname)
        .lastname(body.lastname)
        .phone(body.phone)
        .image(body.image)
        .roles(body.roles)
        .build(state.db.postgres.clone(), Arc::clone(&state.crypto))
        .create_user()
        .await?;

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

    Ok((StatusCode::CREATED, Json(user.data.into())))
}
