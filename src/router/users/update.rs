//! Partially update an account.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::router::Valid;
use crate::router::users::Identity;
use crate::user::{Role, User, UserBuilder};
use crate::{AppState, ServerError};

#[derive(Debug, Validate, Serialize, Deserialize)]
pub struct Body {
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
    #[validate(length(
        min = 8,
        max = 255,
        message = "Password must contain at least 8 characters."
    ))]
    pub password: Option<String>,
}

/// Handler to update profile fields.
///
/// Only the owner of the account or an admin may write; absent fields are
/// left untouched.
pub async fn handler(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Identity(identity): Identity,
    Valid(body): Valid<Body>,
) -> Result<Json<User>, ServerError> {
    if identity.id != user_id && !identity.has_role(Role::Admin) {
        return Err(ServerError::Forbidden);
    }

    let mut user = UserBuilder::new()
        .id(user_id)
        .build(state.db.postgres.clone(), Arc::clone(&state.crypto))
        .find_by_id()
        .await?;

    if let Some(firstname) = body.firstname {
        user.data.firstname = Some(firstname);
    }
    if let Some(lastname) = body.lastname {
        user.data.lastname = Some(lastname);
    }
    if let Some(phone) = body.phone {
        user.data.phone = Some(phone);
    }
    if let Some(image) = body.image {
        user.data.image = Some(image);
    }
    if let Some(password) = body.password {
        user.data.password = state.crypto.hash_password(password)?;
    }

    user.update().await?;

    Ok(Json(user.data))
}
