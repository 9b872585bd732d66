//! HTTP handlers, one per file.

pub mod login;
pub mod refresh;
pub mod register;
pub mod reset;
pub mod status;
pub mod users;

use std::sync::LazyLock;

use axum::Json;
use axum::extract::{FromRequest, Request};
use regex_lite::Regex;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::{Result, ServerError};

static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+\d{8,16}$").unwrap());

/// Check international phone number format.
pub fn validate_phone(phone: &str) -> std::result::Result<(), ValidationError> {
    if !PHONE.is_match(phone) {
        return Err(ValidationError::new("invalid_phone"));
    }

    Ok(())
}

/// Error returned when an email matches no usable account.
pub(crate) fn invalid_email() -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(
        "email",
        ValidationError::new("email")
            .with_message("Invalid email provided.".into()),
    );
    errors
}

/// Error returned when an opaque token is unknown, spent or expired.
pub(crate) fn invalid_token() -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(
        "token",
        ValidationError::new("token")
            .with_message("Invalid token provided.".into()),
    );
    errors
}

/// JSON extractor running `validator` rules before the handler.
pub struct Valid<T>(pub T);

impl<T, S> FromRequest<S> for Valid<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = axum::extract::rejection::JsonRejection>,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Valid(value))
    }
}

#[cfg(test)]
pub(crate) const ADMIN_ID: &str = "11111111-1111-1111-1111-111111111111";
#[cfg(test)]
pub(crate) const CANDIDATE_ID: &str = "22222222-2222-2222-2222-222222222222";
#[cfg(test)]
pub(crate) const TEST_SECRET: &str = "an-obviously-test-only-secret";

/// MUST NEVER be used in production.
#[cfg(test)]
pub(crate) fn state(pool: sqlx::Pool<sqlx::Postgres>) -> crate::AppState {
    use std::sync::Arc;

    let config = Arc::new(crate::config::Configuration::default());

    crate::AppState {
        crypto: Arc::new(
            // Cheap parameters, hashing strength is not under test.
            crate::crypto::PasswordManager::new(Some(crate::config::Argon2 {
                memory_cost: 1024,
                iterations: 1,
                parallelism: 1,
                hash_length: 32,
            }))
            .expect("cannot build password manager"),
        ),
        token: crate::token::TokenManager::new(
            "https://vouch.test/",
            TEST_SECRET,
            &config.token,
        ),
        db: crate::database::Database {
            postgres: pool,
        },
        mail: crate::mail::MailManager::default(),
        config,
    }
}
