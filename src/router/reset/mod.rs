//! Password reset HTTP API.

mod change;
mod request;
mod validate;

use axum::Router;
use axum::routing::post;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        // `POST /reset-password` starts the flow.
        .route("/", post(request::handler))
        // `POST /reset-password/validate` checks a token without spending it.
        .route("/validate", post(validate::handler))
        // `POST /reset-password/change` spends the token and sets the password.
        .route("/change", post(change::handler))
}
