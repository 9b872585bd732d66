//! Get a single account.

use axum::Json;
use axum::extract::{Path, State};
use uuid::Uuid;

use crate::user::{User, UserRepository};
use crate::{AppState, ServerError};

pub async fn handler(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<User>, ServerError> {
    let user = UserRepository::new(state.db.postgres.clone())
        .find_by_id(user_id)
        .await?;

    Ok(Json(user))
}

#[cfg(test)]
pub(super) mod tests {
    use crate::*;
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use sqlx::{Pool, Postgres};

    #[sqlx::test(fixtures("../../../fixtures/users.sql"))]
    async fn test_get_user_handler(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state);

        let path = format!("/users/{}", router::ADMIN_ID);
        let response =
            make_request(None, app, Method::GET, &path, String::default())
                .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["id"], router::ADMIN_ID);
        assert_eq!(body["roles"], serde_json::json!(["ADMIN"]));
    }

    #[sqlx::test]
    async fn test_get_unknown_user(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state);

        let path = format!("/users/{}", uuid::Uuid::new_v4());
        let response =
            make_request(None, app, Method::GET, &path, String::default())
                .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
