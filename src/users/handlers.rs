use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Html,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    error::ApiError,
    state::AppState,
    store::{StoreError, UserStore},
};

use super::dto::{CreateUserRequest, MessageResponse, UpdateUserRequest, UserListItem};
use super::password;

// --- public routers ---

pub fn page_routes() -> Router<AppState> {
    Router::new().route("/", get(index))
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/cadastrar", post(create_user))
        .route("/usuarios", get(list_users))
        .route("/usuarios/:id", put(update_user).delete(delete_user))
}

// --- handlers ---

pub async fn index() -> Html<&'static str> {
    Html(include_str!("../../static/index.html"))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let (Some(name), Some(email), Some(password)) = (
        required(&payload.name),
        required(&payload.email),
        required(&payload.password),
    ) else {
        warn!("registration with missing fields");
        return Err(ApiError::Validation("All fields are required.".into()));
    };

    let password_hash = password::hash_password(password);

    match state.store.create_user(name, email, &password_hash).await {
        Ok(user) => {
            info!(user_id = user.id, email = %user.email, "user registered");
            Ok((
                StatusCode::CREATED,
                Json(MessageResponse {
                    message: "User registered successfully.".into(),
                }),
            ))
        }
        Err(StoreError::DuplicateEmail) => {
            warn!(email = %email, "email already registered");
            Err(ApiError::Conflict(
                "Email already registered. Please use another email.".into(),
            ))
        }
        Err(e) => Err(e.into()),
    }
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserListItem>>, ApiError> {
    let users = state.store.list_users().await?;
    let items = users
        .into_iter()
        .map(|u| UserListItem {
            id: u.id,
            name: u.name,
            email: u.email,
        })
        .collect();
    Ok(Json(items))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let (Some(name), Some(email)) = (required(&payload.name), required(&payload.email)) else {
        warn!(user_id, "update with missing fields");
        return Err(ApiError::Validation(
            "Name and email are required for update.".into(),
        ));
    };

    // An absent or empty password keeps the stored hash.
    let password_hash = required(&payload.password).map(password::hash_password);

    match state
        .store
        .update_user(user_id, name, email, password_hash.as_deref())
        .await
    {
        Ok(()) => {
            info!(user_id, "user updated");
            Ok(Json(MessageResponse {
                message: "User updated successfully.".into(),
            }))
        }
        Err(StoreError::NotFound) => {
            warn!(user_id, "update for unknown user");
            Err(ApiError::NotFound("User not found.".into()))
        }
        Err(StoreError::DuplicateEmail) => {
            warn!(user_id, email = %email, "email already registered to another user");
            Err(ApiError::Conflict(
                "Email already registered to another user.".into(),
            ))
        }
        Err(e) => Err(e.into()),
    }
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
) -> Result<Json<MessageResponse>, ApiError> {
    match state.store.delete_user(user_id).await {
        Ok(()) => {
            info!(user_id, "user deleted");
            Ok(Json(MessageResponse {
                message: "User deleted successfully.".into(),
            }))
        }
        Err(StoreError::NotFound) => {
            warn!(user_id, "delete for unknown user");
            Err(ApiError::NotFound("User not found.".into()))
        }
        Err(e) => Err(e.into()),
    }
}

fn required(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_body(
        name: Option<&str>,
        email: Option<&str>,
        password: Option<&str>,
    ) -> Json<CreateUserRequest> {
        Json(CreateUserRequest {
            name: name.map(String::from),
            email: email.map(String::from),
            password: password.map(String::from),
        })
    }

    fn update_body(
        name: Option<&str>,
        email: Option<&str>,
        password: Option<&str>,
    ) -> Json<UpdateUserRequest> {
        Json(UpdateUserRequest {
            name: name.map(String::from),
            email: email.map(String::from),
            password: password.map(String::from),
        })
    }

    #[tokio::test]
    async fn register_stores_hash_not_plaintext() {
        let state = AppState::in_memory();

        let (status, Json(body)) = create_user(
            State(state.clone()),
            create_body(Some("Ana"), Some("ana@x.com"), Some("pw123")),
        )
        .await
        .expect("registration should succeed");
        assert_eq!(status, StatusCode::CREATED);
        assert!(body.message.contains("registered"));

        let stored = state.store.list_users().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].password_hash.len(), 64);
        assert!(stored[0].password_hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(stored[0].password_hash, "pw123");
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let state = AppState::in_memory();

        create_user(
            State(state.clone()),
            create_body(Some("Ana"), Some("ana@x.com"), Some("pw123")),
        )
        .await
        .unwrap();

        let err = create_user(
            State(state.clone()),
            create_body(Some("Someone Else"), Some("ana@x.com"), Some("other")),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));

        let stored = state.store.list_users().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].name, "Ana");
    }

    #[tokio::test]
    async fn registration_requires_all_fields() {
        let state = AppState::in_memory();

        // {"email":"a@b.com"} with name and password missing
        let err = create_user(
            State(state.clone()),
            create_body(None, Some("a@b.com"), None),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        // empty string counts as missing
        let err = create_user(
            State(state.clone()),
            create_body(Some(""), Some("a@b.com"), Some("pw")),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        assert!(state.store.list_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn updating_unknown_user_is_not_found() {
        let state = AppState::in_memory();

        let err = update_user(
            State(state.clone()),
            Path(7),
            update_body(Some("Ana"), Some("ana@x.com"), None),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        assert!(state.store.list_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_requires_name_and_email() {
        let state = AppState::in_memory();
        create_user(
            State(state.clone()),
            create_body(Some("Ana"), Some("ana@x.com"), Some("pw123")),
        )
        .await
        .unwrap();

        let err = update_user(
            State(state.clone()),
            Path(1),
            update_body(Some("Ana"), None, None),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn updating_to_anothers_email_is_a_conflict() {
        let state = AppState::in_memory();
        create_user(
            State(state.clone()),
            create_body(Some("Ana"), Some("ana@x.com"), Some("pw1")),
        )
        .await
        .unwrap();
        create_user(
            State(state.clone()),
            create_body(Some("Bia"), Some("bia@x.com"), Some("pw2")),
        )
        .await
        .unwrap();

        let err = update_user(
            State(state.clone()),
            Path(2),
            update_body(Some("Bia"), Some("ana@x.com"), None),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));

        let stored = state.store.list_users().await.unwrap();
        assert_eq!(stored[1].email, "bia@x.com");
    }

    #[tokio::test]
    async fn update_with_password_rehashes() {
        let state = AppState::in_memory();
        create_user(
            State(state.clone()),
            create_body(Some("Ana"), Some("ana@x.com"), Some("pw123")),
        )
        .await
        .unwrap();
        let before = state.store.list_users().await.unwrap()[0]
            .password_hash
            .clone();

        update_user(
            State(state.clone()),
            Path(1),
            update_body(Some("Ana"), Some("ana@x.com"), Some("new-password")),
        )
        .await
        .unwrap();

        let after = state.store.list_users().await.unwrap()[0]
            .password_hash
            .clone();
        assert_ne!(before, after);
        assert_eq!(after, password::hash_password("new-password"));
    }

    #[tokio::test]
    async fn deleting_unknown_user_is_not_found() {
        let state = AppState::in_memory();
        let err = delete_user(State(state.clone()), Path(3)).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn listing_an_empty_table_returns_an_empty_list() {
        let state = AppState::in_memory();
        let Json(items) = list_users(State(state)).await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn full_crud_flow() {
        let state = AppState::in_memory();

        let (status, _) = create_user(
            State(state.clone()),
            create_body(Some("Ana"), Some("ana@x.com"), Some("pw123")),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let Json(items) = list_users(State(state.clone())).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, 1);
        assert_eq!(items[0].name, "Ana");
        assert_eq!(items[0].email, "ana@x.com");

        let Json(body) = update_user(
            State(state.clone()),
            Path(1),
            update_body(Some("Ana B"), Some("ana@x.com"), None),
        )
        .await
        .unwrap();
        assert!(body.message.contains("updated"));

        let Json(body) = delete_user(State(state.clone()), Path(1)).await.unwrap();
        assert!(body.message.contains("deleted"));

        let Json(items) = list_users(State(state)).await.unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn index_page_embeds_the_registration_form() {
        let html = include_str!("../../static/index.html");
        assert!(html.contains("/cadastrar"));
        assert!(html.contains("/usuarios"));
    }
}
