//! User route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use serde_json::{Value, json};

use vitrine_core::UserId;

use crate::db::StoreError;
use crate::db::users::UserRepository;
use crate::error::{AppError, Result};
use crate::models::User;
use crate::services::password::hash_password;
use crate::state::AppState;
use crate::upload::{UploadForm, discard_upload};
use crate::validation::{validate_user_create, validate_user_patch};

/// Message returned when `PATCH /users/{id}` targets a missing user.
pub const USER_NOT_FOUND: &str = "Usuário não encontrado";

/// List all users.
pub async fn index(State(state): State<AppState>) -> Json<Vec<User>> {
    Json(UserRepository::new(state.store()).list().await)
}

/// Show a single user.
///
/// # Errors
///
/// Returns 404 if the ID is not numeric or no user has it.
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<User>> {
    let id = id.parse::<UserId>().map_err(|_| StoreError::NotFound)?;
    let user = UserRepository::new(state.store())
        .get_by_id(id)
        .await
        .ok_or(StoreError::NotFound)?;
    Ok(Json(user))
}

/// Create a user.
///
/// The plaintext password is validated, hashed and dropped; only the hash is
/// stored. Answers 201 with the stored record.
///
/// # Errors
///
/// Returns 400 with the field errors, or 500 if hashing or the store fails.
pub async fn create(
    State(state): State<AppState>,
    form: UploadForm,
) -> Result<(StatusCode, Json<User>)> {
    let (input, upload) = form.validate(validate_user_create)?;

    let result: Result<User> = async {
        let password_hash = hash_password(&input.password)?;
        let user = UserRepository::new(state.store())
            .create(input, password_hash, Utc::now())
            .await?;
        Ok(user)
    }
    .await;

    match result {
        Ok(user) => Ok((StatusCode::CREATED, Json(user))),
        Err(e) => {
            discard_upload(upload);
            Err(e)
        }
    }
}

/// Partially update a user.
///
/// Only the fields present in the request are validated and merged; a new
/// password is hashed before it is stored. `updatedAt` is stamped.
///
/// # Errors
///
/// Returns 400 with the field errors, 404 if the user does not exist
/// (nothing is written), or 500 if hashing or the store fails.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    form: UploadForm,
) -> Result<Json<User>> {
    let (mut changes, upload) = form.validate(validate_user_patch)?;
    let users = UserRepository::new(state.store());

    let result: Result<User> = async {
        let id = id
            .parse::<UserId>()
            .map_err(|_| AppError::NotFound(USER_NOT_FOUND))?;
        let existing = users
            .get_by_id(id)
            .await
            .ok_or(AppError::NotFound(USER_NOT_FOUND))?;

        let password_hash = changes
            .password
            .take()
            .map(|password| hash_password(&password))
            .transpose()?;

        users
            .assign(existing.merge(changes, password_hash, Utc::now()))
            .await
            .map_err(|e| match e {
                StoreError::NotFound => AppError::NotFound(USER_NOT_FOUND),
                other => other.into(),
            })
    }
    .await;

    match result {
        Ok(user) => Ok(Json(user)),
        Err(e) => {
            discard_upload(upload);
            Err(e)
        }
    }
}

/// Delete a user.
///
/// # Errors
///
/// Returns 404 if there is no such user, or 500 if the store cannot be
/// written.
pub async fn destroy(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>> {
    let id = id.parse::<UserId>().map_err(|_| StoreError::NotFound)?;
    UserRepository::new(state.store()).delete(id).await?;
    Ok(Json(json!({})))
}
