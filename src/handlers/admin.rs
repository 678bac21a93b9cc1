// src/handlers/admin.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use validator::Validate;

use crate::{
    error::AppError,
    models::user::{NewUser, Role},
    state::SharedStore,
    utils::{
        credentials::validate_username_format, extract::AppJson, hash::hash_password, jwt::Session,
    },
};

/// DTO for an admin creating an account with an explicit role.
#[derive(Debug, Deserialize, Validate)]
pub struct AdminCreateUserRequest {
    #[validate(
        length(min = 3, max = 50, message = "Username length must be between 3 and 50 characters."),
        custom(function = validate_username_format)
    )]
    pub username: String,
    #[validate(length(min = 8, max = 128, message = "Password length must be between 8 and 128 characters."))]
    pub password: String,
    pub role: Role,
}

/// Creates a user with any role (this is how teacher accounts are made).
/// Admin only.
pub async fn create_user(
    State(store): State<SharedStore>,
    session: Session,
    AppJson(payload): AppJson<AdminCreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    if session.role != Role::Admin {
        return Err(AppError::Forbidden("Only admins can create accounts".to_string()));
    }
    payload.validate()?;

    let user = store
        .create_user(NewUser {
            username: payload.username,
            password: hash_password(&payload.password)?,
            role: payload.role,
        })
        .await?;

    tracing::info!(user_id = user.id, role = %user.role, created_by = session.user_id, "Admin created user");

    Ok((StatusCode::CREATED, Json(user)))
}
