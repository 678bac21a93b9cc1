// src/handlers/auth.rs

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use validator::Validate;

use crate::{
    config::{Config, MIN_PASSWORD_STRENGTH},
    error::AppError,
    models::user::{CreateUserRequest, LoginRequest, NewUser, Role, UsernameQuery},
    state::SharedStore,
    utils::{
        credentials::{password_strength, strength_label, validate_username_format},
        extract::AppJson,
        hash::{hash_password, verify_password},
        jwt::sign_jwt,
    },
};

/// Registers a new student account.
///
/// Rejects weak passwords, hashes with Argon2 and returns 201 with the user
/// (password excluded).
pub async fn register(
    State(store): State<SharedStore>,
    AppJson(payload): AppJson<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let strength = password_strength(&payload.password);
    if strength < MIN_PASSWORD_STRENGTH {
        return Err(AppError::Validation(format!(
            "Password is too weak ({}). Mix letters, digits and symbols.",
            strength_label(strength)
        )));
    }

    let hashed_password = hash_password(&payload.password)?;

    let user = store
        .create_user(NewUser {
            username: payload.username,
            password: hashed_password,
            role: Role::Student,
        })
        .await?;

    tracing::info!(user_id = user.id, "Registered new student");

    Ok((StatusCode::CREATED, Json(user)))
}

/// Authenticates a user and returns a JWT token.
pub async fn login(
    State(store): State<SharedStore>,
    State(config): State<Config>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = store
        .find_user_by_username(&payload.username)
        .await?
        .ok_or(AppError::AuthError("Invalid username or password".to_string()))?;

    if !verify_password(&payload.password, &user.password)? {
        return Err(AppError::AuthError("Invalid username or password".to_string()));
    }

    let role = user
        .role()
        .ok_or_else(|| AppError::InternalServerError(format!("User {} has unknown role", user.id)))?;

    let token = sign_jwt(user.id, role, &config.jwt_secret, config.jwt_expiration)?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "role": role,
        "user_id": user.id,
    })))
}

/// Tells the registration form whether a username can still be taken.
pub async fn check_username(
    State(store): State<SharedStore>,
    Query(query): Query<UsernameQuery>,
) -> Result<impl IntoResponse, AppError> {
    let username = query.username.trim();
    let well_formed = (3..=50).contains(&username.chars().count())
        && validate_username_format(username).is_ok();

    let available = well_formed && store.find_user_by_username(username).await?.is_none();

    Ok(Json(json!({
        "username": username,
        "valid": well_formed,
        "available": available,
    })))
}
