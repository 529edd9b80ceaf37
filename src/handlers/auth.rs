//! /api/auth handlers: registration, login, profile, password,
//! availability checks.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::auth::token;
use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::Identity;
use crate::state::AppState;

const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username_or_email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            display_name: user.display_name,
            avatar_url: user.avatar_url,
            created_at: user.created_at,
            last_login_at: user.last_login_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub available: bool,
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_registration(&payload)?;

    let user = state
        .user_service
        .register(&payload.username, &payload.email, &payload.password)
        .await?;

    let token = token::issue_token(&user.username, user.id)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            username: user.username,
            email: user.email,
            display_name: user.display_name,
        }),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .user_service
        .authenticate(&payload.username_or_email, &payload.password)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid username/email or password"))?;

    let token = token::issue_token(&user.username, user.id)?;
    Ok(Json(AuthResponse {
        token,
        username: user.username,
        email: user.email,
        display_name: user.display_name,
    }))
}

/// GET /api/auth/profile
pub async fn get_profile(
    State(state): State<AppState>,
    Identity(identity): Identity,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = state.user_service.get_profile(identity.user_id()).await?;
    Ok(Json(user.into()))
}

/// PUT /api/auth/profile
pub async fn update_profile(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = state
        .user_service
        .update_profile(
            identity.user_id(),
            payload.display_name.as_deref(),
            payload.avatar_url.as_deref(),
        )
        .await?;
    Ok(Json(user.into()))
}

/// PUT /api/auth/password
pub async fn change_password(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    if payload.new_password.len() < MIN_PASSWORD_LENGTH {
        let mut field_errors = HashMap::new();
        field_errors.insert(
            "newPassword".to_string(),
            format!("must be at least {MIN_PASSWORD_LENGTH} characters"),
        );
        return Err(ApiError::validation_error(
            "Validation failed",
            Some(field_errors),
        ));
    }

    state
        .user_service
        .change_password(
            identity.user_id(),
            &payload.old_password,
            &payload.new_password,
        )
        .await?;
    Ok(StatusCode::OK)
}

/// GET /api/auth/check-username/:username
pub async fn check_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    let available = state.user_service.is_username_available(&username).await?;
    Ok(Json(AvailabilityResponse { available }))
}

/// GET /api/auth/check-email/:email
pub async fn check_email(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    let available = state.user_service.is_email_available(&email).await?;
    Ok(Json(AvailabilityResponse { available }))
}

/// POST /api/auth/logout
///
/// Stateless tokens: logout is a client-side discard. The endpoint
/// exists so clients have a uniform call to make.
pub async fn logout() -> StatusCode {
    StatusCode::OK
}

fn validate_registration(payload: &RegisterRequest) -> Result<(), ApiError> {
    let mut field_errors = HashMap::new();

    if let Err(msg) = validate_username(&payload.username) {
        field_errors.insert("username".to_string(), msg);
    }
    if let Err(msg) = validate_email(&payload.email) {
        field_errors.insert("email".to_string(), msg);
    }
    if payload.password.len() < MIN_PASSWORD_LENGTH {
        field_errors.insert(
            "password".to_string(),
            format!("must be at least {MIN_PASSWORD_LENGTH} characters"),
        );
    }

    if field_errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::validation_error(
            "Validation failed",
            Some(field_errors),
        ))
    }
}

fn validate_username(username: &str) -> Result<(), String> {
    if username.len() < 3 {
        return Err("must be at least 3 characters".to_string());
    }
    if username.len() > 50 {
        return Err("must be at most 50 characters".to_string());
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
    {
        return Err("may only contain letters, numbers, underscore, and hyphen".to_string());
    }
    // Guaranteed non-empty by the length check
    if !username.chars().next().unwrap().is_alphanumeric() {
        return Err("must start with a letter or number".to_string());
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), String> {
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() || !parts[1].contains('.') {
        return Err("Invalid email format".to_string());
    }
    if email.len() > 100 {
        return Err("must be at most 100 characters".to_string());
    }
    Ok(())
}
