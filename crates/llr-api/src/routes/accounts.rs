//! # Accounts API
//!
//! Routes:
//! - POST /register — create an account
//! - POST /login — exchange email and password for a bearer token
//!
//! Both are public. Password hashing and verification run on the
//! blocking pool.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{hash_password, verify_password, UserAccount};
use crate::error::AppError;
use crate::extractors::{check_len, extract_validated_json, Validate, MAX_FIELD_LEN};
use crate::routes::MessageResponse;
use crate::state::AppState;

/// Request to register an account.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), String> {
        if self.username.trim().is_empty()
            || self.email.trim().is_empty()
            || self.password.is_empty()
        {
            return Err("username, email and password are required".to_string());
        }
        if !self.email.contains('@') {
            return Err("email must be a valid address".to_string());
        }
        check_len("username", &self.username, MAX_FIELD_LEN)?;
        check_len("email", &self.email, MAX_FIELD_LEN)?;
        check_len("password", &self.password, MAX_FIELD_LEN)?;
        Ok(())
    }
}

/// Request to log in. `loginId` is the account's email.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub login_id: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), String> {
        if self.login_id.trim().is_empty() || self.password.is_empty() {
            return Err("loginId and password are required".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    /// Bearer token for `Authorization: Bearer <token>`.
    pub token: String,
    pub username: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// POST /register — Create an account.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = MessageResponse),
        (status = 400, description = "Missing or invalid fields", body = crate::error::ErrorBody),
        (status = 409, description = "Email already registered", body = crate::error::ErrorBody),
    ),
    tag = "accounts"
)]
pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let req = extract_validated_json(body)?;

    let password = req.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(format!("hashing task failed: {e}")))??;

    let account = UserAccount::new(
        req.username.trim(),
        req.email.trim(),
        password_hash,
        Utc::now(),
    );
    let user_id = account.id;
    state.users.register(account).await?;

    tracing::info!(%user_id, "account registered");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Registration successful!".to_string(),
        }),
    ))
}

/// POST /login — Issue a bearer token.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Unknown user or wrong password", body = crate::error::ErrorBody),
    ),
    tag = "accounts"
)]
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let req = extract_validated_json(body)?;

    let user = state
        .users
        .find_by_login(&req.login_id)
        .ok_or_else(|| AppError::InvalidCredentials("User not found".to_string()))?;

    let password = req.password;
    let stored = user.password_hash.clone();
    let verified = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
        .await
        .map_err(|e| AppError::Internal(format!("verification task failed: {e}")))??;
    if !verified {
        tracing::warn!(user_id = %user.id, "login rejected: wrong password");
        return Err(AppError::InvalidCredentials(
            "Invalid credentials".to_string(),
        ));
    }

    let token = state.signer.issue(&user, Utc::now())?;
    tracing::info!(user_id = %user.id, "login succeeded");
    Ok(Json(LoginResponse {
        token,
        username: user.username,
    }))
}
