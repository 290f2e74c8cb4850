//! Registration, login and availability checks

use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::UserState;
use crate::auth::authenticate_credentials;
use crate::db::StoreError;
use crate::error::ApiError;
use crate::extract::{Json, Query};
use crate::models::User;
use crate::response::{ApiResponse, ApiResult};
use crate::store::NewUser;
use crate::validation::{validate_email, FieldErrors};

const EMAIL_TAKEN: &str = "Email is already in use";
const NICKNAME_TAKEN: &str = "Nickname is already in use";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub nickname: String,
    pub bio: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserAuthResponse {
    pub token: String,
    #[serde(rename = "type")]
    pub token_type: &'static str,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct EmailParams {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct NicknameParams {
    #[serde(default)]
    pub nickname: String,
}

fn issue(state: &UserState, user: User) -> Result<UserAuthResponse, ApiError> {
    let token = state.jwt.generate_token(user.id, &user.email)?;
    Ok(UserAuthResponse {
        token,
        token_type: "Bearer",
        user,
    })
}

/// Create an ACTIVE, unverified account and sign it in.
///
/// The store re-checks the email inside its insert transaction, so two
/// concurrent registrations of one address cannot both succeed.
pub fn register(state: &UserState, request: RegisterRequest) -> Result<UserAuthResponse, ApiError> {
    let mut errors = FieldErrors::new();
    errors.require("email", &request.email, "Email is required");
    if !request.email.trim().is_empty() && !validate_email(&request.email) {
        errors.add("email", "Email format is invalid");
    }
    errors.max_len("email", &request.email, 100);
    errors.require("password", &request.password, "Password is required");
    errors.require("nickname", &request.nickname, "Nickname is required");
    errors.max_len("nickname", &request.nickname, 50);
    if let Some(bio) = &request.bio {
        errors.max_len("bio", bio, 500);
    }
    errors.finish()?;

    if state.users.exists_by_email(&request.email)? {
        warn!("[USER-AUTH] Registration rejected - email taken: {}", request.email);
        return Err(ApiError::bad_request(EMAIL_TAKEN));
    }

    let password_hash = state.hasher.hash(&request.password)?;
    let user = state
        .users
        .insert(NewUser {
            username: request.email.clone(),
            email: request.email,
            password_hash,
            nickname: request.nickname,
            bio: request.bio,
        })
        .map_err(|e| match e {
            StoreError::Duplicate(_) => ApiError::bad_request(EMAIL_TAKEN),
            other => other.into(),
        })?;

    info!("[USER-AUTH] Registered - id: {}, email: {}", user.id, user.email);
    issue(state, user)
}

pub fn login(state: &UserState, request: &LoginRequest) -> Result<UserAuthResponse, ApiError> {
    let mut errors = FieldErrors::new();
    errors.require("email", &request.email, "Email is required");
    errors.require("password", &request.password, "Password is required");
    errors.finish()?;

    let user = authenticate_credentials(
        &state.users,
        state.hasher.as_ref(),
        &request.email,
        &request.password,
    )?;

    info!("[USER-AUTH] Login successful - id: {}", user.id);
    issue(state, user)
}

pub async fn post_register(
    State(state): State<UserState>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<UserAuthResponse> {
    let response = register(&state, request)?;
    Ok(Json(ApiResponse::with_message("Registration completed", response)))
}

pub async fn post_login(
    State(state): State<UserState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<UserAuthResponse> {
    let response = login(&state, &request)?;
    Ok(Json(ApiResponse::with_message("Login successful", response)))
}

pub async fn get_check_email(
    State(state): State<UserState>,
    Query(params): Query<EmailParams>,
) -> ApiResult<bool> {
    if params.email.trim().is_empty() {
        return Err(ApiError::bad_request("Email is required"));
    }
    if state.users.exists_by_email(&params.email)? {
        return Err(ApiError::Conflict(EMAIL_TAKEN.to_string()));
    }
    Ok(Json(ApiResponse::with_message("Email is available", true)))
}

pub async fn get_check_nickname(
    State(state): State<UserState>,
    Query(params): Query<NicknameParams>,
) -> ApiResult<bool> {
    if params.nickname.trim().is_empty() {
        return Err(ApiError::bad_request("Nickname is required"));
    }
    if state.users.exists_by_nickname(&params.nickname)? {
        return Err(ApiError::Conflict(NICKNAME_TAKEN.to_string()));
    }
    Ok(Json(ApiResponse::with_message("Nickname is available", true)))
}
