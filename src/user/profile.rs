//! The signed-in user's own profile

use axum::extract::State;
use serde::Deserialize;
use tracing::info;

use super::UserState;
use crate::auth::Principal;
use crate::error::ApiError;
use crate::extract::{Json, Query};
use crate::models::User;
use crate::response::{ApiResponse, ApiResult};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileParams {
    pub nickname: Option<String>,
    pub bio: Option<String>,
    pub profile_image: Option<String>,
}

fn current_user(state: &UserState, principal: &Principal) -> Result<User, ApiError> {
    state
        .users
        .find_by_id(principal.id)?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

pub fn update_profile(
    state: &UserState,
    principal: &Principal,
    params: ProfileParams,
) -> Result<User, ApiError> {
    let mut user = current_user(state, principal)?;

    if let Some(nickname) = params.nickname {
        let nickname = nickname.trim().to_string();
        if nickname.is_empty() || nickname.chars().count() > 50 {
            return Err(ApiError::bad_request("Nickname must be 1-50 characters"));
        }
        if nickname != user.nickname && state.users.exists_by_nickname(&nickname)? {
            return Err(ApiError::bad_request("Nickname is already in use"));
        }
        user.nickname = nickname;
    }
    if let Some(bio) = params.bio {
        if bio.chars().count() > 500 {
            return Err(ApiError::bad_request("Bio must be at most 500 characters"));
        }
        user.bio = Some(bio);
    }
    if let Some(image) = params.profile_image {
        user.profile_image = Some(image);
    }

    let user = state.users.update(&user)?;
    info!("[USER-PROFILE] Profile updated - id: {}", user.id);
    Ok(user)
}

pub async fn get_me(State(state): State<UserState>, principal: Principal) -> ApiResult<User> {
    Ok(Json(ApiResponse::ok(current_user(&state, &principal)?)))
}

pub async fn put_me(
    State(state): State<UserState>,
    principal: Principal,
    Query(params): Query<ProfileParams>,
) -> ApiResult<User> {
    let user = update_profile(&state, &principal, params)?;
    Ok(Json(ApiResponse::with_message("Profile updated", user)))
}
