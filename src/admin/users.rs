//! User moderation

use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{not_found, AdminState};
use crate::error::ApiError;
use crate::extract::{Json, Path, Query};
use crate::models::{Page, PageRequest, User, UserStatus};
use crate::response::{ApiResponse, ApiResult};

#[derive(Debug, Default, Deserialize)]
pub struct UserSearchParams {
    pub keyword: Option<String>,
    pub status: Option<UserStatus>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct UserStatusParams {
    pub status: UserStatus,
}

/// A user plus activity counters
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: User,
    pub debate_count: i64,
    pub comment_count: i64,
}

pub fn search_users(state: &AdminState, params: &UserSearchParams) -> Result<Page<User>, ApiError> {
    let page = PageRequest::new(params.page, params.size);
    Ok(state
        .users
        .search(params.keyword.as_deref(), params.status, page)?)
}

fn find_user(state: &AdminState, id: i64) -> Result<User, ApiError> {
    state.users.find_by_id(id)?.ok_or_else(|| not_found("User"))
}

pub fn user_detail(state: &AdminState, id: i64) -> Result<UserDetail, ApiError> {
    let user = find_user(state, id)?;
    Ok(UserDetail {
        debate_count: state.debates.count_visible_by_user(user.id)?,
        comment_count: state.comments.count_by_user(user.id)?,
        user,
    })
}

pub fn update_user_status(state: &AdminState, id: i64, status: UserStatus) -> Result<User, ApiError> {
    let mut user = find_user(state, id)?;
    let previous = user.status;
    user.status = status;
    let user = state.users.update(&user)?;

    info!("[ADMIN-USER] Status changed - userId: {}, {} -> {}", id, previous, status);
    Ok(user)
}

/// Soft delete: the row stays, status becomes DELETED
pub fn delete_user_by_id(state: &AdminState, id: i64) -> Result<(), ApiError> {
    update_user_status(state, id, UserStatus::Deleted)?;
    info!("[ADMIN-USER] User deleted - userId: {}", id);
    Ok(())
}

pub async fn get_users(
    State(state): State<AdminState>,
    Query(params): Query<UserSearchParams>,
) -> ApiResult<Page<User>> {
    Ok(Json(ApiResponse::ok(search_users(&state, &params)?)))
}

pub async fn get_user(State(state): State<AdminState>, Path(id): Path<i64>) -> ApiResult<UserDetail> {
    Ok(Json(ApiResponse::ok(user_detail(&state, id)?)))
}

pub async fn put_user_status(
    State(state): State<AdminState>,
    Path(id): Path<i64>,
    Query(params): Query<UserStatusParams>,
) -> ApiResult<User> {
    let user = update_user_status(&state, id, params.status)?;
    Ok(Json(ApiResponse::with_message("User status updated", user)))
}

pub async fn delete_user(State(state): State<AdminState>, Path(id): Path<i64>) -> ApiResult<()> {
    delete_user_by_id(&state, id)?;
    Ok(Json(ApiResponse::done("User deleted")))
}
