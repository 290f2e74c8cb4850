//! Comment moderation

use axum::extract::State;
use serde::Deserialize;
use tracing::info;

use super::{not_found, AdminState};
use crate::error::ApiError;
use crate::extract::{Json, Path, Query};
use crate::models::{Comment, Page, PageRequest};
use crate::response::{ApiResponse, ApiResult};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentSearchParams {
    pub keyword: Option<String>,
    pub is_hidden: Option<bool>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

pub fn search_comments(
    state: &AdminState,
    params: &CommentSearchParams,
) -> Result<Page<Comment>, ApiError> {
    let page = PageRequest::new(params.page, params.size);
    Ok(state
        .comments
        .search(params.keyword.as_deref(), params.is_hidden, page)?)
}

pub fn find_comment(state: &AdminState, id: i64) -> Result<Comment, ApiError> {
    state.comments.find_by_id(id)?.ok_or_else(|| not_found("Comment"))
}

pub fn toggle_hidden(state: &AdminState, id: i64) -> Result<Comment, ApiError> {
    let current = find_comment(state, id)?;
    let comment = state
        .comments
        .set_hidden(id, !current.is_hidden)?
        .ok_or_else(|| not_found("Comment"))?;

    info!("[ADMIN-COMMENT] Visibility toggled - id: {}, hidden: {}", id, comment.is_hidden);
    Ok(comment)
}

pub fn delete_comment_by_id(state: &AdminState, id: i64) -> Result<(), ApiError> {
    if !state.comments.delete(id)? {
        return Err(not_found("Comment"));
    }
    info!("[ADMIN-COMMENT] Comment deleted - id: {}", id);
    Ok(())
}

pub async fn get_comments(
    State(state): State<AdminState>,
    Query(params): Query<CommentSearchParams>,
) -> ApiResult<Page<Comment>> {
    Ok(Json(ApiResponse::ok(search_comments(&state, &params)?)))
}

pub async fn get_comment(State(state): State<AdminState>, Path(id): Path<i64>) -> ApiResult<Comment> {
    Ok(Json(ApiResponse::ok(find_comment(&state, id)?)))
}

pub async fn put_comment_toggle_hidden(
    State(state): State<AdminState>,
    Path(id): Path<i64>,
) -> ApiResult<Comment> {
    let comment = toggle_hidden(&state, id)?;
    Ok(Json(ApiResponse::with_message("Comment visibility changed", comment)))
}

pub async fn delete_comment(State(state): State<AdminState>, Path(id): Path<i64>) -> ApiResult<()> {
    delete_comment_by_id(&state, id)?;
    Ok(Json(ApiResponse::done("Comment deleted")))
}
