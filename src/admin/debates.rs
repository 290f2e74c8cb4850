//! Debate moderation

use axum::extract::State;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use tracing::info;

use super::{not_found, AdminState};
use crate::error::ApiError;
use crate::extract::{Json, Path, Query};
use crate::models::{Debate, DebateStatus, Page, PageRequest};
use crate::response::{ApiResponse, ApiResult};
use crate::store::DebateFilter;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebateSearchParams {
    pub keyword: Option<String>,
    pub status: Option<DebateStatus>,
    pub is_hidden: Option<bool>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebateUpdateParams {
    pub title: Option<String>,
    pub content: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DebateStatusParams {
    pub status: DebateStatus,
}

/// RFC 3339, or a zone-less `YYYY-MM-DDTHH:MM:SS[.fff]` read as UTC
pub fn parse_datetime(field: &str, value: &str) -> Result<DateTime<Utc>, ApiError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|_| ApiError::bad_request(format!("Invalid {}: {}", field, value)))
}

pub fn search_debates(
    state: &AdminState,
    params: DebateSearchParams,
) -> Result<Page<Debate>, ApiError> {
    let page = PageRequest::new(params.page, params.size);
    let filter = DebateFilter {
        keyword: params.keyword,
        status: params.status,
        is_hidden: params.is_hidden,
    };
    Ok(state.debates.search(&filter, page)?)
}

pub fn find_debate(state: &AdminState, id: i64) -> Result<Debate, ApiError> {
    state.debates.find_by_id(id)?.ok_or_else(|| not_found("Debate"))
}

pub fn update_debate(
    state: &AdminState,
    id: i64,
    params: DebateUpdateParams,
) -> Result<Debate, ApiError> {
    let mut debate = find_debate(state, id)?;

    if let Some(title) = params.title {
        if title.trim().is_empty() {
            return Err(ApiError::bad_request("Title must not be blank"));
        }
        debate.title = title;
    }
    if let Some(content) = params.content {
        debate.content = content;
    }
    if let Some(start) = params.start_date.as_deref() {
        debate.start_date = parse_datetime("startDate", start)?;
    }
    if let Some(end) = params.end_date.as_deref() {
        debate.end_date = parse_datetime("endDate", end)?;
    }
    if debate.end_date < debate.start_date {
        return Err(ApiError::bad_request("End date must not be before start date"));
    }

    let debate = state.debates.update(&debate)?;
    info!("[ADMIN-DEBATE] Debate updated - id: {}", id);
    Ok(debate)
}

pub fn update_debate_status(
    state: &AdminState,
    id: i64,
    status: DebateStatus,
) -> Result<Debate, ApiError> {
    let mut debate = find_debate(state, id)?;
    debate.status = status;
    let debate = state.debates.update(&debate)?;

    info!("[ADMIN-DEBATE] Status changed - id: {}, status: {}", id, status);
    Ok(debate)
}

pub fn toggle_hidden(state: &AdminState, id: i64) -> Result<Debate, ApiError> {
    let mut debate = find_debate(state, id)?;
    debate.is_hidden = !debate.is_hidden;
    let debate = state.debates.update(&debate)?;

    info!("[ADMIN-DEBATE] Visibility toggled - id: {}, hidden: {}", id, debate.is_hidden);
    Ok(debate)
}

pub fn delete_debate_by_id(state: &AdminState, id: i64) -> Result<(), ApiError> {
    if !state.debates.delete(id)? {
        return Err(not_found("Debate"));
    }
    info!("[ADMIN-DEBATE] Debate deleted - id: {}", id);
    Ok(())
}

pub async fn get_debates(
    State(state): State<AdminState>,
    Query(params): Query<DebateSearchParams>,
) -> ApiResult<Page<Debate>> {
    Ok(Json(ApiResponse::ok(search_debates(&state, params)?)))
}

pub async fn get_debate(State(state): State<AdminState>, Path(id): Path<i64>) -> ApiResult<Debate> {
    Ok(Json(ApiResponse::ok(find_debate(&state, id)?)))
}

pub async fn put_debate(
    State(state): State<AdminState>,
    Path(id): Path<i64>,
    Query(params): Query<DebateUpdateParams>,
) -> ApiResult<Debate> {
    let debate = update_debate(&state, id, params)?;
    Ok(Json(ApiResponse::with_message("Debate updated", debate)))
}

pub async fn put_debate_status(
    State(state): State<AdminState>,
    Path(id): Path<i64>,
    Query(params): Query<DebateStatusParams>,
) -> ApiResult<Debate> {
    let debate = update_debate_status(&state, id, params.status)?;
    Ok(Json(ApiResponse::with_message("Debate status updated", debate)))
}

pub async fn put_debate_toggle_hidden(
    State(state): State<AdminState>,
    Path(id): Path<i64>,
) -> ApiResult<Debate> {
    let debate = toggle_hidden(&state, id)?;
    Ok(Json(ApiResponse::with_message("Debate visibility changed", debate)))
}

pub async fn delete_debate(State(state): State<AdminState>, Path(id): Path<i64>) -> ApiResult<()> {
    delete_debate_by_id(&state, id)?;
    Ok(Json(ApiResponse::done("Debate deleted")))
}
