//! Report review

use axum::extract::State;
use serde::Deserialize;
use tracing::info;

use super::{not_found, AdminState};
use crate::auth::Principal;
use crate::error::ApiError;
use crate::extract::{Json, Path, Query};
use crate::models::{Page, PageRequest, Report, ReportStatus};
use crate::response::{ApiResponse, ApiResult};

#[derive(Debug, Default, Deserialize)]
pub struct ReportSearchParams {
    pub status: Option<ReportStatus>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ProcessParams {
    pub status: ReportStatus,
}

pub fn list_reports(state: &AdminState, params: &ReportSearchParams) -> Result<Page<Report>, ApiError> {
    let page = PageRequest::new(params.page, params.size);
    Ok(state.reports.list(params.status, page)?)
}

pub fn find_report(state: &AdminState, id: i64) -> Result<Report, ApiError> {
    state.reports.find_by_id(id)?.ok_or_else(|| not_found("Report"))
}

/// Record the decision together with the deciding admin
pub fn process_report(
    state: &AdminState,
    admin: &Principal,
    id: i64,
    status: ReportStatus,
) -> Result<Report, ApiError> {
    if status == ReportStatus::Pending {
        return Err(ApiError::bad_request("Report can only be processed as APPROVED or REJECTED"));
    }

    let report = state
        .reports
        .process(id, status, admin.id)?
        .ok_or_else(|| not_found("Report"))?;

    info!(
        "[ADMIN-REPORT] Report processed - id: {}, status: {}, by: {}",
        id, status, admin.login_key
    );
    Ok(report)
}

pub async fn get_reports(
    State(state): State<AdminState>,
    Query(params): Query<ReportSearchParams>,
) -> ApiResult<Page<Report>> {
    Ok(Json(ApiResponse::ok(list_reports(&state, &params)?)))
}

pub async fn get_report(State(state): State<AdminState>, Path(id): Path<i64>) -> ApiResult<Report> {
    Ok(Json(ApiResponse::ok(find_report(&state, id)?)))
}

pub async fn put_report_process(
    State(state): State<AdminState>,
    admin: Principal,
    Path(id): Path<i64>,
    Query(params): Query<ProcessParams>,
) -> ApiResult<Report> {
    let report = process_report(&state, &admin, id, params.status)?;
    Ok(Json(ApiResponse::with_message("Report processed", report)))
}
