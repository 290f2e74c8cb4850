//! Dashboard summary cards and short lists

use axum::extract::State;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::AdminState;
use crate::error::ApiError;
use crate::extract::{Json, Query};
use crate::models::{Debate, DebateStatus, PageRequest, Report, ReportStatus, User};
use crate::response::{ApiResponse, ApiResult};

const MAX_LIST_LIMIT: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: i64,
    pub total_debates: i64,
    pub total_comments: i64,
    pub active_debates: i64,
    pub pending_reports: i64,
    pub today_new_users: i64,
    pub today_new_debates: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitParams {
    pub limit: Option<u32>,
}

impl LimitParams {
    fn resolve(&self, default: u32) -> u32 {
        self.limit.unwrap_or(default).clamp(1, MAX_LIST_LIMIT)
    }
}

/// `[00:00, 24:00)` of `day` in UTC
pub(crate) fn day_bounds(day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc.from_utc_datetime(&day.and_time(chrono::NaiveTime::MIN));
    (start, start + Duration::days(1))
}

pub fn stats_at(state: &AdminState, now: DateTime<Utc>) -> Result<DashboardStats, ApiError> {
    let (today_start, today_end) = day_bounds(now.date_naive());

    Ok(DashboardStats {
        total_users: state.users.count()?,
        total_debates: state.debates.count()?,
        total_comments: state.comments.count()?,
        active_debates: state.debates.count_by_status(DebateStatus::Active)?,
        pending_reports: state.reports.count_by_status(ReportStatus::Pending)?,
        today_new_users: state.users.count_created_between(today_start, today_end)?,
        today_new_debates: state.debates.count_created_between(today_start, today_end)?,
    })
}

pub fn pending_reports(state: &AdminState, limit: u32) -> Result<Vec<Report>, ApiError> {
    let page = state
        .reports
        .list(Some(ReportStatus::Pending), PageRequest::new(Some(0), Some(limit)))?;
    Ok(page.content)
}

pub async fn get_stats(State(state): State<AdminState>) -> ApiResult<DashboardStats> {
    Ok(Json(ApiResponse::ok(stats_at(&state, Utc::now())?)))
}

pub async fn get_recent_users(
    State(state): State<AdminState>,
    Query(params): Query<LimitParams>,
) -> ApiResult<Vec<User>> {
    Ok(Json(ApiResponse::ok(state.users.recent(params.resolve(10))?)))
}

pub async fn get_top_debates(
    State(state): State<AdminState>,
    Query(params): Query<LimitParams>,
) -> ApiResult<Vec<Debate>> {
    Ok(Json(ApiResponse::ok(state.debates.top_by_views(params.resolve(5))?)))
}

pub async fn get_pending_reports(
    State(state): State<AdminState>,
    Query(params): Query<LimitParams>,
) -> ApiResult<Vec<Report>> {
    Ok(Json(ApiResponse::ok(pending_reports(&state, params.resolve(10))?)))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::models::{AdminRole, ReportTargetType};
    use crate::store::NewReport;
    use axum::http::StatusCode;

    #[test]
    fn test_day_bounds() {
        let day = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let (start, end) = day_bounds(day);
        assert_eq!(start.to_rfc3339(), "2024-02-29T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2024-03-01T00:00:00+00:00");
    }

    #[test]
    fn test_stats_counts() {
        let (state, _dir) = test_state();
        let first = seed_debate(&state, "One");
        let second = seed_debate(&state, "Two");
        state.comments.insert(first.user_id, first.id, None, "hi").unwrap();

        let mut active = second.clone();
        active.status = DebateStatus::Active;
        state.debates.update(&active).unwrap();

        state
            .reports
            .insert(NewReport {
                reporter_id: first.user_id,
                target_type: ReportTargetType::Debate,
                target_id: first.id,
                reason: "spam".to_string(),
                description: None,
            })
            .unwrap();

        let stats = stats_at(&state, Utc::now()).unwrap();
        assert_eq!(
            stats,
            DashboardStats {
                total_users: 1,
                total_debates: 2,
                total_comments: 1,
                active_debates: 1,
                pending_reports: 1,
                today_new_users: 1,
                today_new_debates: 2,
            }
        );

        let tomorrow = stats_at(&state, Utc::now() + Duration::days(1)).unwrap();
        assert_eq!(tomorrow.today_new_users, 0);
        assert_eq!(tomorrow.today_new_debates, 0);
    }

    #[tokio::test]
    async fn test_lists_respect_limit() {
        let (state, _dir) = test_state();
        let (_, token) = seed_admin(&state, "root", AdminRole::SuperAdmin);
        let popular = seed_debate(&state, "Popular");
        let quiet = seed_debate(&state, "Quiet");
        state.debates.set_view_count(popular.id, 50).unwrap();
        state.debates.set_view_count(quiet.id, 3).unwrap();
        seed_user(&state, "newest@x.com", "newest");

        let (status, body) = send(
            &state,
            "GET",
            "/api/admin/dashboard/top-debates?limit=1",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"][0]["title"], "Popular");

        let (_, body) = send(&state, "GET", "/api/admin/dashboard/recent-users", Some(&token), None).await;
        assert_eq!(body["data"][0]["email"], "newest@x.com");

        let (_, body) = send(&state, "GET", "/api/admin/dashboard/pending-reports", Some(&token), None).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 0);

        let (_, body) = send(&state, "GET", "/api/admin/dashboard/stats", Some(&token), None).await;
        assert_eq!(body["data"]["totalDebates"], 2);
        assert_eq!(body["data"]["totalUsers"], 2);
    }
}
