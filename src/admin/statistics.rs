//! Aggregate statistics

use axum::extract::State;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::dashboard::day_bounds;
use super::AdminState;
use crate::error::ApiError;
use crate::extract::{Json, Query};
use crate::models::{DebateStatus, UserStatus};
use crate::response::{ApiResponse, ApiResult};

pub const MAX_DAYS: u32 = 365;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatistics {
    pub total_users: i64,
    pub active_users: i64,
    pub suspended_users: i64,
    pub deleted_users: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebateStatistics {
    pub total_debates: i64,
    pub scheduled_debates: i64,
    pub active_debates: i64,
    pub ended_debates: i64,
    pub hidden_debates: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct DaysParams {
    pub days: Option<u32>,
}

/// Daily counts keyed by `YYYY-MM-DD`
pub type DailyCounts = BTreeMap<String, i64>;

pub fn user_statistics(state: &AdminState) -> Result<UserStatistics, ApiError> {
    Ok(UserStatistics {
        total_users: state.users.count()?,
        active_users: state.users.count_by_status(UserStatus::Active)?,
        suspended_users: state.users.count_by_status(UserStatus::Suspended)?,
        deleted_users: state.users.count_by_status(UserStatus::Deleted)?,
    })
}

pub fn debate_statistics(state: &AdminState) -> Result<DebateStatistics, ApiError> {
    Ok(DebateStatistics {
        total_debates: state.debates.count()?,
        scheduled_debates: state.debates.count_by_status(DebateStatus::Scheduled)?,
        active_debates: state.debates.count_by_status(DebateStatus::Active)?,
        ended_debates: state.debates.count_by_status(DebateStatus::Ended)?,
        hidden_debates: state.debates.count_hidden()?,
    })
}

/// One entry per UTC day for the `days` days ending today, zero-filled
pub fn daily_counts<F>(now: DateTime<Utc>, days: u32, mut count: F) -> Result<DailyCounts, ApiError>
where
    F: FnMut(DateTime<Utc>, DateTime<Utc>) -> Result<i64, ApiError>,
{
    let days = days.clamp(1, MAX_DAYS);
    let today = now.date_naive();

    let mut counts = DailyCounts::new();
    for offset in 0..days {
        let day = today - Duration::days(offset as i64);
        let (start, end) = day_bounds(day);
        counts.insert(day.format("%Y-%m-%d").to_string(), count(start, end)?);
    }
    Ok(counts)
}

pub async fn get_user_statistics(State(state): State<AdminState>) -> ApiResult<UserStatistics> {
    Ok(Json(ApiResponse::ok(user_statistics(&state)?)))
}

pub async fn get_debate_statistics(State(state): State<AdminState>) -> ApiResult<DebateStatistics> {
    Ok(Json(ApiResponse::ok(debate_statistics(&state)?)))
}

pub async fn get_daily_users(
    State(state): State<AdminState>,
    Query(params): Query<DaysParams>,
) -> ApiResult<DailyCounts> {
    let counts = daily_counts(Utc::now(), params.days.unwrap_or(7), |from, to| {
        Ok(state.users.count_created_between(from, to)?)
    })?;
    Ok(Json(ApiResponse::ok(counts)))
}

pub async fn get_daily_debates(
    State(state): State<AdminState>,
    Query(params): Query<DaysParams>,
) -> ApiResult<DailyCounts> {
    let counts = daily_counts(Utc::now(), params.days.unwrap_or(7), |from, to| {
        Ok(state.debates.count_created_between(from, to)?)
    })?;
    Ok(Json(ApiResponse::ok(counts)))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::models::AdminRole;
    use axum::http::StatusCode;
    use chrono::TimeZone;

    #[test]
    fn test_daily_counts_window() {
        let now = Utc.with_ymd_and_hms(2024, 3, 2, 15, 0, 0).unwrap();
        let mut seen = Vec::new();

        let counts = daily_counts(now, 3, |from, to| {
            seen.push((from, to));
            Ok(if from.format("%d").to_string() == "01" { 4 } else { 0 })
        })
        .unwrap();

        let keys: Vec<&str> = counts.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["2024-02-29", "2024-03-01", "2024-03-02"]);
        assert_eq!(counts["2024-03-01"], 4);
        assert_eq!(counts["2024-03-02"], 0);
        assert!(seen.iter().all(|(from, to)| *to - *from == Duration::days(1)));
    }

    #[test]
    fn test_daily_counts_clamped() {
        let now = Utc::now();
        assert_eq!(daily_counts(now, 0, |_, _| Ok(0)).unwrap().len(), 1);
        assert_eq!(daily_counts(now, 10_000, |_, _| Ok(0)).unwrap().len(), MAX_DAYS as usize);
    }

    #[tokio::test]
    async fn test_statistics_endpoints() {
        let (state, _dir) = test_state();
        let (_, token) = seed_admin(&state, "root", AdminRole::SuperAdmin);
        let debate = seed_debate(&state, "Counted");
        let mut hidden = debate.clone();
        hidden.is_hidden = true;
        state.debates.update(&hidden).unwrap();

        let (status, body) = send(&state, "GET", "/api/admin/statistics/debates", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["totalDebates"], 1);
        assert_eq!(body["data"]["scheduledDebates"], 1);
        assert_eq!(body["data"]["hiddenDebates"], 1);

        let (_, body) = send(&state, "GET", "/api/admin/statistics/users", Some(&token), None).await;
        assert_eq!(body["data"]["totalUsers"], 1);
        assert_eq!(body["data"]["activeUsers"], 1);

        let today = Utc::now().format("%Y-%m-%d").to_string();
        let (_, body) = send(
            &state,
            "GET",
            "/api/admin/statistics/users/daily?days=3",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(body["data"].as_object().unwrap().len(), 3);
        assert_eq!(body["data"][today.as_str()], 1);

        let (_, body) = send(&state, "GET", "/api/admin/statistics/debates/daily", Some(&token), None).await;
        assert_eq!(body["data"].as_object().unwrap().len(), 7);
    }
}
