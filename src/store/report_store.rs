//! Report Storage

use chrono::Utc;
use rusqlite::{params, Row};
use tracing::info;

use crate::db::{Database, StoreError, StoreResult};
use crate::models::{Page, PageRequest, Report, ReportStatus, ReportTargetType};
use crate::store::{query_one, Filter};

const REPORT_COLUMNS: &str = "id, reporter_id, target_type, target_id, reason, description, \
                              status, processed_by, processed_at, created_at";

#[derive(Debug, Clone)]
pub struct NewReport {
    pub reporter_id: i64,
    pub target_type: ReportTargetType,
    pub target_id: i64,
    pub reason: String,
    pub description: Option<String>,
}

#[derive(Clone)]
pub struct ReportStore {
    db: Database,
}

fn map_report(row: &Row<'_>) -> rusqlite::Result<Report> {
    Ok(Report {
        id: row.get(0)?,
        reporter_id: row.get(1)?,
        target_type: row.get(2)?,
        target_id: row.get(3)?,
        reason: row.get(4)?,
        description: row.get(5)?,
        status: row.get(6)?,
        processed_by: row.get(7)?,
        processed_at: row.get(8)?,
        created_at: row.get(9)?,
    })
}

impl ReportStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn insert(&self, new: NewReport) -> StoreResult<Report> {
        let id = self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO reports (reporter_id, target_type, target_id, reason, description,
                                      status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    new.reporter_id,
                    new.target_type,
                    new.target_id,
                    new.reason,
                    new.description,
                    ReportStatus::Pending,
                    Utc::now()
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })?;

        self.find_by_id(id)?
            .ok_or_else(|| StoreError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    pub fn find_by_id(&self, id: i64) -> StoreResult<Option<Report>> {
        self.db.with_conn(|conn| {
            query_one(
                conn,
                &format!("SELECT {} FROM reports WHERE id = ?1", REPORT_COLUMNS),
                params![id],
                map_report,
            )
        })
    }

    /// Optionally restricted to one status; newest first
    pub fn list(&self, status: Option<ReportStatus>, page: PageRequest) -> StoreResult<Page<Report>> {
        let mut filter = Filter::default();
        if let Some(status) = status {
            filter.push("status = {}", status);
        }

        self.db.with_conn(|conn| {
            let where_sql = filter.where_sql();
            let total: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM reports{}", where_sql),
                filter.params().as_slice(),
                |row| row.get(0),
            )?;

            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM reports{} ORDER BY created_at DESC, id DESC LIMIT {} OFFSET {}",
                REPORT_COLUMNS,
                where_sql,
                page.limit(),
                page.offset()
            ))?;
            let reports = stmt
                .query_map(filter.params().as_slice(), map_report)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(Page::new(reports, total as u64, page))
        })
    }

    /// Record the decision, who made it and when
    pub fn process(
        &self,
        id: i64,
        status: ReportStatus,
        processed_by: i64,
    ) -> StoreResult<Option<Report>> {
        let rows = self.db.with_conn(|conn| {
            Ok(conn.execute(
                "UPDATE reports SET status = ?1, processed_by = ?2, processed_at = ?3 WHERE id = ?4",
                params![status, processed_by, Utc::now(), id],
            )?)
        })?;
        if rows == 0 {
            return Ok(None);
        }

        info!("✅ Report {} processed as {} by {}", id, status, processed_by);
        self.find_by_id(id)
    }

    pub fn count_by_status(&self, status: ReportStatus) -> StoreResult<i64> {
        self.db.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM reports WHERE status = ?1",
                params![status],
                |row| row.get(0),
            )?)
        })
    }
}
