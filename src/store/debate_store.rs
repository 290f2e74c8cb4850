//! Debate Storage
//! Mission: Debate topics with author and category joined in, plus dashboard counts

use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use tracing::info;

use crate::db::{Database, StoreError, StoreResult};
use crate::models::{Debate, DebateStatus, Page, PageRequest};
use crate::store::{like_pattern, query_one, Filter};

const DEBATE_SELECT: &str = "SELECT d.id, d.user_id, u.nickname, d.category_id, c.name, d.title, \
     d.content, d.start_date, d.end_date, d.status, d.is_hidden, d.view_count, d.created_at, \
     d.updated_at FROM debate d JOIN users u ON u.id = d.user_id \
     JOIN categories c ON c.id = d.category_id";

#[derive(Debug, Clone)]
pub struct NewDebate {
    pub user_id: i64,
    pub category_id: i64,
    pub title: String,
    pub content: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: DebateStatus,
}

/// Optional search criteria; `None` means "any"
#[derive(Debug, Clone, Default)]
pub struct DebateFilter {
    pub keyword: Option<String>,
    pub status: Option<DebateStatus>,
    pub is_hidden: Option<bool>,
}

#[derive(Clone)]
pub struct DebateStore {
    db: Database,
}

fn map_debate(row: &Row<'_>) -> rusqlite::Result<Debate> {
    Ok(Debate {
        id: row.get(0)?,
        user_id: row.get(1)?,
        author_nickname: row.get(2)?,
        category_id: row.get(3)?,
        category_name: row.get(4)?,
        title: row.get(5)?,
        content: row.get(6)?,
        start_date: row.get(7)?,
        end_date: row.get(8)?,
        status: row.get(9)?,
        is_hidden: row.get(10)?,
        view_count: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

impl DebateStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn insert(&self, new: NewDebate) -> StoreResult<Debate> {
        let now = Utc::now();
        let id = self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO debate (user_id, category_id, title, content, start_date, end_date,
                                     status, is_hidden, view_count, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, 0, ?8, ?8)",
                params![
                    new.user_id,
                    new.category_id,
                    new.title,
                    new.content,
                    new.start_date,
                    new.end_date,
                    new.status,
                    now
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })?;

        info!("✅ Created debate: {} ({})", new.title, id);
        self.find_by_id(id)?
            .ok_or_else(|| StoreError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    pub fn find_by_id(&self, id: i64) -> StoreResult<Option<Debate>> {
        self.db.with_conn(|conn| {
            query_one(
                conn,
                &format!("{} WHERE d.id = ?1", DEBATE_SELECT),
                params![id],
                map_debate,
            )
        })
    }

    /// Keyword matches title or content; newest first
    pub fn search(&self, criteria: &DebateFilter, page: PageRequest) -> StoreResult<Page<Debate>> {
        let mut filter = Filter::default();
        if let Some(pattern) = like_pattern(criteria.keyword.as_deref()) {
            filter.push("(d.title LIKE {} OR d.content LIKE {})", pattern);
        }
        if let Some(status) = criteria.status {
            filter.push("d.status = {}", status);
        }
        if let Some(hidden) = criteria.is_hidden {
            filter.push("d.is_hidden = {}", hidden);
        }

        self.db.with_conn(|conn| {
            let where_sql = filter.where_sql();
            let total: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM debate d{}", where_sql),
                filter.params().as_slice(),
                |row| row.get(0),
            )?;

            let mut stmt = conn.prepare(&format!(
                "{}{} ORDER BY d.created_at DESC, d.id DESC LIMIT {} OFFSET {}",
                DEBATE_SELECT,
                where_sql,
                page.limit(),
                page.offset()
            ))?;
            let debates = stmt
                .query_map(filter.params().as_slice(), map_debate)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(Page::new(debates, total as u64, page))
        })
    }

    /// Write back title, content, schedule, status and visibility
    pub fn update(&self, debate: &Debate) -> StoreResult<Debate> {
        let now = Utc::now();
        self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE debate SET title = ?1, content = ?2, start_date = ?3, end_date = ?4,
                                   status = ?5, is_hidden = ?6, updated_at = ?7
                 WHERE id = ?8",
                params![
                    debate.title,
                    debate.content,
                    debate.start_date,
                    debate.end_date,
                    debate.status,
                    debate.is_hidden,
                    now,
                    debate.id
                ],
            )?;
            Ok(())
        })?;

        Ok(Debate {
            updated_at: now,
            ..debate.clone()
        })
    }

    /// Comments and likes on the debate go with it
    pub fn delete(&self, id: i64) -> StoreResult<bool> {
        let rows = self
            .db
            .with_conn(|conn| Ok(conn.execute("DELETE FROM debate WHERE id = ?1", params![id])?))?;
        if rows > 0 {
            info!("🗑️  Deleted debate: {}", id);
        }
        Ok(rows > 0)
    }

    /// Visible debates by view count, highest first
    pub fn top_by_views(&self, limit: u32) -> StoreResult<Vec<Debate>> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{} WHERE d.is_hidden = 0 ORDER BY d.view_count DESC, d.id ASC LIMIT ?1",
                DEBATE_SELECT
            ))?;
            let debates = stmt
                .query_map(params![limit], map_debate)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(debates)
        })
    }

    pub fn count(&self) -> StoreResult<i64> {
        self.count_where("", params![])
    }

    pub fn count_by_status(&self, status: DebateStatus) -> StoreResult<i64> {
        self.count_where(" WHERE status = ?1", params![status])
    }

    pub fn count_hidden(&self) -> StoreResult<i64> {
        self.count_where(" WHERE is_hidden = 1", params![])
    }

    /// Visible debates authored by `user_id`
    pub fn count_visible_by_user(&self, user_id: i64) -> StoreResult<i64> {
        self.count_where(" WHERE user_id = ?1 AND is_hidden = 0", params![user_id])
    }

    /// Debates created in `[from, to)`
    pub fn count_created_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<i64> {
        self.count_where(
            " WHERE created_at >= ?1 AND created_at < ?2",
            params![from, to],
        )
    }

    fn count_where(&self, where_sql: &str, params: &[&dyn rusqlite::ToSql]) -> StoreResult<i64> {
        self.db.with_conn(|conn| {
            Ok(conn.query_row(
                &format!("SELECT COUNT(*) FROM debate{}", where_sql),
                params,
                |row| row.get(0),
            )?)
        })
    }

    #[cfg(test)]
    pub(crate) fn set_view_count(&self, id: i64, views: i64) -> StoreResult<()> {
        self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE debate SET view_count = ?1 WHERE id = ?2",
                params![views, id],
            )?;
            Ok(())
        })
    }
}
