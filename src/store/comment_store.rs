//! Comment Storage

use chrono::Utc;
use rusqlite::{params, Row};
use tracing::info;

use crate::db::{Database, StoreError, StoreResult};
use crate::models::{Comment, Page, PageRequest};
use crate::store::{like_pattern, query_one, Filter};

const COMMENT_SELECT: &str = "SELECT cm.id, cm.user_id, u.nickname, cm.debate_id, cm.parent_id, \
     cm.content, cm.is_hidden, cm.created_at, cm.updated_at \
     FROM comments cm JOIN users u ON u.id = cm.user_id";

#[derive(Clone)]
pub struct CommentStore {
    db: Database,
}

fn map_comment(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        user_id: row.get(1)?,
        author_nickname: row.get(2)?,
        debate_id: row.get(3)?,
        parent_id: row.get(4)?,
        content: row.get(5)?,
        is_hidden: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

impl CommentStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn insert(
        &self,
        user_id: i64,
        debate_id: i64,
        parent_id: Option<i64>,
        content: &str,
    ) -> StoreResult<Comment> {
        let now = Utc::now();
        let id = self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO comments (user_id, debate_id, parent_id, content, is_hidden,
                                       created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, 0, ?5, ?5)",
                params![user_id, debate_id, parent_id, content, now],
            )?;
            Ok(conn.last_insert_rowid())
        })?;

        self.find_by_id(id)?
            .ok_or_else(|| StoreError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    pub fn find_by_id(&self, id: i64) -> StoreResult<Option<Comment>> {
        self.db.with_conn(|conn| {
            query_one(
                conn,
                &format!("{} WHERE cm.id = ?1", COMMENT_SELECT),
                params![id],
                map_comment,
            )
        })
    }

    /// Keyword matches content; newest first
    pub fn search(
        &self,
        keyword: Option<&str>,
        is_hidden: Option<bool>,
        page: PageRequest,
    ) -> StoreResult<Page<Comment>> {
        let mut filter = Filter::default();
        if let Some(pattern) = like_pattern(keyword) {
            filter.push("cm.content LIKE {}", pattern);
        }
        if let Some(hidden) = is_hidden {
            filter.push("cm.is_hidden = {}", hidden);
        }

        self.db.with_conn(|conn| {
            let where_sql = filter.where_sql();
            let total: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM comments cm{}", where_sql),
                filter.params().as_slice(),
                |row| row.get(0),
            )?;

            let mut stmt = conn.prepare(&format!(
                "{}{} ORDER BY cm.created_at DESC, cm.id DESC LIMIT {} OFFSET {}",
                COMMENT_SELECT,
                where_sql,
                page.limit(),
                page.offset()
            ))?;
            let comments = stmt
                .query_map(filter.params().as_slice(), map_comment)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(Page::new(comments, total as u64, page))
        })
    }

    pub fn set_hidden(&self, id: i64, hidden: bool) -> StoreResult<Option<Comment>> {
        let rows = self.db.with_conn(|conn| {
            Ok(conn.execute(
                "UPDATE comments SET is_hidden = ?1, updated_at = ?2 WHERE id = ?3",
                params![hidden, Utc::now(), id],
            )?)
        })?;
        if rows == 0 {
            return Ok(None);
        }
        self.find_by_id(id)
    }

    /// Replies to the comment go with it
    pub fn delete(&self, id: i64) -> StoreResult<bool> {
        let rows = self.db.with_conn(|conn| {
            Ok(conn.execute("DELETE FROM comments WHERE id = ?1", params![id])?)
        })?;
        if rows > 0 {
            info!("🗑️  Deleted comment: {}", id);
        }
        Ok(rows > 0)
    }

    pub fn count(&self) -> StoreResult<i64> {
        self.db.with_conn(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM comments", [], |row| row.get(0))?)
        })
    }

    pub fn count_by_user(&self, user_id: i64) -> StoreResult<i64> {
        self.db.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM comments WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )?)
        })
    }
}
