//! Repositories
//! Mission: SQLite-backed persistence for every record type, one store per table

pub mod admin_store;
pub mod category_store;
pub mod comment_store;
pub mod debate_store;
pub mod report_store;
pub mod user_store;

pub use admin_store::{AdminStore, NewAdmin};
pub use category_store::{CategoryStore, NewCategory};
pub use comment_store::CommentStore;
pub use debate_store::{DebateFilter, DebateStore, NewDebate};
pub use report_store::{NewReport, ReportStore};
pub use user_store::{NewUser, UserStore};

use rusqlite::{types::ToSql, OptionalExtension, Row};

use crate::db::StoreResult;

/// `%keyword%` for LIKE searches; `None` for a missing or blank keyword
pub(crate) fn like_pattern(keyword: Option<&str>) -> Option<String> {
    keyword
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(|k| format!("%{}%", k))
}

/// Optional-filter WHERE clause builder for search queries
#[derive(Default)]
pub(crate) struct Filter {
    clauses: Vec<String>,
    params: Vec<Box<dyn ToSql>>,
}

impl Filter {
    /// Add `clause`; every `{}` in it is bound to `value`
    pub fn push<V: ToSql + 'static>(&mut self, clause: &str, value: V) {
        self.params.push(Box::new(value));
        let placeholder = format!("?{}", self.params.len());
        self.clauses.push(clause.replace("{}", &placeholder));
    }

    pub fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    pub fn params(&self) -> Vec<&dyn ToSql> {
        self.params.iter().map(|p| p.as_ref()).collect()
    }
}

/// Single-row lookup that maps "no rows" to `None`
pub(crate) fn query_one<T, F>(
    conn: &rusqlite::Connection,
    sql: &str,
    params: &[&dyn ToSql],
    map: F,
) -> StoreResult<Option<T>>
where
    F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
{
    Ok(conn.query_row(sql, params, map).optional()?)
}
