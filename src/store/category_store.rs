//! Category Storage

use chrono::Utc;
use rusqlite::{params, Row};
use tracing::info;

use crate::db::{Database, StoreResult};
use crate::models::Category;
use crate::store::query_one;

const CATEGORY_COLUMNS: &str = "id, name, description, order_num, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    pub order_num: i32,
}

#[derive(Clone)]
pub struct CategoryStore {
    db: Database,
}

fn map_category(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        order_num: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

impl CategoryStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// A taken name is `StoreError::Duplicate` via the UNIQUE constraint
    pub fn insert(&self, new: NewCategory) -> StoreResult<Category> {
        let now = Utc::now();
        let id = self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO categories (name, description, order_num, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![new.name, new.description, new.order_num, now],
            )?;
            Ok(conn.last_insert_rowid())
        })?;

        info!("✅ Created category: {} ({})", new.name, id);
        Ok(Category {
            id,
            name: new.name,
            description: new.description,
            order_num: new.order_num,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn find_by_id(&self, id: i64) -> StoreResult<Option<Category>> {
        self.db.with_conn(|conn| {
            query_one(
                conn,
                &format!("SELECT {} FROM categories WHERE id = ?1", CATEGORY_COLUMNS),
                params![id],
                map_category,
            )
        })
    }

    pub fn find_by_name(&self, name: &str) -> StoreResult<Option<Category>> {
        self.db.with_conn(|conn| {
            query_one(
                conn,
                &format!("SELECT {} FROM categories WHERE name = ?1", CATEGORY_COLUMNS),
                params![name],
                map_category,
            )
        })
    }

    /// All categories in display order
    pub fn list_ordered(&self) -> StoreResult<Vec<Category>> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM categories ORDER BY order_num ASC, id ASC",
                CATEGORY_COLUMNS
            ))?;
            let categories = stmt
                .query_map([], map_category)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(categories)
        })
    }

    pub fn update(&self, category: &Category) -> StoreResult<Category> {
        let now = Utc::now();
        self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE categories SET name = ?1, description = ?2, order_num = ?3, updated_at = ?4
                 WHERE id = ?5",
                params![
                    category.name,
                    category.description,
                    category.order_num,
                    now,
                    category.id
                ],
            )?;
            Ok(())
        })?;

        Ok(Category {
            updated_at: now,
            ..category.clone()
        })
    }

    /// `StoreError::InUse` while debates still reference the category
    pub fn delete(&self, id: i64) -> StoreResult<bool> {
        let rows = self.db.with_conn(|conn| {
            Ok(conn.execute("DELETE FROM categories WHERE id = ?1", params![id])?)
        })?;
        if rows > 0 {
            info!("🗑️  Deleted category: {}", id);
        }
        Ok(rows > 0)
    }
}
