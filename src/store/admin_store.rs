//! Admin Storage
//! Mission: Persist administrator accounts in the `admins` table

use chrono::Utc;
use rusqlite::{params, Row, TransactionBehavior};
use tracing::info;

use crate::auth::models::CredentialStore;
use crate::db::{Database, StoreError, StoreResult};
use crate::models::{Admin, AdminRole, AdminStatus};
use crate::store::query_one;

const ADMIN_COLUMNS: &str =
    "id, admin_id, password, name, role, status, created_at, updated_at";

/// Fields supplied when creating an admin
#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub admin_id: String,
    pub password_hash: String,
    pub name: String,
    pub role: AdminRole,
}

#[derive(Clone)]
pub struct AdminStore {
    db: Database,
}

fn map_admin(row: &Row<'_>) -> rusqlite::Result<Admin> {
    Ok(Admin {
        id: row.get(0)?,
        admin_id: row.get(1)?,
        password_hash: row.get(2)?,
        name: row.get(3)?,
        role: row.get(4)?,
        status: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

impl AdminStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert an ACTIVE admin. The existence check and insert share one
    /// transaction; a taken admin id is `StoreError::Duplicate`.
    pub fn insert(&self, new: NewAdmin) -> StoreResult<Admin> {
        self.insert_checked(new, false)
    }

    /// Insert an ACTIVE admin only while the table is empty, otherwise
    /// `StoreError::NotEmpty`. The emptiness check runs in the insert
    /// transaction.
    pub fn insert_first(&self, new: NewAdmin) -> StoreResult<Admin> {
        self.insert_checked(new, true)
    }

    fn insert_checked(&self, new: NewAdmin, only_if_empty: bool) -> StoreResult<Admin> {
        let admin = self.db.with_conn(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            if only_if_empty {
                let existing: i64 =
                    tx.query_row("SELECT COUNT(*) FROM admins", [], |row| row.get(0))?;
                if existing > 0 {
                    return Err(StoreError::NotEmpty("admins".to_string()));
                }
            }

            let taken: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM admins WHERE admin_id = ?1)",
                params![new.admin_id],
                |row| row.get(0),
            )?;
            if taken {
                return Err(StoreError::Duplicate(format!("admin_id {}", new.admin_id)));
            }

            let now = Utc::now();
            tx.execute(
                "INSERT INTO admins (admin_id, password, name, role, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                params![
                    new.admin_id,
                    new.password_hash,
                    new.name,
                    new.role,
                    AdminStatus::Active,
                    now
                ],
            )?;
            let id = tx.last_insert_rowid();
            tx.commit()?;

            Ok(Admin {
                id,
                admin_id: new.admin_id,
                password_hash: new.password_hash,
                name: new.name,
                role: new.role,
                status: AdminStatus::Active,
                created_at: now,
                updated_at: now,
            })
        })?;

        info!("✅ Created admin: {} ({})", admin.admin_id, admin.role);
        Ok(admin)
    }

    pub fn find_by_id(&self, id: i64) -> StoreResult<Option<Admin>> {
        self.db.with_conn(|conn| {
            query_one(
                conn,
                &format!("SELECT {} FROM admins WHERE id = ?1", ADMIN_COLUMNS),
                params![id],
                map_admin,
            )
        })
    }

    pub fn find_by_admin_id(&self, admin_id: &str) -> StoreResult<Option<Admin>> {
        self.db.with_conn(|conn| {
            query_one(
                conn,
                &format!("SELECT {} FROM admins WHERE admin_id = ?1", ADMIN_COLUMNS),
                params![admin_id],
                map_admin,
            )
        })
    }

    pub fn exists_by_admin_id(&self, admin_id: &str) -> StoreResult<bool> {
        self.db.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM admins WHERE admin_id = ?1)",
                params![admin_id],
                |row| row.get(0),
            )?)
        })
    }

    pub fn list(&self) -> StoreResult<Vec<Admin>> {
        self.db.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {} FROM admins ORDER BY id", ADMIN_COLUMNS))?;
            let admins = stmt
                .query_map([], map_admin)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(admins)
        })
    }

    pub fn count(&self) -> StoreResult<i64> {
        self.db.with_conn(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM admins", [], |row| row.get(0))?)
        })
    }

    /// Write back name, role, status and password hash; refreshes `updated_at`
    pub fn update(&self, admin: &Admin) -> StoreResult<Admin> {
        let now = Utc::now();
        self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE admins SET password = ?1, name = ?2, role = ?3, status = ?4, updated_at = ?5
                 WHERE id = ?6",
                params![
                    admin.password_hash,
                    admin.name,
                    admin.role,
                    admin.status,
                    now,
                    admin.id
                ],
            )?;
            Ok(())
        })?;

        Ok(Admin {
            updated_at: now,
            ..admin.clone()
        })
    }

    /// Returns false when no admin has `id`
    pub fn delete(&self, id: i64) -> StoreResult<bool> {
        let rows = self
            .db
            .with_conn(|conn| Ok(conn.execute("DELETE FROM admins WHERE id = ?1", params![id])?))?;
        if rows > 0 {
            info!("🗑️  Deleted admin: {}", id);
        }
        Ok(rows > 0)
    }
}

impl CredentialStore<Admin> for AdminStore {
    fn find_by_login_key(&self, login_key: &str) -> StoreResult<Option<Admin>> {
        self.find_by_admin_id(login_key)
    }

    fn exists_by_login_key(&self, login_key: &str) -> StoreResult<bool> {
        self.exists_by_admin_id(login_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_store() -> AdminStore {
        AdminStore::new(Database::open_in_memory().unwrap())
    }

    fn new_admin(admin_id: &str, role: AdminRole) -> NewAdmin {
        NewAdmin {
            admin_id: admin_id.to_string(),
            password_hash: "$2b$04$hash".to_string(),
            name: format!("{} name", admin_id),
            role,
        }
    }

    #[test]
    fn test_create_and_retrieve_admin() {
        let store = create_test_store();

        let created = store.insert(new_admin("root", AdminRole::SuperAdmin)).unwrap();
        assert!(created.id > 0);
        assert_eq!(created.status, AdminStatus::Active);

        let by_key = store.find_by_login_key("root").unwrap().unwrap();
        assert_eq!(by_key.id, created.id);
        assert_eq!(by_key.role, AdminRole::SuperAdmin);
        assert_eq!(by_key.password_hash, "$2b$04$hash");

        let by_id = store.find_by_id(created.id).unwrap().unwrap();
        assert_eq!(by_id.admin_id, "root");

        assert!(store.exists_by_login_key("root").unwrap());
        assert!(!store.exists_by_login_key("nobody").unwrap());
        assert!(store.find_by_login_key("nobody").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_admin_id_rejected() {
        let store = create_test_store();
        store.insert(new_admin("root", AdminRole::SuperAdmin)).unwrap();

        let err = store.insert(new_admin("root", AdminRole::Admin)).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_insert_first_only_into_empty_table() {
        let store = create_test_store();

        let first = store.insert_first(new_admin("root", AdminRole::SuperAdmin)).unwrap();
        assert_eq!(first.admin_id, "root");

        let err = store.insert_first(new_admin("late", AdminRole::SuperAdmin)).unwrap_err();
        assert!(matches!(err, StoreError::NotEmpty(_)));
        assert!(!store.exists_by_admin_id("late").unwrap());
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_update_refreshes_timestamp() {
        let store = create_test_store();
        let mut admin = store.insert(new_admin("ops", AdminRole::Admin)).unwrap();

        admin.name = "Operations".to_string();
        admin.status = AdminStatus::Inactive;
        let updated = store.update(&admin).unwrap();
        assert!(updated.updated_at >= admin.created_at);

        let reloaded = store.find_by_id(admin.id).unwrap().unwrap();
        assert_eq!(reloaded.name, "Operations");
        assert_eq!(reloaded.status, AdminStatus::Inactive);
        assert_eq!(reloaded.created_at, admin.created_at);
    }

    #[test]
    fn test_list_and_delete() {
        let store = create_test_store();
        let a = store.insert(new_admin("a", AdminRole::Admin)).unwrap();
        store.insert(new_admin("b", AdminRole::Admin)).unwrap();

        assert_eq!(store.list().unwrap().len(), 2);
        assert!(store.delete(a.id).unwrap());
        assert!(!store.delete(a.id).unwrap());
        assert_eq!(store.count().unwrap(), 1);
    }
}
