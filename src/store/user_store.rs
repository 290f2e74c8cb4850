//! User Storage
//! Mission: Persist end-user accounts in the `users` table

use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use tracing::info;

use crate::auth::models::CredentialStore;
use crate::db::{Database, StoreError, StoreResult};
use crate::models::{Page, PageRequest, User, UserStatus};
use crate::store::{like_pattern, query_one, Filter};

const USER_COLUMNS: &str = "id, email, password, username, nickname, profile_image, bio, \
                            status, email_verified, created_at, updated_at";

/// Fields supplied at registration
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub username: String,
    pub nickname: String,
    pub bio: Option<String>,
}

#[derive(Clone)]
pub struct UserStore {
    db: Database,
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        username: row.get(3)?,
        nickname: row.get(4)?,
        profile_image: row.get(5)?,
        bio: row.get(6)?,
        status: row.get(7)?,
        email_verified: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

impl UserStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert an ACTIVE, unverified user. The email check and the insert
    /// share one transaction; a taken email or username is
    /// `StoreError::Duplicate`.
    pub fn insert(&self, new: NewUser) -> StoreResult<User> {
        let user = self.db.with_conn(|conn| {
            let tx = conn.transaction()?;
            let taken: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)",
                params![new.email],
                |row| row.get(0),
            )?;
            if taken {
                return Err(StoreError::Duplicate(format!("email {}", new.email)));
            }

            let now = Utc::now();
            tx.execute(
                "INSERT INTO users (email, password, username, nickname, bio, status,
                                    email_verified, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?7)",
                params![
                    new.email,
                    new.password_hash,
                    new.username,
                    new.nickname,
                    new.bio,
                    UserStatus::Active,
                    now
                ],
            )?;
            let id = tx.last_insert_rowid();
            tx.commit()?;

            Ok(User {
                id,
                email: new.email,
                password_hash: new.password_hash,
                username: new.username,
                nickname: new.nickname,
                profile_image: None,
                bio: new.bio,
                status: UserStatus::Active,
                email_verified: false,
                created_at: now,
                updated_at: now,
            })
        })?;

        info!("✅ Created user: {} ({})", user.email, user.id);
        Ok(user)
    }

    pub fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        self.db.with_conn(|conn| {
            query_one(
                conn,
                &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
                params![id],
                map_user,
            )
        })
    }

    pub fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.db.with_conn(|conn| {
            query_one(
                conn,
                &format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS),
                params![email],
                map_user,
            )
        })
    }

    pub fn exists_by_email(&self, email: &str) -> StoreResult<bool> {
        self.exists("SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)", email)
    }

    pub fn exists_by_nickname(&self, nickname: &str) -> StoreResult<bool> {
        self.exists("SELECT EXISTS(SELECT 1 FROM users WHERE nickname = ?1)", nickname)
    }

    fn exists(&self, sql: &str, value: &str) -> StoreResult<bool> {
        self.db
            .with_conn(|conn| Ok(conn.query_row(sql, params![value], |row| row.get(0))?))
    }

    /// Write back the mutable profile fields and status; refreshes `updated_at`
    pub fn update(&self, user: &User) -> StoreResult<User> {
        let now = Utc::now();
        self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET password = ?1, nickname = ?2, profile_image = ?3, bio = ?4,
                                  status = ?5, email_verified = ?6, updated_at = ?7
                 WHERE id = ?8",
                params![
                    user.password_hash,
                    user.nickname,
                    user.profile_image,
                    user.bio,
                    user.status,
                    user.email_verified,
                    now,
                    user.id
                ],
            )?;
            Ok(())
        })?;

        Ok(User {
            updated_at: now,
            ..user.clone()
        })
    }

    /// Keyword matches email, username or nickname; newest first
    pub fn search(
        &self,
        keyword: Option<&str>,
        status: Option<UserStatus>,
        page: PageRequest,
    ) -> StoreResult<Page<User>> {
        let mut filter = Filter::default();
        if let Some(pattern) = like_pattern(keyword) {
            filter.push("(email LIKE {} OR username LIKE {} OR nickname LIKE {})", pattern);
        }
        if let Some(status) = status {
            filter.push("status = {}", status);
        }

        self.db.with_conn(|conn| {
            let where_sql = filter.where_sql();
            let total: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM users{}", where_sql),
                filter.params().as_slice(),
                |row| row.get(0),
            )?;

            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM users{} ORDER BY created_at DESC, id DESC LIMIT {} OFFSET {}",
                USER_COLUMNS,
                where_sql,
                page.limit(),
                page.offset()
            ))?;
            let users = stmt
                .query_map(filter.params().as_slice(), map_user)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(Page::new(users, total as u64, page))
        })
    }

    /// Most recently registered users first
    pub fn recent(&self, limit: u32) -> StoreResult<Vec<User>> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM users ORDER BY created_at DESC, id DESC LIMIT ?1",
                USER_COLUMNS
            ))?;
            let users = stmt
                .query_map(params![limit], map_user)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(users)
        })
    }

    pub fn count(&self) -> StoreResult<i64> {
        self.db.with_conn(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?)
        })
    }

    pub fn count_by_status(&self, status: UserStatus) -> StoreResult<i64> {
        self.db.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM users WHERE status = ?1",
                params![status],
                |row| row.get(0),
            )?)
        })
    }

    /// Users created in `[from, to)`
    pub fn count_created_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<i64> {
        self.db.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM users WHERE created_at >= ?1 AND created_at < ?2",
                params![from, to],
                |row| row.get(0),
            )?)
        })
    }
}

impl CredentialStore<User> for UserStore {
    fn find_by_login_key(&self, login_key: &str) -> StoreResult<Option<User>> {
        self.find_by_email(login_key)
    }

    fn exists_by_login_key(&self, login_key: &str) -> StoreResult<bool> {
        self.exists_by_email(login_key)
    }
}
