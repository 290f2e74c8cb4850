//! Administrator console backend
//! Mission: Admin login, account management and moderation of users, debates,
//! comments, reports and categories, plus dashboard statistics
//!
//! Service functions are synchronous and take `&AdminState`; the `get_*` /
//! `post_*` / `put_*` / `delete_*` handlers only extract parameters and wrap
//! results in the response envelope.

pub mod admins;
pub mod auth;
pub mod categories;
pub mod comments;
pub mod dashboard;
pub mod debates;
pub mod reports;
pub mod statistics;
pub mod upload;
pub mod users;

use axum::{
    extract::DefaultBodyLimit,
    http::Method,
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::services::ServeDir;

use crate::auth::{
    authenticate, require_principal, AccessPolicy, AdminClaims, JwtHandler, PasswordHasher,
    PrincipalResolver, TokenGate,
};
use crate::db::Database;
use crate::error::ApiError;
use crate::middleware::log_requests;
use crate::models::Admin;
use crate::server::health;
use crate::store::{AdminStore, CategoryStore, CommentStore, DebateStore, ReportStore, UserStore};

pub use upload::UploadSettings;

/// Shared state of the admin service
#[derive(Clone)]
pub struct AdminState {
    pub admins: AdminStore,
    pub users: UserStore,
    pub categories: CategoryStore,
    pub debates: DebateStore,
    pub comments: CommentStore,
    pub reports: ReportStore,
    pub jwt: Arc<JwtHandler<AdminClaims>>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub uploads: Arc<UploadSettings>,
}

impl AdminState {
    pub fn new(
        db: Database,
        jwt: Arc<JwtHandler<AdminClaims>>,
        hasher: Arc<dyn PasswordHasher>,
        uploads: UploadSettings,
    ) -> Self {
        Self {
            admins: AdminStore::new(db.clone()),
            users: UserStore::new(db.clone()),
            categories: CategoryStore::new(db.clone()),
            debates: DebateStore::new(db.clone()),
            comments: CommentStore::new(db.clone()),
            reports: ReportStore::new(db),
            jwt,
            hasher,
            uploads: Arc::new(uploads),
        }
    }
}

/// Routes reachable without an admin token
pub fn access_policy(upload_url_prefix: &str) -> AccessPolicy {
    AccessPolicy::new()
        .permit("/api/admin/auth/**")
        .permit_method(Method::POST, "/api/admin/admins")
        .permit(&format!("{}/**", upload_url_prefix))
        .permit("/health")
}

pub(crate) fn not_found(what: &str) -> ApiError {
    ApiError::not_found(format!("{} not found", what))
}

pub fn router(state: AdminState) -> Router {
    let resolver: Arc<dyn PrincipalResolver> = Arc::new(TokenGate::<Admin>::new(
        state.jwt.clone(),
        Arc::new(state.admins.clone()),
    ));
    let policy = Arc::new(access_policy(&state.uploads.url_prefix));
    let files = ServeDir::new(&state.uploads.dir);
    let files_prefix = state.uploads.url_prefix.clone();

    Router::new()
        .route("/health", get(health))
        .route("/api/admin/auth/login", post(auth::post_login))
        // Admin accounts
        .route(
            "/api/admin/admins",
            get(admins::get_admins).post(admins::post_admin),
        )
        .route(
            "/api/admin/admins/:id",
            get(admins::get_admin)
                .put(admins::put_admin)
                .delete(admins::delete_admin),
        )
        .route("/api/admin/admins/:id/password", put(admins::put_admin_password))
        // Users
        .route("/api/admin/users", get(users::get_users))
        .route(
            "/api/admin/users/:id",
            get(users::get_user).delete(users::delete_user),
        )
        .route("/api/admin/users/:id/status", put(users::put_user_status))
        // Debates
        .route("/api/admin/debate", get(debates::get_debates))
        .route(
            "/api/admin/debate/:id",
            get(debates::get_debate)
                .put(debates::put_debate)
                .delete(debates::delete_debate),
        )
        .route("/api/admin/debate/:id/status", put(debates::put_debate_status))
        .route(
            "/api/admin/debate/:id/toggle-hidden",
            put(debates::put_debate_toggle_hidden),
        )
        // Comments
        .route("/api/admin/comments", get(comments::get_comments))
        .route(
            "/api/admin/comments/:id",
            get(comments::get_comment).delete(comments::delete_comment),
        )
        .route(
            "/api/admin/comments/:id/toggle-hidden",
            put(comments::put_comment_toggle_hidden),
        )
        // Reports
        .route("/api/admin/reports", get(reports::get_reports))
        .route("/api/admin/reports/:id", get(reports::get_report))
        .route("/api/admin/reports/:id/process", put(reports::put_report_process))
        // Categories
        .route(
            "/api/admin/categories",
            get(categories::get_categories).post(categories::post_category),
        )
        .route(
            "/api/admin/categories/:id",
            get(categories::get_category)
                .put(categories::put_category)
                .delete(categories::delete_category),
        )
        // Dashboard
        .route("/api/admin/dashboard/stats", get(dashboard::get_stats))
        .route("/api/admin/dashboard/recent-users", get(dashboard::get_recent_users))
        .route("/api/admin/dashboard/top-debates", get(dashboard::get_top_debates))
        .route(
            "/api/admin/dashboard/pending-reports",
            get(dashboard::get_pending_reports),
        )
        // Statistics
        .route("/api/admin/statistics/users", get(statistics::get_user_statistics))
        .route("/api/admin/statistics/debates", get(statistics::get_debate_statistics))
        .route("/api/admin/statistics/users/daily", get(statistics::get_daily_users))
        .route("/api/admin/statistics/debates/daily", get(statistics::get_daily_debates))
        // Uploads
        .route(
            "/api/upload/image",
            post(upload::post_upload_image).layer(DefaultBodyLimit::max(upload::UPLOAD_BODY_LIMIT)),
        )
        .nest_service(&files_prefix, files)
        .with_state(state)
        .layer(from_fn_with_state(policy, require_principal))
        .layer(from_fn_with_state(resolver, authenticate))
        .layer(from_fn_with_state("admin", log_requests))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::auth::BcryptHasher;
    use crate::models::{AdminRole, Debate, DebateStatus, User};
    use crate::store::{NewAdmin, NewCategory, NewDebate, NewUser};
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use chrono::{Duration, Utc};
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;

    pub const SECRET: &str = "admin-test-secret-0123456789abcdef";
    pub const PASSWORD: &str = "Admin1234!";

    /// State over a fresh in-memory database; keep the TempDir alive
    pub fn test_state() -> (AdminState, TempDir) {
        let dir = TempDir::new().unwrap();
        let state = AdminState::new(
            Database::open_in_memory().unwrap(),
            Arc::new(JwtHandler::new(SECRET, 3_600_000).unwrap()),
            Arc::new(BcryptHasher::new(4)),
            UploadSettings {
                dir: dir.path().to_path_buf(),
                url_prefix: "/uploads".to_string(),
            },
        );
        (state, dir)
    }

    /// Insert an ACTIVE admin with `PASSWORD` and return it with a token
    pub fn seed_admin(state: &AdminState, admin_id: &str, role: AdminRole) -> (Admin, String) {
        let admin = state
            .admins
            .insert(NewAdmin {
                admin_id: admin_id.to_string(),
                password_hash: state.hasher.hash(PASSWORD).unwrap(),
                name: admin_id.to_string(),
                role,
            })
            .unwrap();
        let token = state.jwt.generate_token(admin.id, &admin.admin_id).unwrap();
        (admin, token)
    }

    pub fn seed_user(state: &AdminState, email: &str, nickname: &str) -> User {
        state
            .users
            .insert(NewUser {
                email: email.to_string(),
                password_hash: "$2b$04$hash".to_string(),
                username: email.to_string(),
                nickname: nickname.to_string(),
                bio: None,
            })
            .unwrap()
    }

    /// Debate by a shared author in a shared category, both created on demand
    pub fn seed_debate(state: &AdminState, title: &str) -> Debate {
        let author = match state.users.find_by_email("author@x.com").unwrap() {
            Some(user) => user,
            None => seed_user(state, "author@x.com", "author"),
        };
        let category = match state.categories.find_by_name("general").unwrap() {
            Some(category) => category,
            None => state
                .categories
                .insert(NewCategory {
                    name: "general".to_string(),
                    description: None,
                    order_num: 0,
                })
                .unwrap(),
        };

        let start = Utc::now();
        state
            .debates
            .insert(NewDebate {
                user_id: author.id,
                category_id: category.id,
                title: title.to_string(),
                content: format!("{} content", title),
                start_date: start,
                end_date: start + Duration::days(7),
                status: DebateStatus::Scheduled,
            })
            .unwrap()
    }

    /// Send a request through the full admin router
    pub async fn send(
        state: &AdminState,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }
}
