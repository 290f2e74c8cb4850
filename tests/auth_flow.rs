//! End-to-end auth flow across both services sharing one database file

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use debate_backend::admin::{self, admins::bootstrap_super_admin, AdminState, UploadSettings};
use debate_backend::auth::{BcryptHasher, JwtHandler};
use debate_backend::user::{self, UserState};
use debate_backend::Database;

const SECRET: &str = "integration-secret-0123456789abcdef";

struct Services {
    admin: Router,
    user: Router,
    _dir: TempDir,
}

fn services(expiration_ms: i64) -> (Services, AdminState) {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("debate.db");
    let db = Database::open(db_path.to_str().unwrap()).unwrap();
    let hasher = Arc::new(BcryptHasher::new(4));

    let admin_state = AdminState::new(
        db.clone(),
        Arc::new(JwtHandler::new(SECRET, expiration_ms).unwrap()),
        hasher.clone(),
        UploadSettings {
            dir: dir.path().join("uploads"),
            url_prefix: "/uploads".to_string(),
        },
    );
    let user_state = UserState::new(
        db,
        Arc::new(JwtHandler::new(SECRET, expiration_ms).unwrap()),
        hasher,
    );

    (
        Services {
            admin: admin::router(admin_state.clone()),
            user: user::router(user_state),
            _dir: dir,
        },
        admin_state,
    )
}

async fn call(
    app: &Router,
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

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn admin_token(services: &Services) -> String {
    let (status, body) = call(
        &services.admin,
        "POST",
        "/api/admin/auth/login",
        None,
        Some(json!({ "adminId": "root", "password": "RootPass1!" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_register_login_and_moderation() {
    let (services, admin_state) = services(3_600_000);
    bootstrap_super_admin(&admin_state, "root", "RootPass1!").unwrap();

    // Register alice on the user service
    let (status, body) = call(
        &services.user,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "email": "alice@x.com", "password": "Passw0rd!", "nickname": "alice" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let user_id = body["data"]["user"]["id"].as_i64().unwrap();
    let user_token = body["data"]["token"].as_str().unwrap().to_string();

    // Log in again: same account
    let (status, body) = call(
        &services.user,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "alice@x.com", "password": "Passw0rd!" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["id"], user_id);

    let (status, wrong) = call(
        &services.user,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "alice@x.com", "password": "bad" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, unknown) = call(
        &services.user,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "nobody@x.com", "password": "Passw0rd!" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong["message"], unknown["message"]);

    // Tokens are not interchangeable between services
    let admin_token = admin_token(&services).await;
    let (status, _) = call(&services.user, "GET", "/api/users/me", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = call(&services.admin, "GET", "/api/admin/users", Some(&user_token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // The admin sees the new user and suspends it
    let (status, body) = call(&services.admin, "GET", "/api/admin/users", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalElements"], 1);

    let (status, _) = call(
        &services.admin,
        "PUT",
        &format!("/api/admin/users/{}/status?status=SUSPENDED", user_id),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // The existing token no longer authenticates and login is refused
    let (status, _) = call(&services.user, "GET", "/api/users/me", Some(&user_token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = call(
        &services.user,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "alice@x.com", "password": "Passw0rd!" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Account is inactive");
}

#[tokio::test]
async fn test_duplicate_registration_is_rejected() {
    let (services, admin_state) = services(3_600_000);
    let request = json!({ "email": "bob@x.com", "password": "Passw0rd!", "nickname": "bob" });

    let (status, _) = call(&services.user, "POST", "/api/auth/register", None, Some(request.clone())).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&services.user, "POST", "/api/auth/register", None, Some(request)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(admin_state.users.count().unwrap(), 1);
}

#[tokio::test]
async fn test_expired_token_is_anonymous() {
    let (services, admin_state) = services(1);
    bootstrap_super_admin(&admin_state, "root", "RootPass1!").unwrap();
    let token = admin_token(&services).await;

    tokio::time::sleep(std::time::Duration::from_millis(1_100)).await;

    let (status, _) = call(&services.admin, "GET", "/api/admin/admins", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Public routes still answer
    let (status, _) = call(&services.admin, "GET", "/health", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}
