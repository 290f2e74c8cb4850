//! Admin account management

use axum::extract::State;
use serde::Deserialize;
use tracing::{info, warn};

use super::{not_found, AdminState};
use crate::auth::Principal;
use crate::db::StoreError;
use crate::error::ApiError;
use crate::extract::{Json, Path, Query};
use crate::models::{Admin, AdminRole, AdminStatus};
use crate::response::{ApiResponse, ApiResult};
use crate::store::NewAdmin;
use crate::validation::FieldErrors;

const ADMIN_ID_TAKEN: &str = "Admin ID already exists";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdminRequest {
    #[serde(default)]
    pub admin_id: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
    pub role: Option<AdminRole>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateAdminParams {
    pub name: Option<String>,
    pub role: Option<AdminRole>,
    pub status: Option<AdminStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordParams {
    #[serde(default)]
    pub new_password: String,
}

pub fn list_admins(state: &AdminState) -> Result<Vec<Admin>, ApiError> {
    Ok(state.admins.list()?)
}

pub fn get_admin_by_id(state: &AdminState, id: i64) -> Result<Admin, ApiError> {
    state.admins.find_by_id(id)?.ok_or_else(|| not_found("Admin"))
}

/// Create an admin account.
///
/// Anonymous callers may only create the very first admin; after that a
/// valid admin token is required.
pub fn create_admin(
    state: &AdminState,
    caller: Option<&Principal>,
    request: CreateAdminRequest,
) -> Result<Admin, ApiError> {
    if caller.is_none() && state.admins.count()? > 0 {
        return Err(ApiError::unauthorized("Authentication required"));
    }

    let mut errors = FieldErrors::new();
    errors.require("adminId", &request.admin_id, "Admin ID is required");
    errors.max_len("adminId", &request.admin_id, 50);
    errors.require("password", &request.password, "Password is required");
    errors.require("name", &request.name, "Name is required");
    errors.max_len("name", &request.name, 50);
    errors.finish()?;

    info!("[ADMIN-MGMT] Creating admin - adminId: {}", request.admin_id);
    if state.admins.exists_by_admin_id(&request.admin_id)? {
        warn!("[ADMIN-MGMT] Duplicate adminId: {}", request.admin_id);
        return Err(ApiError::bad_request(ADMIN_ID_TAKEN));
    }

    let password_hash = state.hasher.hash(&request.password)?;
    let new = NewAdmin {
        admin_id: request.admin_id,
        password_hash,
        name: request.name,
        role: request.role.unwrap_or(AdminRole::Admin),
    };
    // Anonymous creation re-checks the empty table inside the insert
    let inserted = match caller {
        Some(_) => state.admins.insert(new),
        None => state.admins.insert_first(new),
    };
    let admin = inserted.map_err(|e| match e {
        StoreError::Duplicate(_) => ApiError::bad_request(ADMIN_ID_TAKEN),
        StoreError::NotEmpty(_) => ApiError::unauthorized("Authentication required"),
        other => other.into(),
    })?;

    info!("[ADMIN-MGMT] Admin created - id: {}, adminId: {}", admin.id, admin.admin_id);
    Ok(admin)
}

pub fn update_admin(
    state: &AdminState,
    id: i64,
    params: UpdateAdminParams,
) -> Result<Admin, ApiError> {
    let mut admin = get_admin_by_id(state, id)?;

    if let Some(name) = params.name {
        if name.trim().is_empty() {
            return Err(ApiError::bad_request("Name must not be blank"));
        }
        admin.name = name;
    }
    if let Some(role) = params.role {
        admin.role = role;
    }
    if let Some(status) = params.status {
        admin.status = status;
    }

    let admin = state.admins.update(&admin)?;
    info!("[ADMIN-MGMT] Admin updated - id: {}", id);
    Ok(admin)
}

pub fn change_password(state: &AdminState, id: i64, new_password: &str) -> Result<(), ApiError> {
    let mut errors = FieldErrors::new();
    errors.require("newPassword", new_password, "New password is required");
    errors.finish()?;

    let mut admin = get_admin_by_id(state, id)?;
    admin.password_hash = state.hasher.hash(new_password)?;
    state.admins.update(&admin)?;

    info!("[ADMIN-MGMT] Password changed - id: {}", id);
    Ok(())
}

pub fn delete_admin_by_id(state: &AdminState, caller: &Principal, id: i64) -> Result<(), ApiError> {
    if caller.id == id {
        return Err(ApiError::bad_request("Cannot delete your own account"));
    }
    if !state.admins.delete(id)? {
        return Err(not_found("Admin"));
    }
    info!("[ADMIN-MGMT] Admin deleted - id: {} by {}", id, caller.login_key);
    Ok(())
}

/// Create a SUPER_ADMIN when the admin table is empty.
///
/// Returns the new account, or `None` when admins already exist.
pub fn bootstrap_super_admin(
    state: &AdminState,
    admin_id: &str,
    password: &str,
) -> Result<Option<Admin>, ApiError> {
    if state.admins.count()? > 0 {
        return Ok(None);
    }

    let admin = create_admin(
        state,
        None,
        CreateAdminRequest {
            admin_id: admin_id.to_string(),
            password: password.to_string(),
            name: "Super Admin".to_string(),
            role: Some(AdminRole::SuperAdmin),
        },
    )?;
    info!("🔐 Bootstrap super admin created: {}", admin.admin_id);
    Ok(Some(admin))
}

pub async fn get_admins(State(state): State<AdminState>) -> ApiResult<Vec<Admin>> {
    Ok(Json(ApiResponse::ok(list_admins(&state)?)))
}

pub async fn get_admin(State(state): State<AdminState>, Path(id): Path<i64>) -> ApiResult<Admin> {
    Ok(Json(ApiResponse::ok(get_admin_by_id(&state, id)?)))
}

pub async fn post_admin(
    State(state): State<AdminState>,
    caller: Option<Principal>,
    Json(request): Json<CreateAdminRequest>,
) -> ApiResult<Admin> {
    let admin = create_admin(&state, caller.as_ref(), request)?;
    Ok(Json(ApiResponse::with_message("Admin created", admin)))
}

pub async fn put_admin(
    State(state): State<AdminState>,
    Path(id): Path<i64>,
    Query(params): Query<UpdateAdminParams>,
) -> ApiResult<Admin> {
    let admin = update_admin(&state, id, params)?;
    Ok(Json(ApiResponse::with_message("Admin updated", admin)))
}

pub async fn put_admin_password(
    State(state): State<AdminState>,
    Path(id): Path<i64>,
    Query(params): Query<PasswordParams>,
) -> ApiResult<()> {
    change_password(&state, id, &params.new_password)?;
    Ok(Json(ApiResponse::done("Password changed")))
}

pub async fn delete_admin(
    State(state): State<AdminState>,
    caller: Principal,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    delete_admin_by_id(&state, &caller, id)?;
    Ok(Json(ApiResponse::done("Admin deleted")))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_first_admin_can_be_created_anonymously() {
        let (state, _dir) = test_state();

        let (status, body) = send(
            &state,
            "POST",
            "/api/admin/admins",
            None,
            Some(json!({ "adminId": "first", "password": "pw123456", "name": "First" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["role"], "ADMIN");
        assert_eq!(body["data"]["status"], "ACTIVE");

        // Table is no longer empty
        let (status, _) = send(
            &state,
            "POST",
            "/api/admin/admins",
            None,
            Some(json!({ "adminId": "second", "password": "pw123456", "name": "Second" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(state.admins.count().unwrap(), 1);
    }

    #[test]
    fn test_concurrent_anonymous_creation_yields_one_admin() {
        let (state, _dir) = test_state();

        let created: Vec<bool> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let state = &state;
                    scope.spawn(move || {
                        create_admin(
                            state,
                            None,
                            CreateAdminRequest {
                                admin_id: format!("anon{}", i),
                                password: PASSWORD.to_string(),
                                name: format!("Anon {}", i),
                                role: Some(AdminRole::SuperAdmin),
                            },
                        )
                        .is_ok()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(created.iter().filter(|ok| **ok).count(), 1);
        assert_eq!(state.admins.count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_bad_request() {
        let (state, _dir) = test_state();
        let (_, token) = seed_admin(&state, "root", AdminRole::SuperAdmin);

        let (status, body) = send(&state, "GET", "/api/admin/admins/abc", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_create_duplicate_and_invalid() {
        let (state, _dir) = test_state();
        let (_, token) = seed_admin(&state, "root", AdminRole::SuperAdmin);

        let (status, body) = send(
            &state,
            "POST",
            "/api/admin/admins",
            Some(&token),
            Some(json!({ "adminId": "root", "password": "pw", "name": "Again" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], ADMIN_ID_TAKEN);

        let (status, body) = send(
            &state,
            "POST",
            "/api/admin/admins",
            Some(&token),
            Some(json!({ "adminId": "", "password": "", "name": "" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["data"]["adminId"].is_string());
        assert!(body["data"]["password"].is_string());
        assert!(body["data"]["name"].is_string());

        let (status, body) = send(
            &state,
            "POST",
            "/api/admin/admins",
            Some(&token),
            Some(json!({ "adminId": "mod", "password": "pw", "name": "Mod", "role": "SUPER_ADMIN" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["role"], "SUPER_ADMIN");
    }

    #[tokio::test]
    async fn test_update_password_and_delete() {
        let (state, _dir) = test_state();
        let (root, token) = seed_admin(&state, "root", AdminRole::SuperAdmin);
        let (ops, _) = seed_admin(&state, "ops", AdminRole::Admin);

        let (status, body) = send(
            &state,
            "PUT",
            &format!("/api/admin/admins/{}?name=Operator&status=INACTIVE", ops.id),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "Operator");
        assert_eq!(body["data"]["status"], "INACTIVE");
        assert_eq!(body["data"]["role"], "ADMIN");

        let (status, _) = send(
            &state,
            "PUT",
            &format!("/api/admin/admins/{}/password?newPassword=Changed99", ops.id),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let stored = state.admins.find_by_id(ops.id).unwrap().unwrap();
        assert!(state.hasher.verify("Changed99", &stored.password_hash));

        let (status, body) = send(
            &state,
            "DELETE",
            &format!("/api/admin/admins/{}", root.id),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Cannot delete your own account");

        let (status, _) = send(
            &state,
            "DELETE",
            &format!("/api/admin/admins/{}", ops.id),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &state,
            "GET",
            &format!("/api/admin/admins/{}", ops.id),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Admin not found");
    }

    #[test]
    fn test_bootstrap_only_on_empty_table() {
        let (state, _dir) = test_state();

        let created = bootstrap_super_admin(&state, "root", "Bootstrap1!").unwrap().unwrap();
        assert_eq!(created.role, AdminRole::SuperAdmin);
        assert!(state.hasher.verify("Bootstrap1!", &created.password_hash));

        assert!(bootstrap_super_admin(&state, "other", "pw").unwrap().is_none());
        assert_eq!(state.admins.count().unwrap(), 1);
    }
}
