//! Admin login

use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::AdminState;
use crate::auth::authenticate_credentials;
use crate::error::ApiError;
use crate::extract::Json;
use crate::models::{Admin, AdminRole, AdminStatus};
use crate::response::{ApiResponse, ApiResult};
use crate::validation::FieldErrors;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminLoginRequest {
    #[serde(default)]
    pub admin_id: String,
    #[serde(default)]
    pub password: String,
}

/// Admin fields returned alongside a token
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminInfo {
    pub id: i64,
    pub admin_id: String,
    pub name: String,
    pub role: AdminRole,
    pub status: AdminStatus,
}

impl From<&Admin> for AdminInfo {
    fn from(admin: &Admin) -> Self {
        Self {
            id: admin.id,
            admin_id: admin.admin_id.clone(),
            name: admin.name.clone(),
            role: admin.role,
            status: admin.status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AdminAuthResponse {
    pub token: String,
    #[serde(rename = "type")]
    pub token_type: &'static str,
    pub admin: AdminInfo,
}

pub fn login(state: &AdminState, request: &AdminLoginRequest) -> Result<AdminAuthResponse, ApiError> {
    let mut errors = FieldErrors::new();
    errors.require("adminId", &request.admin_id, "Admin ID is required");
    errors.require("password", &request.password, "Password is required");
    errors.finish()?;

    info!("[ADMIN-AUTH] Login attempt - adminId: {}", request.admin_id);
    let admin = authenticate_credentials(
        &state.admins,
        state.hasher.as_ref(),
        &request.admin_id,
        &request.password,
    )?;

    let token = state.jwt.generate_token(admin.id, &admin.admin_id)?;
    info!("[ADMIN-AUTH] Login successful - adminId: {}", admin.admin_id);

    Ok(AdminAuthResponse {
        token,
        token_type: "Bearer",
        admin: AdminInfo::from(&admin),
    })
}

pub async fn post_login(
    State(state): State<AdminState>,
    Json(request): Json<AdminLoginRequest>,
) -> ApiResult<AdminAuthResponse> {
    let response = login(&state, &request)?;
    Ok(Json(ApiResponse::with_message("Login successful", response)))
}
