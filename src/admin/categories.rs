//! Debate categories

use axum::extract::State;
use serde::Deserialize;
use tracing::info;

use super::{not_found, AdminState};
use crate::db::StoreError;
use crate::error::ApiError;
use crate::extract::{Json, Path, Query};
use crate::models::Category;
use crate::response::{ApiResponse, ApiResult};
use crate::store::NewCategory;

const NAME_TAKEN: &str = "Category name already exists";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryParams {
    pub name: Option<String>,
    pub description: Option<String>,
    pub order_num: Option<i32>,
}

fn name_taken(err: StoreError) -> ApiError {
    match err {
        StoreError::Duplicate(_) => ApiError::bad_request(NAME_TAKEN),
        other => other.into(),
    }
}

pub fn find_category(state: &AdminState, id: i64) -> Result<Category, ApiError> {
    state.categories.find_by_id(id)?.ok_or_else(|| not_found("Category"))
}

pub fn create_category(state: &AdminState, params: CategoryParams) -> Result<Category, ApiError> {
    let name = match params.name {
        Some(name) if !name.trim().is_empty() => name,
        _ => return Err(ApiError::bad_request("Category name is required")),
    };
    if state.categories.find_by_name(&name)?.is_some() {
        return Err(ApiError::bad_request(NAME_TAKEN));
    }

    let category = state
        .categories
        .insert(NewCategory {
            name,
            description: params.description,
            order_num: params.order_num.unwrap_or(0),
        })
        .map_err(name_taken)?;

    info!("[ADMIN-CATEGORY] Category created - id: {}, name: {}", category.id, category.name);
    Ok(category)
}

pub fn update_category(
    state: &AdminState,
    id: i64,
    params: CategoryParams,
) -> Result<Category, ApiError> {
    let mut category = find_category(state, id)?;

    if let Some(name) = params.name {
        if name.trim().is_empty() {
            return Err(ApiError::bad_request("Category name is required"));
        }
        if name != category.name && state.categories.find_by_name(&name)?.is_some() {
            return Err(ApiError::bad_request(NAME_TAKEN));
        }
        category.name = name;
    }
    if let Some(description) = params.description {
        category.description = Some(description);
    }
    if let Some(order_num) = params.order_num {
        category.order_num = order_num;
    }

    let category = state.categories.update(&category).map_err(name_taken)?;
    info!("[ADMIN-CATEGORY] Category updated - id: {}", id);
    Ok(category)
}

pub fn delete_category_by_id(state: &AdminState, id: i64) -> Result<(), ApiError> {
    find_category(state, id)?;
    match state.categories.delete(id) {
        Ok(_) => {}
        Err(StoreError::InUse(_)) => {
            return Err(ApiError::bad_request("Category is still used by debates"))
        }
        Err(e) => return Err(e.into()),
    }
    info!("[ADMIN-CATEGORY] Category deleted - id: {}", id);
    Ok(())
}

pub async fn get_categories(State(state): State<AdminState>) -> ApiResult<Vec<Category>> {
    Ok(Json(ApiResponse::ok(state.categories.list_ordered()?)))
}

pub async fn get_category(State(state): State<AdminState>, Path(id): Path<i64>) -> ApiResult<Category> {
    Ok(Json(ApiResponse::ok(find_category(&state, id)?)))
}

pub async fn post_category(
    State(state): State<AdminState>,
    Query(params): Query<CategoryParams>,
) -> ApiResult<Category> {
    let category = create_category(&state, params)?;
    Ok(Json(ApiResponse::with_message("Category created", category)))
}

pub async fn put_category(
    State(state): State<AdminState>,
    Path(id): Path<i64>,
    Query(params): Query<CategoryParams>,
) -> ApiResult<Category> {
    let category = update_category(&state, id, params)?;
    Ok(Json(ApiResponse::with_message("Category updated", category)))
}

pub async fn delete_category(State(state): State<AdminState>, Path(id): Path<i64>) -> ApiResult<()> {
    delete_category_by_id(&state, id)?;
    Ok(Json(ApiResponse::done("Category deleted")))
}
