//! API error type and its HTTP translation.
//!
//! Errors are raised where they are detected and converted into a status
//! code plus the common response envelope only here, at the request
//! boundary. Internal failures are logged with their cause and reported to
//! the client with a generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{error, warn};

use crate::db::StoreError;
use crate::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("validation failed: {0:?}")]
    Validation(BTreeMap<String, String>),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(detail) => {
                warn!("Duplicate value rejected: {}", detail);
                ApiError::BadRequest("Value already exists".to_string())
            }
            StoreError::InUse(detail) => {
                warn!("Referenced record rejected: {}", detail);
                ApiError::BadRequest("Record is still referenced by other data".to_string())
            }
            StoreError::NotEmpty(detail) => {
                warn!("Insert into non-empty table rejected: {}", detail);
                ApiError::Conflict("Records already exist".to_string())
            }
            StoreError::Sqlite(e) => ApiError::Internal(anyhow::Error::new(e)),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            ApiError::Validation(fields) => {
                warn!("Validation error: {:?}", fields);
                ApiResponse {
                    success: false,
                    message: "Validation failed".to_string(),
                    data: Some(fields),
                }
            }
            ApiError::Internal(err) => {
                error!("Unexpected error: {:#}", err);
                ApiResponse::error("Internal server error")
            }
            ApiError::Unauthorized(msg)
            | ApiError::BadRequest(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg) => {
                warn!(status = status.as_u16(), "{}", msg);
                ApiResponse::error(msg)
            }
        };

        (status, Json(body)).into_response()
    }
}
