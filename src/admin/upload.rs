//! Image upload
//!
//! Files are stored flat in the upload directory under a random name and
//! served back by the router under the configured URL prefix.

use anyhow::Context;
use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
};
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

use super::AdminState;
use crate::auth::Principal;
use crate::error::ApiError;
use crate::extract::Json;
use crate::response::{ApiResponse, ApiResult};

pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;
/// Request body cap; leaves room for multipart framing around a full-size image
pub const UPLOAD_BODY_LIMIT: usize = MAX_IMAGE_BYTES + 64 * 1024;

const TOO_LARGE: &str = "File size must not exceed 10MB";

#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub dir: PathBuf,
    pub url_prefix: String,
}

/// Lower-cased extension of the client file name, if it is a plain one
fn extension_of(file_name: Option<&str>) -> Option<String> {
    let ext = Path::new(file_name?).extension()?.to_str()?;
    if ext.is_empty() || ext.len() > 10 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::bad_request(TOO_LARGE)
    } else {
        ApiError::bad_request(format!("Invalid upload: {}", err.body_text()))
    }
}

/// Check an uploaded image and write it; returns its public URL
pub async fn store_image(
    settings: &UploadSettings,
    file_name: Option<&str>,
    content_type: Option<&str>,
    bytes: &[u8],
) -> Result<String, ApiError> {
    if bytes.is_empty() {
        return Err(ApiError::bad_request("File is empty"));
    }
    if !content_type.is_some_and(|ct| ct.starts_with("image/")) {
        return Err(ApiError::bad_request("Only image files can be uploaded"));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(ApiError::bad_request(TOO_LARGE));
    }

    let stored_name = match extension_of(file_name) {
        Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
        None => Uuid::new_v4().to_string(),
    };

    tokio::fs::create_dir_all(&settings.dir)
        .await
        .with_context(|| format!("Failed to create upload dir {}", settings.dir.display()))?;
    let path = settings.dir.join(&stored_name);
    tokio::fs::write(&path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(format!("{}/{}", settings.url_prefix, stored_name))
}

pub async fn post_upload_image(
    State(state): State<AdminState>,
    admin: Principal,
    mut multipart: Multipart,
) -> ApiResult<String> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;

        let url = store_image(
            &state.uploads,
            file_name.as_deref(),
            content_type.as_deref(),
            &bytes,
        )
        .await?;

        info!("📷 Image uploaded by {}: {} ({} bytes)", admin.login_key, url, bytes.len());
        return Ok(Json(ApiResponse::with_message("Image uploaded", url)));
    }

    Err(ApiError::bad_request("File is empty"))
}
