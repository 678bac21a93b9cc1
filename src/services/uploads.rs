// src/services/uploads.rs

use std::path::Path;

use axum::extract::Multipart;
use uuid::Uuid;

use crate::{error::AppError, models::attempt::MAX_TIME_SPENT};

pub const ALLOWED_EXTENSIONS: [&str; 6] = ["pdf", "doc", "docx", "png", "jpg", "jpeg"];

/// Public URL prefix the upload directory is served under.
pub const UPLOAD_URL_PREFIX: &str = "/uploads";

/// Fields collected from a `multipart/form-data` submission.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file_name: Option<String>,
    pub bytes: Option<Vec<u8>>,
    pub time_spent: Option<i32>,
}

/// Lowercased extension, if it is one we accept.
pub fn allowed_extension(file_name: &str) -> Option<String> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())?
        .to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Reads the `file` and optional `time_spent` fields, enforcing `max_bytes`
/// while streaming so oversized files are never fully buffered.
pub async fn read_upload_form(
    mut multipart: Multipart,
    max_bytes: usize,
) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::Validation("Invalid multipart data".to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                form.file_name = field.file_name().map(|s| s.to_string());
                let mut bytes = Vec::new();
                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|_| AppError::Validation("Failed to read file".to_string()))?
                {
                    if bytes.len() + chunk.len() > max_bytes {
                        return Err(AppError::Validation(format!(
                            "File size exceeds the {} byte limit",
                            max_bytes
                        )));
                    }
                    bytes.extend_from_slice(&chunk);
                }
                form.bytes = Some(bytes);
            }
            "time_spent" => {
                let text = field
                    .text()
                    .await
                    .map_err(|_| AppError::Validation("Invalid time_spent".to_string()))?;
                let minutes = text.trim().parse::<i32>().map_err(|_| {
                    AppError::Validation("time_spent must be a whole number of minutes".to_string())
                })?;
                if !(0..=MAX_TIME_SPENT).contains(&minutes) {
                    return Err(AppError::Validation(format!(
                        "time_spent must be between 0 and {} minutes",
                        MAX_TIME_SPENT
                    )));
                }
                form.time_spent = Some(minutes);
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Writes an uploaded file to `upload_dir` under a fresh name and returns its
/// server-relative URL.
pub async fn store_file(
    upload_dir: &str,
    file_name: &str,
    bytes: &[u8],
) -> Result<String, AppError> {
    let ext = allowed_extension(file_name).ok_or_else(|| {
        AppError::Validation(format!(
            "Unsupported file type. Allowed: {}",
            ALLOWED_EXTENSIONS.join(", ")
        ))
    })?;
    if bytes.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".to_string()));
    }

    tokio::fs::create_dir_all(upload_dir)
        .await
        .map_err(|e| AppError::Persistence(format!("Failed to prepare upload dir: {}", e)))?;

    let stored_name = format!("{}.{}", Uuid::new_v4(), ext);
    let path = Path::new(upload_dir).join(&stored_name);
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| AppError::Persistence(format!("Failed to write upload: {}", e)))?;

    tracing::info!(file = %stored_name, size = bytes.len(), "Stored uploaded file");
    Ok(format!("{}/{}", UPLOAD_URL_PREFIX, stored_name))
}

/// Validates and stores the `file` part of an upload form.
pub async fn store_form_file(upload_dir: &str, form: &UploadForm) -> Result<String, AppError> {
    let bytes = form
        .bytes
        .as_deref()
        .ok_or_else(|| AppError::Validation("A 'file' field is required".to_string()))?;
    let file_name = form.file_name.as_deref().unwrap_or("upload");
    store_file(upload_dir, file_name, bytes).await
}

/// Deletes a file previously returned by `store_file`. Used when the record
/// that would reference it was not written, or no longer references it.
pub async fn remove_stored_file(upload_dir: &str, url: &str) {
    let Some(stored_name) = url
        .strip_prefix(UPLOAD_URL_PREFIX)
        .and_then(|rest| rest.strip_prefix('/'))
        .filter(|name| !name.is_empty() && !name.contains('/') && !name.contains(".."))
    else {
        tracing::warn!(url, "Refusing to remove a file outside the upload dir");
        return;
    };

    let path = Path::new(upload_dir).join(stored_name);
    if let Err(e) = tokio::fs::remove_file(&path).await {
        tracing::warn!(file = %stored_name, "Failed to remove unreferenced upload: {}", e);
    }
}
