use uuid::Uuid;

use crate::{
    audit,
    dto::uploads::UploadedFile,
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Accepted receipt formats and the extension each is stored with.
const ALLOWED_TYPES: [(&str, &str); 4] = [
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/webp", "webp"),
    ("application/pdf", "pdf"),
];

pub fn extension_for(content_type: &str) -> Option<&'static str> {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    ALLOWED_TYPES
        .iter()
        .find(|(mime, _)| mime.eq_ignore_ascii_case(essence))
        .map(|(_, ext)| *ext)
}

/// Stores a payment receipt under a random name and returns its public URL.
pub async fn store_receipt(
    state: &AppState,
    user: &AuthUser,
    content_type: Option<&str>,
    data: &[u8],
) -> AppResult<ApiResponse<UploadedFile>> {
    let content_type = content_type
        .ok_or_else(|| AppError::BadRequest("file content type is required".into()))?;
    let extension = extension_for(content_type).ok_or_else(|| {
        AppError::BadRequest(format!("unsupported file type {content_type}"))
    })?;
    if data.is_empty() {
        return Err(AppError::BadRequest("file is empty".into()));
    }
    if data.len() > state.config.max_upload_bytes {
        return Err(AppError::BadRequest(format!(
            "file exceeds {} bytes",
            state.config.max_upload_bytes
        )));
    }

    let file_name = format!("{}.{extension}", Uuid::new_v4());
    let path = state.config.upload_dir.join(&file_name);
    tokio::fs::create_dir_all(&state.config.upload_dir)
        .await
        .map_err(|err| AppError::Internal(err.into()))?;
    tokio::fs::write(&path, data)
        .await
        .map_err(|err| AppError::Internal(err.into()))?;

    tracing::debug!(path = %path.display(), size = data.len(), "receipt stored");
    audit::record(
        &state.pool,
        Some(user.user_id),
        "receipt_upload",
        "uploads",
        serde_json::json!({ "file": file_name, "size": data.len() }),
    )
    .await;

    Ok(ApiResponse::success(
        "File uploaded",
        UploadedFile {
            url: state.config.upload_url(&file_name),
            content_type: content_type.to_string(),
            size: data.len(),
        },
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipt_types_map_to_extensions() {
        assert_eq!(extension_for("image/png"), Some("png"));
        assert_eq!(extension_for("image/jpeg"), Some("jpg"));
        assert_eq!(extension_for("IMAGE/WEBP"), Some("webp"));
        assert_eq!(extension_for("application/pdf; charset=binary"), Some("pdf"));
        assert_eq!(extension_for("image/gif"), None);
        assert_eq!(extension_for("text/html"), None);
    }
}
