use axum::{
    Json, Router,
    extract::{Multipart, State, multipart::MultipartError},
    http::StatusCode,
    routing::post,
};

use crate::{
    dto::uploads::{ReceiptUpload, UploadedFile},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::upload_service,
    state::AppState,
};

const FILE_FIELD: &str = "file";

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(upload_receipt))
}

#[utoipa::path(
    post,
    path = "/api/uploads",
    request_body(content = ReceiptUpload, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Receipt stored; use the URL as a payment reference image", body = ApiResponse<UploadedFile>),
        (status = 400, description = "Missing file, unsupported type or too large"),
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn upload_receipt(
    State(state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<ApiResponse<UploadedFile>>)> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let content_type = field.content_type().map(str::to_owned);
        let data = field.bytes().await.map_err(multipart_error)?;
        let resp =
            upload_service::store_receipt(&state, &user, content_type.as_deref(), &data).await?;
        return Ok((StatusCode::CREATED, Json(resp)));
    }

    Err(AppError::BadRequest(format!(
        "multipart field `{FILE_FIELD}` is required"
    )))
}

fn multipart_error(err: MultipartError) -> AppError {
    AppError::BadRequest(err.body_text())
}
