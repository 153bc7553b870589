use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadedFile {
    pub url: String,
    pub content_type: String,
    pub size: usize,
}

/// Multipart form accepted by the receipt upload endpoint.
#[derive(Debug, ToSchema)]
pub struct ReceiptUpload {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}
