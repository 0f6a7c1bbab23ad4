//! Wire types for the upload endpoints.

use serde::{Deserialize, Serialize};

/// Request body for `POST /api/uploads/create`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMultipartRequest {
    pub job_id: String,
    pub filename: String,
    pub content_type: String,
    pub size_bytes: u64,
}

/// One presigned part URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedPart {
    pub part_number: u32,
    pub url: String,
}

/// Response body for `POST /api/uploads/create`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipartSession {
    pub upload_id: String,
    pub key: String,
    pub part_size: u64,
    pub presigned_parts: Vec<PresignedPart>,
}

/// One entry of the completion parts list. Field names follow the S3
/// CompleteMultipartUpload convention the backend forwards verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedPartWire {
    #[serde(rename = "ETag")]
    pub etag: String,
    #[serde(rename = "PartNumber")]
    pub part_number: u32,
}

/// Request body for `POST /api/uploads/complete`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteMultipartRequest {
    pub job_id: String,
    pub key: String,
    pub upload_id: String,
    pub parts: Vec<CompletedPartWire>,
}

/// Request body for `POST /api/uploads/abort`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbortMultipartRequest {
    pub key: String,
    pub upload_id: String,
}
