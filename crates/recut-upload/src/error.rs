//! Upload error types.

use thiserror::Error;

use recut_models::JobId;

use crate::session::UploadTier;

pub type UploadResult<T> = Result<T, UploadError>;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("multipart session rejected: {0}")]
    SessionRejected(String),

    #[error("part {part_number} response missing ETag header")]
    MissingEtag { part_number: u32 },

    #[error("part {part_number} recorded out of order (last was {last})")]
    PartOrder { part_number: u32, last: u32 },

    #[error("{tier} tier failed: {detail}")]
    TierFailed { tier: UploadTier, detail: String },

    #[error("all upload tiers failed for job {job_id}")]
    AllTiersFailed { job_id: JobId },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
