//! Job wire models.
//!
//! These types mirror the JSON exchanged with the backend's job endpoints.
//! The `analysis` payload on [`JobDetail`] is deliberately kept as raw JSON;
//! its shape varies across job versions and is normalized downstream.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::stage::PipelineStage;

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Export quality requested at job creation; scales ETA heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
pub enum ExportQuality {
    /// 2160p export
    #[serde(rename = "4k")]
    Uhd4k,
    /// 1080p export
    #[serde(rename = "1080p")]
    #[default]
    Fhd1080,
    /// 720p and below
    #[serde(other, rename = "720p")]
    Standard,
}

impl ExportQuality {
    /// Multiplier applied to stage-baseline ETA estimates.
    pub fn eta_multiplier(&self) -> f64 {
        match self {
            Self::Uhd4k => 1.45,
            Self::Fhd1080 => 1.2,
            Self::Standard => 1.0,
        }
    }
}

/// Summary of a job as returned by `GET /api/jobs`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    /// Unique job ID
    pub id: JobId,

    /// Original filename
    pub filename: String,

    /// Raw status string from the backend
    pub status: String,

    /// Server-reported progress (0-100) for the current stage
    #[serde(default)]
    pub progress: u8,

    /// Source file size in bytes, once known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,

    /// Sanitized error message for user display (if failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// When the job was created
    pub created_at: DateTime<Utc>,

    /// When the job was last updated
    pub updated_at: DateTime<Utc>,
}

impl JobSummary {
    /// Normalized pipeline stage for this job.
    pub fn stage(&self) -> PipelineStage {
        PipelineStage::from_wire(&self.status)
    }

    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.stage().is_terminal()
    }
}

/// Full job detail as returned by `GET /api/jobs/:id`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobDetail {
    /// Summary fields
    #[serde(flatten)]
    pub summary: JobSummary,

    /// Source video duration in seconds, once probed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_sec: Option<f64>,

    /// Export quality requested at creation
    #[serde(default)]
    pub export_quality: ExportQuality,

    /// Raw analysis payload; shape varies across job versions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<serde_json::Value>,
}

impl JobDetail {
    /// Normalized pipeline stage for this job.
    pub fn stage(&self) -> PipelineStage {
        self.summary.stage()
    }

    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.summary.is_terminal()
    }

    /// Best-known duration, defaulting to zero until the probe lands.
    pub fn duration_or_zero(&self) -> f64 {
        self.duration_sec.filter(|d| d.is_finite() && *d > 0.0).unwrap_or(0.0)
    }
}

/// Request body for `POST /api/jobs/create`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    /// Original filename
    pub filename: String,

    /// MIME type of the source file
    pub content_type: String,

    /// Source file size in bytes
    pub size_bytes: u64,

    /// Requested export quality
    #[serde(default)]
    pub export_quality: ExportQuality,

    /// Client-generated idempotency key
    pub idempotency_key: String,
}

impl CreateJobRequest {
    /// Create a request with a fresh idempotency key.
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        size_bytes: u64,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            size_bytes,
            export_quality: ExportQuality::default(),
            idempotency_key: Uuid::new_v4().to_string(),
        }
    }

    /// Set the export quality.
    pub fn with_quality(mut self, quality: ExportQuality) -> Self {
        self.export_quality = quality;
        self
    }
}

/// Response body for `POST /api/jobs/create`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobResponse {
    /// The created job
    pub job: JobSummary,

    /// Single presigned PUT URL, when the backend offers that tier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_url: Option<String>,

    /// Object key the source will land at
    pub input_path: String,

    /// Destination bucket
    pub bucket: String,
}

/// Response body for `GET /api/jobs/:id/output-url`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OutputUrlResponse {
    /// Playable/downloadable URL for the finished edit
    pub url: String,

    /// Seconds until the URL expires, when bounded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
}
