//! Shared data models for the ReCut client.
//!
//! This crate provides Serde-serializable types for:
//! - Pipeline stages and job summaries/details
//! - Canonical analytics records (retention, emotions, explorer items)
//! - Composite retention scores
//! - Export quality settings

pub mod analysis;
pub mod job;
pub mod stage;
pub mod utils;

// Re-export common types
pub use analysis::{
    ActionItem, EmotionMoment, EmotionSegment, HookCandidate, RetentionPoint, RetentionScore,
    RiskWindow, ScoreBreakdownItem, TimelineRange, ACTION_ITEM_CAP, EMOTION_SEGMENT_CAP,
    HOOK_CANDIDATE_CAP, RETENTION_POINT_CAP, RISK_WINDOW_CAP,
};
pub use job::{
    CreateJobRequest, CreateJobResponse, ExportQuality, JobDetail, JobId, JobSummary,
    OutputUrlResponse,
};
pub use stage::PipelineStage;
pub use utils::{format_bytes, format_eta};
