//! Pipeline stage vocabulary.
//!
//! Stages are reported by the backend as loose strings; this module maps
//! them onto a closed enum so terminal-state checks and per-stage heuristics
//! stay in one place. `completed` and `ready` are the same terminal success
//! state, and the legacy `processing` status maps to `rendering`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A named step in the remote processing pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Job accepted, waiting for the upload to begin
    #[default]
    Queued,
    /// Source file is being uploaded
    Uploading,
    /// Transcript/visual analysis
    Analyzing,
    /// Hook detection
    Hooking,
    /// Cut selection
    Cutting,
    /// Pacing pass
    Pacing,
    /// Story restructuring
    Story,
    /// Subtitle generation
    Subtitling,
    /// Audio cleanup and mixing
    Audio,
    /// Retention curve scoring
    Retention,
    /// Final render
    Rendering,
    /// Terminal success (`completed` or `ready` on the wire)
    Ready,
    /// Terminal failure
    Failed,
    /// Unrecognized stage string; treated as non-terminal so polling continues
    Other,
}

impl PipelineStage {
    /// Parse a raw status string from the backend.
    pub fn from_wire(status: &str) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "queued" => Self::Queued,
            "uploading" => Self::Uploading,
            "analyzing" => Self::Analyzing,
            "hooking" => Self::Hooking,
            "cutting" => Self::Cutting,
            "pacing" => Self::Pacing,
            "story" => Self::Story,
            "subtitling" => Self::Subtitling,
            "audio" => Self::Audio,
            "retention" => Self::Retention,
            // Legacy status, same meaning as rendering
            "rendering" | "processing" => Self::Rendering,
            "completed" | "ready" => Self::Ready,
            "failed" => Self::Failed,
            _ => Self::Other,
        }
    }

    /// Get string representation of the stage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Uploading => "uploading",
            Self::Analyzing => "analyzing",
            Self::Hooking => "hooking",
            Self::Cutting => "cutting",
            Self::Pacing => "pacing",
            Self::Story => "story",
            Self::Subtitling => "subtitling",
            Self::Audio => "audio",
            Self::Retention => "retention",
            Self::Rendering => "rendering",
            Self::Ready => "ready",
            Self::Failed => "failed",
            Self::Other => "other",
        }
    }

    /// Human-readable label for progress displays.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Queued => "Queued",
            Self::Uploading => "Uploading",
            Self::Analyzing => "Analyzing footage",
            Self::Hooking => "Detecting hooks",
            Self::Cutting => "Selecting cuts",
            Self::Pacing => "Tuning pacing",
            Self::Story => "Shaping story",
            Self::Subtitling => "Generating subtitles",
            Self::Audio => "Mixing audio",
            Self::Retention => "Scoring retention",
            Self::Rendering => "Rendering",
            Self::Ready => "Ready",
            Self::Failed => "Failed",
            Self::Other => "Processing",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready | Self::Failed)
    }

    /// Baseline duration in seconds for ETA heuristics when the server
    /// reports no progress for the stage yet.
    pub fn baseline_secs(&self) -> f64 {
        match self {
            Self::Queued => 15.0,
            Self::Uploading => 60.0,
            Self::Analyzing => 90.0,
            Self::Hooking => 45.0,
            Self::Cutting => 50.0,
            Self::Pacing => 35.0,
            Self::Story => 40.0,
            Self::Subtitling => 55.0,
            Self::Audio => 30.0,
            Self::Retention => 25.0,
            Self::Rendering => 120.0,
            Self::Ready | Self::Failed => 0.0,
            Self::Other => 60.0,
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
