//! Canonical analytics records.
//!
//! Everything here is derived from the backend's analysis payload and
//! recomputed on every fetch; the client never owns analysis data. Caps on
//! the list lengths bound both UI cost and the linear cursor lookups.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Maximum retention points kept after normalization.
pub const RETENTION_POINT_CAP: usize = 40;
/// Maximum emotion timeline segments.
pub const EMOTION_SEGMENT_CAP: usize = 16;
/// Maximum hook candidates surfaced in the explorer.
pub const HOOK_CANDIDATE_CAP: usize = 12;
/// Maximum risk windows surfaced in the explorer.
pub const RISK_WINDOW_CAP: usize = 16;
/// Maximum action items surfaced in the explorer.
pub const ACTION_ITEM_CAP: usize = 18;

/// One point on the predicted retention curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RetentionPoint {
    /// Timeline position in seconds
    pub at_sec: f64,
    /// Predicted retention (0-100)
    pub predicted: f64,
    /// Classification tag (e.g. "hook", "dip")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Human-readable description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A single detected emotion moment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EmotionMoment {
    /// Timeline position in seconds
    pub timestamp_sec: f64,
    /// Canonical emotion key (e.g. "curiosity", "excitement")
    pub emotion: String,
    /// Intensity on a 0-100 percent scale
    pub intensity: f64,
    /// Why the model flagged this moment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// A non-overlapping emotion timeline segment derived from moments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EmotionSegment {
    /// Segment start in seconds
    pub start_sec: f64,
    /// Segment end in seconds
    pub end_sec: f64,
    /// Dominant emotion for the span
    pub emotion: String,
    /// Intensity on a 0-100 percent scale
    pub intensity: f64,
    /// Position on the timeline as a percentage of duration
    pub position_pct: f64,
    /// Width on the timeline as a percentage of duration
    pub width_pct: f64,
}

/// A hook candidate surfaced in the explorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HookCandidate {
    /// Range start in seconds
    pub start_sec: f64,
    /// Range end in seconds
    pub end_sec: f64,
    /// Hook strength (0-100)
    pub score: f64,
    /// Why this span hooks viewers
    pub reason: String,
}

/// A retention-risk window surfaced in the explorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RiskWindow {
    /// Range start in seconds
    pub start_sec: f64,
    /// Range end in seconds
    pub end_sec: f64,
    /// Drop-off severity (0-100)
    pub severity: f64,
    /// Why viewers bail here
    pub reason: String,
}

/// A suggested edit action surfaced in the explorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ActionItem {
    /// Range start in seconds
    pub start_sec: f64,
    /// Range end in seconds
    pub end_sec: f64,
    /// Expected impact (0-100)
    pub score: f64,
    /// What to change
    pub reason: String,
}

/// A timeline entity with a `[start, end]` span, usable by cursor lookups.
pub trait TimelineRange {
    /// Range start in seconds.
    fn start_sec(&self) -> f64;
    /// Range end in seconds.
    fn end_sec(&self) -> f64;

    /// Whether the cursor falls inside this range (inclusive).
    fn contains(&self, cursor_sec: f64) -> bool {
        self.start_sec() <= cursor_sec && cursor_sec <= self.end_sec()
    }

    /// Midpoint of the range.
    fn midpoint(&self) -> f64 {
        (self.start_sec() + self.end_sec()) / 2.0
    }
}

macro_rules! impl_timeline_range {
    ($($ty:ty),+) => {
        $(impl TimelineRange for $ty {
            fn start_sec(&self) -> f64 {
                self.start_sec
            }
            fn end_sec(&self) -> f64 {
                self.end_sec
            }
        })+
    };
}

impl_timeline_range!(EmotionSegment, HookCandidate, RiskWindow, ActionItem);

/// One weighted component of the composite retention score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScoreBreakdownItem {
    /// Stable component key (e.g. "ending_hold")
    pub key: String,
    /// Display label
    pub label: String,
    /// Component score (0-100)
    pub score: f64,
    /// Component weight (0-1); the five weights sum to 1.0
    pub weight: f64,
    /// `score * weight`
    pub weighted_score: f64,
}

/// Composite retention score with before/after/delta.
///
/// When `synthesized` is true the `before` value was fabricated by the
/// client from an inferred-lift heuristic, not reported by the backend.
/// Consumers must not present a synthesized baseline as measured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RetentionScore {
    /// Predicted retention before the auto-edit (0-100)
    pub before: f64,
    /// Predicted retention after the auto-edit (0-100)
    pub after: f64,
    /// `after - before`
    pub delta: f64,
    /// True when `before` was synthesized client-side
    pub synthesized: bool,
    /// The five weighted components
    pub breakdown: Vec<ScoreBreakdownItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeline_range_containment() {
        let seg = EmotionSegment {
            start_sec: 10.0,
            end_sec: 20.0,
            emotion: "curiosity".to_string(),
            intensity: 50.0,
            position_pct: 10.0,
            width_pct: 10.0,
        };
        assert!(seg.contains(10.0));
        assert!(seg.contains(20.0));
        assert!(!seg.contains(20.1));
        assert_eq!(seg.midpoint(), 15.0);
    }
}
