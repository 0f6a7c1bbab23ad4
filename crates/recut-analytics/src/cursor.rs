//! Cursor correlation lookups.
//!
//! Given a pinned timestamp, find the nearest retention point, emotion
//! segment, or explorer item for the inspection panel. The lists are capped
//! (40 points, 16 segments) so linear scans are fine. The index borrows the
//! current normalized lists and is rebuilt on every cursor change; it has no
//! mutation methods.

use recut_models::{
    ActionItem, EmotionSegment, HookCandidate, RetentionPoint, RiskWindow, TimelineRange,
};

use crate::normalize::NormalizedAnalysis;

/// Read-only cursor lookups over one analysis snapshot.
#[derive(Debug, Clone, Copy)]
pub struct CursorIndex<'a> {
    analysis: &'a NormalizedAnalysis,
}

impl<'a> CursorIndex<'a> {
    /// Build an index over the given normalized analysis.
    pub fn new(analysis: &'a NormalizedAnalysis) -> Self {
        Self { analysis }
    }

    /// Nearest retention point by absolute distance.
    pub fn nearest_point(&self, cursor_sec: f64) -> Option<&'a RetentionPoint> {
        nearest_point(cursor_sec, &self.analysis.retention)
    }

    /// Nearest emotion segment, containment first.
    pub fn nearest_segment(&self, cursor_sec: f64) -> Option<&'a EmotionSegment> {
        nearest_range(cursor_sec, &self.analysis.segments)
    }

    /// Nearest hook candidate, containment first.
    pub fn nearest_hook(&self, cursor_sec: f64) -> Option<&'a HookCandidate> {
        nearest_range(cursor_sec, &self.analysis.hooks)
    }

    /// Nearest risk window, containment first.
    pub fn nearest_risk(&self, cursor_sec: f64) -> Option<&'a RiskWindow> {
        nearest_range(cursor_sec, &self.analysis.risks)
    }

    /// Nearest action item, containment first.
    pub fn nearest_action(&self, cursor_sec: f64) -> Option<&'a ActionItem> {
        nearest_range(cursor_sec, &self.analysis.actions)
    }
}

/// Pick the point with minimum `|at_sec - cursor|`.
pub fn nearest_point(cursor_sec: f64, points: &[RetentionPoint]) -> Option<&RetentionPoint> {
    points.iter().min_by(|a, b| {
        let da = (a.at_sec - cursor_sec).abs();
        let db = (b.at_sec - cursor_sec).abs();
        da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
    })
}

/// Containment check first, returning immediately on a hit, else nearest by
/// midpoint distance.
pub fn nearest_range<T: TimelineRange>(cursor_sec: f64, ranges: &[T]) -> Option<&T> {
    if let Some(hit) = ranges.iter().find(|r| r.contains(cursor_sec)) {
        return Some(hit);
    }

    ranges.iter().min_by(|a, b| {
        let da = (a.midpoint() - cursor_sec).abs();
        let db = (b.midpoint() - cursor_sec).abs();
        da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(at_sec: f64) -> RetentionPoint {
        RetentionPoint {
            at_sec,
            predicted: 80.0,
            kind: None,
            description: None,
        }
    }

    fn segment(start_sec: f64, end_sec: f64) -> EmotionSegment {
        EmotionSegment {
            start_sec,
            end_sec,
            emotion: "joy".to_string(),
            intensity: 50.0,
            position_pct: 0.0,
            width_pct: 0.0,
        }
    }

    #[test]
    fn test_nearest_point() {
        let points = vec![point(0.0), point(15.0), point(30.0)];
        assert_eq!(nearest_point(16.0, &points).unwrap().at_sec, 15.0);
        assert_eq!(nearest_point(29.0, &points).unwrap().at_sec, 30.0);
        assert!(nearest_point(5.0, &[]).is_none());
    }

    #[test]
    fn test_containment_wins_over_midpoint() {
        // The second segment contains the cursor even though the first
        // segment's midpoint is closer.
        let segments = vec![segment(0.0, 4.0), segment(4.5, 60.0)];
        let hit = nearest_range(5.0, &segments).unwrap();
        assert_eq!(hit.start_sec, 4.5);
    }

    #[test]
    fn test_midpoint_fallback_when_no_containment() {
        let segments = vec![segment(0.0, 4.0), segment(20.0, 24.0)];
        let hit = nearest_range(10.0, &segments).unwrap();
        assert_eq!(hit.start_sec, 0.0);
        let hit = nearest_range(16.0, &segments).unwrap();
        assert_eq!(hit.start_sec, 20.0);
    }

    #[test]
    fn test_boundary_cursor_is_contained() {
        let segments = vec![segment(10.0, 20.0)];
        assert!(nearest_range(10.0, &segments).is_some());
        assert!(nearest_range(20.0, &segments).is_some());
    }
}
