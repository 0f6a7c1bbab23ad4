//! Composite retention score.
//!
//! Five weighted components are computed independently from the normalized
//! signals and combined as a dot product. When the backend has not reported
//! a baseline, a plausible "before" is synthesized from an inferred-lift
//! heuristic and flagged as such; it is a product heuristic, not a
//! measurement.

use recut_models::{RetentionPoint, RetentionScore, ScoreBreakdownItem};

use crate::normalize::NormalizedAnalysis;

/// The five score components with their fixed weights (sum = 1.0).
const COMPONENTS: [(&str, &str, f64); 5] = [
    ("ending_hold", "Ending hold", 0.34),
    ("average_hold", "Average hold", 0.24),
    ("emotion_strength", "Emotion strength", 0.18),
    ("stability", "Stability", 0.14),
    ("scan_confidence", "Scan confidence", 0.10),
];

/// Stability floor; even a catastrophic curve never scores below this.
const STABILITY_FLOOR: f64 = 30.0;

/// Bounds on the synthesized before-score lift, in points.
const LIFT_MIN: f64 = 1.3;
const LIFT_MAX: f64 = 9.5;

/// Neutral default used when a signal is entirely absent.
const NEUTRAL_SCORE: f64 = 50.0;

/// Compose the weighted retention score from normalized signals.
pub fn compose_score(analysis: &NormalizedAnalysis) -> RetentionScore {
    let ending_hold = analysis
        .retention
        .last()
        .map(|p| p.predicted)
        .unwrap_or(NEUTRAL_SCORE);

    let average_hold = mean(analysis.retention.iter().map(|p| p.predicted)).unwrap_or(NEUTRAL_SCORE);

    let emotion_strength =
        mean(analysis.emotions.iter().map(|m| m.intensity)).unwrap_or(NEUTRAL_SCORE);

    let (largest_drop, average_drop) = drop_profile(&analysis.retention);
    let stability = (100.0 - (largest_drop * 1.65 + average_drop * 1.15)).max(STABILITY_FLOOR);

    let scan_confidence = analysis.scan_confidence.unwrap_or(NEUTRAL_SCORE);

    let scores = [
        ending_hold,
        average_hold,
        emotion_strength,
        stability,
        scan_confidence,
    ];

    let breakdown: Vec<ScoreBreakdownItem> = COMPONENTS
        .iter()
        .zip(scores)
        .map(|(&(key, label, weight), score)| {
            let score = score.clamp(0.0, 100.0);
            ScoreBreakdownItem {
                key: key.to_string(),
                label: label.to_string(),
                score,
                weight,
                weighted_score: score * weight,
            }
        })
        .collect();

    let after = breakdown
        .iter()
        .map(|item| item.weighted_score)
        .sum::<f64>()
        .clamp(0.0, 100.0);

    // Baseline resolution: a reported before wins; a reported after/delta
    // pair pins the baseline the server itself measured; a bare delta is
    // applied to the composite; otherwise synthesize from the inferred lift.
    let reported = &analysis.reported;
    let (before, synthesized) = match (reported.before, reported.after, reported.delta) {
        (Some(before), _, _) => (before.clamp(0.0, 100.0), false),
        (None, Some(reported_after), Some(delta)) => {
            ((reported_after - delta).clamp(0.0, 100.0), false)
        }
        (None, None, Some(delta)) => ((after - delta).clamp(0.0, 100.0), false),
        (None, _, None) => {
            let lift = inferred_lift(emotion_strength, scan_confidence, largest_drop);
            ((after - lift).clamp(0.0, 100.0), true)
        }
    };

    RetentionScore {
        before,
        after,
        delta: after - before,
        synthesized,
        breakdown,
    }
}

/// Largest single drop and average drop magnitude between consecutive
/// retention points. A single catastrophic drop is penalized more heavily
/// than many small ones by the stability weighting.
fn drop_profile(points: &[RetentionPoint]) -> (f64, f64) {
    let drops: Vec<f64> = points
        .windows(2)
        .filter_map(|pair| {
            let drop = pair[0].predicted - pair[1].predicted;
            (drop > 0.0).then_some(drop)
        })
        .collect();

    let largest = drops.iter().cloned().fold(0.0, f64::max);
    let average = mean(drops.iter().cloned()).unwrap_or(0.0);
    (largest, average)
}

/// Bounded lift heuristic for the synthesized baseline.
fn inferred_lift(emotion_strength: f64, scan_confidence: f64, largest_drop: f64) -> f64 {
    (LIFT_MIN + emotion_strength * 0.04 + scan_confidence * 0.02 + largest_drop * 0.05)
        .clamp(LIFT_MIN, LIFT_MAX)
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{normalize_analysis, ReportedScore};
    use recut_models::EmotionMoment;
    use serde_json::json;

    fn points(values: &[f64]) -> Vec<RetentionPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, &predicted)| RetentionPoint {
                at_sec: i as f64 * 15.0,
                predicted,
                kind: None,
                description: None,
            })
            .collect()
    }

    fn analysis_with(retention: Vec<RetentionPoint>) -> NormalizedAnalysis {
        NormalizedAnalysis {
            retention,
            ..Default::default()
        }
    }

    #[test]
    fn test_weights_sum_to_one() {
        let total: f64 = COMPONENTS.iter().map(|&(_, _, w)| w).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_composite_matches_dot_product() {
        let mut analysis = analysis_with(points(&[95.0, 88.0, 82.0, 79.0]));
        analysis.scan_confidence = Some(70.0);
        analysis.emotions = vec![EmotionMoment {
            timestamp_sec: 5.0,
            emotion: "joy".to_string(),
            intensity: 64.0,
            reason: None,
        }];

        let score = compose_score(&analysis);
        let dot: f64 = score.breakdown.iter().map(|b| b.score * b.weight).sum();
        assert!((score.after - dot).abs() < 1e-9);
        assert_eq!(score.breakdown.len(), 5);
        let weight_sum: f64 = score.breakdown.iter().map(|b| b.weight).sum();
        assert!((weight_sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_stability_floor() {
        // One catastrophic 70-point drop
        let score = compose_score(&analysis_with(points(&[100.0, 30.0])));
        let stability = score
            .breakdown
            .iter()
            .find(|b| b.key == "stability")
            .unwrap();
        assert_eq!(stability.score, STABILITY_FLOOR);
    }

    #[test]
    fn test_single_large_drop_beats_many_small() {
        let one_big = compose_score(&analysis_with(points(&[100.0, 60.0, 60.0, 60.0, 60.0])));
        let many_small = compose_score(&analysis_with(points(&[100.0, 90.0, 80.0, 70.0, 60.0])));
        let stability = |s: &RetentionScore| {
            s.breakdown
                .iter()
                .find(|b| b.key == "stability")
                .unwrap()
                .score
        };
        assert!(stability(&one_big) < stability(&many_small));
    }

    #[test]
    fn test_synthesized_before_is_flagged_and_bounded() {
        let score = compose_score(&analysis_with(points(&[90.0, 85.0, 80.0])));
        assert!(score.synthesized);
        let lift = score.after - score.before;
        assert!(lift >= LIFT_MIN && lift <= LIFT_MAX);
        assert!((score.delta - lift).abs() < 1e-9);
    }

    #[test]
    fn test_reported_before_wins() {
        let mut analysis = analysis_with(points(&[90.0, 85.0]));
        analysis.reported = ReportedScore {
            before: Some(58.0),
            after: None,
            delta: None,
        };
        let score = compose_score(&analysis);
        assert!(!score.synthesized);
        assert_eq!(score.before, 58.0);
        assert!((score.delta - (score.after - 58.0)).abs() < 1e-9);
    }

    #[test]
    fn test_reported_delta_fills_missing_before() {
        let mut analysis = analysis_with(points(&[90.0, 85.0]));
        analysis.reported = ReportedScore {
            before: None,
            after: None,
            delta: Some(7.5),
        };
        let score = compose_score(&analysis);
        assert!(!score.synthesized);
        assert!((score.after - score.before - 7.5).abs() < 1e-9);
    }

    #[test]
    fn test_reported_after_delta_pair_pins_baseline() {
        let mut analysis = analysis_with(points(&[90.0, 85.0]));
        analysis.reported = ReportedScore {
            before: None,
            after: Some(70.0),
            delta: Some(10.0),
        };
        let score = compose_score(&analysis);
        assert!(!score.synthesized);
        // Baseline comes from the server's own pair, not the composite
        assert_eq!(score.before, 60.0);
        assert!((score.delta - (score.after - 60.0)).abs() < 1e-9);
    }

    #[test]
    fn test_before_after_delta_consistency() {
        let raw = json!({"retention": [96, 90, 84, 81], "score": {"before": 60.0}});
        let analysis = normalize_analysis(Some(&raw), 60.0);
        let score = compose_score(&analysis);
        assert!((score.before - (score.after - score.delta)).abs() < 1e-9);
    }
}
