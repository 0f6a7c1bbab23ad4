//! Tolerant normalization of the analysis payload.
//!
//! The payload shape is not contractually fixed across job versions, so
//! every extractor here is an ordered try-this-field-then-that-field chain
//! returning options. Entries that fail required-field checks are discarded
//! rather than raised as errors, and non-finite numerics are treated as
//! absent. The UI must always have something plausible to render.

use serde_json::Value;
use tracing::debug;

use recut_models::{
    ActionItem, EmotionMoment, EmotionSegment, HookCandidate, RetentionPoint, RiskWindow,
    ACTION_ITEM_CAP, EMOTION_SEGMENT_CAP, HOOK_CANDIDATE_CAP, RETENTION_POINT_CAP,
    RISK_WINDOW_CAP,
};

/// Spacing assumed when the retention curve arrives as a flat numeric array.
const FLAT_CURVE_SPACING_SEC: f64 = 15.0;

/// Ranges narrower than this are degenerate and dropped.
const MIN_RANGE_SPAN_SEC: f64 = 0.2;

/// Minimum span given to an emotion moment with no successor.
const MIN_SEGMENT_SPAN_SEC: f64 = 3.0;

/// Duration assumed for the synthetic curve when the probe has not landed.
const FALLBACK_DURATION_SEC: f64 = 60.0;

/// Before/after/delta score values explicitly reported by the backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportedScore {
    pub before: Option<f64>,
    pub after: Option<f64>,
    pub delta: Option<f64>,
}

/// The full set of canonical records derived from one analysis payload.
#[derive(Debug, Clone, Default)]
pub struct NormalizedAnalysis {
    pub retention: Vec<RetentionPoint>,
    /// True when `retention` was synthesized because the payload had no curve.
    pub retention_synthetic: bool,
    pub emotions: Vec<EmotionMoment>,
    pub segments: Vec<EmotionSegment>,
    pub hooks: Vec<HookCandidate>,
    pub risks: Vec<RiskWindow>,
    pub actions: Vec<ActionItem>,
    /// Scan confidence on a 0-100 scale, when reported.
    pub scan_confidence: Option<f64>,
    pub reported: ReportedScore,
}

/// Normalize a raw analysis payload into canonical records.
///
/// `raw` is the `analysis` field of a job detail; `duration_sec` bounds all
/// timeline clamping (zero means unknown).
pub fn normalize_analysis(raw: Option<&Value>, duration_sec: f64) -> NormalizedAnalysis {
    let duration = if duration_sec.is_finite() && duration_sec > 0.0 {
        duration_sec
    } else {
        0.0
    };

    let retention_raw = raw.and_then(|v| field(v, &["retention", "retentionCurve", "retention_points", "curve"]));
    let (retention, retention_synthetic) = normalize_retention(retention_raw, duration);

    let emotions = normalize_emotions(
        raw.and_then(|v| field(v, &["emotions", "emotionMoments", "emotion_moments"])),
        duration,
    );
    let segments = segments_from_moments(&emotions, duration);

    let hooks = normalize_hooks(
        raw.and_then(|v| field(v, &["hooks", "hookCandidates", "hook_candidates"])),
        duration,
    );
    let risks = normalize_risks(
        raw.and_then(|v| field(v, &["risks", "riskWindows", "risk_windows", "dropoffs"])),
        duration,
    );
    let actions = normalize_actions(
        raw.and_then(|v| field(v, &["actions", "actionItems", "action_items", "suggestions"])),
        duration,
    );

    let scan_confidence = raw
        .and_then(|v| num_field(v, &["scanConfidence", "scan_confidence", "confidence", "coverage"]))
        .map(to_percent_scale);

    let reported = raw
        .and_then(|v| field(v, &["score", "retentionScore", "retention_score"]))
        .map(|score| ReportedScore {
            before: num_field(score, &["before", "baseline"]),
            after: num_field(score, &["after", "current"]),
            delta: num_field(score, &["delta", "lift", "improvement"]),
        })
        .unwrap_or_default();

    NormalizedAnalysis {
        retention,
        retention_synthetic,
        emotions,
        segments,
        hooks,
        risks,
        actions,
        scan_confidence,
        reported,
    }
}

/// Normalize the retention curve, synthesizing one when absent.
///
/// Returns the points and whether they were synthesized.
pub fn normalize_retention(raw: Option<&Value>, duration_sec: f64) -> (Vec<RetentionPoint>, bool) {
    let mut points: Vec<RetentionPoint> = Vec::new();

    if let Some(Value::Array(entries)) = raw {
        for (index, entry) in entries.iter().enumerate() {
            let point = match entry {
                // Flat numeric array: index determines spacing
                Value::Number(_) => as_finite(entry).map(|predicted| RetentionPoint {
                    at_sec: index as f64 * FLAT_CURVE_SPACING_SEC,
                    predicted: predicted.clamp(0.0, 100.0),
                    kind: None,
                    description: None,
                }),
                Value::Object(_) => {
                    let at = num_field(entry, &["atSec", "at_sec", "timeSec", "time_sec", "t", "at", "time"]);
                    let predicted =
                        num_field(entry, &["predicted", "retention", "value", "score", "pct"]);
                    match (at, predicted) {
                        (Some(at), Some(predicted)) => Some(RetentionPoint {
                            at_sec: at.max(0.0),
                            predicted: predicted.clamp(0.0, 100.0),
                            kind: str_field(entry, &["kind", "type", "tag"]),
                            description: str_field(entry, &["description", "label", "reason"]),
                        }),
                        _ => None,
                    }
                }
                _ => None,
            };

            match point {
                Some(p) => points.push(p),
                None => debug!(index, "discarding malformed retention entry"),
            }
        }
    }

    if points.is_empty() {
        return (synthetic_retention(duration_sec), true);
    }

    points.sort_by(|a, b| a.at_sec.partial_cmp(&b.at_sec).unwrap_or(std::cmp::Ordering::Equal));
    points.truncate(RETENTION_POINT_CAP);
    (points, false)
}

/// Deterministic 7-point fallback curve spanning `[0, duration]`.
///
/// Values follow a gentle quadratic decay from 100 down to 48 so the graph
/// renders plausibly before the backend supplies a real curve.
fn synthetic_retention(duration_sec: f64) -> Vec<RetentionPoint> {
    let span = if duration_sec > 0.0 {
        duration_sec
    } else {
        FALLBACK_DURATION_SEC
    };

    (0..7)
        .map(|i| {
            let t = i as f64 / 6.0;
            RetentionPoint {
                at_sec: t * span,
                predicted: 100.0 - 30.0 * t - 22.0 * t * t,
                kind: None,
                description: None,
            }
        })
        .collect()
}

/// Normalize emotion moments.
///
/// Accepts explicit `emotion`/`intensity` fields, or a `scores` map from
/// which the arg-max pair is taken as the dominant emotion. Intensities on a
/// fractional 0-1 scale are promoted to percent.
pub fn normalize_emotions(raw: Option<&Value>, duration_sec: f64) -> Vec<EmotionMoment> {
    let mut moments: Vec<EmotionMoment> = Vec::new();

    if let Some(Value::Array(entries)) = raw {
        for (index, entry) in entries.iter().enumerate() {
            let timestamp = num_field(
                entry,
                &["timestampSec", "timestamp_sec", "timestamp", "atSec", "at_sec", "t", "time"],
            );

            let explicit = str_field(entry, &["emotion", "label"]).and_then(|emotion| {
                num_field(entry, &["intensity", "strength", "value"])
                    .map(|intensity| (emotion, intensity))
            });

            let dominant = explicit.or_else(|| {
                entry
                    .get("scores")
                    .and_then(Value::as_object)
                    .and_then(|scores| {
                        scores
                            .iter()
                            .filter_map(|(k, v)| as_finite(v).map(|n| (k.clone(), n)))
                            .max_by(|a, b| {
                                a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal)
                            })
                    })
            });

            match (timestamp, dominant) {
                (Some(ts), Some((emotion, intensity))) => {
                    let mut at = ts.max(0.0);
                    if duration_sec > 0.0 {
                        at = at.min(duration_sec);
                    }
                    moments.push(EmotionMoment {
                        timestamp_sec: at,
                        emotion,
                        intensity: to_percent_scale(intensity),
                        reason: str_field(entry, &["reason", "why", "description"]),
                    });
                }
                _ => debug!(index, "discarding malformed emotion entry"),
            }
        }
    }

    moments.sort_by(|a, b| {
        a.timestamp_sec
            .partial_cmp(&b.timestamp_sec)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    moments
}

/// Derive non-overlapping timeline segments from sorted emotion moments.
///
/// Each moment extends to the start of the next, or by a minimum span when
/// it has no successor, clipped to the video duration.
pub fn segments_from_moments(moments: &[EmotionMoment], duration_sec: f64) -> Vec<EmotionSegment> {
    let duration = if duration_sec > 0.0 {
        duration_sec
    } else {
        // Without a known duration percentages are meaningless but the
        // spans themselves still render; use the last moment as the bound.
        moments
            .last()
            .map(|m| m.timestamp_sec + MIN_SEGMENT_SPAN_SEC)
            .unwrap_or(FALLBACK_DURATION_SEC)
    };

    let mut segments: Vec<EmotionSegment> = Vec::new();
    for (i, moment) in moments.iter().enumerate() {
        let start = moment.timestamp_sec.min(duration);
        let natural_end = match moments.get(i + 1) {
            Some(next) => next.timestamp_sec,
            None => start + MIN_SEGMENT_SPAN_SEC,
        };
        let end = natural_end.max(start).min(duration);
        if end <= start {
            continue;
        }

        segments.push(EmotionSegment {
            start_sec: start,
            end_sec: end,
            emotion: moment.emotion.clone(),
            intensity: moment.intensity,
            position_pct: start / duration * 100.0,
            width_pct: (end - start) / duration * 100.0,
        });
        if segments.len() == EMOTION_SEGMENT_CAP {
            break;
        }
    }
    segments
}

/// Normalize hook candidates.
pub fn normalize_hooks(raw: Option<&Value>, duration_sec: f64) -> Vec<HookCandidate> {
    let mut hooks = ranges(raw, duration_sec, &["score", "strength", "confidence"])
        .map(|(start, end, score, entry)| HookCandidate {
            start_sec: start,
            end_sec: end,
            score,
            reason: str_field(entry, &["reason", "why", "description", "label"])
                .unwrap_or_else(|| "Potential hook".to_string()),
        })
        .collect::<Vec<_>>();
    sort_by_relevance(&mut hooks, |h| (h.score, h.start_sec));
    hooks.truncate(HOOK_CANDIDATE_CAP);
    hooks
}

/// Normalize risk windows.
pub fn normalize_risks(raw: Option<&Value>, duration_sec: f64) -> Vec<RiskWindow> {
    let mut risks = ranges(raw, duration_sec, &["severity", "score", "risk"])
        .map(|(start, end, severity, entry)| RiskWindow {
            start_sec: start,
            end_sec: end,
            severity,
            reason: str_field(entry, &["reason", "why", "description", "label"])
                .unwrap_or_else(|| "Viewer drop-off risk".to_string()),
        })
        .collect::<Vec<_>>();
    sort_by_relevance(&mut risks, |r| (r.severity, r.start_sec));
    risks.truncate(RISK_WINDOW_CAP);
    risks
}

/// Normalize action items.
pub fn normalize_actions(raw: Option<&Value>, duration_sec: f64) -> Vec<ActionItem> {
    let mut actions = ranges(raw, duration_sec, &["score", "impact", "priority"])
        .map(|(start, end, score, entry)| ActionItem {
            start_sec: start,
            end_sec: end,
            score,
            reason: str_field(entry, &["reason", "action", "description", "label"])
                .unwrap_or_else(|| "Suggested edit".to_string()),
        })
        .collect::<Vec<_>>();
    sort_by_relevance(&mut actions, |a| (a.score, a.start_sec));
    actions.truncate(ACTION_ITEM_CAP);
    actions
}

/// Shared range extraction: clamp into `[0, duration]`, drop degenerate
/// spans, scale fractional scores to percent.
fn ranges<'a>(
    raw: Option<&'a Value>,
    duration_sec: f64,
    score_keys: &'a [&'a str],
) -> impl Iterator<Item = (f64, f64, f64, &'a Value)> {
    let entries = match raw {
        Some(Value::Array(entries)) => entries.as_slice(),
        _ => &[],
    };

    entries.iter().filter_map(move |entry| {
        let start = num_field(entry, &["startSec", "start_sec", "start", "from", "s"])?;
        let end = num_field(entry, &["endSec", "end_sec", "end", "to", "e"])?;
        let score = num_field(entry, score_keys).map(to_percent_scale).unwrap_or(50.0);

        let (mut start, mut end) = (start.max(0.0), end.max(0.0));
        if duration_sec > 0.0 {
            start = start.min(duration_sec);
            end = end.min(duration_sec);
        }
        if end - start < MIN_RANGE_SPAN_SEC {
            return None;
        }
        Some((start, end, score.clamp(0.0, 100.0), entry))
    })
}

/// Sort by relevance: score descending, then start ascending.
fn sort_by_relevance<T, F: Fn(&T) -> (f64, f64)>(items: &mut [T], key: F) {
    items.sort_by(|a, b| {
        let (score_a, start_a) = key(a);
        let (score_b, start_b) = key(b);
        score_b
            .partial_cmp(&score_a)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(start_a.partial_cmp(&start_b).unwrap_or(std::cmp::Ordering::Equal))
    });
}

/// Promote fractional 0-1 values to a 0-100 percent scale.
///
/// Decision rule: values at or below 1 are treated as fractional.
fn to_percent_scale(value: f64) -> f64 {
    let scaled = if value <= 1.0 { value * 100.0 } else { value };
    scaled.clamp(0.0, 100.0)
}

/// Look up the first present field among the candidate keys.
fn field<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| value.get(k)).filter(|v| !v.is_null())
}

/// Extract a finite number from the first usable candidate field.
///
/// Non-finite results never propagate; the chain continues to the next key.
fn num_field(value: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .filter_map(|k| value.get(k))
        .find_map(as_finite)
}

/// Coerce a JSON value to a finite f64, accepting numeric strings.
fn as_finite(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Extract a non-empty string from the first usable candidate field.
fn str_field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| value.get(k))
        .find_map(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
