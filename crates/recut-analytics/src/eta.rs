//! Remaining-time estimation.
//!
//! Estimates come from one of two modes: observed upload byte-rate while a
//! job is uploading, or stage-elapsed/progress extrapolation for every other
//! non-terminal stage, with a per-stage baseline heuristic when the server
//! has reported no progress yet. All state is keyed by job id and dropped
//! explicitly when a job reaches a terminal state.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use recut_models::{ExportQuality, JobId, PipelineStage};

const MIB: f64 = 1024.0 * 1024.0;

/// Minimum elapsed time before a byte-rate is considered observable.
const MIN_RATE_ELAPSED_SECS: f64 = 0.5;

/// Post-upload processing buffer, proportional to file size.
const UPLOAD_BUFFER_SECS_PER_MIB: f64 = 0.2;

/// When a job has entered the current pipeline stage.
///
/// Replaced, not merged, whenever the normalized stage changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageMarker {
    pub stage: PipelineStage,
    pub entered_at: DateTime<Utc>,
}

/// Observed upload byte counts for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferStats {
    pub bytes_uploaded: u64,
    pub bytes_total: u64,
    pub started_at: DateTime<Utc>,
}

/// Snapshot of the job fields the estimator needs, taken from the freshest
/// job detail.
#[derive(Debug, Clone, Copy)]
pub struct EtaInputs {
    pub stage: PipelineStage,
    /// Server-reported progress for the current stage (0-100).
    pub progress: u8,
    pub file_size_bytes: u64,
    pub quality: ExportQuality,
}

/// Per-job ETA estimator.
#[derive(Debug, Default)]
pub struct EtaEstimator {
    stages: HashMap<JobId, StageMarker>,
    transfers: HashMap<JobId, TransferStats>,
}

impl EtaEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the stage a job is currently in. The marker is replaced only
    /// when the stage actually changes, preserving time-in-stage.
    pub fn observe_stage(&mut self, job_id: &JobId, stage: PipelineStage, now: DateTime<Utc>) {
        match self.stages.get(job_id) {
            Some(marker) if marker.stage == stage => {}
            _ => {
                self.stages.insert(
                    job_id.clone(),
                    StageMarker {
                        stage,
                        entered_at: now,
                    },
                );
            }
        }
    }

    /// Record upload byte counts for a job. A byte count lower than the
    /// previous observation means a new tier attempt started, so the rate
    /// window resets.
    pub fn observe_transfer(
        &mut self,
        job_id: &JobId,
        bytes_uploaded: u64,
        bytes_total: u64,
        now: DateTime<Utc>,
    ) {
        let entry = self.transfers.entry(job_id.clone()).or_insert(TransferStats {
            bytes_uploaded: 0,
            bytes_total,
            started_at: now,
        });

        if bytes_uploaded < entry.bytes_uploaded {
            entry.started_at = now;
        }
        entry.bytes_uploaded = bytes_uploaded;
        entry.bytes_total = bytes_total;
    }

    /// Drop all state for a job. Called on terminal transition so the maps
    /// do not grow across a long-lived session.
    pub fn forget(&mut self, job_id: &JobId) {
        self.stages.remove(job_id);
        self.transfers.remove(job_id);
    }

    /// Estimate seconds remaining for a job, or `None` for terminal stages.
    ///
    /// Never returns a negative value; callers treat zero as "finalizing".
    pub fn estimate(&self, job_id: &JobId, inputs: &EtaInputs, now: DateTime<Utc>) -> Option<f64> {
        if inputs.stage.is_terminal() {
            return None;
        }

        let estimate = if inputs.stage == PipelineStage::Uploading {
            self.upload_estimate(job_id, inputs, now)
        } else {
            self.processing_estimate(job_id, inputs, now)
        };

        Some(estimate.max(0.0))
    }

    /// Byte-rate estimate, falling back to percent extrapolation when byte
    /// counts are not observable yet.
    fn upload_estimate(&self, job_id: &JobId, inputs: &EtaInputs, now: DateTime<Utc>) -> f64 {
        if let Some(transfer) = self.transfers.get(job_id) {
            let elapsed = elapsed_secs(transfer.started_at, now);
            if transfer.bytes_uploaded > 0 && elapsed > MIN_RATE_ELAPSED_SECS {
                let rate = transfer.bytes_uploaded as f64 / elapsed;
                let outstanding = transfer.bytes_total.saturating_sub(transfer.bytes_uploaded) as f64;
                let buffer = UPLOAD_BUFFER_SECS_PER_MIB * (inputs.file_size_bytes as f64 / MIB);
                return outstanding / rate + buffer;
            }
        }

        // Percent clamped to [1, 99]: avoids divide-by-zero and avoids the
        // estimate snapping straight to zero at 100%.
        let pct = (inputs.progress as f64).clamp(1.0, 99.0);
        let elapsed = self.stage_elapsed(job_id, now);
        elapsed * (100.0 - pct) / pct
    }

    /// Progress extrapolation, or the per-stage baseline heuristic when no
    /// progress has been reported for the stage.
    fn processing_estimate(&self, job_id: &JobId, inputs: &EtaInputs, now: DateTime<Utc>) -> f64 {
        let elapsed = self.stage_elapsed(job_id, now);

        if inputs.progress > 0 && elapsed > 0.0 {
            let p = (inputs.progress as f64).min(99.0);
            return elapsed * (100.0 - p) / p;
        }

        let file_mb = (inputs.file_size_bytes as f64 / MIB).max(1.0);
        let size_factor = (file_mb.sqrt() / 16.0).clamp(0.5, 4.0);
        inputs.stage.baseline_secs() * size_factor * inputs.quality.eta_multiplier() - elapsed
    }

    fn stage_elapsed(&self, job_id: &JobId, now: DateTime<Utc>) -> f64 {
        self.stages
            .get(job_id)
            .map(|marker| elapsed_secs(marker.entered_at, now))
            .unwrap_or(0.0)
    }
}

fn elapsed_secs(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    ((to - from).num_milliseconds() as f64 / 1000.0).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn inputs(stage: PipelineStage, progress: u8, size_mb: u64) -> EtaInputs {
        EtaInputs {
            stage,
            progress,
            file_size_bytes: size_mb * 1024 * 1024,
            quality: ExportQuality::Standard,
        }
    }

    #[test]
    fn test_terminal_stages_return_none() {
        let estimator = EtaEstimator::new();
        let job = JobId::new();
        let now = Utc::now();
        assert!(estimator
            .estimate(&job, &inputs(PipelineStage::Ready, 100, 10), now)
            .is_none());
        assert!(estimator
            .estimate(&job, &inputs(PipelineStage::Failed, 0, 10), now)
            .is_none());
    }

    #[test]
    fn test_byte_rate_estimate() {
        let mut estimator = EtaEstimator::new();
        let job = JobId::new();
        let start = Utc::now();
        let now = start + Duration::seconds(10);

        // 100 MiB of 300 MiB in 10s -> 10 MiB/s -> 20s left + 60s buffer
        estimator.observe_transfer(&job, 0, 300 * 1024 * 1024, start);
        estimator.observe_transfer(&job, 100 * 1024 * 1024, 300 * 1024 * 1024, now);

        let eta = estimator
            .estimate(&job, &inputs(PipelineStage::Uploading, 33, 300), now)
            .unwrap();
        assert!((eta - (20.0 + 0.2 * 300.0)).abs() < 1e-6);
    }

    #[test]
    fn test_upload_percent_fallback_clamps() {
        let mut estimator = EtaEstimator::new();
        let job = JobId::new();
        let start = Utc::now();
        let now = start + Duration::seconds(30);
        estimator.observe_stage(&job, PipelineStage::Uploading, start);

        // No transfer observations; progress 0 clamps to 1%
        let eta = estimator
            .estimate(&job, &inputs(PipelineStage::Uploading, 0, 50), now)
            .unwrap();
        assert!((eta - 30.0 * 99.0).abs() < 1e-6);

        // progress 100 clamps to 99%, never snapping to zero
        let eta = estimator
            .estimate(&job, &inputs(PipelineStage::Uploading, 100, 50), now)
            .unwrap();
        assert!(eta > 0.0);
    }

    #[test]
    fn test_stage_transition_uses_baseline_not_byte_rate() {
        let mut estimator = EtaEstimator::new();
        let job = JobId::new();
        let start = Utc::now();

        estimator.observe_transfer(&job, 50 * 1024 * 1024, 100 * 1024 * 1024, start);
        estimator.observe_stage(&job, PipelineStage::Uploading, start);

        // Stage flips to analyzing with no reported progress
        let now = start + Duration::seconds(5);
        estimator.observe_stage(&job, PipelineStage::Analyzing, now);

        let snapshot = inputs(PipelineStage::Analyzing, 0, 256);
        let eta = estimator.estimate(&job, &snapshot, now).unwrap();
        let expected = PipelineStage::Analyzing.baseline_secs() * 1.0 * 1.0;
        assert!((eta - expected).abs() < 1e-6);
    }

    #[test]
    fn test_progress_extrapolation() {
        let mut estimator = EtaEstimator::new();
        let job = JobId::new();
        let start = Utc::now();
        estimator.observe_stage(&job, PipelineStage::Rendering, start);

        let now = start + Duration::seconds(40);
        let eta = estimator
            .estimate(&job, &inputs(PipelineStage::Rendering, 25, 100), now)
            .unwrap();
        assert!((eta - 120.0).abs() < 1e-6);
    }

    #[test]
    fn test_estimate_never_negative() {
        let mut estimator = EtaEstimator::new();
        let job = JobId::new();
        let start = Utc::now();
        estimator.observe_stage(&job, PipelineStage::Retention, start);

        // Far past the baseline for the stage
        let now = start + Duration::seconds(100_000);
        let eta = estimator
            .estimate(&job, &inputs(PipelineStage::Retention, 0, 8), now)
            .unwrap();
        assert_eq!(eta, 0.0);
    }

    #[test]
    fn test_quality_multiplier_applies_to_baseline() {
        let estimator = EtaEstimator::new();
        let job = JobId::new();
        let now = Utc::now();

        let mut uhd = inputs(PipelineStage::Rendering, 0, 256);
        uhd.quality = ExportQuality::Uhd4k;
        let base = estimator
            .estimate(&job, &inputs(PipelineStage::Rendering, 0, 256), now)
            .unwrap();
        let scaled = estimator.estimate(&job, &uhd, now).unwrap();
        assert!((scaled - base * 1.45).abs() < 1e-6);
    }

    #[test]
    fn test_tier_restart_resets_rate_window() {
        let mut estimator = EtaEstimator::new();
        let job = JobId::new();
        let start = Utc::now();

        estimator.observe_transfer(&job, 200, 1000, start);
        // Bytes went backwards: new tier attempt
        let later = start + Duration::seconds(60);
        estimator.observe_transfer(&job, 10, 1000, later);

        let transfer = estimator.transfers.get(&job).unwrap();
        assert_eq!(transfer.started_at, later);
        assert_eq!(transfer.bytes_uploaded, 10);
    }

    #[test]
    fn test_forget_drops_all_state() {
        let mut estimator = EtaEstimator::new();
        let job = JobId::new();
        let now = Utc::now();
        estimator.observe_stage(&job, PipelineStage::Analyzing, now);
        estimator.observe_transfer(&job, 1, 2, now);
        estimator.forget(&job);
        assert!(estimator.stages.is_empty());
        assert!(estimator.transfers.is_empty());
    }
}
