//! Terminal progress view.
//!
//! Bridges upload events and poll snapshots into printed status lines, with
//! a shared ETA estimator fed from both sides.

use std::sync::Mutex;

use chrono::Utc;
use tracing::{debug, warn};

use recut_analytics::{compose_score, normalize_analysis, EtaEstimator, EtaInputs};
use recut_client::{ClientError, PollHandler};
use recut_models::{format_bytes, format_eta, JobDetail, JobSummary};
use recut_upload::{ProgressObserver, UploadEvent};

pub struct ProgressView {
    estimator: Mutex<EtaEstimator>,
    latest: Mutex<Option<JobDetail>>,
}

impl ProgressView {
    pub fn new() -> Self {
        Self {
            estimator: Mutex::new(EtaEstimator::new()),
            latest: Mutex::new(None),
        }
    }

    /// Freshest detail snapshot seen by the poll loop.
    pub fn latest_detail(&self) -> Option<JobDetail> {
        self.latest.lock().expect("view poisoned").clone()
    }

    fn print_detail(&self, detail: &JobDetail) {
        let stage = detail.stage();
        if stage.is_terminal() {
            let mut estimator = self.estimator.lock().expect("view poisoned");
            estimator.forget(&detail.summary.id);
            match detail.summary.error_message.as_deref() {
                Some(message) => println!("{}: {}", stage.display_name(), message),
                None => println!("{}", stage.display_name()),
            }
            return;
        }

        let inputs = EtaInputs {
            stage,
            progress: detail.summary.progress,
            file_size_bytes: detail.summary.size_bytes.unwrap_or(0),
            quality: detail.export_quality,
        };
        let estimator = self.estimator.lock().expect("view poisoned");
        let eta = estimator.estimate(&detail.summary.id, &inputs, Utc::now());
        match eta {
            Some(secs) => println!(
                "{} {:>3}%  ETA {}",
                stage.display_name(),
                detail.summary.progress,
                format_eta(secs)
            ),
            None => println!("{} {:>3}%", stage.display_name(), detail.summary.progress),
        }
    }
}

impl PollHandler for ProgressView {
    fn on_jobs(&self, jobs: &[JobSummary]) {
        let active = jobs.iter().filter(|j| !j.is_terminal()).count();
        debug!(total = jobs.len(), active, "job list refreshed");
    }

    fn on_detail(&self, detail: &JobDetail) {
        {
            let mut estimator = self.estimator.lock().expect("view poisoned");
            estimator.observe_stage(&detail.summary.id, detail.stage(), Utc::now());
        }
        self.print_detail(detail);
        *self.latest.lock().expect("view poisoned") = Some(detail.clone());
    }

    fn on_eta_tick(&self) {
        if let Some(detail) = self.latest_detail() {
            if !detail.is_terminal() {
                self.print_detail(&detail);
            }
        }
    }

    fn on_error(&self, error: &ClientError) {
        warn!("poll failed: {}", error);
    }
}

impl ProgressObserver for ProgressView {
    fn on_event(&self, event: &UploadEvent) {
        match event {
            UploadEvent::TierStarted { tier, .. } => {
                println!("uploading via {} tier", tier);
            }
            UploadEvent::BytesTransferred {
                job_id,
                bytes_uploaded,
                bytes_total,
                ..
            } => {
                if let Some(total) = bytes_total {
                    let mut estimator = self.estimator.lock().expect("view poisoned");
                    estimator.observe_transfer(job_id, *bytes_uploaded, *total, Utc::now());
                    println!(
                        "uploaded {} of {}",
                        format_bytes(*bytes_uploaded),
                        format_bytes(*total)
                    );
                }
            }
            UploadEvent::TierFailed { tier, detail, .. } => {
                warn!("{} tier failed: {}", tier, detail);
            }
            UploadEvent::Completed { tier, .. } => {
                println!("upload complete ({} tier)", tier);
            }
        }
    }
}

/// Print the derived analytics summary for a finished job.
pub fn print_analysis(detail: &JobDetail) {
    let normalized = normalize_analysis(detail.analysis.as_ref(), detail.duration_or_zero());
    let score = compose_score(&normalized);

    let marker = if score.synthesized { " (estimated)" } else { "" };
    println!(
        "retention {:.0} -> {:.0} ({:+.1}){}",
        score.before, score.after, score.delta, marker
    );
    for item in &score.breakdown {
        println!("  {:<18} {:>5.1} x {:.2} = {:>5.2}", item.label, item.score, item.weight, item.weighted_score);
    }

    if !normalized.hooks.is_empty() {
        println!("hooks:");
        for hook in normalized.hooks.iter().take(3) {
            println!("  {:>6.1}s-{:<6.1}s {}", hook.start_sec, hook.end_sec, hook.reason);
        }
    }
    if !normalized.risks.is_empty() {
        println!("risk windows:");
        for risk in normalized.risks.iter().take(3) {
            println!("  {:>6.1}s-{:<6.1}s {}", risk.start_sec, risk.end_sec, risk.reason);
        }
    }
}
