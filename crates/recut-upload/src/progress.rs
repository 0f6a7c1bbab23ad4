//! Upload progress events.
//!
//! Within a single tier attempt, `bytes_uploaded` is monotonically
//! non-decreasing; a `TierStarted` event marks the reset between attempts.
//! Byte totals are reported for the multipart and single-PUT tiers and
//! omitted for the proxy tier, which only has an all-or-nothing signal.

use recut_models::JobId;

use crate::session::UploadTier;

/// Progress event emitted by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadEvent {
    /// A tier attempt began; byte counters reset.
    TierStarted { job_id: JobId, tier: UploadTier },
    /// Bytes landed. `bytes_total` is `None` when the tier cannot know it.
    BytesTransferred {
        job_id: JobId,
        tier: UploadTier,
        bytes_uploaded: u64,
        bytes_total: Option<u64>,
    },
    /// A tier attempt failed; the orchestrator falls through to the next.
    TierFailed {
        job_id: JobId,
        tier: UploadTier,
        detail: String,
    },
    /// The upload finished on this tier.
    Completed {
        job_id: JobId,
        tier: UploadTier,
        bytes_total: Option<u64>,
    },
}

/// Observer for upload progress.
pub trait ProgressObserver: Send + Sync {
    fn on_event(&self, event: &UploadEvent);
}

/// Observer that discards all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {
    fn on_event(&self, _event: &UploadEvent) {}
}

impl<F> ProgressObserver for F
where
    F: Fn(&UploadEvent) + Send + Sync,
{
    fn on_event(&self, event: &UploadEvent) {
        self(event)
    }
}
