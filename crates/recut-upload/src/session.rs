//! Per-job upload session state.
//!
//! A session is allocated when a file is accepted, looked up by job id on
//! every callback, and removed once the job reaches an ingested state. The
//! store is the only client-owned mutable state besides stage markers; all
//! writes for a job id are causally ordered by the sequential tier loop.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use recut_models::JobId;

use crate::error::{UploadError, UploadResult};

/// One of the three upload strategies, attempted in a fixed fallback order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadTier {
    Multipart,
    SinglePut,
    Proxy,
}

impl UploadTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadTier::Multipart => "multipart",
            UploadTier::SinglePut => "single_put",
            UploadTier::Proxy => "proxy",
        }
    }
}

impl std::fmt::Display for UploadTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A completed multipart part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedPart {
    pub part_number: u32,
    pub etag: String,
}

/// Mutable upload state for one job.
#[derive(Debug, Clone)]
pub struct UploadSession {
    pub job_id: JobId,
    pub file_size_bytes: u64,
    pub chunk_size_bytes: u64,
    pub upload_id: Option<String>,
    pub object_key: Option<String>,
    pub parts_completed: Vec<CompletedPart>,
    pub bytes_uploaded: u64,
    pub started_at: DateTime<Utc>,
    pub tier: UploadTier,
}

impl UploadSession {
    /// Create a fresh session for an accepted file.
    pub fn new(job_id: JobId, file_size_bytes: u64, chunk_size_bytes: u64) -> Self {
        Self {
            job_id,
            file_size_bytes,
            chunk_size_bytes,
            upload_id: None,
            object_key: None,
            parts_completed: Vec::new(),
            bytes_uploaded: 0,
            started_at: Utc::now(),
            tier: UploadTier::Multipart,
        }
    }

    /// Record a completed part.
    ///
    /// Parts must arrive in strictly ascending part-number order with no
    /// duplicates; the completion call depends on that ordering.
    pub fn record_part(&mut self, part_number: u32, etag: String, len: u64) -> UploadResult<()> {
        if let Some(last) = self.parts_completed.last() {
            if part_number <= last.part_number {
                return Err(UploadError::PartOrder {
                    part_number,
                    last: last.part_number,
                });
            }
        }
        self.parts_completed.push(CompletedPart { part_number, etag });
        self.bytes_uploaded += len;
        Ok(())
    }

    /// Switch to the next tier, resetting per-attempt progress.
    pub fn switch_tier(&mut self, tier: UploadTier) {
        self.tier = tier;
        self.bytes_uploaded = 0;
        self.parts_completed.clear();
        self.upload_id = None;
        self.object_key = None;
    }
}

/// Session store keyed by job id.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<JobId, UploadSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) the session for a job.
    pub fn insert(&self, session: UploadSession) {
        let mut sessions = self.sessions.lock().expect("session store poisoned");
        sessions.insert(session.job_id.clone(), session);
    }

    /// Snapshot the session for a job.
    pub fn get(&self, job_id: &JobId) -> Option<UploadSession> {
        let sessions = self.sessions.lock().expect("session store poisoned");
        sessions.get(job_id).cloned()
    }

    /// Mutate the session for a job in place.
    pub fn with_session<T>(
        &self,
        job_id: &JobId,
        f: impl FnOnce(&mut UploadSession) -> T,
    ) -> Option<T> {
        let mut sessions = self.sessions.lock().expect("session store poisoned");
        sessions.get_mut(job_id).map(f)
    }

    /// Drop the session for a job. Called on terminal transition; sessions
    /// are removed, not merely overwritten, so the map cannot grow across a
    /// long-lived process.
    pub fn remove(&self, job_id: &JobId) -> Option<UploadSession> {
        let mut sessions = self.sessions.lock().expect("session store poisoned");
        sessions.remove(job_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().expect("session store poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
