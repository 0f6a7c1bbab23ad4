//! Tiered upload execution.
//!
//! `upload` attempts multipart, then a single presigned PUT, then the
//! authenticated proxy, falling through on each failure. A multipart
//! attempt that fails after creating a session is aborted best-effort so no
//! dangling upload is leaked on the object store; the abort's own failure
//! is logged and swallowed since there is no further recourse.

use std::io::SeekFrom;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, ETAG};
use reqwest::{Client, RequestBuilder};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::{debug, info, warn};

use recut_models::{CreateJobResponse, JobId};

use crate::error::{UploadError, UploadResult};
use crate::planner;
use crate::progress::{ProgressObserver, UploadEvent};
use crate::session::{SessionStore, UploadSession, UploadTier};
use crate::types::{
    AbortMultipartRequest, CompleteMultipartRequest, CompletedPartWire, CreateMultipartRequest,
    MultipartSession,
};

/// Read granularity for streamed request bodies.
const STREAM_CHUNK_BYTES: usize = 1024 * 1024;

/// Configuration for the upload orchestrator.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Backend base URL
    pub api_base: String,
    /// Bearer token for authenticated endpoints
    pub auth_token: Option<String>,
    /// Timeout for control-plane calls (create/complete/abort)
    pub request_timeout: Duration,
    /// Timeout for data-plane transfers (part and file PUTs)
    pub transfer_timeout: Duration,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:8000".to_string(),
            auth_token: None,
            request_timeout: Duration::from_secs(30),
            transfer_timeout: Duration::from_secs(600),
        }
    }
}

impl UploadConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            api_base: std::env::var("RECUT_API_BASE")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            auth_token: std::env::var("RECUT_AUTH_TOKEN").ok(),
            request_timeout: Duration::from_secs(
                std::env::var("RECUT_REQUEST_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            transfer_timeout: Duration::from_secs(
                std::env::var("RECUT_TRANSFER_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
            ),
        }
    }
}

/// Terminal result of a successful upload.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    /// The tier that succeeded
    pub tier: UploadTier,
    /// Total bytes persisted
    pub bytes_total: u64,
    /// Object key, when the tier exposes one
    pub object_key: Option<String>,
}

/// Drives the tiered upload strategy for one file against one job.
pub struct UploadOrchestrator {
    http: Client,
    config: UploadConfig,
    sessions: Arc<SessionStore>,
}

impl UploadOrchestrator {
    /// Create a new orchestrator.
    pub fn new(config: UploadConfig) -> UploadResult<Self> {
        // No client-wide timeout: transfers are bounded per request
        let http = Client::builder().build().map_err(UploadError::Network)?;
        Ok(Self {
            http,
            config,
            sessions: Arc::new(SessionStore::new()),
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> UploadResult<Self> {
        Self::new(UploadConfig::from_env())
    }

    /// Shared handle to the per-job session store.
    pub fn sessions(&self) -> Arc<SessionStore> {
        Arc::clone(&self.sessions)
    }

    /// Upload a file for a created job, attempting each tier in order.
    ///
    /// Returns the outcome of the first tier that succeeds, or
    /// [`UploadError::AllTiersFailed`] after the proxy tier also fails.
    pub async fn upload(
        &self,
        path: &Path,
        job: &CreateJobResponse,
        observer: Arc<dyn ProgressObserver>,
    ) -> UploadResult<UploadOutcome> {
        let size = tokio::fs::metadata(path).await?.len();
        let job_id = job.job.id.clone();

        self.sessions.insert(UploadSession::new(
            job_id.clone(),
            size,
            planner::chunk_size(size),
        ));

        match self.multipart_tier(path, &job_id, size, observer.as_ref()).await {
            Ok(outcome) => return Ok(outcome),
            Err(e) => {
                warn!(job_id = %job_id, "multipart tier failed: {}", e);
                observer.on_event(&UploadEvent::TierFailed {
                    job_id: job_id.clone(),
                    tier: UploadTier::Multipart,
                    detail: e.to_string(),
                });
            }
        }

        if let Some(upload_url) = job.upload_url.as_deref() {
            self.sessions
                .with_session(&job_id, |s| s.switch_tier(UploadTier::SinglePut));
            match self
                .single_put_tier(path, &job_id, upload_url, size, &observer)
                .await
            {
                Ok(outcome) => return Ok(outcome),
                Err(e) => {
                    warn!(job_id = %job_id, "single-put tier failed: {}", e);
                    observer.on_event(&UploadEvent::TierFailed {
                        job_id: job_id.clone(),
                        tier: UploadTier::SinglePut,
                        detail: e.to_string(),
                    });
                }
            }
        } else {
            debug!(job_id = %job_id, "no presigned upload URL; skipping single-put tier");
        }

        self.sessions
            .with_session(&job_id, |s| s.switch_tier(UploadTier::Proxy));
        match self.proxy_tier(path, &job_id, size, observer.as_ref()).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                warn!(job_id = %job_id, "proxy tier failed: {}", e);
                observer.on_event(&UploadEvent::TierFailed {
                    job_id: job_id.clone(),
                    tier: UploadTier::Proxy,
                    detail: e.to_string(),
                });
                // Terminal failure: no tier will resume this session
                self.sessions.remove(&job_id);
                Err(UploadError::AllTiersFailed { job_id })
            }
        }
    }

    /// Tier 1: multipart direct-to-object-storage.
    async fn multipart_tier(
        &self,
        path: &Path,
        job_id: &JobId,
        size: u64,
        observer: &dyn ProgressObserver,
    ) -> UploadResult<UploadOutcome> {
        observer.on_event(&UploadEvent::TierStarted {
            job_id: job_id.clone(),
            tier: UploadTier::Multipart,
        });

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload.bin".to_string());

        let request = CreateMultipartRequest {
            job_id: job_id.to_string(),
            filename: filename.clone(),
            content_type: planner::content_type_for(&filename).to_string(),
            size_bytes: size,
        };

        let response = self
            .authorize(self.http.post(self.endpoint("/api/uploads/create")))
            .timeout(self.config.request_timeout)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(UploadError::SessionRejected(format!(
                "create returned {}",
                response.status()
            )));
        }

        let mp: MultipartSession = response.json().await?;
        if mp.part_size == 0 {
            return Err(UploadError::SessionRejected("zero part size".to_string()));
        }

        self.sessions.with_session(job_id, |s| {
            s.upload_id = Some(mp.upload_id.clone());
            s.object_key = Some(mp.key.clone());
        });

        info!(
            job_id = %job_id,
            upload_id = %mp.upload_id,
            parts = planner::part_count(size, mp.part_size),
            "multipart session opened"
        );

        let parts = match self.put_parts(path, job_id, size, &mp, observer).await {
            Ok(parts) => parts,
            Err(e) => {
                self.abort_multipart(&mp).await;
                return Err(e);
            }
        };

        if let Err(e) = self.complete_multipart(job_id, &mp, parts).await {
            self.abort_multipart(&mp).await;
            return Err(e);
        }

        observer.on_event(&UploadEvent::Completed {
            job_id: job_id.clone(),
            tier: UploadTier::Multipart,
            bytes_total: Some(size),
        });

        Ok(UploadOutcome {
            tier: UploadTier::Multipart,
            bytes_total: size,
            object_key: Some(mp.key),
        })
    }

    /// PUT each part slice to its presigned URL, sequentially in ascending
    /// part-number order. A response without an `ETag` header is a hard
    /// failure: the completion call depends on exact etags.
    async fn put_parts(
        &self,
        path: &Path,
        job_id: &JobId,
        size: u64,
        mp: &MultipartSession,
        observer: &dyn ProgressObserver,
    ) -> UploadResult<Vec<CompletedPartWire>> {
        let expected = planner::part_count(size, mp.part_size);
        let mut file = tokio::fs::File::open(path).await?;
        let mut wire_parts = Vec::with_capacity(expected as usize);
        let mut uploaded: u64 = 0;

        for part_number in 1..=expected as u32 {
            let part = mp
                .presigned_parts
                .iter()
                .find(|p| p.part_number == part_number)
                .ok_or_else(|| UploadError::TierFailed {
                    tier: UploadTier::Multipart,
                    detail: format!("no presigned URL for part {}", part_number),
                })?;

            let offset = (part_number as u64 - 1) * mp.part_size;
            let len = mp.part_size.min(size - offset) as usize;
            let mut buf = vec![0u8; len];
            file.seek(SeekFrom::Start(offset)).await?;
            file.read_exact(&mut buf).await?;

            let response = self
                .http
                .put(&part.url)
                .timeout(self.config.transfer_timeout)
                .header(CONTENT_LENGTH, len)
                .body(buf)
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(UploadError::TierFailed {
                    tier: UploadTier::Multipart,
                    detail: format!("part {} returned {}", part_number, response.status()),
                });
            }

            let etag = response
                .headers()
                .get(ETAG)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
                .ok_or(UploadError::MissingEtag { part_number })?;

            if let Some(result) = self
                .sessions
                .with_session(job_id, |s| s.record_part(part_number, etag.clone(), len as u64))
            {
                result?;
            }

            uploaded += len as u64;
            wire_parts.push(CompletedPartWire {
                etag,
                part_number,
            });

            observer.on_event(&UploadEvent::BytesTransferred {
                job_id: job_id.clone(),
                tier: UploadTier::Multipart,
                bytes_uploaded: uploaded,
                bytes_total: Some(size),
            });
            debug!(job_id = %job_id, part_number, uploaded, "part uploaded");
        }

        Ok(wire_parts)
    }

    /// Finish the multipart upload with the accumulated parts list.
    async fn complete_multipart(
        &self,
        job_id: &JobId,
        mp: &MultipartSession,
        parts: Vec<CompletedPartWire>,
    ) -> UploadResult<()> {
        let request = CompleteMultipartRequest {
            job_id: job_id.to_string(),
            key: mp.key.clone(),
            upload_id: mp.upload_id.clone(),
            parts,
        };

        let response = self
            .authorize(self.http.post(self.endpoint("/api/uploads/complete")))
            .timeout(self.config.request_timeout)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(UploadError::TierFailed {
                tier: UploadTier::Multipart,
                detail: format!("complete returned {}", response.status()),
            });
        }
        Ok(())
    }

    /// Compensating abort for a partially-successful multipart attempt.
    /// Best-effort: a failed abort is logged and swallowed.
    async fn abort_multipart(&self, mp: &MultipartSession) {
        let request = AbortMultipartRequest {
            key: mp.key.clone(),
            upload_id: mp.upload_id.clone(),
        };

        let result = self
            .authorize(self.http.post(self.endpoint("/api/uploads/abort")))
            .timeout(self.config.request_timeout)
            .json(&request)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                debug!(upload_id = %mp.upload_id, "multipart upload aborted");
            }
            Ok(response) => {
                warn!(upload_id = %mp.upload_id, "abort returned {}", response.status());
            }
            Err(e) => {
                warn!(upload_id = %mp.upload_id, "abort failed: {}", e);
            }
        }
    }

    /// Tier 2: stream the whole file to the presigned PUT URL, then notify
    /// the backend that ingestion finished.
    async fn single_put_tier(
        &self,
        path: &Path,
        job_id: &JobId,
        upload_url: &str,
        size: u64,
        observer: &Arc<dyn ProgressObserver>,
    ) -> UploadResult<UploadOutcome> {
        observer.on_event(&UploadEvent::TierStarted {
            job_id: job_id.clone(),
            tier: UploadTier::SinglePut,
        });

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let body = self
            .streaming_body(path, job_id, size, UploadTier::SinglePut, Some(Arc::clone(observer)))
            .await?;

        let response = self
            .http
            .put(upload_url)
            .timeout(self.config.transfer_timeout)
            .header(CONTENT_LENGTH, size)
            .header(CONTENT_TYPE, planner::content_type_for(&filename))
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(UploadError::TierFailed {
                tier: UploadTier::SinglePut,
                detail: format!("presigned PUT returned {}", response.status()),
            });
        }

        let notify = self
            .authorize(
                self.http
                    .post(self.endpoint(&format!("/api/jobs/{}/complete-upload", job_id))),
            )
            .timeout(self.config.request_timeout)
            .send()
            .await?;

        if !notify.status().is_success() {
            return Err(UploadError::TierFailed {
                tier: UploadTier::SinglePut,
                detail: format!("complete-upload returned {}", notify.status()),
            });
        }

        observer.on_event(&UploadEvent::Completed {
            job_id: job_id.clone(),
            tier: UploadTier::SinglePut,
            bytes_total: Some(size),
        });

        Ok(UploadOutcome {
            tier: UploadTier::SinglePut,
            bytes_total: size,
            object_key: None,
        })
    }

    /// Tier 3: stream the raw body to the authenticated proxy endpoint.
    /// All-or-nothing: no byte-level progress is reported.
    async fn proxy_tier(
        &self,
        path: &Path,
        job_id: &JobId,
        size: u64,
        observer: &dyn ProgressObserver,
    ) -> UploadResult<UploadOutcome> {
        observer.on_event(&UploadEvent::TierStarted {
            job_id: job_id.clone(),
            tier: UploadTier::Proxy,
        });

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let body = self
            .streaming_body(path, job_id, size, UploadTier::Proxy, None)
            .await?;

        let url = format!("{}?jobId={}", self.endpoint("/api/uploads/proxy"), job_id);
        let response = self
            .authorize(self.http.post(url))
            .timeout(self.config.transfer_timeout)
            .header(CONTENT_LENGTH, size)
            .header(CONTENT_TYPE, planner::content_type_for(&filename))
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(UploadError::TierFailed {
                tier: UploadTier::Proxy,
                detail: format!("proxy returned {}", response.status()),
            });
        }

        observer.on_event(&UploadEvent::Completed {
            job_id: job_id.clone(),
            tier: UploadTier::Proxy,
            bytes_total: None,
        });

        Ok(UploadOutcome {
            tier: UploadTier::Proxy,
            bytes_total: size,
            object_key: None,
        })
    }

    /// Build a streaming request body over the file, emitting cumulative
    /// byte counts to the observer as chunks are consumed.
    async fn streaming_body(
        &self,
        path: &Path,
        job_id: &JobId,
        size: u64,
        tier: UploadTier,
        observer: Option<Arc<dyn ProgressObserver>>,
    ) -> UploadResult<reqwest::Body> {
        struct StreamState {
            file: tokio::fs::File,
            sent: u64,
            total: u64,
            job_id: JobId,
            tier: UploadTier,
            observer: Option<Arc<dyn ProgressObserver>>,
            sessions: Arc<SessionStore>,
        }

        let state = StreamState {
            file: tokio::fs::File::open(path).await?,
            sent: 0,
            total: size,
            job_id: job_id.clone(),
            tier,
            observer,
            sessions: Arc::clone(&self.sessions),
        };

        let body_stream = stream::unfold(state, |mut state| async move {
            if state.sent >= state.total {
                return None;
            }

            let want = STREAM_CHUNK_BYTES.min((state.total - state.sent) as usize);
            let mut buf = vec![0u8; want];
            match state.file.read(&mut buf).await {
                Ok(0) => Some((
                    Err(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        "file shorter than its reported size",
                    )),
                    state,
                )),
                Ok(n) => {
                    buf.truncate(n);
                    state.sent += n as u64;
                    if let Some(observer) = &state.observer {
                        observer.on_event(&UploadEvent::BytesTransferred {
                            job_id: state.job_id.clone(),
                            tier: state.tier,
                            bytes_uploaded: state.sent,
                            bytes_total: Some(state.total),
                        });
                        let sent = state.sent;
                        state
                            .sessions
                            .with_session(&state.job_id, |s| s.bytes_uploaded = sent);
                    }
                    Some((Ok(buf), state))
                }
                Err(e) => Some((Err(e), state)),
            }
        });

        Ok(reqwest::Body::wrap_stream(body_stream))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base.trim_end_matches('/'), path)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.config.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = UploadConfig::default();
        assert_eq!(config.api_base, "http://localhost:8000");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_endpoint_joining() {
        let mut config = UploadConfig::default();
        config.api_base = "https://api.recut.app/".to_string();
        let orchestrator = UploadOrchestrator::new(config).unwrap();
        assert_eq!(
            orchestrator.endpoint("/api/uploads/create"),
            "https://api.recut.app/api/uploads/create"
        );
    }
}
