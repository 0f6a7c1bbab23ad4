//! Authenticated job API client.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use recut_models::{
    CreateJobRequest, CreateJobResponse, JobDetail, JobId, JobSummary, OutputUrlResponse,
};

use crate::error::{ClientError, ClientResult};

/// Configuration for the API client.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Backend base URL
    pub base_url: String,
    /// Bearer token for authenticated calls
    pub auth_token: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Max retries for idempotent reads
    pub max_retries: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            auth_token: None,
            timeout: Duration::from_secs(30),
            max_retries: 2,
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("RECUT_API_BASE")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            auth_token: std::env::var("RECUT_AUTH_TOKEN").ok(),
            timeout: Duration::from_secs(
                std::env::var("RECUT_API_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            max_retries: std::env::var("RECUT_API_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
        }
    }
}

/// Wrapper shape of `GET /api/jobs`.
#[derive(Debug, Deserialize)]
struct JobListResponse {
    jobs: Vec<JobSummary>,
}

/// Error body shape the backend uses for quota and validation failures.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Client for the job endpoints.
pub struct ApiClient {
    http: Client,
    config: ApiConfig,
}

impl ApiClient {
    /// Create a new API client.
    pub fn new(config: ApiConfig) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ClientError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> ClientResult<Self> {
        Self::new(ApiConfig::from_env())
    }

    /// Create a job. Not retried: the idempotency key lets a caller safely
    /// resubmit, but resubmission is the caller's decision.
    pub async fn create_job(&self, request: &CreateJobRequest) -> ClientResult<CreateJobResponse> {
        let url = self.endpoint("/api/jobs/create");
        debug!(filename = %request.filename, "creating job");

        let response = self
            .authorize(self.http.post(&url))
            .json(request)
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    /// List job summaries.
    pub async fn list_jobs(&self) -> ClientResult<Vec<JobSummary>> {
        let url = self.endpoint("/api/jobs");
        let response = self
            .with_retry(|| async {
                let response = self.authorize(self.http.get(&url)).send().await?;
                Self::check(response).await
            })
            .await?;
        let list: JobListResponse = response.json().await?;
        Ok(list.jobs)
    }

    /// Fetch full job detail including the raw analysis payload.
    pub async fn get_job(&self, job_id: &JobId) -> ClientResult<JobDetail> {
        let url = self.endpoint(&format!("/api/jobs/{}", job_id));
        let response = self
            .with_retry(|| async {
                let response = self.authorize(self.http.get(&url)).send().await?;
                Self::check(response).await
            })
            .await?;
        Ok(response.json().await?)
    }

    /// Fetch a playable/downloadable URL for a finished job.
    pub async fn output_url(&self, job_id: &JobId) -> ClientResult<OutputUrlResponse> {
        let url = self.endpoint(&format!("/api/jobs/{}/output-url", job_id));
        let response = self
            .with_retry(|| async {
                let response = self.authorize(self.http.get(&url)).send().await?;
                Self::check(response).await
            })
            .await?;
        Ok(response.json().await?)
    }

    /// Map a response's status to the error taxonomy.
    ///
    /// 401 is terminal (stale token); a render-limit body is terminal and
    /// carried verbatim; 5xx is retryable; everything else non-success is a
    /// plain request failure.
    async fn check(response: Response) -> ClientResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED {
            return Err(ClientError::SessionExpired);
        }

        let body = response.text().await.unwrap_or_default();
        let parsed = serde_json::from_str::<ErrorBody>(&body).ok();

        // 402 is a render-limit regardless of body shape; a structured body
        // only refines the detail text.
        let is_render_limit = status == StatusCode::PAYMENT_REQUIRED
            || parsed.as_ref().and_then(|p| p.code.as_deref()) == Some("render_limit");
        if is_render_limit {
            let detail = parsed
                .and_then(|p| p.error.or(p.message))
                .unwrap_or_else(|| {
                    let raw = body.trim();
                    if raw.is_empty() {
                        "render limit reached".to_string()
                    } else {
                        raw.to_string()
                    }
                });
            return Err(ClientError::RenderLimit { detail });
        }

        if status.is_server_error() {
            return Err(ClientError::ServiceUnavailable(format!(
                "backend returned {}: {}",
                status, body
            )));
        }

        Err(ClientError::RequestFailed(format!(
            "backend returned {}: {}",
            status, body
        )))
    }

    /// Execute with retry logic for idempotent reads.
    async fn with_retry<F, Fut, T>(&self, operation: F) -> ClientResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = ClientResult<T>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = Duration::from_millis(500 * 2u64.pow(attempt));
                    warn!(
                        "request failed (attempt {}), retrying in {:?}: {}",
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error
            .unwrap_or_else(|| ClientError::RequestFailed("unknown error".to_string())))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
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
        let config = ApiConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.max_retries, 2);
    }
}
