//! API client error types.

use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// 401 from any authenticated call. Never retried; the caller must
    /// drop the token and force a sign-out.
    #[error("session expired; sign in again")]
    SessionExpired,

    /// Server-reported render quota exhaustion, surfaced verbatim.
    #[error("render limit reached: {detail}")]
    RenderLimit { detail: String },

    #[error("backend unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    /// Whether a retry could plausibly succeed. Authorization and quota
    /// failures are terminal by contract.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::ServiceUnavailable(_) | ClientError::Network(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_errors_not_retryable() {
        assert!(!ClientError::SessionExpired.is_retryable());
        assert!(!ClientError::RenderLimit {
            detail: "0 renders left".to_string()
        }
        .is_retryable());
        assert!(ClientError::ServiceUnavailable("503".to_string()).is_retryable());
    }
}
