//! HTTP client for the job API.
//!
//! [`ApiClient`] wraps the authenticated job endpoints with retry for
//! idempotent reads, and [`JobPollingLoop`] drives fixed-interval list and
//! detail polling until every job reaches a terminal state.

pub mod api;
pub mod error;
pub mod poll;

pub use api::{ApiClient, ApiConfig};
pub use error::{ClientError, ClientResult};
pub use poll::{JobPollingLoop, PollConfig, PollHandler};
