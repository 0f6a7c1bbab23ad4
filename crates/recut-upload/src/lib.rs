//! Tiered upload orchestration.
//!
//! Turns a local file into durable remote storage by attempting, in order:
//! multipart direct-to-object-storage, a single presigned PUT, and an
//! authenticated proxy fallback. Emits progress events per tier and issues
//! a compensating abort when a partially-successful multipart attempt is
//! abandoned.

pub mod error;
pub mod orchestrator;
pub mod planner;
pub mod progress;
pub mod session;
pub mod types;

pub use error::{UploadError, UploadResult};
pub use orchestrator::{UploadConfig, UploadOrchestrator, UploadOutcome};
pub use planner::{chunk_size, content_type_for, parallelism, part_count};
pub use progress::{NoopObserver, ProgressObserver, UploadEvent};
pub use session::{CompletedPart, SessionStore, UploadSession, UploadTier};
