//! Analytics derivation engine for the ReCut client.
//!
//! Turns the backend's loosely-structured analysis payload into canonical
//! retention curves, emotion timelines and explorer lists, composes the
//! weighted retention score, and answers cursor-correlation lookups. Also
//! houses the per-job ETA estimator fed by upload and stage observations.

pub mod cursor;
pub mod eta;
pub mod normalize;
pub mod score;

pub use cursor::CursorIndex;
pub use eta::{EtaEstimator, EtaInputs, StageMarker, TransferStats};
pub use normalize::{normalize_analysis, NormalizedAnalysis, ReportedScore};
pub use score::compose_score;
