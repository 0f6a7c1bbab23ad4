//! Fixed-interval job polling.
//!
//! Three independent cadences: the job list while any job is non-terminal,
//! the selected job's detail at a tighter interval while it is non-terminal,
//! and an ETA tick that fires regardless of network activity. `run` returns
//! when no non-terminal job remains, dropping all three tickers with it, so
//! no timer outlives its precondition.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use recut_models::{JobDetail, JobId, JobSummary};

use crate::api::ApiClient;
use crate::error::{ClientError, ClientResult};

/// Polling cadence configuration.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Interval between job-list fetches
    pub list_interval: Duration,
    /// Interval between selected-job detail fetches
    pub detail_interval: Duration,
    /// Interval between ETA re-render ticks
    pub eta_tick_interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            list_interval: Duration::from_secs(5),
            detail_interval: Duration::from_secs(2),
            eta_tick_interval: Duration::from_secs(1),
        }
    }
}

impl PollConfig {
    /// Create config from environment variables (values in milliseconds).
    pub fn from_env() -> Self {
        let millis = |key: &str, default: u64| {
            Duration::from_millis(
                std::env::var(key)
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(default),
            )
        };
        Self {
            list_interval: millis("RECUT_POLL_LIST_MS", 5_000),
            detail_interval: millis("RECUT_POLL_DETAIL_MS", 2_000),
            eta_tick_interval: millis("RECUT_POLL_ETA_MS", 1_000),
        }
    }
}

/// Callbacks invoked by the polling loop.
pub trait PollHandler: Send + Sync {
    /// Fresh job-list snapshot.
    fn on_jobs(&self, jobs: &[JobSummary]);

    /// Fresh detail snapshot for the selected job.
    fn on_detail(&self, detail: &JobDetail);

    /// ETA re-render tick; fires on its own cadence with no new data.
    fn on_eta_tick(&self) {}

    /// A poll attempt failed with a recoverable error; polling continues.
    fn on_error(&self, error: &ClientError);
}

/// Drives list, detail, and ETA timers against the API.
pub struct JobPollingLoop {
    client: Arc<ApiClient>,
    config: PollConfig,
    selected: Mutex<Option<JobId>>,
}

impl JobPollingLoop {
    pub fn new(client: Arc<ApiClient>, config: PollConfig) -> Self {
        Self {
            client,
            config,
            selected: Mutex::new(None),
        }
    }

    /// Select the job whose detail should be polled at the tighter interval.
    /// Selection is cleared automatically once the job turns terminal, after
    /// the final snapshot has been delivered.
    pub fn select_job(&self, job_id: Option<JobId>) {
        *self.selected.lock().expect("selection poisoned") = job_id;
    }

    fn selected_job(&self) -> Option<JobId> {
        self.selected.lock().expect("selection poisoned").clone()
    }

    /// Run until every listed job is terminal.
    ///
    /// A 401 aborts immediately with [`ClientError::SessionExpired`]; other
    /// errors are reported through the handler and polling continues.
    pub async fn run(&self, handler: Arc<dyn PollHandler>) -> ClientResult<()> {
        info!(
            list = ?self.config.list_interval,
            detail = ?self.config.detail_interval,
            "starting job polling loop"
        );

        let mut list_tick = interval(self.config.list_interval);
        let mut detail_tick = interval(self.config.detail_interval);
        let mut eta_tick = interval(self.config.eta_tick_interval);
        list_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        detail_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        eta_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = list_tick.tick() => {
                    match self.client.list_jobs().await {
                        Ok(jobs) => {
                            handler.on_jobs(&jobs);
                            if jobs.iter().all(JobSummary::is_terminal) {
                                info!("all jobs terminal; polling stopped");
                                return Ok(());
                            }
                        }
                        Err(ClientError::SessionExpired) => {
                            warn!("job list returned 401; stopping polling");
                            return Err(ClientError::SessionExpired);
                        }
                        Err(e) => handler.on_error(&e),
                    }
                }
                _ = detail_tick.tick() => {
                    let Some(job_id) = self.selected_job() else { continue };
                    match self.client.get_job(&job_id).await {
                        Ok(detail) => {
                            let terminal = detail.is_terminal();
                            handler.on_detail(&detail);
                            if terminal {
                                debug!(job_id = %job_id, "selected job terminal; detail polling stopped");
                                self.select_job(None);
                            }
                        }
                        Err(ClientError::SessionExpired) => {
                            warn!("job detail returned 401; stopping polling");
                            return Err(ClientError::SessionExpired);
                        }
                        Err(e) => handler.on_error(&e),
                    }
                }
                _ = eta_tick.tick() => handler.on_eta_tick(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_interval_tighter_than_list() {
        let config = PollConfig::default();
        assert!(config.detail_interval < config.list_interval);
        assert!(config.eta_tick_interval <= config.detail_interval);
    }
}
