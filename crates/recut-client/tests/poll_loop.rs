//! Polling loop behavior against a mock backend.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use recut_client::{ApiClient, ApiConfig, ClientError, JobPollingLoop, PollConfig, PollHandler};
use recut_models::{JobDetail, JobId, JobSummary};

#[derive(Default)]
struct Recorder {
    lists: Mutex<Vec<Vec<JobSummary>>>,
    details: Mutex<Vec<JobDetail>>,
    errors: Mutex<Vec<String>>,
    ticks: AtomicUsize,
}

impl PollHandler for Recorder {
    fn on_jobs(&self, jobs: &[JobSummary]) {
        self.lists.lock().unwrap().push(jobs.to_vec());
    }

    fn on_detail(&self, detail: &JobDetail) {
        self.details.lock().unwrap().push(detail.clone());
    }

    fn on_eta_tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    fn on_error(&self, error: &ClientError) {
        self.errors.lock().unwrap().push(error.to_string());
    }
}

fn job_json(id: &str, status: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "filename": "clip.mp4",
        "status": status,
        "progress": 40,
        "createdAt": "2026-08-01T10:00:00Z",
        "updatedAt": "2026-08-01T10:05:00Z",
    })
}

fn client(server: &MockServer) -> Arc<ApiClient> {
    let config = ApiConfig {
        base_url: server.uri(),
        auth_token: Some("test-token".to_string()),
        timeout: Duration::from_secs(5),
        max_retries: 2,
    };
    Arc::new(ApiClient::new(config).unwrap())
}

fn fast_poll() -> PollConfig {
    PollConfig {
        list_interval: Duration::from_millis(20),
        detail_interval: Duration::from_millis(10),
        eta_tick_interval: Duration::from_millis(5),
    }
}

#[tokio::test]
async fn loop_stops_once_all_jobs_terminal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/jobs"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"jobs": [job_json("j-1", "rendering")]})),
        )
        .up_to_n_times(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/jobs"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"jobs": [job_json("j-1", "ready")]})),
        )
        .mount(&server)
        .await;

    let recorder = Arc::new(Recorder::default());
    let polling = JobPollingLoop::new(client(&server), fast_poll());

    tokio::time::timeout(Duration::from_secs(5), polling.run(recorder.clone()))
        .await
        .expect("loop should stop on its own")
        .unwrap();

    let lists = recorder.lists.lock().unwrap();
    assert!(lists.len() >= 3);
    assert!(lists.last().unwrap()[0].is_terminal());
    assert!(recorder.ticks.load(Ordering::Relaxed) > 0);
}

#[tokio::test]
async fn session_expiry_aborts_without_retry() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/jobs"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let recorder = Arc::new(Recorder::default());
    let polling = JobPollingLoop::new(client(&server), fast_poll());

    let err = tokio::time::timeout(Duration::from_secs(5), polling.run(recorder.clone()))
        .await
        .expect("loop should abort on its own")
        .unwrap_err();

    assert!(matches!(err, ClientError::SessionExpired));
    assert!(recorder.errors.lock().unwrap().is_empty());
}

#[tokio::test]
async fn selected_job_detail_polled_until_terminal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/jobs"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"jobs": [job_json("j-2", "retention")]})),
        )
        .up_to_n_times(3)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/jobs"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"jobs": [job_json("j-2", "ready")]})),
        )
        .mount(&server)
        .await;

    let mut detail = job_json("j-2", "ready");
    detail["durationSec"] = serde_json::json!(42.5);
    detail["analysis"] = serde_json::json!({"retention": [100, 90, 80]});
    Mock::given(method("GET"))
        .and(path("/api/jobs/j-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(detail))
        .mount(&server)
        .await;

    let recorder = Arc::new(Recorder::default());
    let polling = JobPollingLoop::new(client(&server), fast_poll());
    polling.select_job(Some(JobId::from_string("j-2")));

    tokio::time::timeout(Duration::from_secs(5), polling.run(recorder.clone()))
        .await
        .expect("loop should stop on its own")
        .unwrap();

    let details = recorder.details.lock().unwrap();
    // Selection is cleared after the first terminal snapshot
    assert_eq!(details.len(), 1);
    assert_eq!(details[0].duration_or_zero(), 42.5);
    assert!(details[0].analysis.is_some());
}
