//! Error taxonomy mapping against a mock backend.

use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use recut_client::{ApiClient, ApiConfig, ClientError};
use recut_models::{CreateJobRequest, JobId};

fn client(server: &MockServer) -> ApiClient {
    let config = ApiConfig {
        base_url: server.uri(),
        auth_token: Some("test-token".to_string()),
        timeout: Duration::from_secs(5),
        max_retries: 2,
    };
    ApiClient::new(config).unwrap()
}

#[tokio::test]
async fn render_limit_surfaced_verbatim() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/jobs/create"))
        .respond_with(ResponseTemplate::new(402).set_body_json(serde_json::json!({
            "code": "render_limit",
            "error": "Render limit reached: 0 of 3 renders left this month",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = CreateJobRequest::new("clip.mp4", "video/mp4", 1024);
    let err = client(&server).create_job(&request).await.unwrap_err();

    match err {
        ClientError::RenderLimit { detail } => {
            assert_eq!(detail, "Render limit reached: 0 of 3 renders left this month");
        }
        other => panic!("expected RenderLimit, got {other}"),
    }
}

#[tokio::test]
async fn plain_text_quota_body_still_maps_to_render_limit() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/jobs/create"))
        .respond_with(
            ResponseTemplate::new(402)
                .set_body_string("Render limit reached: 0 of 3 renders left this month"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let request = CreateJobRequest::new("clip.mp4", "video/mp4", 1024);
    let err = client(&server).create_job(&request).await.unwrap_err();

    match err {
        ClientError::RenderLimit { detail } => {
            assert_eq!(detail, "Render limit reached: 0 of 3 renders left this month");
        }
        other => panic!("expected RenderLimit, got {other}"),
    }
}

#[tokio::test]
async fn unauthorized_detail_fetch_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/jobs/j-9"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server)
        .get_job(&JobId::from_string("j-9"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::SessionExpired));
}

#[tokio::test]
async fn transient_server_error_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/jobs"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"jobs": []})))
        .expect(1)
        .mount(&server)
        .await;

    let jobs = client(&server).list_jobs().await.unwrap();
    assert!(jobs.is_empty());
}
