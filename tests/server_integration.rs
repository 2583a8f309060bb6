//! End-to-end tests for the slash-command server
//!
//! The server runs on an ephemeral port; Slack's response_url is a wiremock
//! endpoint.

use chrono::Duration as Days;
use dangbeon::clock::Clock;
use dangbeon::config::ServerConfig;
use dangbeon::notifications::ResponseUrlClient;
use dangbeon::server::{AppState, HealthResponse, OnCallServer, UsageResponse};
use dangbeon::storage::MockAssignmentRepository;
use dangbeon::dispatch::DispatchConfig;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct TestServer {
    base: String,
    state: AppState,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    async fn start(repo: Arc<MockAssignmentRepository>) -> Self {
        let sink = ResponseUrlClient::new(Duration::from_secs(2)).unwrap();
        let state = AppState::new(repo, Arc::new(sink), DispatchConfig::default(), Clock::kst());
        let config = ServerConfig {
            enable_request_logging: false,
            ..ServerConfig::default()
        };
        let server = OnCallServer::new(config, state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let (tx, rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            server
                .serve(listener, async {
                    let _ = rx.await;
                })
                .await
                .unwrap();
        });

        Self {
            base,
            state,
            shutdown: Some(tx),
        }
    }

    fn url(&self, route: &str) -> String {
        format!("{}{route}", self.base)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

fn seeded() -> Arc<MockAssignmentRepository> {
    let today = Clock::kst().today();
    let repo = Arc::new(MockAssignmentRepository::new());
    repo.seed(today + Days::days(2), "A");
    repo.seed(today + Days::days(9), "B");
    repo
}

// ============================================================================
// Probes
// ============================================================================

#[tokio::test]
async fn test_get_probes_describe_usage() {
    let server = TestServer::start(seeded()).await;
    let client = reqwest::Client::new();

    let swap: UsageResponse = client
        .get(server.url("/slack/swap"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(swap.usage.contains("/온콜바꿔"));

    let list: UsageResponse = client
        .get(server.url("/slack/oncall"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(list.usage.contains("/온콜리스트"));

    let health: HealthResponse = client
        .get(server.url("/api/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health.status, "healthy");
}

// ============================================================================
// Swap Command
// ============================================================================

#[tokio::test]
async fn test_swap_acks_then_posts_result() {
    let slack = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/commands/T1/42"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&slack)
        .await;

    let repo = seeded();
    let server = TestServer::start(repo.clone()).await;
    let response_url = format!("{}/commands/T1/42", slack.uri());

    let ack: Value = reqwest::Client::new()
        .post(server.url("/slack/swap"))
        .form(&[("text", "A B"), ("response_url", response_url.as_str())])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(ack["response_type"], "ephemeral");
    assert!(ack["text"].as_str().unwrap().contains("⏳"));

    let outcomes = server.state.inflight.drain(Duration::from_secs(5)).await;
    assert_eq!(outcomes.len(), 1);

    let today = Clock::kst().today();
    assert_eq!(repo.responder_on(today + Days::days(2)).as_deref(), Some("B"));
    assert_eq!(repo.responder_on(today + Days::days(9)).as_deref(), Some("A"));

    let requests = slack.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["response_type"], "in_channel");
    assert!(body.to_string().contains("온콜 일정이 변경되었습니다"));
}

#[tokio::test]
async fn test_malformed_swap_answers_immediately() {
    let slack = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&slack)
        .await;

    let repo = seeded();
    let server = TestServer::start(repo.clone()).await;
    let response_url = format!("{}/commands/T1/43", slack.uri());

    let reply: Value = reqwest::Client::new()
        .post(server.url("/slack/swap"))
        .form(&[("text", "A"), ("response_url", response_url.as_str())])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let text = reply["text"].as_str().unwrap();
    assert!(text.contains("사용법: /온콜바꿔 [멤버1] [멤버2]"));
    assert!(server.state.inflight.is_empty().await);
    assert!(repo.update_calls().is_empty());
}

#[tokio::test]
async fn test_unknown_member_reported_through_response_url() {
    let slack = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&slack)
        .await;

    let repo = seeded();
    let server = TestServer::start(repo.clone()).await;
    let response_url = format!("{}/commands/T1/44", slack.uri());

    reqwest::Client::new()
        .post(server.url("/slack/swap"))
        .form(&[("text", "A 로쿤"), ("response_url", response_url.as_str())])
        .send()
        .await
        .unwrap();

    server.state.inflight.drain(Duration::from_secs(5)).await;

    let requests = slack.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body["text"]
        .as_str()
        .unwrap()
        .contains("'로쿤'의 향후 온콜 일정을 찾을 수 없습니다."));
    assert!(repo.update_calls().is_empty());
}

// ============================================================================
// List Command
// ============================================================================

#[tokio::test]
async fn test_list_returns_upcoming_assignments() {
    let repo = seeded();
    let today = Clock::kst().today();
    repo.seed(today - Days::days(1), "C");
    repo.seed(today + Days::days(45), "C");
    let server = TestServer::start(repo).await;

    let reply: Value = reqwest::Client::new()
        .post(server.url("/slack/oncall"))
        .form(&[("text", "")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let rendered = reply.to_string();
    assert_eq!(reply["response_type"], "in_channel");
    assert!(rendered.contains("- A"));
    assert!(rendered.contains("- B"));
    assert!(!rendered.contains("- C"));
}

#[tokio::test]
async fn test_list_empty_message() {
    let server = TestServer::start(Arc::new(MockAssignmentRepository::new())).await;

    let reply: Value = reqwest::Client::new()
        .post(server.url("/slack/oncall"))
        .form(&[("text", "")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(
        reply["text"],
        "📅 향후 30일간 예정된 온콜 스케줄이 없습니다."
    );
}
