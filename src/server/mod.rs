mod assets;
mod handlers;
mod response;
pub mod wire;

use std::net::SocketAddr;
use std::time::Instant;

use axum::Router;
use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tracing::{Instrument, info, info_span, warn};

use crate::context::AppContext;
use crate::error::AppResult;

pub fn build_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/tasks", post(handlers::search_tasks))
        .route("/api/tasks/{task_id}", post(handlers::task_details))
        .route("/api/tasks/{task_id}/label", post(handlers::add_label))
        .fallback(assets::serve_ui)
        .layer(middleware::from_fn(log_request))
        .with_state(ctx)
}

pub async fn serve(ctx: AppContext) -> AppResult<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], ctx.config.port));
    let listener = TcpListener::bind(addr).await?;
    info!(
        %addr,
        static_dir = %ctx.config.static_dir.display(),
        "proxy server listening"
    );

    axum::serve(listener, build_router(ctx))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "unable to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let span = info_span!("http.request", %method, %path);
    let response = next.run(request).instrument(span).await;

    info!(
        %method,
        %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request completed"
    );
    response
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use reqwest::StatusCode;
    use serde_json::{Value, json};

    use super::*;
    use crate::config::ServerConfig;
    use crate::infra::jira::JiraClient;
    use crate::test_support::{FAKE_TOKEN, FakeJira, issue};

    struct Harness {
        jira: FakeJira,
        proxy_url: String,
        http: reqwest::Client,
        _static_dir: tempfile::TempDir,
    }

    impl Harness {
        async fn start(issues: Vec<Value>) -> Self {
            let jira = FakeJira::start(issues).await;
            let static_dir = tempfile::tempdir().expect("static dir");
            std::fs::write(static_dir.path().join("index.html"), "<html>swipe</html>")
                .expect("write index");

            let config = ServerConfig::new(0, static_dir.path().to_path_buf());
            let ctx = AppContext::new(config, Arc::new(JiraClient::new()));
            let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind proxy");
            let addr = listener.local_addr().expect("local addr");
            tokio::spawn(async move {
                axum::serve(listener, build_router(ctx))
                    .await
                    .expect("serve proxy")
            });

            Self {
                jira,
                proxy_url: format!("http://{addr}"),
                http: reqwest::Client::new(),
                _static_dir: static_dir,
            }
        }

        fn jira_config(&self) -> Value {
            json!({ "baseURL": self.jira.base_url, "apiToken": FAKE_TOKEN })
        }

        async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
            let response = self
                .http
                .post(format!("{}{path}", self.proxy_url))
                .json(&body)
                .send()
                .await
                .expect("proxy request");
            let status = response.status();
            (status, response.json().await.expect("json body"))
        }
    }

    #[tokio::test]
    async fn search_returns_formatted_tickets_with_links() {
        let harness = Harness::start(vec![
            issue("X-1", json!({"summary": "first", "priority": {"name": "High"}})),
            issue("X-2", json!({"summary": "second"})),
            issue("X-3", json!({"summary": "third"})),
        ])
        .await;

        let (status, body) = harness
            .post(
                "/api/tasks",
                json!({"jql": "project = X", "maxResults": 2, "jiraConfig": harness.jira_config()}),
            )
            .await;

        assert_eq!(status, StatusCode::OK);
        let tasks = body["tasks"].as_array().expect("tasks array");
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0]["id"], "X-1");
        assert_eq!(tasks[0]["priority"], "High");
        assert_eq!(tasks[1]["priority"], "Medium");
        for task in tasks {
            let key = task["id"].as_str().unwrap();
            assert_eq!(
                task["link"],
                format!("{}/browse/{key}", harness.jira.base_url)
            );
            assert!(task.get("labels").is_none());
        }
    }

    #[tokio::test]
    async fn oversized_limit_is_rejected_without_upstream_call() {
        let harness = Harness::start(vec![issue("X-1", json!({}))]).await;

        let (status, body) = harness
            .post(
                "/api/tasks",
                json!({"jql": "project = X", "maxResults": 5000, "jiraConfig": harness.jira_config()}),
            )
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "maxResults must be between 1 and 1000");
        assert_eq!(harness.jira.state().calls(), 0);
    }

    #[tokio::test]
    async fn missing_query_or_config_is_rejected() {
        let harness = Harness::start(Vec::new()).await;

        let (status, body) = harness
            .post("/api/tasks", json!({"jiraConfig": harness.jira_config()}))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "JQL query is required");

        let (status, _) = harness
            .post("/api/tasks", json!({"jql": "project = X"}))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(harness.jira.state().calls(), 0);
    }

    #[tokio::test]
    async fn labeling_an_already_labeled_ticket_succeeds_without_write() {
        let harness = Harness::start(vec![issue("X-1", json!({"labels": ["change"]}))]).await;

        let (status, body) = harness
            .post(
                "/api/tasks/X-1/label",
                json!({"label": "change", "jiraConfig": harness.jira_config()}),
            )
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Label \"change\" added to task X-1");
        assert_eq!(harness.jira.state().writes, 0);
    }

    #[tokio::test]
    async fn repeated_label_results_in_one_write() {
        let harness = Harness::start(vec![issue("X-1", json!({}))]).await;
        let body = json!({"label": "run", "jiraConfig": harness.jira_config()});

        for _ in 0..2 {
            let (status, _) = harness.post("/api/tasks/X-1/label", body.clone()).await;
            assert_eq!(status, StatusCode::OK);
        }

        assert_eq!(harness.jira.state().writes, 1);
        assert_eq!(harness.jira.labels("X-1"), vec!["run"]);
    }

    #[tokio::test]
    async fn invalid_label_is_rejected() {
        let harness = Harness::start(vec![issue("X-1", json!({}))]).await;
        let (status, body) = harness
            .post(
                "/api/tasks/X-1/label",
                json!({"label": "skip", "jiraConfig": harness.jira_config()}),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Label must be either \"run\" or \"change\"");
        assert_eq!(harness.jira.state().calls(), 0);
    }

    #[tokio::test]
    async fn task_details_include_labels() {
        let harness = Harness::start(vec![issue(
            "X-9",
            json!({"summary": "nine", "labels": ["run", "triage"]}),
        )])
        .await;

        let (status, body) = harness
            .post("/api/tasks/X-9", json!({"jiraConfig": harness.jira_config()}))
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["task"]["id"], "X-9");
        assert_eq!(body["task"]["labels"], json!(["run", "triage"]));
    }

    #[tokio::test]
    async fn upstream_errors_collapse_to_generic_message() {
        let harness = Harness::start(Vec::new()).await;
        harness.jira.fail_with(StatusCode::UNAUTHORIZED);

        let (status, body) = harness
            .post(
                "/api/tasks",
                json!({"jql": "project = X", "jiraConfig": harness.jira_config()}),
            )
            .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Failed to fetch tasks from Jira"}));
    }

    #[tokio::test]
    async fn malformed_body_is_a_bad_request() {
        let harness = Harness::start(Vec::new()).await;
        let response = harness
            .http
            .post(format!("{}/api/tasks", harness.proxy_url))
            .header("content-type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = response.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().starts_with("Invalid request body"));
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let harness = Harness::start(Vec::new()).await;
        let body: Value = harness
            .http
            .get(format!("{}/api/health", harness.proxy_url))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "OK");
        assert!(body["timestamp"].as_str().unwrap().parse::<jiff::Timestamp>().is_ok());
    }

    #[tokio::test]
    async fn unknown_get_routes_serve_the_ui_bundle() {
        let harness = Harness::start(Vec::new()).await;
        let response = harness
            .http
            .get(format!("{}/review/deep/link", harness.proxy_url))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.text().await.unwrap(), "<html>swipe</html>");
    }
}
