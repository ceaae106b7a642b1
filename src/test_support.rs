use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use crate::domain::settings::Credentials;

pub const FAKE_TOKEN: &str = "secret-token";

pub fn issue(key: &str, fields: Value) -> Value {
    json!({ "key": key, "fields": fields })
}

#[derive(Clone, Default)]
pub struct FakeJiraState {
    pub issues: Vec<Value>,
    pub searches: Vec<Value>,
    pub reads: usize,
    pub writes: usize,
    pub authorization: Vec<String>,
    pub fail_with: Option<StatusCode>,
}

impl FakeJiraState {
    pub fn calls(&self) -> usize {
        self.searches.len() + self.reads + self.writes
    }
}

type Shared = Arc<Mutex<FakeJiraState>>;

/// In-process stand-in for the upstream tracker's REST API.
pub struct FakeJira {
    pub base_url: String,
    state: Shared,
}

impl FakeJira {
    pub async fn start(issues: Vec<Value>) -> Self {
        let state: Shared = Arc::new(Mutex::new(FakeJiraState {
            issues,
            ..FakeJiraState::default()
        }));
        let app = Router::new()
            .route("/rest/api/2/search", post(search))
            .route("/rest/api/2/issue/{key}", get(read_issue).put(update_issue))
            .route("/rest/api/2/myself", get(myself))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake jira");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move { axum::serve(listener, app).await.expect("serve fake jira") });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::from_parts(Some(&self.base_url), Some(FAKE_TOKEN)).expect("credentials")
    }

    pub fn fail_with(&self, status: StatusCode) {
        lock(&self.state).fail_with = Some(status);
    }

    pub fn state(&self) -> FakeJiraState {
        lock(&self.state).clone()
    }

    pub fn labels(&self, key: &str) -> Vec<String> {
        lock(&self.state)
            .issues
            .iter()
            .find(|issue| issue["key"] == key)
            .and_then(|issue| issue["fields"]["labels"].as_array().cloned())
            .unwrap_or_default()
            .into_iter()
            .filter_map(|label| label.as_str().map(str::to_string))
            .collect()
    }
}

fn lock(state: &Shared) -> MutexGuard<'_, FakeJiraState> {
    state.lock().expect("fake jira state poisoned")
}

fn record_call(state: &mut FakeJiraState, headers: &HeaderMap) -> Result<(), StatusCode> {
    if let Some(value) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        state.authorization.push(value.to_string());
    }
    match state.fail_with {
        Some(status) => Err(status),
        None => Ok(()),
    }
}

async fn search(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    let mut state = lock(&state);
    state.searches.push(body.clone());
    record_call(&mut state, &headers)?;
    let limit = body["maxResults"].as_u64().unwrap_or(50) as usize;
    let issues: Vec<Value> = state.issues.iter().take(limit).cloned().collect();
    Ok(Json(json!({ "startAt": 0, "total": issues.len(), "issues": issues })))
}

async fn read_issue(
    State(state): State<Shared>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    let mut state = lock(&state);
    state.reads += 1;
    record_call(&mut state, &headers)?;
    state
        .issues
        .iter()
        .find(|issue| issue["key"] == key.as_str())
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn update_issue(
    State(state): State<Shared>,
    Path(key): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<StatusCode, StatusCode> {
    let mut state = lock(&state);
    state.writes += 1;
    record_call(&mut state, &headers)?;
    let issue = state
        .issues
        .iter_mut()
        .find(|issue| issue["key"] == key.as_str())
        .ok_or(StatusCode::NOT_FOUND)?;
    issue["fields"]["labels"] = body["fields"]["labels"].clone();
    Ok(StatusCode::NO_CONTENT)
}

async fn myself(State(state): State<Shared>, headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    let mut state = lock(&state);
    state.reads += 1;
    record_call(&mut state, &headers)?;
    Ok(Json(json!({
        "displayName": "Fake User",
        "emailAddress": "fake@example.com",
        "active": true
    })))
}
