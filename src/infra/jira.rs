use async_trait::async_trait;
use reqwest::{
    Client, Method, RequestBuilder, Response, Url,
    header::{ACCEPT, AUTHORIZATION},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::debug;

use crate::domain::settings::Credentials;
use crate::domain::ticket::{LabelOutcome, PageSize, Ticket, TicketLabel, TrackerUser};
use crate::error::{AppError, AppResult};
use crate::services::IssueTrackerService;

const SEARCH_FIELDS: [&str; 10] = [
    "summary",
    "description",
    "components",
    "timeestimate",
    "timeoriginalestimate",
    "key",
    "issuetype",
    "priority",
    "assignee",
    "reporter",
];

const NO_DESCRIPTION: &str = "No description";
const UNKNOWN_ISSUE_TYPE: &str = "Unknown";
const DEFAULT_PRIORITY: &str = "Medium";
const UNASSIGNED: &str = "Unassigned";
const UNKNOWN_REPORTER: &str = "Not specified";

#[derive(Default)]
pub struct JiraClient {
    http: Client,
}

impl JiraClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn endpoint(base_url: &str, segments: &[&str]) -> AppResult<Url> {
        let mut url = Url::parse(base_url.trim_end_matches('/')).map_err(|err| {
            AppError::IssueTracker(format!("invalid Jira base URL '{base_url}': {err}"))
        })?;
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                AppError::IssueTracker(format!("Jira base URL '{base_url}' cannot hold a path"))
            })?;
            path.pop_if_empty()
                .extend(["rest", "api", "2"])
                .extend(segments);
        }
        Ok(url)
    }

    fn browse_url(base_url: &str, key: &str) -> String {
        format!("{}/browse/{}", base_url.trim_end_matches('/'), key)
    }

    fn request(&self, method: Method, url: Url, credentials: &Credentials) -> RequestBuilder {
        self.http
            .request(method, url)
            .header(AUTHORIZATION, format!("Bearer {}", credentials.api_token))
            .header(ACCEPT, "application/json")
    }

    async fn send(request: RequestBuilder) -> AppResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|err| AppError::IssueTracker(format!("failed to call Jira: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read response>".to_string());
            return Err(AppError::IssueTracker(format!(
                "Jira responded with {status}: {body}"
            )));
        }
        Ok(response)
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> AppResult<T> {
        response
            .json()
            .await
            .map_err(|err| AppError::IssueTracker(format!("failed to parse Jira response: {err}")))
    }

    async fn fetch_issue(
        &self,
        ticket_id: &str,
        fields: Option<&str>,
        credentials: &Credentials,
    ) -> AppResult<JiraIssue> {
        let mut url = Self::endpoint(&credentials.base_url, &["issue", ticket_id])?;
        if let Some(fields) = fields {
            url.query_pairs_mut().append_pair("fields", fields);
        }
        let response = Self::send(self.request(Method::GET, url, credentials)).await?;
        Self::read_json(response).await
    }
}

#[async_trait]
impl IssueTrackerService for JiraClient {
    async fn search(
        &self,
        query: &str,
        limit: PageSize,
        credentials: &Credentials,
    ) -> AppResult<Vec<Ticket>> {
        let url = Self::endpoint(&credentials.base_url, &["search"])?;
        let body = JiraSearchRequest {
            jql: query,
            max_results: limit.get(),
            fields: &SEARCH_FIELDS,
        };
        debug!(limit = limit.get(), "searching Jira");

        let response =
            Self::send(self.request(Method::POST, url, credentials).json(&body)).await?;
        let payload: JiraSearchResponse = Self::read_json(response).await?;

        Ok(payload
            .issues
            .into_iter()
            .map(|issue| issue.into_ticket(&credentials.base_url, false))
            .collect())
    }

    async fn get_ticket(&self, ticket_id: &str, credentials: &Credentials) -> AppResult<Ticket> {
        let issue = self.fetch_issue(ticket_id, None, credentials).await?;
        Ok(issue.into_ticket(&credentials.base_url, true))
    }

    async fn add_label(
        &self,
        ticket_id: &str,
        label: TicketLabel,
        credentials: &Credentials,
    ) -> AppResult<LabelOutcome> {
        // Read-modify-write without a guard; a concurrent edit between the two calls is lost.
        let issue = self
            .fetch_issue(ticket_id, Some("labels"), credentials)
            .await?;
        let mut labels = issue.fields.labels.unwrap_or_default();
        if labels.iter().any(|existing| existing == label.as_str()) {
            debug!(ticket_id, %label, "label already present");
            return Ok(LabelOutcome::AlreadyPresent);
        }
        labels.push(label.as_str().to_string());

        let url = Self::endpoint(&credentials.base_url, &["issue", ticket_id])?;
        let body = JiraLabelsUpdate {
            fields: JiraLabelsField { labels },
        };
        Self::send(self.request(Method::PUT, url, credentials).json(&body)).await?;
        debug!(ticket_id, %label, "label added");
        Ok(LabelOutcome::Added)
    }

    async fn current_user(&self, credentials: &Credentials) -> AppResult<TrackerUser> {
        let url = Self::endpoint(&credentials.base_url, &["myself"])?;
        let response = Self::send(self.request(Method::GET, url, credentials)).await?;
        let myself: JiraMyself = Self::read_json(response).await?;
        Ok(TrackerUser {
            display_name: non_empty(myself.display_name).unwrap_or_else(|| "<unknown>".to_string()),
            email: non_empty(myself.email_address),
            active: myself.active.unwrap_or(false),
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JiraSearchRequest<'a> {
    jql: &'a str,
    max_results: u32,
    fields: &'a [&'a str],
}

#[derive(Deserialize)]
struct JiraSearchResponse {
    #[serde(default)]
    issues: Vec<JiraIssue>,
}

#[derive(Deserialize)]
struct JiraIssue {
    key: String,
    #[serde(default)]
    fields: JiraIssueFields,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct JiraIssueFields {
    summary: Option<String>,
    // Plain text on API v2; anything else is treated as missing.
    description: Option<Value>,
    components: Option<Vec<JiraNamed>>,
    timeestimate: Option<i64>,
    timeoriginalestimate: Option<i64>,
    issuetype: Option<JiraNamed>,
    priority: Option<JiraNamed>,
    assignee: Option<JiraUserRef>,
    reporter: Option<JiraUserRef>,
    labels: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct JiraNamed {
    name: Option<String>,
}

#[derive(Deserialize)]
struct JiraUserRef {
    #[serde(rename = "displayName")]
    display_name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JiraMyself {
    display_name: Option<String>,
    email_address: Option<String>,
    active: Option<bool>,
}

#[derive(Serialize)]
struct JiraLabelsUpdate {
    fields: JiraLabelsField,
}

#[derive(Serialize)]
struct JiraLabelsField {
    labels: Vec<String>,
}

impl JiraIssue {
    fn into_ticket(self, base_url: &str, with_labels: bool) -> Ticket {
        let fields = self.fields;
        let description = fields
            .description
            .as_ref()
            .and_then(Value::as_str)
            .filter(|text| !text.is_empty())
            .unwrap_or(NO_DESCRIPTION)
            .to_string();
        let time_estimate = fields
            .timeestimate
            .filter(|seconds| *seconds > 0)
            .or(fields.timeoriginalestimate.filter(|seconds| *seconds > 0))
            .unwrap_or(0) as u64;

        Ticket {
            link: JiraClient::browse_url(base_url, &self.key),
            id: self.key,
            summary: fields.summary.unwrap_or_default(),
            description,
            components: fields
                .components
                .unwrap_or_default()
                .into_iter()
                .filter_map(|component| non_empty(component.name))
                .collect(),
            time_estimate,
            issue_type: fields
                .issuetype
                .and_then(|named| non_empty(named.name))
                .unwrap_or_else(|| UNKNOWN_ISSUE_TYPE.to_string()),
            priority: fields
                .priority
                .and_then(|named| non_empty(named.name))
                .unwrap_or_else(|| DEFAULT_PRIORITY.to_string()),
            assignee: fields
                .assignee
                .and_then(|user| non_empty(user.display_name))
                .unwrap_or_else(|| UNASSIGNED.to_string()),
            reporter: fields
                .reporter
                .and_then(|user| non_empty(user.display_name))
                .unwrap_or_else(|| UNKNOWN_REPORTER.to_string()),
            labels: with_labels.then(|| fields.labels.unwrap_or_default()),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}
