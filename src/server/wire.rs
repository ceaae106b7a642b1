//! JSON bodies of the proxy's HTTP surface.

use serde::{Deserialize, Serialize};

use crate::domain::settings::JiraConfig;
use crate::domain::ticket::Ticket;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchTasksRequest {
    pub jql: Option<String>,
    pub max_results: Option<i64>,
    pub jira_config: Option<JiraConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLabelRequest {
    pub label: Option<String>,
    pub jira_config: Option<JiraConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetailsRequest {
    pub jira_config: Option<JiraConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchTasksResponse {
    pub tasks: Vec<Ticket>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddLabelResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TaskDetailsResponse {
    pub task: Ticket,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
