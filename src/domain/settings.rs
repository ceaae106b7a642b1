use serde::{Deserialize, Serialize};

use crate::domain::ticket::DEFAULT_PAGE_SIZE;
use crate::error::{AppError, AppResult};

const MISSING_CONFIGURATION: &str =
    "Jira configuration is required. Please configure Jira settings first.";

/// Connection parameters persisted in the user's settings file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub jira_url: String,
    pub jira_token: String,
    pub task_limit: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            jira_url: String::new(),
            jira_token: String::new(),
            task_limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Settings {
    pub fn credentials(&self) -> AppResult<Credentials> {
        Credentials::from_parts(Some(&self.jira_url), Some(&self.jira_token))
    }

    pub fn page_size(&self) -> u32 {
        if self.task_limit == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            self.task_limit
        }
    }
}

/// Endpoint base URL and bearer token required by every upstream call.
///
/// Serializes as the `jiraConfig` object of the proxy's request bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(rename = "baseURL")]
    pub base_url: String,
    #[serde(rename = "apiToken")]
    pub api_token: String,
}

impl Credentials {
    pub fn from_parts(base_url: Option<&str>, api_token: Option<&str>) -> AppResult<Self> {
        let base_url = base_url.map(str::trim).filter(|value| !value.is_empty());
        let api_token = api_token.map(str::trim).filter(|value| !value.is_empty());
        match (base_url, api_token) {
            (Some(base_url), Some(api_token)) => Ok(Self {
                base_url: base_url.to_string(),
                api_token: api_token.to_string(),
            }),
            _ => Err(AppError::Configuration(MISSING_CONFIGURATION.to_string())),
        }
    }
}

/// Unchecked `jiraConfig` object as received in a proxy request body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JiraConfig {
    #[serde(rename = "baseURL")]
    pub base_url: Option<String>,
    #[serde(rename = "apiToken")]
    pub api_token: Option<String>,
}

impl JiraConfig {
    pub fn credentials(config: Option<&JiraConfig>) -> AppResult<Credentials> {
        let config =
            config.ok_or_else(|| AppError::Configuration(MISSING_CONFIGURATION.to_string()))?;
        Credentials::from_parts(config.base_url.as_deref(), config.api_token.as_deref())
    }
}
