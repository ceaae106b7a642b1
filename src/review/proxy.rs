use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::domain::settings::Credentials;
use crate::domain::ticket::{Ticket, TicketLabel};
use crate::error::{AppError, AppResult};
use crate::server::wire::{
    AddLabelResponse, ErrorResponse, SearchTasksResponse, TaskDetailsResponse,
};

/// The review client's view of the proxy server.
#[async_trait]
pub trait TicketProxy: Send + Sync {
    async fn search(
        &self,
        query: &str,
        limit: u32,
        credentials: &Credentials,
    ) -> AppResult<Vec<Ticket>>;

    async fn add_label(
        &self,
        ticket_id: &str,
        label: TicketLabel,
        credentials: &Credentials,
    ) -> AppResult<String>;

    async fn ticket(&self, ticket_id: &str, credentials: &Credentials) -> AppResult<Ticket>;
}

pub struct ProxyClient {
    http: Client,
    base_url: String,
}

impl ProxyClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, segments: &[&str]) -> AppResult<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|err| {
            AppError::Configuration(format!("invalid proxy URL '{}': {err}", self.base_url))
        })?;
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                AppError::Configuration(format!("proxy URL '{}' cannot hold a path", self.base_url))
            })?;
            path.pop_if_empty().extend(["api", "tasks"]).extend(segments);
        }
        Ok(url)
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, url: Url, body: &B) -> AppResult<T> {
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|err| AppError::Proxy(format!("failed to reach proxy: {err}")))?;
        Self::read(response).await
    }

    async fn read<T: DeserializeOwned>(response: Response) -> AppResult<T> {
        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|err| AppError::Proxy(format!("unexpected proxy response: {err}")));
        }
        let message = match response.json::<ErrorResponse>().await {
            Ok(body) => body.error,
            Err(_) => format!("proxy responded with {status}"),
        };
        if status.is_client_error() {
            Err(AppError::Validation(message))
        } else {
            Err(AppError::Proxy(message))
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchBody<'a> {
    jql: &'a str,
    max_results: u32,
    jira_config: &'a Credentials,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LabelBody<'a> {
    label: TicketLabel,
    jira_config: &'a Credentials,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DetailsBody<'a> {
    jira_config: &'a Credentials,
}

#[async_trait]
impl TicketProxy for ProxyClient {
    async fn search(
        &self,
        query: &str,
        limit: u32,
        credentials: &Credentials,
    ) -> AppResult<Vec<Ticket>> {
        let body = SearchBody {
            jql: query,
            max_results: limit,
            jira_config: credentials,
        };
        let response: SearchTasksResponse = self.post(self.endpoint(&[])?, &body).await?;
        Ok(response.tasks)
    }

    async fn add_label(
        &self,
        ticket_id: &str,
        label: TicketLabel,
        credentials: &Credentials,
    ) -> AppResult<String> {
        let body = LabelBody {
            label,
            jira_config: credentials,
        };
        let url = self.endpoint(&[ticket_id, "label"])?;
        let response: AddLabelResponse = self.post(url, &body).await?;
        Ok(response.message)
    }

    async fn ticket(&self, ticket_id: &str, credentials: &Credentials) -> AppResult<Ticket> {
        let body = DetailsBody {
            jira_config: credentials,
        };
        let url = self.endpoint(&[ticket_id])?;
        let response: TaskDetailsResponse = self.post(url, &body).await?;
        Ok(response.task)
    }
}
