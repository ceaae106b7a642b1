use async_trait::async_trait;

use crate::domain::settings::Credentials;
use crate::domain::ticket::{LabelOutcome, PageSize, Ticket, TicketLabel, TrackerUser};
use crate::error::AppResult;

/// Remote ticket gateway. Credentials travel with every call.
#[async_trait]
pub trait IssueTrackerService: Send + Sync {
    async fn search(
        &self,
        query: &str,
        limit: PageSize,
        credentials: &Credentials,
    ) -> AppResult<Vec<Ticket>>;

    async fn get_ticket(&self, ticket_id: &str, credentials: &Credentials) -> AppResult<Ticket>;

    async fn add_label(
        &self,
        ticket_id: &str,
        label: TicketLabel,
        credentials: &Credentials,
    ) -> AppResult<LabelOutcome>;

    async fn current_user(&self, credentials: &Credentials) -> AppResult<TrackerUser>;
}
