use crate::context::AppContext;
use crate::domain::settings::JiraConfig;
use crate::domain::ticket::{LabelOutcome, PageSize, Ticket, TicketLabel};
use crate::error::{AppError, AppResult};

pub struct LabelAcknowledgement {
    pub outcome: LabelOutcome,
    pub message: String,
}

/// Validates a search request and forwards it to the tracker.
///
/// Checks run in order (query, credentials, page size) and all of them
/// complete before any outbound call is made.
pub async fn search_tickets(
    ctx: &AppContext,
    query: Option<&str>,
    max_results: Option<i64>,
    jira_config: Option<&JiraConfig>,
) -> AppResult<Vec<Ticket>> {
    let query = query
        .filter(|query| !query.trim().is_empty())
        .ok_or_else(|| AppError::Validation("JQL query is required".to_string()))?;
    let credentials = JiraConfig::credentials(jira_config)?;
    let limit = PageSize::new(max_results)?;

    ctx.issue_tracker.search(query, limit, &credentials).await
}

pub async fn label_ticket(
    ctx: &AppContext,
    ticket_id: &str,
    label: Option<&str>,
    jira_config: Option<&JiraConfig>,
) -> AppResult<LabelAcknowledgement> {
    let label = TicketLabel::parse(label)?;
    let credentials = JiraConfig::credentials(jira_config)?;

    let outcome = ctx
        .issue_tracker
        .add_label(ticket_id, label, &credentials)
        .await?;

    Ok(LabelAcknowledgement {
        outcome,
        message: format!("Label \"{label}\" added to task {ticket_id}"),
    })
}

pub async fn ticket_details(
    ctx: &AppContext,
    ticket_id: &str,
    jira_config: Option<&JiraConfig>,
) -> AppResult<Ticket> {
    let credentials = JiraConfig::credentials(jira_config)?;
    ctx.issue_tracker.get_ticket(ticket_id, &credentials).await
}
