use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use tracing::info;

use crate::context::AppContext;
use crate::server::response::ApiError;
use crate::server::wire::{
    AddLabelRequest, AddLabelResponse, HealthResponse, SearchTasksRequest, SearchTasksResponse,
    TaskDetailsRequest, TaskDetailsResponse,
};
use crate::workflow::triage;

pub async fn search_tasks(
    State(ctx): State<AppContext>,
    payload: Result<Json<SearchTasksRequest>, JsonRejection>,
) -> Result<Json<SearchTasksResponse>, ApiError> {
    let Json(request) = payload?;
    let tasks = triage::search_tickets(
        &ctx,
        request.jql.as_deref(),
        request.max_results,
        request.jira_config.as_ref(),
    )
    .await
    .map_err(|err| ApiError::from_app(err, "Failed to fetch tasks from Jira"))?;

    Ok(Json(SearchTasksResponse { tasks }))
}

pub async fn add_label(
    State(ctx): State<AppContext>,
    Path(task_id): Path<String>,
    payload: Result<Json<AddLabelRequest>, JsonRejection>,
) -> Result<Json<AddLabelResponse>, ApiError> {
    let Json(request) = payload?;
    let ack = triage::label_ticket(
        &ctx,
        &task_id,
        request.label.as_deref(),
        request.jira_config.as_ref(),
    )
    .await
    .map_err(|err| ApiError::from_app(err, "Failed to add label to task"))?;
    info!(%task_id, outcome = ?ack.outcome, "label request handled");

    Ok(Json(AddLabelResponse {
        success: true,
        message: ack.message,
    }))
}

pub async fn task_details(
    State(ctx): State<AppContext>,
    Path(task_id): Path<String>,
    payload: Result<Json<TaskDetailsRequest>, JsonRejection>,
) -> Result<Json<TaskDetailsResponse>, ApiError> {
    let Json(request) = payload?;
    let task = triage::ticket_details(&ctx, &task_id, request.jira_config.as_ref())
        .await
        .map_err(|err| ApiError::from_app(err, "Failed to fetch task details"))?;

    Ok(Json(TaskDetailsResponse { task }))
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        timestamp: jiff::Timestamp::now().to_string(),
    })
}
