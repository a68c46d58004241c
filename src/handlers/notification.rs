// src/handlers/notification.rs

use crate::{
    errors::AppResult,
    models::{Actor, MarkReadResponse, Notification, SendMessageRequest},
    state::AppState,
};
use axum::{Json, extract::State, http::StatusCode};

/// Notifications addressed to the caller's role or to the caller, newest first
#[utoipa::path(
    get,
    path = "/api/v1/notifications/unread",
    responses((status = 200, description = "Unread notifications", body = Vec<Notification>)),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
pub async fn unread_notifications(
    actor: Actor,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Notification>>> {
    Ok(Json(state.notifications().unread_for(&actor).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/notifications/read-all",
    responses((status = 200, description = "Number of notifications marked", body = MarkReadResponse)),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
pub async fn mark_all_read(
    actor: Actor,
    State(state): State<AppState>,
) -> AppResult<Json<MarkReadResponse>> {
    Ok(Json(state.notifications().mark_all_read(&actor).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/notifications/messages",
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Message sent", body = Notification),
        (status = 400, description = "Empty message or no recipient"),
    ),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
pub async fn send_message(
    actor: Actor,
    State(state): State<AppState>,
    Json(body): Json<SendMessageRequest>,
) -> AppResult<(StatusCode, Json<Notification>)> {
    let notification = state.notifications().send_message(&actor, body).await?;
    Ok((StatusCode::CREATED, Json(notification)))
}
