// src/handlers/archive.rs

use crate::{
    errors::AppResult,
    models::{Actor, ArchiveResponse},
    state::AppState,
};
use axum::{Json, extract::State};
use chrono::Utc;

/// Run the archival sweep now instead of waiting for the scheduler
#[utoipa::path(
    post,
    path = "/api/v1/archive/run",
    responses(
        (status = 200, description = "The run, or null when the current month is already closed", body = ArchiveResponse),
        (status = 403, description = "Only an Admin may trigger archival"),
    ),
    security(("bearer_auth" = [])),
    tag = "Archive"
)]
pub async fn run_archive(
    actor: Actor,
    State(state): State<AppState>,
) -> AppResult<Json<ArchiveResponse>> {
    let run = state
        .archive()
        .trigger(&actor, Utc::now().date_naive())
        .await?;
    Ok(Json(ArchiveResponse { run }))
}
