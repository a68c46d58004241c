use crate::state::AppState;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
};
use serde_json::json;

/// Root handler: a short landing page pointing at the docs and health check
pub async fn root_handler() -> impl IntoResponse {
    Html(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <title>Fleetdesk API</title>
  <style>
    body { font-family: system-ui, sans-serif; background: #0f172a; color: #e2e8f0; padding: 40px 20px; }
    .container { max-width: 720px; margin: 0 auto; }
    h1 { color: #38bdf8; margin-bottom: 4px; }
    p { color: #94a3b8; }
    a { color: #38bdf8; }
    li { margin: 6px 0; font-family: monospace; }
  </style>
</head>
<body>
<div class="container">
  <h1>Fleetdesk API</h1>
  <p>Back office for a delivery fleet: salary bands, invoice review, ledgers and notifications.</p>
  <ul>
    <li><a href="/docs">/docs</a> interactive API documentation</li>
    <li><a href="/health">/health</a> service and storage status</li>
    <li>/api/v1/driver-invoices, /api/v1/employee-invoices, /api/v1/review-queue</li>
    <li>/api/v1/salary-configs, /api/v1/bank-statements, /api/v1/petty-cash</li>
    <li>/api/v1/notifications/unread</li>
  </ul>
</div>
</body>
</html>"#,
    )
}

/// Health check endpoint
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let storage = state.store.backend_name();
    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "storage": storage,
                "service": "fleetdesk",
                "version": env!("CARGO_PKG_VERSION"),
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "unhealthy",
                "storage": storage,
                "error": e.to_string(),
            })),
        ),
    }
}
