// src/services/scheduler.rs

use crate::state::AppState;
use chrono::Utc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// One pass of the background work: archival catch-up, then the licence scan.
pub async fn run_sweeps(state: &AppState) {
    let today = Utc::now().date_naive();

    if let Err(err) = state.archive().archive_invoices(today).await {
        warn!(error = %err, "archive sweep failed");
    }

    if let Err(err) = state
        .directory()
        .scan_expiring_licences(today, state.config.expiry_warning_days)
        .await
    {
        warn!(error = %err, "licence expiry scan failed");
    }
}

/// Runs the sweeps on every tick of `SWEEP_INTERVAL_SECS`, starting immediately.
pub fn spawn_sweeps(state: AppState) -> JoinHandle<()> {
    let period = Duration::from_secs(state.config.sweep_interval_secs.max(1));
    info!(interval_secs = period.as_secs(), "background sweeps scheduled");

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            run_sweeps(&state).await;
        }
    })
}
