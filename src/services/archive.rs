// src/services/archive.rs

use crate::{
    errors::{AppError, AppResult},
    models::{Actor, ArchiveRun, Role},
    services::{
        ensure_role,
        sequence::{SequenceAllocator, SequenceScope},
    },
    store::Store,
};
use chrono::{Datelike, NaiveDate, Utc};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// First day of the month after `start`'s month.
pub fn next_month(start: NaiveDate) -> NaiveDate {
    let (year, month) = if start.month() == 12 {
        (start.year() + 1, 1)
    } else {
        (start.year(), start.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(start)
}

/// Parses `"YYYY-MM"` into the first day of that month.
pub fn parse_period(period: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", period.trim()), "%Y-%m-%d").map_err(|_| {
        AppError::Validation(format!("Period must look like YYYY-MM, got '{period}'"))
    })
}

pub struct ArchiveService {
    store: Arc<dyn Store>,
    sequences: SequenceAllocator,
}

impl ArchiveService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            sequences: SequenceAllocator::new(store.clone()),
            store,
        }
    }

    /// Closes every month boundary up to `today`'s month. Archives what is
    /// dated before the current month and records the run; `None` when the
    /// marker is already current.
    pub async fn archive_invoices(&self, today: NaiveDate) -> AppResult<Option<ArchiveRun>> {
        let period = month_start(today);

        if let Some(latest) = self.store.latest_archive_run().await? {
            if latest.period >= period {
                debug!(%period, "archive marker is current");
                return Ok(None);
            }
        }

        let run = ArchiveRun {
            id: Uuid::new_v4(),
            sequence: self.sequences.next(SequenceScope::ArchiveRun).await?,
            period,
            driver_invoices: 0,
            employee_invoices: 0,
            petty_cash: 0,
            ran_at: Utc::now(),
        };

        match self.store.run_archive(run).await {
            Ok(run) => {
                info!(
                    %period,
                    driver_invoices = run.driver_invoices,
                    employee_invoices = run.employee_invoices,
                    petty_cash = run.petty_cash,
                    "archive sweep completed"
                );
                Ok(Some(run))
            }
            // another sweep closed the same period first
            Err(AppError::Conflict(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Manual run on behalf of an Admin.
    pub async fn trigger(&self, actor: &Actor, today: NaiveDate) -> AppResult<Option<ArchiveRun>> {
        ensure_role(actor, &[Role::Admin], "trigger archival")?;
        info!(actor = %actor.id, "archive sweep triggered manually");
        self.archive_invoices(today).await
    }
}
