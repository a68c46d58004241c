use super::Role;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

// ─── Invoice Status ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, ToSchema, PartialEq, Eq, Hash)]
#[sqlx(type_name = "invoice_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    VisibleToAll,
    PendingManagerReview,
    PendingAdminReview,
    Approved,
    ManagerRejected,
    AdminRejected,
    Archived,
    Overridden,
    VisibleToAllArchived,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::VisibleToAll => "visible_to_all",
            InvoiceStatus::PendingManagerReview => "pending_manager_review",
            InvoiceStatus::PendingAdminReview => "pending_admin_review",
            InvoiceStatus::Approved => "approved",
            InvoiceStatus::ManagerRejected => "manager_rejected",
            InvoiceStatus::AdminRejected => "admin_rejected",
            InvoiceStatus::Archived => "archived",
            InvoiceStatus::Overridden => "overridden",
            InvoiceStatus::VisibleToAllArchived => "visible_to_all_archived",
        }
    }

    /// States employee invoices never enter.
    pub fn is_driver_only(&self) -> bool {
        matches!(
            self,
            InvoiceStatus::VisibleToAll
                | InvoiceStatus::VisibleToAllArchived
                | InvoiceStatus::Overridden
        )
    }

    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            InvoiceStatus::PendingManagerReview | InvoiceStatus::PendingAdminReview
        )
    }

    pub fn outcome(&self) -> ReviewOutcome {
        match self {
            InvoiceStatus::Approved | InvoiceStatus::Overridden => ReviewOutcome::Approved,
            InvoiceStatus::ManagerRejected | InvoiceStatus::AdminRejected => {
                ReviewOutcome::Rejected
            }
            _ => ReviewOutcome::Undecided,
        }
    }

    /// The state an invoice moves to when archived or reset, if it is archivable at all.
    pub fn archived_counterpart(&self) -> Option<InvoiceStatus> {
        match self {
            InvoiceStatus::PendingManagerReview
            | InvoiceStatus::PendingAdminReview
            | InvoiceStatus::Approved
            | InvoiceStatus::Overridden => Some(InvoiceStatus::Archived),
            InvoiceStatus::VisibleToAll => Some(InvoiceStatus::VisibleToAllArchived),
            _ => None,
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Review verdict stored next to the status, written in the same update.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, ToSchema, PartialEq, Eq)]
#[sqlx(type_name = "review_outcome", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReviewOutcome {
    Undecided,
    Approved,
    Rejected,
}

// ─── Driver Invoice ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct DriverInvoice {
    pub id: Uuid,
    pub serial: i64,
    pub driver_id: Uuid,
    pub invoice_date: NaiveDate,
    pub deduction_date: Option<NaiveDate>,
    pub main_order: i32,
    pub additional_order: i32,
    pub hour: Decimal,
    pub cash: Decimal,
    pub additional_salary: Decimal,
    pub deduction_reason: Option<String>,
    pub talabat_deduction_amount: Decimal,
    pub company_deduction_amount: Decimal,
    pub petty_cash_deduction_amount: Decimal,
    pub remarks: Option<String>,
    pub file: Option<String>,
    pub submitted_by: Uuid,
    pub submitter_role: Role,
    pub status: InvoiceStatus,
    pub outcome: ReviewOutcome,
    pub main_order_pay: Decimal,
    pub additional_order_pay: Decimal,
    pub computed_salary: Decimal,
    pub salary_override: Option<Decimal>,
    pub override_reason: Option<String>,
    pub overridden_by: Option<Uuid>,
    pub overridden_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
    pub archived_by: Option<Uuid>,
    pub reset_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DriverInvoice {
    /// A status carrying a verdict sets the outcome; publishing keeps it.
    pub fn apply_status(&mut self, status: InvoiceStatus, at: DateTime<Utc>) {
        self.status = status;
        if status.outcome() != ReviewOutcome::Undecided {
            self.outcome = status.outcome();
        }
        self.updated_at = at;
    }

    /// Archival keeps the review outcome; it is not a review.
    pub fn mark_archived(&mut self, status: InvoiceStatus, at: DateTime<Utc>, by: Option<Uuid>) {
        self.status = status;
        self.archived_at = Some(at);
        self.archived_by = by;
        self.updated_at = at;
    }

    /// Order pay after any override.
    pub fn effective_salary(&self) -> Decimal {
        self.salary_override.unwrap_or(self.computed_salary)
    }

    pub fn total_deductions(&self) -> Decimal {
        self.talabat_deduction_amount
            + self.company_deduction_amount
            + self.petty_cash_deduction_amount
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateDriverInvoiceRequest {
    pub driver_id: Uuid,
    pub invoice_date: NaiveDate,
    pub deduction_date: Option<NaiveDate>,
    pub main_order: i32,
    #[serde(default)]
    pub additional_order: i32,
    #[serde(default)]
    pub hour: Decimal,
    #[serde(default)]
    pub cash: Decimal,
    #[serde(default)]
    pub additional_salary: Decimal,
    pub deduction_reason: Option<String>,
    #[serde(default)]
    pub talabat_deduction_amount: Decimal,
    #[serde(default)]
    pub company_deduction_amount: Decimal,
    #[serde(default)]
    pub petty_cash_deduction_amount: Decimal,
    pub remarks: Option<String>,
    pub file: Option<String>,
}

// ─── Employee Invoice ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct EmployeeInvoice {
    pub id: Uuid,
    pub serial: i64,
    pub user_id: Uuid,
    pub invoice_date: NaiveDate,
    pub deduction_date: Option<NaiveDate>,
    pub additional_salary: Decimal,
    pub deduction_reason: Option<String>,
    pub company_deduction_amount: Decimal,
    pub remarks: Option<String>,
    pub file: Option<String>,
    pub submitted_by: Uuid,
    pub submitter_role: Role,
    pub status: InvoiceStatus,
    pub outcome: ReviewOutcome,
    pub archived_at: Option<DateTime<Utc>>,
    pub archived_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EmployeeInvoice {
    pub fn apply_status(&mut self, status: InvoiceStatus, at: DateTime<Utc>) {
        self.status = status;
        self.outcome = status.outcome();
        self.updated_at = at;
    }

    pub fn mark_archived(&mut self, status: InvoiceStatus, at: DateTime<Utc>, by: Option<Uuid>) {
        self.status = status;
        self.archived_at = Some(at);
        self.archived_by = by;
        self.updated_at = at;
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateEmployeeInvoiceRequest {
    pub user_id: Uuid,
    pub invoice_date: NaiveDate,
    pub deduction_date: Option<NaiveDate>,
    #[serde(default)]
    pub additional_salary: Decimal,
    pub deduction_reason: Option<String>,
    #[serde(default)]
    pub company_deduction_amount: Decimal,
    pub remarks: Option<String>,
    pub file: Option<String>,
}

// ─── Review & Audit Requests ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateInvoiceStatusRequest {
    pub status: InvoiceStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OverrideSalaryRequest {
    pub amount: Decimal,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InvoiceFilter {
    pub status: Option<InvoiceStatus>,
    pub driver_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ResetResponse {
    pub invoices_reset: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewQueue {
    pub role: Role,
    pub driver_invoices: Vec<DriverInvoice>,
    pub employee_invoices: Vec<EmployeeInvoice>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PeriodQuery {
    /// Format: "YYYY-MM"
    pub period: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DriverSalarySummary {
    pub driver_id: Uuid,
    /// First day of the summarised month.
    pub period: NaiveDate,
    pub invoice_count: usize,
    pub order_pay: Decimal,
    pub additional_salary: Decimal,
    pub deductions: Decimal,
    pub net_salary: Decimal,
}

// ─── Archive Runs ─────────────────────────────────────────────────────────────

/// One completed archival sweep. The latest run's `period` is the
/// "last archived month" marker.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ArchiveRun {
    pub id: Uuid,
    pub sequence: i64,
    /// First day of the month whose boundary this run closed.
    pub period: NaiveDate,
    pub driver_invoices: i64,
    pub employee_invoices: i64,
    pub petty_cash: i64,
    pub ran_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ArchiveResponse {
    /// `None` when the current month was already archived.
    pub run: Option<ArchiveRun>,
}
