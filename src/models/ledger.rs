use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

// ─── Bank Accounts ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BankAccount {
    pub id: Uuid,
    pub account_number: String,
    pub account_name: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBankAccountRequest {
    pub account_number: String,
    pub account_name: String,
}

// ─── Bank Statements ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BankStatement {
    pub id: Uuid,
    pub bank_account_number: String,
    /// Per-account counter, starting at 1.
    pub sequence: i64,
    pub statement_date: NaiveDate,
    pub deposits: Decimal,
    pub spends: Decimal,
    pub balance: Decimal,
    pub description: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateBankStatementRequest {
    pub account_number: String,
    #[serde(default)]
    pub deposits: Decimal,
    #[serde(default)]
    pub spends: Decimal,
    pub statement_date: NaiveDate,
    /// Required on the first record of an account, rejected afterwards.
    pub starting_balance: Option<Decimal>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatementQuery {
    pub account_number: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Restrict to the current calendar year.
    #[serde(default)]
    pub current_year: bool,
}

// ─── Petty Cash ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, ToSchema, PartialEq, Eq)]
#[sqlx(type_name = "petty_cash_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PettyCashStatus {
    Pending,
    Approved,
    Rejected,
    Archived,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PettyCash {
    pub id: Uuid,
    pub serial_number: i64,
    pub request_applicant: String,
    pub spends_reason: String,
    pub cash_amount: Decimal,
    pub spend_type: String,
    pub request_date: NaiveDate,
    pub previous_balance: Decimal,
    pub current_balance: Decimal,
    pub status: PettyCashStatus,
    pub deducted_from_user: Option<Uuid>,
    pub deducted_from_driver: Option<Uuid>,
    pub created_by: Uuid,
    pub reviewed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl PettyCash {
    /// Spends charged to a person leave the company balance untouched.
    pub fn is_attributed(&self) -> bool {
        self.deducted_from_user.is_some() || self.deducted_from_driver.is_some()
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreatePettyCashRequest {
    pub request_applicant: String,
    pub spends_reason: String,
    pub cash_amount: Decimal,
    pub spend_type: String,
    pub request_date: NaiveDate,
    pub deducted_from_user: Option<Uuid>,
    pub deducted_from_driver: Option<Uuid>,
    /// Required on the very first petty-cash record only.
    pub starting_balance: Option<Decimal>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePettyCashStatusRequest {
    pub status: PettyCashStatus,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PettyCashQuery {
    pub status: Option<PettyCashStatus>,
}
