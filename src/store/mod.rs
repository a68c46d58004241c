//! Persistence seams.
//!
//! Every operation that must not be split (an invoice and its companion
//! notification, a ledger append, an archive sweep) is a single call here, so
//! each backend can make it atomic.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::{
    errors::AppResult,
    models::{
        ArchiveRun, BankAccount, BankStatement, Driver, DriverInvoice, EmployeeInvoice,
        InvoiceFilter, InvoiceStatus, Notification, PettyCash, PettyCashStatus, Role,
        SalaryConfig, User, VehicleType,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Resolved statement search; both bounds are inclusive.
#[derive(Debug, Clone, Default)]
pub struct StatementSearch {
    pub account_number: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[async_trait]
pub trait Backend: Send + Sync {
    fn backend_name(&self) -> &'static str;

    async fn ping(&self) -> AppResult<()>;
}

#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Atomically increments the named counter and returns the new value (first call yields 1).
    async fn increment_counter(&self, key: &str) -> AppResult<i64>;
}

#[async_trait]
pub trait SalaryStore: Send + Sync {
    /// Fails with `Conflict` when the vehicle type already has a config.
    async fn insert_salary_config(&self, config: &SalaryConfig) -> AppResult<()>;

    async fn get_salary_config(&self, vehicle_type: VehicleType)
    -> AppResult<Option<SalaryConfig>>;

    async fn list_salary_configs(&self) -> AppResult<Vec<SalaryConfig>>;

    /// Fails with `NotFound` when there is nothing to replace.
    async fn replace_salary_config(&self, config: &SalaryConfig) -> AppResult<()>;

    async fn delete_salary_config(&self, vehicle_type: VehicleType) -> AppResult<bool>;
}

#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Fails with `Conflict` on a duplicate (case-insensitive) email.
    async fn insert_user(&self, user: &User) -> AppResult<()>;

    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>>;

    async fn list_users(&self) -> AppResult<Vec<User>>;

    async fn insert_driver(&self, driver: &Driver) -> AppResult<()>;

    async fn get_driver(&self, id: Uuid) -> AppResult<Option<Driver>>;

    async fn list_drivers(&self) -> AppResult<Vec<Driver>>;

    /// Active drivers whose licence expires on or before `until`.
    async fn drivers_with_expiring_licence(&self, until: NaiveDate) -> AppResult<Vec<Driver>>;

    /// Stamps `expiry_notified_for` and stores the warning together.
    async fn record_licence_warning(
        &self,
        driver_id: Uuid,
        expiry: NaiveDate,
        notification: &Notification,
    ) -> AppResult<()>;
}

#[async_trait]
pub trait InvoiceStore: Send + Sync {
    async fn insert_driver_invoice(
        &self,
        invoice: &DriverInvoice,
        notification: &Notification,
    ) -> AppResult<()>;

    async fn get_driver_invoice(&self, id: Uuid) -> AppResult<Option<DriverInvoice>>;

    async fn list_driver_invoices(&self, filter: &InvoiceFilter) -> AppResult<Vec<DriverInvoice>>;

    /// Compare-and-set on `expected`; a concurrent status change yields `Conflict`.
    async fn update_driver_invoice(
        &self,
        invoice: &DriverInvoice,
        expected: InvoiceStatus,
        notification: Option<&Notification>,
    ) -> AppResult<()>;

    /// Archives every archivable invoice of `driver_id` (or of all drivers),
    /// stamping `reset_by`. The notification is only stored when something changed.
    async fn reset_driver_invoices(
        &self,
        driver_id: Option<Uuid>,
        reset_by: Uuid,
        at: DateTime<Utc>,
        notification: &Notification,
    ) -> AppResult<u64>;

    async fn insert_employee_invoice(
        &self,
        invoice: &EmployeeInvoice,
        notification: &Notification,
    ) -> AppResult<()>;

    async fn get_employee_invoice(&self, id: Uuid) -> AppResult<Option<EmployeeInvoice>>;

    async fn list_employee_invoices(
        &self,
        filter: &InvoiceFilter,
    ) -> AppResult<Vec<EmployeeInvoice>>;

    async fn update_employee_invoice(
        &self,
        invoice: &EmployeeInvoice,
        expected: InvoiceStatus,
        notification: Option<&Notification>,
    ) -> AppResult<()>;
}

#[async_trait]
pub trait ArchiveStore: Send + Sync {
    async fn latest_archive_run(&self) -> AppResult<Option<ArchiveRun>>;

    /// Archives invoices and approved petty cash dated before `run.period`,
    /// fills in the counts and records the run. A second run for the same
    /// period fails with `Conflict`.
    async fn run_archive(&self, run: ArchiveRun) -> AppResult<ArchiveRun>;
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Fails with `Conflict` on a duplicate number or (case-insensitive) name.
    async fn insert_bank_account(&self, account: &BankAccount) -> AppResult<()>;

    async fn get_bank_account(&self, account_number: &str) -> AppResult<Option<BankAccount>>;

    async fn list_bank_accounts(&self) -> AppResult<Vec<BankAccount>>;

    async fn latest_bank_statement(&self, account_number: &str)
    -> AppResult<Option<BankStatement>>;

    /// Fails with `Conflict` when `(account, sequence)` is taken.
    async fn insert_bank_statement(&self, statement: &BankStatement) -> AppResult<()>;

    async fn search_bank_statements(&self, search: &StatementSearch)
    -> AppResult<Vec<BankStatement>>;

    async fn latest_petty_cash_serial(&self) -> AppResult<Option<i64>>;

    /// Starting balance of the first record minus every spend that is neither
    /// rejected nor attributed to a person. `None` before the first record.
    async fn petty_cash_balance(&self) -> AppResult<Option<Decimal>>;

    /// Fails with `Conflict` when the serial number is taken.
    async fn insert_petty_cash(
        &self,
        record: &PettyCash,
        notification: Option<&Notification>,
    ) -> AppResult<()>;

    async fn get_petty_cash(&self, id: Uuid) -> AppResult<Option<PettyCash>>;

    async fn list_petty_cash(&self, status: Option<PettyCashStatus>) -> AppResult<Vec<PettyCash>>;

    /// Compare-and-set on `expected`.
    async fn update_petty_cash_status(
        &self,
        id: Uuid,
        expected: PettyCashStatus,
        status: PettyCashStatus,
        reviewed_by: Uuid,
    ) -> AppResult<PettyCash>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert_notification(&self, notification: &Notification) -> AppResult<()>;

    /// Newest first.
    async fn unread_notifications(&self, user_id: Uuid, role: Role)
    -> AppResult<Vec<Notification>>;

    /// Records a read row for every notification currently unread by the user.
    async fn mark_all_read(&self, user_id: Uuid, role: Role, at: DateTime<Utc>) -> AppResult<u64>;

    async fn list_notifications_for_target(&self, target_id: Uuid) -> AppResult<Vec<Notification>>;
}

/// Everything the services need from a backend.
pub trait Store:
    Backend
    + CounterStore
    + SalaryStore
    + DirectoryStore
    + InvoiceStore
    + ArchiveStore
    + LedgerStore
    + NotificationStore
{
}

impl<T> Store for T where
    T: Backend
        + CounterStore
        + SalaryStore
        + DirectoryStore
        + InvoiceStore
        + ArchiveStore
        + LedgerStore
        + NotificationStore
{
}
