//! In-process backend. Enforces the same uniqueness rules as the Postgres
//! schema; every call runs under one lock, so composite writes are atomic.

use super::{
    ArchiveStore, Backend, CounterStore, DirectoryStore, InvoiceStore, LedgerStore,
    NotificationStore, SalaryStore, StatementSearch,
};
use crate::{
    errors::{AppError, AppResult},
    models::{
        ArchiveRun, BankAccount, BankStatement, Driver, DriverInvoice, EmployeeInvoice,
        InvoiceFilter, InvoiceStatus, Notification, PettyCash, PettyCashStatus, Role,
        SalaryConfig, User, VehicleType,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    counters: HashMap<String, i64>,
    salary_configs: HashMap<VehicleType, SalaryConfig>,
    users: HashMap<Uuid, User>,
    drivers: HashMap<Uuid, Driver>,
    driver_invoices: HashMap<Uuid, DriverInvoice>,
    employee_invoices: HashMap<Uuid, EmployeeInvoice>,
    archive_runs: Vec<ArchiveRun>,
    bank_accounts: Vec<BankAccount>,
    bank_statements: Vec<BankStatement>,
    petty_cash: Vec<PettyCash>,
    // insertion order is chronological
    notifications: Vec<Notification>,
    reads: HashSet<(Uuid, Uuid)>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Backend for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn increment_counter(&self, key: &str) -> AppResult<i64> {
        let mut tables = self.tables.lock().await;
        let value = tables.counters.entry(key.to_string()).or_insert(0);
        *value += 1;
        Ok(*value)
    }
}

#[async_trait]
impl SalaryStore for MemoryStore {
    async fn insert_salary_config(&self, config: &SalaryConfig) -> AppResult<()> {
        let mut tables = self.tables.lock().await;
        if tables.salary_configs.contains_key(&config.vehicle_type) {
            return Err(AppError::Conflict(format!(
                "A salary configuration for {} already exists",
                config.vehicle_type
            )));
        }
        tables
            .salary_configs
            .insert(config.vehicle_type, config.clone());
        Ok(())
    }

    async fn get_salary_config(
        &self,
        vehicle_type: VehicleType,
    ) -> AppResult<Option<SalaryConfig>> {
        Ok(self
            .tables
            .lock()
            .await
            .salary_configs
            .get(&vehicle_type)
            .cloned())
    }

    async fn list_salary_configs(&self) -> AppResult<Vec<SalaryConfig>> {
        let tables = self.tables.lock().await;
        let mut configs: Vec<_> = tables.salary_configs.values().cloned().collect();
        configs.sort_by_key(|c| c.vehicle_type.as_str());
        Ok(configs)
    }

    async fn replace_salary_config(&self, config: &SalaryConfig) -> AppResult<()> {
        let mut tables = self.tables.lock().await;
        match tables.salary_configs.get_mut(&config.vehicle_type) {
            Some(existing) => {
                *existing = config.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!(
                "Salary configuration for {}",
                config.vehicle_type
            ))),
        }
    }

    async fn delete_salary_config(&self, vehicle_type: VehicleType) -> AppResult<bool> {
        Ok(self
            .tables
            .lock()
            .await
            .salary_configs
            .remove(&vehicle_type)
            .is_some())
    }
}

#[async_trait]
impl DirectoryStore for MemoryStore {
    async fn insert_user(&self, user: &User) -> AppResult<()> {
        let mut tables = self.tables.lock().await;
        if tables
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(AppError::Conflict(format!(
                "User with email '{}' already exists",
                user.email
            )));
        }
        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        let tables = self.tables.lock().await;
        let mut users: Vec<_> = tables.users.values().cloned().collect();
        users.sort_by_key(|u| u.sequence);
        Ok(users)
    }

    async fn insert_driver(&self, driver: &Driver) -> AppResult<()> {
        self.tables
            .lock()
            .await
            .drivers
            .insert(driver.id, driver.clone());
        Ok(())
    }

    async fn get_driver(&self, id: Uuid) -> AppResult<Option<Driver>> {
        Ok(self.tables.lock().await.drivers.get(&id).cloned())
    }

    async fn list_drivers(&self) -> AppResult<Vec<Driver>> {
        let tables = self.tables.lock().await;
        let mut drivers: Vec<_> = tables.drivers.values().cloned().collect();
        drivers.sort_by_key(|d| d.sequence);
        Ok(drivers)
    }

    async fn drivers_with_expiring_licence(&self, until: NaiveDate) -> AppResult<Vec<Driver>> {
        let tables = self.tables.lock().await;
        let mut drivers: Vec<_> = tables
            .drivers
            .values()
            .filter(|d| d.is_active && d.license_expiry.is_some_and(|e| e <= until))
            .cloned()
            .collect();
        drivers.sort_by_key(|d| d.sequence);
        Ok(drivers)
    }

    async fn record_licence_warning(
        &self,
        driver_id: Uuid,
        expiry: NaiveDate,
        notification: &Notification,
    ) -> AppResult<()> {
        let mut tables = self.tables.lock().await;
        let driver = tables
            .drivers
            .get_mut(&driver_id)
            .ok_or_else(|| AppError::NotFound(format!("Driver {driver_id}")))?;
        driver.expiry_notified_for = Some(expiry);
        tables.notifications.push(notification.clone());
        Ok(())
    }
}

fn driver_invoice_matches(invoice: &DriverInvoice, filter: &InvoiceFilter) -> bool {
    filter.status.is_none_or(|s| invoice.status == s)
        && filter.driver_id.is_none_or(|d| invoice.driver_id == d)
        && filter.user_id.is_none_or(|u| invoice.submitted_by == u)
}

fn employee_invoice_matches(invoice: &EmployeeInvoice, filter: &InvoiceFilter) -> bool {
    filter.status.is_none_or(|s| invoice.status == s)
        && filter.user_id.is_none_or(|u| invoice.user_id == u)
}

#[async_trait]
impl InvoiceStore for MemoryStore {
    async fn insert_driver_invoice(
        &self,
        invoice: &DriverInvoice,
        notification: &Notification,
    ) -> AppResult<()> {
        let mut tables = self.tables.lock().await;
        tables.driver_invoices.insert(invoice.id, invoice.clone());
        tables.notifications.push(notification.clone());
        Ok(())
    }

    async fn get_driver_invoice(&self, id: Uuid) -> AppResult<Option<DriverInvoice>> {
        Ok(self.tables.lock().await.driver_invoices.get(&id).cloned())
    }

    async fn list_driver_invoices(&self, filter: &InvoiceFilter) -> AppResult<Vec<DriverInvoice>> {
        let tables = self.tables.lock().await;
        let mut invoices: Vec<_> = tables
            .driver_invoices
            .values()
            .filter(|i| driver_invoice_matches(i, filter))
            .cloned()
            .collect();
        invoices.sort_by(|a, b| b.serial.cmp(&a.serial));
        Ok(invoices)
    }

    async fn update_driver_invoice(
        &self,
        invoice: &DriverInvoice,
        expected: InvoiceStatus,
        notification: Option<&Notification>,
    ) -> AppResult<()> {
        let mut tables = self.tables.lock().await;
        let stored = tables
            .driver_invoices
            .get_mut(&invoice.id)
            .ok_or_else(|| AppError::NotFound(format!("Driver invoice {}", invoice.id)))?;
        if stored.status != expected {
            return Err(AppError::Conflict(format!(
                "Driver invoice {} changed to {} concurrently",
                invoice.id, stored.status
            )));
        }
        *stored = invoice.clone();
        if let Some(notification) = notification {
            tables.notifications.push(notification.clone());
        }
        Ok(())
    }

    async fn reset_driver_invoices(
        &self,
        driver_id: Option<Uuid>,
        reset_by: Uuid,
        at: DateTime<Utc>,
        notification: &Notification,
    ) -> AppResult<u64> {
        let mut tables = self.tables.lock().await;
        let mut changed = 0;
        for invoice in tables.driver_invoices.values_mut() {
            if driver_id.is_some_and(|d| invoice.driver_id != d) {
                continue;
            }
            if let Some(next) = invoice.status.archived_counterpart() {
                invoice.mark_archived(next, at, Some(reset_by));
                invoice.reset_by = Some(reset_by);
                changed += 1;
            }
        }
        if changed > 0 {
            tables.notifications.push(notification.clone());
        }
        Ok(changed)
    }

    async fn insert_employee_invoice(
        &self,
        invoice: &EmployeeInvoice,
        notification: &Notification,
    ) -> AppResult<()> {
        let mut tables = self.tables.lock().await;
        tables.employee_invoices.insert(invoice.id, invoice.clone());
        tables.notifications.push(notification.clone());
        Ok(())
    }

    async fn get_employee_invoice(&self, id: Uuid) -> AppResult<Option<EmployeeInvoice>> {
        Ok(self.tables.lock().await.employee_invoices.get(&id).cloned())
    }

    async fn list_employee_invoices(
        &self,
        filter: &InvoiceFilter,
    ) -> AppResult<Vec<EmployeeInvoice>> {
        let tables = self.tables.lock().await;
        let mut invoices: Vec<_> = tables
            .employee_invoices
            .values()
            .filter(|i| employee_invoice_matches(i, filter))
            .cloned()
            .collect();
        invoices.sort_by(|a, b| b.serial.cmp(&a.serial));
        Ok(invoices)
    }

    async fn update_employee_invoice(
        &self,
        invoice: &EmployeeInvoice,
        expected: InvoiceStatus,
        notification: Option<&Notification>,
    ) -> AppResult<()> {
        let mut tables = self.tables.lock().await;
        let stored = tables
            .employee_invoices
            .get_mut(&invoice.id)
            .ok_or_else(|| AppError::NotFound(format!("Employee invoice {}", invoice.id)))?;
        if stored.status != expected {
            return Err(AppError::Conflict(format!(
                "Employee invoice {} changed to {} concurrently",
                invoice.id, stored.status
            )));
        }
        *stored = invoice.clone();
        if let Some(notification) = notification {
            tables.notifications.push(notification.clone());
        }
        Ok(())
    }
}

#[async_trait]
impl ArchiveStore for MemoryStore {
    async fn latest_archive_run(&self) -> AppResult<Option<ArchiveRun>> {
        let tables = self.tables.lock().await;
        Ok(tables.archive_runs.iter().max_by_key(|r| r.period).cloned())
    }

    async fn run_archive(&self, mut run: ArchiveRun) -> AppResult<ArchiveRun> {
        let mut tables = self.tables.lock().await;
        if tables.archive_runs.iter().any(|r| r.period == run.period) {
            return Err(AppError::Conflict(format!(
                "Period {} has already been archived",
                run.period
            )));
        }

        for invoice in tables.driver_invoices.values_mut() {
            if invoice.invoice_date >= run.period {
                continue;
            }
            if let Some(next) = invoice.status.archived_counterpart() {
                invoice.mark_archived(next, run.ran_at, None);
                run.driver_invoices += 1;
            }
        }
        for invoice in tables.employee_invoices.values_mut() {
            if invoice.invoice_date >= run.period {
                continue;
            }
            if let Some(next) = invoice.status.archived_counterpart() {
                invoice.mark_archived(next, run.ran_at, None);
                run.employee_invoices += 1;
            }
        }
        for record in tables.petty_cash.iter_mut() {
            if record.status == PettyCashStatus::Approved && record.request_date < run.period {
                record.status = PettyCashStatus::Archived;
                run.petty_cash += 1;
            }
        }

        tables.archive_runs.push(run.clone());
        Ok(run)
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn insert_bank_account(&self, account: &BankAccount) -> AppResult<()> {
        let mut tables = self.tables.lock().await;
        if let Some(existing) = tables.bank_accounts.iter().find(|a| {
            a.account_number == account.account_number
                || a.account_name.to_lowercase() == account.account_name.to_lowercase()
        }) {
            return Err(AppError::Conflict(format!(
                "Bank account {} ('{}') already exists",
                existing.account_number, existing.account_name
            )));
        }
        tables.bank_accounts.push(account.clone());
        Ok(())
    }

    async fn get_bank_account(&self, account_number: &str) -> AppResult<Option<BankAccount>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .bank_accounts
            .iter()
            .find(|a| a.account_number == account_number)
            .cloned())
    }

    async fn list_bank_accounts(&self) -> AppResult<Vec<BankAccount>> {
        let tables = self.tables.lock().await;
        let mut accounts = tables.bank_accounts.clone();
        accounts.sort_by(|a, b| a.account_number.cmp(&b.account_number));
        Ok(accounts)
    }

    async fn latest_bank_statement(
        &self,
        account_number: &str,
    ) -> AppResult<Option<BankStatement>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .bank_statements
            .iter()
            .filter(|s| s.bank_account_number == account_number)
            .max_by_key(|s| s.sequence)
            .cloned())
    }

    async fn insert_bank_statement(&self, statement: &BankStatement) -> AppResult<()> {
        let mut tables = self.tables.lock().await;
        if tables.bank_statements.iter().any(|s| {
            s.bank_account_number == statement.bank_account_number
                && s.sequence == statement.sequence
        }) {
            return Err(AppError::Conflict(format!(
                "Statement #{} already exists for account {}",
                statement.sequence, statement.bank_account_number
            )));
        }
        tables.bank_statements.push(statement.clone());
        Ok(())
    }

    async fn search_bank_statements(
        &self,
        search: &StatementSearch,
    ) -> AppResult<Vec<BankStatement>> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<_> = tables
            .bank_statements
            .iter()
            .filter(|s| {
                search
                    .account_number
                    .as_deref()
                    .is_none_or(|n| s.bank_account_number == n)
                    && search.from.is_none_or(|from| s.statement_date >= from)
                    && search.to.is_none_or(|to| s.statement_date <= to)
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            a.bank_account_number
                .cmp(&b.bank_account_number)
                .then(a.sequence.cmp(&b.sequence))
        });
        Ok(rows)
    }

    async fn latest_petty_cash_serial(&self) -> AppResult<Option<i64>> {
        let tables = self.tables.lock().await;
        Ok(tables.petty_cash.iter().map(|p| p.serial_number).max())
    }

    async fn petty_cash_balance(&self) -> AppResult<Option<Decimal>> {
        let tables = self.tables.lock().await;
        let Some(first) = tables.petty_cash.iter().min_by_key(|p| p.serial_number) else {
            return Ok(None);
        };
        let spent: Decimal = tables
            .petty_cash
            .iter()
            .filter(|p| p.status != PettyCashStatus::Rejected && !p.is_attributed())
            .map(|p| p.cash_amount)
            .sum();
        Ok(Some(first.previous_balance - spent))
    }

    async fn insert_petty_cash(
        &self,
        record: &PettyCash,
        notification: Option<&Notification>,
    ) -> AppResult<()> {
        let mut tables = self.tables.lock().await;
        if tables
            .petty_cash
            .iter()
            .any(|p| p.serial_number == record.serial_number)
        {
            return Err(AppError::Conflict(format!(
                "Petty cash serial #{} is already taken",
                record.serial_number
            )));
        }
        tables.petty_cash.push(record.clone());
        if let Some(notification) = notification {
            tables.notifications.push(notification.clone());
        }
        Ok(())
    }

    async fn get_petty_cash(&self, id: Uuid) -> AppResult<Option<PettyCash>> {
        let tables = self.tables.lock().await;
        Ok(tables.petty_cash.iter().find(|p| p.id == id).cloned())
    }

    async fn list_petty_cash(&self, status: Option<PettyCashStatus>) -> AppResult<Vec<PettyCash>> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<_> = tables
            .petty_cash
            .iter()
            .filter(|p| status.is_none_or(|s| p.status == s))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.serial_number.cmp(&a.serial_number));
        Ok(rows)
    }

    async fn update_petty_cash_status(
        &self,
        id: Uuid,
        expected: PettyCashStatus,
        status: PettyCashStatus,
        reviewed_by: Uuid,
    ) -> AppResult<PettyCash> {
        let mut tables = self.tables.lock().await;
        let record = tables
            .petty_cash
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Petty cash record {id}")))?;
        if record.status != expected {
            return Err(AppError::Conflict(format!(
                "Petty cash record {id} is no longer {expected:?}"
            )));
        }
        record.status = status;
        record.reviewed_by = Some(reviewed_by);
        Ok(record.clone())
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn insert_notification(&self, notification: &Notification) -> AppResult<()> {
        self.tables
            .lock()
            .await
            .notifications
            .push(notification.clone());
        Ok(())
    }

    async fn unread_notifications(
        &self,
        user_id: Uuid,
        role: Role,
    ) -> AppResult<Vec<Notification>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .notifications
            .iter()
            .rev()
            .filter(|n| n.is_visible_to(user_id, role) && !tables.reads.contains(&(n.id, user_id)))
            .cloned()
            .collect())
    }

    async fn mark_all_read(&self, user_id: Uuid, role: Role, _at: DateTime<Utc>) -> AppResult<u64> {
        let mut tables = self.tables.lock().await;
        let unread: Vec<Uuid> = tables
            .notifications
            .iter()
            .filter(|n| n.is_visible_to(user_id, role) && !tables.reads.contains(&(n.id, user_id)))
            .map(|n| n.id)
            .collect();
        for id in &unread {
            tables.reads.insert((*id, user_id));
        }
        Ok(unread.len() as u64)
    }

    async fn list_notifications_for_target(&self, target_id: Uuid) -> AppResult<Vec<Notification>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .notifications
            .iter()
            .filter(|n| n.target_id == Some(target_id))
            .cloned()
            .collect())
    }
}
