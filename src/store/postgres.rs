//! Postgres backend. Composite writes run in one transaction; uniqueness is
//! left to the schema and unique violations surface as `Conflict`.

use super::{
    ArchiveStore, Backend, CounterStore, DirectoryStore, InvoiceStore, LedgerStore,
    NotificationStore, SalaryStore, StatementSearch,
};
use crate::{
    errors::{AppError, AppResult},
    models::{
        ArchiveRun, BankAccount, BankStatement, Driver, DriverInvoice, EmployeeInvoice,
        InvoiceFilter, InvoiceStatus, Notification, PettyCash, PettyCashStatus, Role,
        SalaryConfig, SalaryRule, User, VehicleType,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{
    FromRow, PgConnection, PgPool,
    postgres::PgPoolOptions,
    types::Json,
};
use uuid::Uuid;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> AppResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> AppResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("migration failed: {e}")))
    }
}

fn conflict_on_unique(err: sqlx::Error, message: impl FnOnce() -> String) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Conflict(message()),
        _ => AppError::Database(err),
    }
}

async fn insert_notification_in(
    conn: &mut PgConnection,
    notification: &Notification,
) -> AppResult<()> {
    sqlx::query(
        r#"INSERT INTO notifications
            (id, roles, for_user_id, kind, sender_id, target_id, message, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"#,
    )
    .bind(notification.id)
    .bind(&notification.roles)
    .bind(notification.for_user_id)
    .bind(notification.kind)
    .bind(notification.sender_id)
    .bind(notification.target_id)
    .bind(&notification.message)
    .bind(notification.created_at)
    .execute(conn)
    .await?;
    Ok(())
}

#[async_trait]
impl Backend for PgStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl CounterStore for PgStore {
    async fn increment_counter(&self, key: &str) -> AppResult<i64> {
        let value = sqlx::query_scalar::<_, i64>(
            r#"INSERT INTO sequence_counters (scope_key, value) VALUES ($1, 1)
            ON CONFLICT (scope_key) DO UPDATE SET value = sequence_counters.value + 1
            RETURNING value"#,
        )
        .bind(key)
        .fetch_one(&self.pool)
        .await?;
        Ok(value)
    }
}

// ─── Salary configs ───────────────────────────────────────────────────────────

#[derive(FromRow)]
struct SalaryConfigRow {
    id: Uuid,
    vehicle_type: VehicleType,
    rules: Json<Vec<SalaryRule>>,
    last_updated_by: Uuid,
    last_updated_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl From<SalaryConfigRow> for SalaryConfig {
    fn from(row: SalaryConfigRow) -> Self {
        Self {
            id: row.id,
            vehicle_type: row.vehicle_type,
            rules: row.rules.0,
            last_updated_by: row.last_updated_by,
            last_updated_at: row.last_updated_at,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl SalaryStore for PgStore {
    async fn insert_salary_config(&self, config: &SalaryConfig) -> AppResult<()> {
        sqlx::query(
            r#"INSERT INTO salary_configs
                (id, vehicle_type, rules, last_updated_by, last_updated_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(config.id)
        .bind(config.vehicle_type)
        .bind(Json(&config.rules))
        .bind(config.last_updated_by)
        .bind(config.last_updated_at)
        .bind(config.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            conflict_on_unique(e, || {
                format!(
                    "A salary configuration for {} already exists",
                    config.vehicle_type
                )
            })
        })?;
        Ok(())
    }

    async fn get_salary_config(
        &self,
        vehicle_type: VehicleType,
    ) -> AppResult<Option<SalaryConfig>> {
        let row = sqlx::query_as::<_, SalaryConfigRow>(
            "SELECT * FROM salary_configs WHERE vehicle_type = $1",
        )
        .bind(vehicle_type)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(SalaryConfig::from))
    }

    async fn list_salary_configs(&self) -> AppResult<Vec<SalaryConfig>> {
        let rows = sqlx::query_as::<_, SalaryConfigRow>(
            "SELECT * FROM salary_configs ORDER BY vehicle_type::text",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(SalaryConfig::from).collect())
    }

    async fn replace_salary_config(&self, config: &SalaryConfig) -> AppResult<()> {
        let result = sqlx::query(
            r#"UPDATE salary_configs
            SET rules = $2, last_updated_by = $3, last_updated_at = $4
            WHERE vehicle_type = $1"#,
        )
        .bind(config.vehicle_type)
        .bind(Json(&config.rules))
        .bind(config.last_updated_by)
        .bind(config.last_updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Salary configuration for {}",
                config.vehicle_type
            )));
        }
        Ok(())
    }

    async fn delete_salary_config(&self, vehicle_type: VehicleType) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM salary_configs WHERE vehicle_type = $1")
            .bind(vehicle_type)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ─── Directory ────────────────────────────────────────────────────────────────

#[async_trait]
impl DirectoryStore for PgStore {
    async fn insert_user(&self, user: &User) -> AppResult<()> {
        sqlx::query(
            r#"INSERT INTO users (id, sequence, name, email, role, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(user.id)
        .bind(user.sequence)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            conflict_on_unique(e, || {
                format!("User with email '{}' already exists", user.email)
            })
        })?;
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY sequence")
            .fetch_all(&self.pool)
            .await?)
    }

    async fn insert_driver(&self, driver: &Driver) -> AppResult<()> {
        sqlx::query(
            r#"INSERT INTO drivers (
                id, sequence, name, phone, vehicle_type, license_expiry,
                expiry_notified_for, is_active, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"#,
        )
        .bind(driver.id)
        .bind(driver.sequence)
        .bind(&driver.name)
        .bind(&driver.phone)
        .bind(driver.vehicle_type)
        .bind(driver.license_expiry)
        .bind(driver.expiry_notified_for)
        .bind(driver.is_active)
        .bind(driver.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_driver(&self, id: Uuid) -> AppResult<Option<Driver>> {
        Ok(sqlx::query_as::<_, Driver>("SELECT * FROM drivers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_drivers(&self) -> AppResult<Vec<Driver>> {
        Ok(sqlx::query_as::<_, Driver>("SELECT * FROM drivers ORDER BY sequence")
            .fetch_all(&self.pool)
            .await?)
    }

    async fn drivers_with_expiring_licence(&self, until: NaiveDate) -> AppResult<Vec<Driver>> {
        Ok(sqlx::query_as::<_, Driver>(
            r#"SELECT * FROM drivers
            WHERE is_active AND license_expiry IS NOT NULL AND license_expiry <= $1
            ORDER BY sequence"#,
        )
        .bind(until)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn record_licence_warning(
        &self,
        driver_id: Uuid,
        expiry: NaiveDate,
        notification: &Notification,
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("UPDATE drivers SET expiry_notified_for = $2 WHERE id = $1")
            .bind(driver_id)
            .bind(expiry)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Driver {driver_id}")));
        }
        insert_notification_in(&mut tx, notification).await?;
        tx.commit().await?;
        Ok(())
    }
}

// ─── Invoices ─────────────────────────────────────────────────────────────────

const ARCHIVE_STATUS_CASE: &str = r#"CASE WHEN status = 'visible_to_all'
    THEN 'visible_to_all_archived'::invoice_status
    ELSE 'archived'::invoice_status END"#;

const ARCHIVABLE_STATUSES: &str = r#"('pending_manager_review', 'pending_admin_review',
    'approved', 'overridden', 'visible_to_all')"#;

#[async_trait]
impl InvoiceStore for PgStore {
    async fn insert_driver_invoice(
        &self,
        invoice: &DriverInvoice,
        notification: &Notification,
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"INSERT INTO driver_invoices (
                id, serial, driver_id, invoice_date, deduction_date, main_order,
                additional_order, hour, cash, additional_salary, deduction_reason,
                talabat_deduction_amount, company_deduction_amount,
                petty_cash_deduction_amount, remarks, file, submitted_by, submitter_role,
                status, outcome, main_order_pay, additional_order_pay, computed_salary,
                salary_override, override_reason, overridden_by, overridden_at,
                archived_at, archived_by, reset_by, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29, $30,
                $31, $32
            )"#,
        )
        .bind(invoice.id)
        .bind(invoice.serial)
        .bind(invoice.driver_id)
        .bind(invoice.invoice_date)
        .bind(invoice.deduction_date)
        .bind(invoice.main_order)
        .bind(invoice.additional_order)
        .bind(invoice.hour)
        .bind(invoice.cash)
        .bind(invoice.additional_salary)
        .bind(&invoice.deduction_reason)
        .bind(invoice.talabat_deduction_amount)
        .bind(invoice.company_deduction_amount)
        .bind(invoice.petty_cash_deduction_amount)
        .bind(&invoice.remarks)
        .bind(&invoice.file)
        .bind(invoice.submitted_by)
        .bind(invoice.submitter_role)
        .bind(invoice.status)
        .bind(invoice.outcome)
        .bind(invoice.main_order_pay)
        .bind(invoice.additional_order_pay)
        .bind(invoice.computed_salary)
        .bind(invoice.salary_override)
        .bind(&invoice.override_reason)
        .bind(invoice.overridden_by)
        .bind(invoice.overridden_at)
        .bind(invoice.archived_at)
        .bind(invoice.archived_by)
        .bind(invoice.reset_by)
        .bind(invoice.created_at)
        .bind(invoice.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, || format!("Invoice #{} already exists", invoice.serial)))?;
        insert_notification_in(&mut tx, notification).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn get_driver_invoice(&self, id: Uuid) -> AppResult<Option<DriverInvoice>> {
        Ok(
            sqlx::query_as::<_, DriverInvoice>("SELECT * FROM driver_invoices WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn list_driver_invoices(&self, filter: &InvoiceFilter) -> AppResult<Vec<DriverInvoice>> {
        Ok(sqlx::query_as::<_, DriverInvoice>(
            r#"SELECT * FROM driver_invoices
            WHERE ($1::invoice_status IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR driver_id = $2)
              AND ($3::uuid IS NULL OR submitted_by = $3)
            ORDER BY serial DESC"#,
        )
        .bind(filter.status)
        .bind(filter.driver_id)
        .bind(filter.user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn update_driver_invoice(
        &self,
        invoice: &DriverInvoice,
        expected: InvoiceStatus,
        notification: Option<&Notification>,
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            r#"UPDATE driver_invoices SET
                status = $3, outcome = $4, salary_override = $5, override_reason = $6,
                overridden_by = $7, overridden_at = $8, archived_at = $9,
                archived_by = $10, reset_by = $11, updated_at = $12
            WHERE id = $1 AND status = $2"#,
        )
        .bind(invoice.id)
        .bind(expected)
        .bind(invoice.status)
        .bind(invoice.outcome)
        .bind(invoice.salary_override)
        .bind(&invoice.override_reason)
        .bind(invoice.overridden_by)
        .bind(invoice.overridden_at)
        .bind(invoice.archived_at)
        .bind(invoice.archived_by)
        .bind(invoice.reset_by)
        .bind(invoice.updated_at)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            let current = sqlx::query_scalar::<_, InvoiceStatus>(
                "SELECT status FROM driver_invoices WHERE id = $1",
            )
            .bind(invoice.id)
            .fetch_optional(&mut *tx)
            .await?;
            return Err(match current {
                Some(status) => AppError::Conflict(format!(
                    "Driver invoice {} changed to {} concurrently",
                    invoice.id, status
                )),
                None => AppError::NotFound(format!("Driver invoice {}", invoice.id)),
            });
        }
        if let Some(notification) = notification {
            insert_notification_in(&mut tx, notification).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn reset_driver_invoices(
        &self,
        driver_id: Option<Uuid>,
        reset_by: Uuid,
        at: DateTime<Utc>,
        notification: &Notification,
    ) -> AppResult<u64> {
        let mut tx = self.pool.begin().await?;
        let sql = format!(
            r#"UPDATE driver_invoices SET
                status = {ARCHIVE_STATUS_CASE},
                archived_at = $1, archived_by = $2, reset_by = $2, updated_at = $1
            WHERE status IN {ARCHIVABLE_STATUSES}
              AND ($3::uuid IS NULL OR driver_id = $3)"#
        );
        let changed = sqlx::query(&sql)
            .bind(at)
            .bind(reset_by)
            .bind(driver_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if changed > 0 {
            insert_notification_in(&mut tx, notification).await?;
        }
        tx.commit().await?;
        Ok(changed)
    }

    async fn insert_employee_invoice(
        &self,
        invoice: &EmployeeInvoice,
        notification: &Notification,
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"INSERT INTO employee_invoices (
                id, serial, user_id, invoice_date, deduction_date, additional_salary,
                deduction_reason, company_deduction_amount, remarks, file, submitted_by,
                submitter_role, status, outcome, archived_at, archived_by, created_at,
                updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                $17, $18
            )"#,
        )
        .bind(invoice.id)
        .bind(invoice.serial)
        .bind(invoice.user_id)
        .bind(invoice.invoice_date)
        .bind(invoice.deduction_date)
        .bind(invoice.additional_salary)
        .bind(&invoice.deduction_reason)
        .bind(invoice.company_deduction_amount)
        .bind(&invoice.remarks)
        .bind(&invoice.file)
        .bind(invoice.submitted_by)
        .bind(invoice.submitter_role)
        .bind(invoice.status)
        .bind(invoice.outcome)
        .bind(invoice.archived_at)
        .bind(invoice.archived_by)
        .bind(invoice.created_at)
        .bind(invoice.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, || format!("Invoice #{} already exists", invoice.serial)))?;
        insert_notification_in(&mut tx, notification).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn get_employee_invoice(&self, id: Uuid) -> AppResult<Option<EmployeeInvoice>> {
        Ok(sqlx::query_as::<_, EmployeeInvoice>(
            "SELECT * FROM employee_invoices WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list_employee_invoices(
        &self,
        filter: &InvoiceFilter,
    ) -> AppResult<Vec<EmployeeInvoice>> {
        Ok(sqlx::query_as::<_, EmployeeInvoice>(
            r#"SELECT * FROM employee_invoices
            WHERE ($1::invoice_status IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR user_id = $2)
            ORDER BY serial DESC"#,
        )
        .bind(filter.status)
        .bind(filter.user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn update_employee_invoice(
        &self,
        invoice: &EmployeeInvoice,
        expected: InvoiceStatus,
        notification: Option<&Notification>,
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            r#"UPDATE employee_invoices SET
                status = $3, outcome = $4, archived_at = $5, archived_by = $6, updated_at = $7
            WHERE id = $1 AND status = $2"#,
        )
        .bind(invoice.id)
        .bind(expected)
        .bind(invoice.status)
        .bind(invoice.outcome)
        .bind(invoice.archived_at)
        .bind(invoice.archived_by)
        .bind(invoice.updated_at)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            let current = sqlx::query_scalar::<_, InvoiceStatus>(
                "SELECT status FROM employee_invoices WHERE id = $1",
            )
            .bind(invoice.id)
            .fetch_optional(&mut *tx)
            .await?;
            return Err(match current {
                Some(status) => AppError::Conflict(format!(
                    "Employee invoice {} changed to {} concurrently",
                    invoice.id, status
                )),
                None => AppError::NotFound(format!("Employee invoice {}", invoice.id)),
            });
        }
        if let Some(notification) = notification {
            insert_notification_in(&mut tx, notification).await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

// ─── Archive ──────────────────────────────────────────────────────────────────

#[async_trait]
impl ArchiveStore for PgStore {
    async fn latest_archive_run(&self) -> AppResult<Option<ArchiveRun>> {
        Ok(sqlx::query_as::<_, ArchiveRun>(
            "SELECT * FROM archive_runs ORDER BY period DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn run_archive(&self, mut run: ArchiveRun) -> AppResult<ArchiveRun> {
        let mut tx = self.pool.begin().await?;

        let driver_sql = format!(
            r#"UPDATE driver_invoices SET
                status = {ARCHIVE_STATUS_CASE}, archived_at = $2, updated_at = $2
            WHERE status IN {ARCHIVABLE_STATUSES} AND invoice_date < $1"#
        );
        run.driver_invoices = sqlx::query(&driver_sql)
            .bind(run.period)
            .bind(run.ran_at)
            .execute(&mut *tx)
            .await?
            .rows_affected() as i64;

        let employee_sql = format!(
            r#"UPDATE employee_invoices SET
                status = {ARCHIVE_STATUS_CASE}, archived_at = $2, updated_at = $2
            WHERE status IN {ARCHIVABLE_STATUSES} AND invoice_date < $1"#
        );
        run.employee_invoices = sqlx::query(&employee_sql)
            .bind(run.period)
            .bind(run.ran_at)
            .execute(&mut *tx)
            .await?
            .rows_affected() as i64;

        run.petty_cash = sqlx::query(
            r#"UPDATE petty_cash SET status = 'archived'
            WHERE status = 'approved' AND request_date < $1"#,
        )
        .bind(run.period)
        .execute(&mut *tx)
        .await?
        .rows_affected() as i64;

        sqlx::query(
            r#"INSERT INTO archive_runs (
                id, sequence, period, driver_invoices, employee_invoices, petty_cash, ran_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)"#,
        )
        .bind(run.id)
        .bind(run.sequence)
        .bind(run.period)
        .bind(run.driver_invoices)
        .bind(run.employee_invoices)
        .bind(run.petty_cash)
        .bind(run.ran_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            conflict_on_unique(e, || format!("Period {} has already been archived", run.period))
        })?;

        tx.commit().await?;
        Ok(run)
    }
}

// ─── Ledgers ──────────────────────────────────────────────────────────────────

#[async_trait]
impl LedgerStore for PgStore {
    async fn insert_bank_account(&self, account: &BankAccount) -> AppResult<()> {
        sqlx::query(
            r#"INSERT INTO bank_accounts (id, account_number, account_name, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5)"#,
        )
        .bind(account.id)
        .bind(&account.account_number)
        .bind(&account.account_name)
        .bind(account.created_by)
        .bind(account.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            conflict_on_unique(e, || {
                format!(
                    "Bank account {} ('{}') already exists",
                    account.account_number, account.account_name
                )
            })
        })?;
        Ok(())
    }

    async fn get_bank_account(&self, account_number: &str) -> AppResult<Option<BankAccount>> {
        Ok(sqlx::query_as::<_, BankAccount>(
            "SELECT * FROM bank_accounts WHERE account_number = $1",
        )
        .bind(account_number)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list_bank_accounts(&self) -> AppResult<Vec<BankAccount>> {
        Ok(
            sqlx::query_as::<_, BankAccount>("SELECT * FROM bank_accounts ORDER BY account_number")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn latest_bank_statement(
        &self,
        account_number: &str,
    ) -> AppResult<Option<BankStatement>> {
        Ok(sqlx::query_as::<_, BankStatement>(
            r#"SELECT * FROM bank_statements
            WHERE bank_account_number = $1
            ORDER BY sequence DESC LIMIT 1"#,
        )
        .bind(account_number)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn insert_bank_statement(&self, statement: &BankStatement) -> AppResult<()> {
        sqlx::query(
            r#"INSERT INTO bank_statements (
                id, bank_account_number, sequence, statement_date, deposits, spends,
                balance, description, created_by, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"#,
        )
        .bind(statement.id)
        .bind(&statement.bank_account_number)
        .bind(statement.sequence)
        .bind(statement.statement_date)
        .bind(statement.deposits)
        .bind(statement.spends)
        .bind(statement.balance)
        .bind(&statement.description)
        .bind(statement.created_by)
        .bind(statement.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            conflict_on_unique(e, || {
                format!(
                    "Statement #{} already exists for account {}",
                    statement.sequence, statement.bank_account_number
                )
            })
        })?;
        Ok(())
    }

    async fn search_bank_statements(
        &self,
        search: &StatementSearch,
    ) -> AppResult<Vec<BankStatement>> {
        Ok(sqlx::query_as::<_, BankStatement>(
            r#"SELECT * FROM bank_statements
            WHERE ($1::text IS NULL OR bank_account_number = $1)
              AND ($2::date IS NULL OR statement_date >= $2)
              AND ($3::date IS NULL OR statement_date <= $3)
            ORDER BY bank_account_number, sequence"#,
        )
        .bind(search.account_number.as_deref())
        .bind(search.from)
        .bind(search.to)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn latest_petty_cash_serial(&self) -> AppResult<Option<i64>> {
        Ok(
            sqlx::query_scalar::<_, Option<i64>>("SELECT MAX(serial_number) FROM petty_cash")
                .fetch_one(&self.pool)
                .await?,
        )
    }

    async fn petty_cash_balance(&self) -> AppResult<Option<Decimal>> {
        Ok(sqlx::query_scalar::<_, Option<Decimal>>(
            r#"SELECT
                (SELECT previous_balance FROM petty_cash ORDER BY serial_number ASC LIMIT 1)
                - COALESCE(SUM(cash_amount) FILTER (
                    WHERE status <> 'rejected'
                      AND deducted_from_user IS NULL
                      AND deducted_from_driver IS NULL
                ), 0)
            FROM petty_cash"#,
        )
        .fetch_one(&self.pool)
        .await?)
    }

    async fn insert_petty_cash(
        &self,
        record: &PettyCash,
        notification: Option<&Notification>,
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"INSERT INTO petty_cash (
                id, serial_number, request_applicant, spends_reason, cash_amount,
                spend_type, request_date, previous_balance, current_balance, status,
                deducted_from_user, deducted_from_driver, created_by, reviewed_by, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)"#,
        )
        .bind(record.id)
        .bind(record.serial_number)
        .bind(&record.request_applicant)
        .bind(&record.spends_reason)
        .bind(record.cash_amount)
        .bind(&record.spend_type)
        .bind(record.request_date)
        .bind(record.previous_balance)
        .bind(record.current_balance)
        .bind(record.status)
        .bind(record.deducted_from_user)
        .bind(record.deducted_from_driver)
        .bind(record.created_by)
        .bind(record.reviewed_by)
        .bind(record.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            conflict_on_unique(e, || {
                format!("Petty cash serial #{} is already taken", record.serial_number)
            })
        })?;
        if let Some(notification) = notification {
            insert_notification_in(&mut tx, notification).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn get_petty_cash(&self, id: Uuid) -> AppResult<Option<PettyCash>> {
        Ok(
            sqlx::query_as::<_, PettyCash>("SELECT * FROM petty_cash WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn list_petty_cash(&self, status: Option<PettyCashStatus>) -> AppResult<Vec<PettyCash>> {
        Ok(sqlx::query_as::<_, PettyCash>(
            r#"SELECT * FROM petty_cash
            WHERE ($1::petty_cash_status IS NULL OR status = $1)
            ORDER BY serial_number DESC"#,
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn update_petty_cash_status(
        &self,
        id: Uuid,
        expected: PettyCashStatus,
        status: PettyCashStatus,
        reviewed_by: Uuid,
    ) -> AppResult<PettyCash> {
        let updated = sqlx::query_as::<_, PettyCash>(
            r#"UPDATE petty_cash SET status = $3, reviewed_by = $4
            WHERE id = $1 AND status = $2
            RETURNING *"#,
        )
        .bind(id)
        .bind(expected)
        .bind(status)
        .bind(reviewed_by)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(record) => Ok(record),
            None => match self.get_petty_cash(id).await? {
                Some(_) => Err(AppError::Conflict(format!(
                    "Petty cash record {id} is no longer {expected:?}"
                ))),
                None => Err(AppError::NotFound(format!("Petty cash record {id}"))),
            },
        }
    }
}

// ─── Notifications ────────────────────────────────────────────────────────────

#[async_trait]
impl NotificationStore for PgStore {
    async fn insert_notification(&self, notification: &Notification) -> AppResult<()> {
        let mut conn = self.pool.acquire().await?;
        insert_notification_in(&mut conn, notification).await
    }

    async fn unread_notifications(
        &self,
        user_id: Uuid,
        role: Role,
    ) -> AppResult<Vec<Notification>> {
        Ok(sqlx::query_as::<_, Notification>(
            r#"SELECT n.* FROM notifications n
            WHERE ($2::user_role = ANY(n.roles) OR n.for_user_id = $1)
              AND NOT EXISTS (
                  SELECT 1 FROM read_notifications r
                  WHERE r.notification_id = n.id AND r.user_id = $1
              )
            ORDER BY n.created_at DESC"#,
        )
        .bind(user_id)
        .bind(role)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn mark_all_read(&self, user_id: Uuid, role: Role, at: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            r#"INSERT INTO read_notifications (notification_id, user_id, read_at)
            SELECT n.id, $1, $3 FROM notifications n
            WHERE $2::user_role = ANY(n.roles) OR n.for_user_id = $1
            ON CONFLICT (notification_id, user_id) DO NOTHING"#,
        )
        .bind(user_id)
        .bind(role)
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn list_notifications_for_target(&self, target_id: Uuid) -> AppResult<Vec<Notification>> {
        Ok(sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE target_id = $1 ORDER BY created_at",
        )
        .bind(target_id)
        .fetch_all(&self.pool)
        .await?)
    }
}
