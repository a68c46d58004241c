// src/services/ledger.rs

use crate::{
    errors::{AppError, AppResult},
    models::{
        Actor, BankAccount, BankStatement, CreateBankAccountRequest, CreateBankStatementRequest,
        CreatePettyCashRequest, Notification, NotificationKind, PettyCash, PettyCashStatus,
        Recipients, Role, StatementQuery,
    },
    services::{
        require_text,
        lifecycle::ReviewPolicy,
        sequence::{following, retry_on_conflict},
    },
    store::{StatementSearch, Store},
};
use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Running balance after one entry: `previous - spends + deposits`.
pub fn next_balance(previous: Decimal, deposits: Decimal, spends: Decimal) -> Decimal {
    previous - spends + deposits
}

/// Narrows a statement query to concrete bounds; `current_year` clamps
/// the range to the calendar year of `today`.
pub fn resolve_search(query: &StatementQuery, today: NaiveDate) -> StatementSearch {
    let mut search = StatementSearch {
        account_number: query
            .account_number
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string),
        from: query.from,
        to: query.to,
    };
    if query.current_year {
        let year_start = NaiveDate::from_ymd_opt(today.year(), 1, 1);
        let year_end = NaiveDate::from_ymd_opt(today.year(), 12, 31);
        search.from = search.from.max(year_start);
        search.to = match (search.to, year_end) {
            (Some(to), Some(end)) => Some(to.min(end)),
            (to, end) => to.or(end),
        };
    }
    search
}

pub struct LedgerService {
    store: Arc<dyn Store>,
    policy: Arc<ReviewPolicy>,
    retry_attempts: u32,
}

impl LedgerService {
    pub fn new(store: Arc<dyn Store>, policy: Arc<ReviewPolicy>, retry_attempts: u32) -> Self {
        Self {
            store,
            policy,
            retry_attempts,
        }
    }

    // ─── Bank accounts ────────────────────────────────────────────────────────

    pub async fn create_bank_account(
        &self,
        actor: &Actor,
        request: CreateBankAccountRequest,
    ) -> AppResult<BankAccount> {
        let account = BankAccount {
            id: Uuid::new_v4(),
            account_number: require_text(&request.account_number, "account_number")?,
            account_name: require_text(&request.account_name, "account_name")?,
            created_by: actor.id,
            created_at: Utc::now(),
        };
        self.store.insert_bank_account(&account).await?;

        info!(account = %account.account_number, actor = %actor.id, "bank account created");
        Ok(account)
    }

    pub async fn list_bank_accounts(&self) -> AppResult<Vec<BankAccount>> {
        self.store.list_bank_accounts().await
    }

    // ─── Bank statements ──────────────────────────────────────────────────────

    pub async fn append_bank_statement(
        &self,
        actor: &Actor,
        request: CreateBankStatementRequest,
    ) -> AppResult<BankStatement> {
        if request.deposits < Decimal::ZERO || request.spends < Decimal::ZERO {
            return Err(AppError::Validation(
                "deposits and spends must not be negative".to_string(),
            ));
        }
        let account_number = require_text(&request.account_number, "account_number")?;
        if self.store.get_bank_account(&account_number).await?.is_none() {
            return Err(AppError::NotFound(format!("Bank account {account_number}")));
        }

        let statement = retry_on_conflict(self.retry_attempts, || {
            self.try_append_statement(actor, &account_number, &request)
        })
        .await?;

        info!(
            account = %statement.bank_account_number,
            sequence = statement.sequence,
            balance = %statement.balance,
            actor = %actor.id,
            "bank statement appended"
        );
        Ok(statement)
    }

    async fn try_append_statement(
        &self,
        actor: &Actor,
        account_number: &str,
        request: &CreateBankStatementRequest,
    ) -> AppResult<BankStatement> {
        let previous = self.store.latest_bank_statement(account_number).await?;
        let (sequence, opening) = match (&previous, request.starting_balance) {
            (None, Some(start)) => (1, start),
            (None, None) => {
                return Err(AppError::MissingStartingBalance(account_number.to_string()));
            }
            (Some(_), Some(_)) => {
                return Err(AppError::Validation(format!(
                    "Account {account_number} already has statements; starting_balance is only accepted on the first one"
                )));
            }
            (Some(prev), None) => (following(Some(prev.sequence)), prev.balance),
        };

        let statement = BankStatement {
            id: Uuid::new_v4(),
            bank_account_number: account_number.to_string(),
            sequence,
            statement_date: request.statement_date,
            deposits: request.deposits,
            spends: request.spends,
            balance: next_balance(opening, request.deposits, request.spends),
            description: request.description.clone(),
            created_by: actor.id,
            created_at: Utc::now(),
        };
        self.store.insert_bank_statement(&statement).await?;
        Ok(statement)
    }

    pub async fn search_bank_statements(
        &self,
        query: &StatementQuery,
    ) -> AppResult<Vec<BankStatement>> {
        let search = resolve_search(query, Utc::now().date_naive());
        self.store.search_bank_statements(&search).await
    }

    // ─── Petty cash ───────────────────────────────────────────────────────────

    /// A spend charged to a user or driver leaves the company balance as it
    /// was and raises a notification so the payroll deduction gets entered.
    pub async fn create_petty_cash(
        &self,
        actor: &Actor,
        request: CreatePettyCashRequest,
    ) -> AppResult<PettyCash> {
        if request.deducted_from_user.is_some() && request.deducted_from_driver.is_some() {
            return Err(AppError::Validation(
                "deducted_from_user and deducted_from_driver are mutually exclusive".to_string(),
            ));
        }
        if request.cash_amount <= Decimal::ZERO {
            return Err(AppError::Validation(
                "cash_amount must be greater than zero".to_string(),
            ));
        }
        require_text(&request.request_applicant, "request_applicant")?;
        require_text(&request.spends_reason, "spends_reason")?;
        require_text(&request.spend_type, "spend_type")?;

        let mut charged_to = None;
        if let Some(user_id) = request.deducted_from_user {
            let user = self
                .store
                .get_user(user_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("User {user_id}")))?;
            charged_to = Some(user.name);
        }
        if let Some(driver_id) = request.deducted_from_driver {
            let driver = self
                .store
                .get_driver(driver_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Driver {driver_id}")))?;
            charged_to = Some(driver.name);
        }

        let record = retry_on_conflict(self.retry_attempts, || {
            self.try_create_petty_cash(actor, &request, charged_to.as_deref())
        })
        .await?;

        info!(
            petty_cash = %record.id,
            serial = record.serial_number,
            amount = %record.cash_amount,
            balance = %record.current_balance,
            attributed = record.is_attributed(),
            actor = %actor.id,
            "petty cash recorded"
        );
        Ok(record)
    }

    async fn try_create_petty_cash(
        &self,
        actor: &Actor,
        request: &CreatePettyCashRequest,
        charged_to: Option<&str>,
    ) -> AppResult<PettyCash> {
        let serial_number = following(self.store.latest_petty_cash_serial().await?);
        let previous_balance = match (
            self.store.petty_cash_balance().await?,
            request.starting_balance,
        ) {
            (None, Some(start)) => start,
            (None, None) => return Err(AppError::MissingStartingBalance("petty cash".to_string())),
            (Some(_), Some(_)) => {
                return Err(AppError::Validation(
                    "starting_balance is only accepted on the first petty cash record".to_string(),
                ));
            }
            (Some(balance), None) => balance,
        };

        let mut record = PettyCash {
            id: Uuid::new_v4(),
            serial_number,
            request_applicant: request.request_applicant.trim().to_string(),
            spends_reason: request.spends_reason.trim().to_string(),
            cash_amount: request.cash_amount,
            spend_type: request.spend_type.trim().to_string(),
            request_date: request.request_date,
            previous_balance,
            current_balance: previous_balance,
            status: PettyCashStatus::Pending,
            deducted_from_user: request.deducted_from_user,
            deducted_from_driver: request.deducted_from_driver,
            created_by: actor.id,
            reviewed_by: None,
            created_at: Utc::now(),
        };
        if !record.is_attributed() {
            record.current_balance = next_balance(previous_balance, Decimal::ZERO, record.cash_amount);
        }

        let notification = charged_to.map(|name| {
            Notification::new(
                NotificationKind::PettyCashRequested,
                Recipients {
                    for_user_id: record.deducted_from_user,
                    ..Recipients::roles([Role::Accountant])
                },
                Some(actor.id),
                Some(record.id),
                format!(
                    "Petty cash #{} of {} is to be deducted from {name}",
                    record.serial_number, record.cash_amount
                ),
            )
        });
        self.store
            .insert_petty_cash(&record, notification.as_ref())
            .await?;
        Ok(record)
    }

    pub async fn set_petty_cash_status(
        &self,
        actor: &Actor,
        id: Uuid,
        status: PettyCashStatus,
    ) -> AppResult<PettyCash> {
        if !self.policy.can_review_petty_cash(actor.role) {
            return Err(AppError::Forbidden(format!(
                "Role {} may not review petty cash",
                actor.role
            )));
        }
        if !matches!(status, PettyCashStatus::Approved | PettyCashStatus::Rejected) {
            return Err(AppError::Validation(
                "Petty cash can only be approved or rejected".to_string(),
            ));
        }

        let current = self
            .store
            .get_petty_cash(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Petty cash record {id}")))?;
        if current.status != PettyCashStatus::Pending {
            return Err(AppError::InvalidTransition(format!(
                "petty cash {:?} -> {status:?}",
                current.status
            )));
        }

        let record = self
            .store
            .update_petty_cash_status(id, PettyCashStatus::Pending, status, actor.id)
            .await?;

        info!(petty_cash = %id, status = ?status, actor = %actor.id, "petty cash reviewed");
        Ok(record)
    }

    pub async fn list_petty_cash(&self, status: Option<PettyCashStatus>) -> AppResult<Vec<PettyCash>> {
        self.store.list_petty_cash(status).await
    }
}
