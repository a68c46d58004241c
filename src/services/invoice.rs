// src/services/invoice.rs

use crate::{
    errors::{AppError, AppResult},
    models::{
        Actor, CreateDriverInvoiceRequest, CreateEmployeeInvoiceRequest, DriverInvoice,
        DriverSalarySummary, EmployeeInvoice, InvoiceFilter, InvoiceStatus, Notification,
        NotificationKind, OverrideSalaryRequest, Recipients, ResetResponse, ReviewOutcome,
        ReviewQueue,
    },
    services::{
        archive::{next_month, parse_period},
        lifecycle::ReviewPolicy,
        notification::{recipients_for, review_message},
        require_text,
        salary::SalaryService,
        sequence::{SequenceAllocator, SequenceScope},
    },
    store::Store,
};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

fn ensure_non_negative(amounts: &[(&str, Decimal)]) -> AppResult<()> {
    for (field, amount) in amounts {
        if *amount < Decimal::ZERO {
            return Err(AppError::Validation(format!("{field} must not be negative")));
        }
    }
    Ok(())
}

/// Counts towards pay once approved, whether since overridden, published or archived.
fn counts_towards_pay(invoice: &DriverInvoice) -> bool {
    invoice.outcome == ReviewOutcome::Approved
}

pub struct InvoiceService {
    store: Arc<dyn Store>,
    policy: Arc<ReviewPolicy>,
    sequences: SequenceAllocator,
    salaries: SalaryService,
}

impl InvoiceService {
    pub fn new(store: Arc<dyn Store>, policy: Arc<ReviewPolicy>) -> Self {
        Self {
            sequences: SequenceAllocator::new(store.clone()),
            salaries: SalaryService::new(store.clone()),
            store,
            policy,
        }
    }

    // ─── Driver invoices ──────────────────────────────────────────────────────

    pub async fn create_driver_invoice(
        &self,
        actor: &Actor,
        request: CreateDriverInvoiceRequest,
    ) -> AppResult<DriverInvoice> {
        if request.main_order < 0 || request.additional_order < 0 {
            return Err(AppError::Validation(
                "main_order and additional_order must not be negative".to_string(),
            ));
        }
        ensure_non_negative(&[
            ("hour", request.hour),
            ("cash", request.cash),
            ("additional_salary", request.additional_salary),
            ("talabat_deduction_amount", request.talabat_deduction_amount),
            ("company_deduction_amount", request.company_deduction_amount),
            ("petty_cash_deduction_amount", request.petty_cash_deduction_amount),
        ])?;

        let route = self.policy.initial_route(actor.role)?.clone();
        let driver = self
            .store
            .get_driver(request.driver_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Driver {}", request.driver_id)))?;
        let pay = self
            .salaries
            .breakdown(driver.vehicle_type, request.main_order, request.additional_order)
            .await?;
        let serial = self.sequences.next(SequenceScope::DriverInvoice).await?;

        let now = Utc::now();
        let invoice = DriverInvoice {
            id: Uuid::new_v4(),
            serial,
            driver_id: driver.id,
            invoice_date: request.invoice_date,
            deduction_date: request.deduction_date,
            main_order: request.main_order,
            additional_order: request.additional_order,
            hour: request.hour,
            cash: request.cash,
            additional_salary: request.additional_salary,
            deduction_reason: request.deduction_reason,
            talabat_deduction_amount: request.talabat_deduction_amount,
            company_deduction_amount: request.company_deduction_amount,
            petty_cash_deduction_amount: request.petty_cash_deduction_amount,
            remarks: request.remarks,
            file: request.file,
            submitted_by: actor.id,
            submitter_role: actor.role,
            status: route.status,
            outcome: route.status.outcome(),
            main_order_pay: pay.main_order_pay,
            additional_order_pay: pay.additional_order_pay,
            computed_salary: pay.total,
            salary_override: None,
            override_reason: None,
            overridden_by: None,
            overridden_at: None,
            archived_at: None,
            archived_by: None,
            reset_by: None,
            created_at: now,
            updated_at: now,
        };

        let notification = Notification::new(
            NotificationKind::InvoiceSubmitted,
            Recipients::roles(route.notify),
            Some(actor.id),
            Some(invoice.id),
            format!(
                "Driver invoice #{} for {} submitted by {}",
                invoice.serial, driver.name, actor.name
            ),
        );
        self.store
            .insert_driver_invoice(&invoice, &notification)
            .await?;

        info!(
            invoice = %invoice.id,
            serial = invoice.serial,
            driver = %driver.id,
            status = %invoice.status,
            computed_salary = %invoice.computed_salary,
            actor = %actor.id,
            "driver invoice created"
        );
        Ok(invoice)
    }

    pub async fn get_driver_invoice(&self, id: Uuid) -> AppResult<DriverInvoice> {
        self.store
            .get_driver_invoice(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Driver invoice {id}")))
    }

    pub async fn list_driver_invoices(&self, filter: &InvoiceFilter) -> AppResult<Vec<DriverInvoice>> {
        self.store.list_driver_invoices(filter).await
    }

    pub async fn update_driver_invoice_status(
        &self,
        actor: &Actor,
        id: Uuid,
        status: InvoiceStatus,
    ) -> AppResult<DriverInvoice> {
        let mut invoice = self.get_driver_invoice(id).await?;
        let previous = invoice.status;
        let rule = self.policy.transition(actor.role, previous, status)?;

        invoice.apply_status(status, Utc::now());
        let (kind, recipients) =
            recipients_for(rule, actor.role, invoice.submitted_by, invoice.submitter_role);
        let notification = Notification::new(
            kind,
            recipients,
            Some(actor.id),
            Some(invoice.id),
            review_message("Driver invoice", invoice.serial, status, actor),
        );
        self.store
            .update_driver_invoice(&invoice, previous, Some(&notification))
            .await?;

        info!(invoice = %invoice.id, from = %previous, to = %status, actor = %actor.id, "driver invoice reviewed");
        Ok(invoice)
    }

    /// Archives the archivable invoices of one driver, or of every driver.
    pub async fn reset_driver_invoices(
        &self,
        actor: &Actor,
        driver_id: Option<Uuid>,
    ) -> AppResult<ResetResponse> {
        if !self.policy.can_reset(actor.role) {
            return Err(AppError::Forbidden(format!(
                "Role {} may not reset invoices",
                actor.role
            )));
        }

        let scope = match driver_id {
            Some(id) => {
                let driver = self
                    .store
                    .get_driver(id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("Driver {id}")))?;
                format!("driver {}", driver.name)
            }
            None => "all drivers".to_string(),
        };

        let notification = Notification::new(
            NotificationKind::InvoicesReset,
            Recipients::roles(self.policy.audit_watchers().iter().copied()),
            Some(actor.id),
            driver_id,
            format!("Invoices of {scope} were reset by {}", actor.name),
        );
        let invoices_reset = self
            .store
            .reset_driver_invoices(driver_id, actor.id, Utc::now(), &notification)
            .await?;

        info!(driver = ?driver_id, invoices_reset, actor = %actor.id, "driver invoices reset");
        Ok(ResetResponse { invoices_reset })
    }

    /// Replaces the computed order pay of an approved invoice. The computed
    /// figure is kept next to the override.
    pub async fn override_driver_salary(
        &self,
        actor: &Actor,
        id: Uuid,
        request: OverrideSalaryRequest,
    ) -> AppResult<DriverInvoice> {
        if !self.policy.can_override(actor.role) {
            return Err(AppError::Forbidden(format!(
                "Role {} may not override salaries",
                actor.role
            )));
        }
        ensure_non_negative(&[("amount", request.amount)])?;
        let reason = require_text(&request.reason, "reason")?;

        let mut invoice = self.get_driver_invoice(id).await?;
        if invoice.status != InvoiceStatus::Approved {
            return Err(AppError::InvalidTransition(format!(
                "{} -> {}: only approved invoices can be overridden",
                invoice.status,
                InvoiceStatus::Overridden
            )));
        }

        let now = Utc::now();
        invoice.salary_override = Some(request.amount);
        invoice.override_reason = Some(reason);
        invoice.overridden_by = Some(actor.id);
        invoice.overridden_at = Some(now);
        invoice.apply_status(InvoiceStatus::Overridden, now);

        let notification = Notification::new(
            NotificationKind::SalaryOverridden,
            Recipients::roles(self.policy.audit_watchers().iter().copied()),
            Some(actor.id),
            Some(invoice.id),
            format!(
                "Salary on driver invoice #{} overridden from {} to {} by {}",
                invoice.serial, invoice.computed_salary, request.amount, actor.name
            ),
        );
        self.store
            .update_driver_invoice(&invoice, InvoiceStatus::Approved, Some(&notification))
            .await?;

        info!(invoice = %invoice.id, amount = %request.amount, actor = %actor.id, "driver salary overridden");
        Ok(invoice)
    }

    /// Pay of one driver for the month `period` ("YYYY-MM").
    pub async fn driver_salary_summary(
        &self,
        driver_id: Uuid,
        period: &str,
    ) -> AppResult<DriverSalarySummary> {
        let start = parse_period(period)?;
        let end = next_month(start);
        if self.store.get_driver(driver_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Driver {driver_id}")));
        }

        let filter = InvoiceFilter {
            driver_id: Some(driver_id),
            ..InvoiceFilter::default()
        };
        let invoices: Vec<_> = self
            .store
            .list_driver_invoices(&filter)
            .await?
            .into_iter()
            .filter(|i| i.invoice_date >= start && i.invoice_date < end)
            .filter(counts_towards_pay)
            .collect();

        let order_pay: Decimal = invoices.iter().map(DriverInvoice::effective_salary).sum();
        let additional_salary: Decimal = invoices.iter().map(|i| i.additional_salary).sum();
        let deductions: Decimal = invoices.iter().map(DriverInvoice::total_deductions).sum();

        Ok(DriverSalarySummary {
            driver_id,
            period: start,
            invoice_count: invoices.len(),
            order_pay,
            additional_salary,
            deductions,
            net_salary: order_pay + additional_salary - deductions,
        })
    }

    // ─── Employee invoices ────────────────────────────────────────────────────

    pub async fn create_employee_invoice(
        &self,
        actor: &Actor,
        request: CreateEmployeeInvoiceRequest,
    ) -> AppResult<EmployeeInvoice> {
        ensure_non_negative(&[
            ("additional_salary", request.additional_salary),
            ("company_deduction_amount", request.company_deduction_amount),
        ])?;

        let route = self.policy.initial_route(actor.role)?.clone();
        let user = self
            .store
            .get_user(request.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {}", request.user_id)))?;
        let serial = self.sequences.next(SequenceScope::EmployeeInvoice).await?;

        let now = Utc::now();
        let invoice = EmployeeInvoice {
            id: Uuid::new_v4(),
            serial,
            user_id: user.id,
            invoice_date: request.invoice_date,
            deduction_date: request.deduction_date,
            additional_salary: request.additional_salary,
            deduction_reason: request.deduction_reason,
            company_deduction_amount: request.company_deduction_amount,
            remarks: request.remarks,
            file: request.file,
            submitted_by: actor.id,
            submitter_role: actor.role,
            status: route.status,
            outcome: route.status.outcome(),
            archived_at: None,
            archived_by: None,
            created_at: now,
            updated_at: now,
        };

        let notification = Notification::new(
            NotificationKind::InvoiceSubmitted,
            Recipients::roles(route.notify),
            Some(actor.id),
            Some(invoice.id),
            format!(
                "Employee invoice #{} for {} submitted by {}",
                invoice.serial, user.name, actor.name
            ),
        );
        self.store
            .insert_employee_invoice(&invoice, &notification)
            .await?;

        info!(invoice = %invoice.id, serial = invoice.serial, user = %user.id, status = %invoice.status, actor = %actor.id, "employee invoice created");
        Ok(invoice)
    }

    pub async fn get_employee_invoice(&self, id: Uuid) -> AppResult<EmployeeInvoice> {
        self.store
            .get_employee_invoice(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Employee invoice {id}")))
    }

    pub async fn list_employee_invoices(
        &self,
        filter: &InvoiceFilter,
    ) -> AppResult<Vec<EmployeeInvoice>> {
        self.store.list_employee_invoices(filter).await
    }

    pub async fn update_employee_invoice_status(
        &self,
        actor: &Actor,
        id: Uuid,
        status: InvoiceStatus,
    ) -> AppResult<EmployeeInvoice> {
        if status.is_driver_only() {
            return Err(AppError::InvalidTransition(format!(
                "{status} does not apply to employee invoices"
            )));
        }
        let mut invoice = self.get_employee_invoice(id).await?;
        let previous = invoice.status;
        let rule = self.policy.transition(actor.role, previous, status)?;

        invoice.apply_status(status, Utc::now());
        let (kind, recipients) =
            recipients_for(rule, actor.role, invoice.submitted_by, invoice.submitter_role);
        let notification = Notification::new(
            kind,
            recipients,
            Some(actor.id),
            Some(invoice.id),
            review_message("Employee invoice", invoice.serial, status, actor),
        );
        self.store
            .update_employee_invoice(&invoice, previous, Some(&notification))
            .await?;

        info!(invoice = %invoice.id, from = %previous, to = %status, actor = %actor.id, "employee invoice reviewed");
        Ok(invoice)
    }

    // ─── Review queue ─────────────────────────────────────────────────────────

    /// Invoices waiting on the actor's role, plus driver invoices shared with everyone.
    pub async fn review_queue(&self, actor: &Actor) -> AppResult<ReviewQueue> {
        let mut driver_invoices = Vec::new();
        let mut employee_invoices = Vec::new();
        if let Some(status) = self.policy.queue_status(actor.role) {
            let filter = InvoiceFilter {
                status: Some(status),
                ..InvoiceFilter::default()
            };
            driver_invoices = self.store.list_driver_invoices(&filter).await?;
            employee_invoices = self.store.list_employee_invoices(&filter).await?;
        }

        let shared = InvoiceFilter {
            status: Some(InvoiceStatus::VisibleToAll),
            ..InvoiceFilter::default()
        };
        driver_invoices.extend(self.store.list_driver_invoices(&shared).await?);

        Ok(ReviewQueue {
            role: actor.role,
            driver_invoices,
            employee_invoices,
        })
    }
}
