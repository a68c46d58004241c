// src/openapi.rs

use crate::models::{
    ArchiveResponse, ArchiveRun, BankAccount, BankStatement, CreateBankAccountRequest,
    CreateBankStatementRequest, CreateDriverInvoiceRequest, CreateDriverRequest,
    CreateEmployeeInvoiceRequest, CreatePettyCashRequest, CreateSalaryConfigRequest,
    CreateUserRequest, Driver, DriverInvoice, DriverSalarySummary, EmployeeInvoice,
    InvoiceStatus, MarkReadResponse, Notification, NotificationKind, OverrideSalaryRequest,
    PettyCash, PettyCashStatus, ResetResponse, ReviewOutcome, ReviewQueue, Role,
    SalaryBreakdown, SalaryConfig, SalaryPreviewRequest, SalaryRule, SendMessageRequest,
    UpdateInvoiceStatusRequest, UpdatePettyCashStatusRequest, UpdateSalaryConfigRequest, User,
    VehicleType,
};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Fleetdesk API",
        version = "1.0.0",
        description = "Back office of a delivery fleet: tiered salary bands per vehicle type, \
            driver and employee invoice review, bank statement and petty cash ledgers, \
            monthly archival and role-addressed notifications.",
        license(name = "MIT")
    ),
    paths(
        // Salary
        crate::handlers::salary::create_salary_config,
        crate::handlers::salary::list_salary_configs,
        crate::handlers::salary::get_salary_config,
        crate::handlers::salary::update_salary_config,
        crate::handlers::salary::delete_salary_config,
        crate::handlers::salary::preview_salary,
        // Directory
        crate::handlers::directory::create_user,
        crate::handlers::directory::list_users,
        crate::handlers::directory::get_user,
        crate::handlers::directory::create_driver,
        crate::handlers::directory::list_drivers,
        crate::handlers::directory::get_driver,
        // Driver invoices
        crate::handlers::invoice::create_driver_invoice,
        crate::handlers::invoice::list_driver_invoices,
        crate::handlers::invoice::get_driver_invoice,
        crate::handlers::invoice::update_driver_invoice_status,
        crate::handlers::invoice::override_driver_salary,
        crate::handlers::invoice::reset_all_driver_invoices,
        crate::handlers::invoice::reset_driver_invoices,
        crate::handlers::invoice::driver_salary_summary,
        // Employee invoices
        crate::handlers::invoice::create_employee_invoice,
        crate::handlers::invoice::list_employee_invoices,
        crate::handlers::invoice::get_employee_invoice,
        crate::handlers::invoice::update_employee_invoice_status,
        crate::handlers::invoice::review_queue,
        // Ledger
        crate::handlers::ledger::create_bank_account,
        crate::handlers::ledger::list_bank_accounts,
        crate::handlers::ledger::create_bank_statement,
        crate::handlers::ledger::search_bank_statements,
        crate::handlers::ledger::create_petty_cash,
        crate::handlers::ledger::list_petty_cash,
        crate::handlers::ledger::update_petty_cash_status,
        // Archive
        crate::handlers::archive::run_archive,
        // Notifications
        crate::handlers::notification::unread_notifications,
        crate::handlers::notification::mark_all_read,
        crate::handlers::notification::send_message,
    ),
    components(
        schemas(
            Role, VehicleType, SalaryRule, SalaryConfig, CreateSalaryConfigRequest,
            UpdateSalaryConfigRequest, SalaryPreviewRequest, SalaryBreakdown,
            User, CreateUserRequest, Driver, CreateDriverRequest,
            InvoiceStatus, ReviewOutcome, DriverInvoice, CreateDriverInvoiceRequest,
            EmployeeInvoice, CreateEmployeeInvoiceRequest, UpdateInvoiceStatusRequest,
            OverrideSalaryRequest, ResetResponse, ReviewQueue, DriverSalarySummary,
            ArchiveRun, ArchiveResponse,
            BankAccount, CreateBankAccountRequest, BankStatement, CreateBankStatementRequest,
            PettyCash, PettyCashStatus, CreatePettyCashRequest, UpdatePettyCashStatusRequest,
            Notification, NotificationKind, SendMessageRequest, MarkReadResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Salary", description = "Order-count salary bands per vehicle type"),
        (name = "Directory", description = "Staff users and drivers"),
        (name = "Driver Invoices", description = "Driver work periods, review, override and reset"),
        (name = "Employee Invoices", description = "Staff bonuses and deductions under review"),
        (name = "Review", description = "What each role has to act on"),
        (name = "Ledger", description = "Bank accounts and running-balance statements"),
        (name = "Petty Cash", description = "Petty-cash spends and their review"),
        (name = "Archive", description = "Monthly archival"),
        (name = "Notifications", description = "Unread notifications and messages"),
    )
)]
pub struct ApiDoc;
