// src/routes/mod.rs

use crate::{
    handlers::{
        archive::run_archive,
        directory::{create_driver, create_user, get_driver, get_user, list_drivers, list_users},
        general::{health_handler, root_handler},
        invoice::{
            create_driver_invoice, create_employee_invoice, driver_salary_summary,
            get_driver_invoice, get_employee_invoice, list_driver_invoices,
            list_employee_invoices, override_driver_salary, reset_all_driver_invoices,
            reset_driver_invoices, review_queue, update_driver_invoice_status,
            update_employee_invoice_status,
        },
        ledger::{
            create_bank_account, create_bank_statement, create_petty_cash, list_bank_accounts,
            list_petty_cash, search_bank_statements, update_petty_cash_status,
        },
        notification::{mark_all_read, send_message, unread_notifications},
        salary::{
            create_salary_config, delete_salary_config, get_salary_config, list_salary_configs,
            preview_salary, update_salary_config,
        },
    },
    openapi::ApiDoc,
    state::AppState,
};
use axum::{
    Router,
    routing::{get, patch, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        // ─── Salary bands ─────────────────────────────────────
        .route(
            "/salary-configs",
            post(create_salary_config).get(list_salary_configs),
        )
        .route(
            "/salary-configs/{vehicle_type}",
            get(get_salary_config)
                .put(update_salary_config)
                .delete(delete_salary_config),
        )
        .route("/salary-configs/{vehicle_type}/preview", post(preview_salary))
        // ─── Directory ────────────────────────────────────────
        .route("/users", post(create_user).get(list_users))
        .route("/users/{user_id}", get(get_user))
        .route("/drivers", post(create_driver).get(list_drivers))
        .route("/drivers/{driver_id}", get(get_driver))
        .route("/drivers/{driver_id}/salary", get(driver_salary_summary))
        .route(
            "/drivers/{driver_id}/invoices/reset",
            post(reset_driver_invoices),
        )
        // ─── Driver invoices ──────────────────────────────────
        .route(
            "/driver-invoices",
            post(create_driver_invoice).get(list_driver_invoices),
        )
        .route("/driver-invoices/reset", post(reset_all_driver_invoices))
        .route("/driver-invoices/{invoice_id}", get(get_driver_invoice))
        .route(
            "/driver-invoices/{invoice_id}/status",
            patch(update_driver_invoice_status),
        )
        .route(
            "/driver-invoices/{invoice_id}/override",
            post(override_driver_salary),
        )
        // ─── Employee invoices ────────────────────────────────
        .route(
            "/employee-invoices",
            post(create_employee_invoice).get(list_employee_invoices),
        )
        .route("/employee-invoices/{invoice_id}", get(get_employee_invoice))
        .route(
            "/employee-invoices/{invoice_id}/status",
            patch(update_employee_invoice_status),
        )
        .route("/review-queue", get(review_queue))
        // ─── Ledgers ──────────────────────────────────────────
        .route(
            "/bank-accounts",
            post(create_bank_account).get(list_bank_accounts),
        )
        .route(
            "/bank-statements",
            post(create_bank_statement).get(search_bank_statements),
        )
        .route("/petty-cash", post(create_petty_cash).get(list_petty_cash))
        .route(
            "/petty-cash/{petty_cash_id}/status",
            patch(update_petty_cash_status),
        )
        // ─── Archive ──────────────────────────────────────────
        .route("/archive/run", post(run_archive))
        // ─── Notifications ────────────────────────────────────
        .route("/notifications/unread", get(unread_notifications))
        .route("/notifications/read-all", post(mark_all_read))
        .route("/notifications/messages", post(send_message))
}

/// The whole application: landing page, health check, API and docs.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .nest("/api/v1", api_routes())
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
