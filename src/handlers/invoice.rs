// src/handlers/invoice.rs

use crate::{
    errors::AppResult,
    models::{
        Actor, CreateDriverInvoiceRequest, CreateEmployeeInvoiceRequest, DriverInvoice,
        DriverSalarySummary, EmployeeInvoice, InvoiceFilter, OverrideSalaryRequest, PeriodQuery,
        ResetResponse, ReviewQueue, UpdateInvoiceStatusRequest,
    },
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

// ─── Driver invoices ──────────────────────────────────────────────────────────

/// Record a driver's work period; order pay is computed from the salary bands
#[utoipa::path(
    post,
    path = "/api/v1/driver-invoices",
    request_body = CreateDriverInvoiceRequest,
    responses(
        (status = 201, description = "Invoice created in its initial review state", body = DriverInvoice),
        (status = 400, description = "Negative counts or amounts"),
        (status = 404, description = "Driver not found"),
        (status = 422, description = "No salary configuration or band for the driver"),
    ),
    security(("bearer_auth" = [])),
    tag = "Driver Invoices"
)]
pub async fn create_driver_invoice(
    actor: Actor,
    State(state): State<AppState>,
    Json(body): Json<CreateDriverInvoiceRequest>,
) -> AppResult<(StatusCode, Json<DriverInvoice>)> {
    let invoice = state.invoices().create_driver_invoice(&actor, body).await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

#[utoipa::path(
    get,
    path = "/api/v1/driver-invoices",
    params(InvoiceFilter),
    responses((status = 200, description = "Newest first", body = Vec<DriverInvoice>)),
    security(("bearer_auth" = [])),
    tag = "Driver Invoices"
)]
pub async fn list_driver_invoices(
    _actor: Actor,
    State(state): State<AppState>,
    Query(filter): Query<InvoiceFilter>,
) -> AppResult<Json<Vec<DriverInvoice>>> {
    Ok(Json(state.invoices().list_driver_invoices(&filter).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/driver-invoices/{invoice_id}",
    params(("invoice_id" = Uuid, Path, description = "Invoice ID")),
    responses(
        (status = 200, description = "Invoice", body = DriverInvoice),
        (status = 404, description = "Invoice not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Driver Invoices"
)]
pub async fn get_driver_invoice(
    _actor: Actor,
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> AppResult<Json<DriverInvoice>> {
    Ok(Json(state.invoices().get_driver_invoice(invoice_id).await?))
}

/// Forward, approve or reject a driver invoice
#[utoipa::path(
    patch,
    path = "/api/v1/driver-invoices/{invoice_id}/status",
    request_body = UpdateInvoiceStatusRequest,
    params(("invoice_id" = Uuid, Path, description = "Invoice ID")),
    responses(
        (status = 200, description = "Status changed", body = DriverInvoice),
        (status = 403, description = "The actor's role may not take this step"),
        (status = 409, description = "The invoice changed concurrently"),
        (status = 422, description = "No such transition"),
    ),
    security(("bearer_auth" = [])),
    tag = "Driver Invoices"
)]
pub async fn update_driver_invoice_status(
    actor: Actor,
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
    Json(body): Json<UpdateInvoiceStatusRequest>,
) -> AppResult<Json<DriverInvoice>> {
    Ok(Json(
        state
            .invoices()
            .update_driver_invoice_status(&actor, invoice_id, body.status)
            .await?,
    ))
}

/// Replace the computed order pay of an approved invoice
#[utoipa::path(
    post,
    path = "/api/v1/driver-invoices/{invoice_id}/override",
    request_body = OverrideSalaryRequest,
    params(("invoice_id" = Uuid, Path, description = "Invoice ID")),
    responses(
        (status = 200, description = "Salary overridden", body = DriverInvoice),
        (status = 403, description = "Only an Accountant or Admin may override"),
        (status = 422, description = "Invoice is not approved"),
    ),
    security(("bearer_auth" = [])),
    tag = "Driver Invoices"
)]
pub async fn override_driver_salary(
    actor: Actor,
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
    Json(body): Json<OverrideSalaryRequest>,
) -> AppResult<Json<DriverInvoice>> {
    Ok(Json(
        state
            .invoices()
            .override_driver_salary(&actor, invoice_id, body)
            .await?,
    ))
}

/// Archive the open invoices of every driver
#[utoipa::path(
    post,
    path = "/api/v1/driver-invoices/reset",
    responses(
        (status = 200, description = "Invoices archived", body = ResetResponse),
        (status = 403, description = "The actor's role may not reset invoices"),
    ),
    security(("bearer_auth" = [])),
    tag = "Driver Invoices"
)]
pub async fn reset_all_driver_invoices(
    actor: Actor,
    State(state): State<AppState>,
) -> AppResult<Json<ResetResponse>> {
    Ok(Json(
        state.invoices().reset_driver_invoices(&actor, None).await?,
    ))
}

/// Archive the open invoices of one driver
#[utoipa::path(
    post,
    path = "/api/v1/drivers/{driver_id}/invoices/reset",
    params(("driver_id" = Uuid, Path, description = "Driver ID")),
    responses(
        (status = 200, description = "Invoices archived", body = ResetResponse),
        (status = 403, description = "The actor's role may not reset invoices"),
        (status = 404, description = "Driver not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Driver Invoices"
)]
pub async fn reset_driver_invoices(
    actor: Actor,
    State(state): State<AppState>,
    Path(driver_id): Path<Uuid>,
) -> AppResult<Json<ResetResponse>> {
    Ok(Json(
        state
            .invoices()
            .reset_driver_invoices(&actor, Some(driver_id))
            .await?,
    ))
}

/// Monthly pay of a driver from approved work
#[utoipa::path(
    get,
    path = "/api/v1/drivers/{driver_id}/salary",
    params(("driver_id" = Uuid, Path, description = "Driver ID"), PeriodQuery),
    responses(
        (status = 200, description = "Pay summary", body = DriverSalarySummary),
        (status = 400, description = "Malformed period"),
        (status = 404, description = "Driver not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Driver Invoices"
)]
pub async fn driver_salary_summary(
    _actor: Actor,
    State(state): State<AppState>,
    Path(driver_id): Path<Uuid>,
    Query(query): Query<PeriodQuery>,
) -> AppResult<Json<DriverSalarySummary>> {
    Ok(Json(
        state
            .invoices()
            .driver_salary_summary(driver_id, &query.period)
            .await?,
    ))
}

// ─── Employee invoices ────────────────────────────────────────────────────────

#[utoipa::path(
    post,
    path = "/api/v1/employee-invoices",
    request_body = CreateEmployeeInvoiceRequest,
    responses(
        (status = 201, description = "Invoice created in its initial review state", body = EmployeeInvoice),
        (status = 404, description = "User not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Employee Invoices"
)]
pub async fn create_employee_invoice(
    actor: Actor,
    State(state): State<AppState>,
    Json(body): Json<CreateEmployeeInvoiceRequest>,
) -> AppResult<(StatusCode, Json<EmployeeInvoice>)> {
    let invoice = state
        .invoices()
        .create_employee_invoice(&actor, body)
        .await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

#[utoipa::path(
    get,
    path = "/api/v1/employee-invoices",
    params(InvoiceFilter),
    responses((status = 200, description = "Newest first", body = Vec<EmployeeInvoice>)),
    security(("bearer_auth" = [])),
    tag = "Employee Invoices"
)]
pub async fn list_employee_invoices(
    _actor: Actor,
    State(state): State<AppState>,
    Query(filter): Query<InvoiceFilter>,
) -> AppResult<Json<Vec<EmployeeInvoice>>> {
    Ok(Json(state.invoices().list_employee_invoices(&filter).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/employee-invoices/{invoice_id}",
    params(("invoice_id" = Uuid, Path, description = "Invoice ID")),
    responses(
        (status = 200, description = "Invoice", body = EmployeeInvoice),
        (status = 404, description = "Invoice not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Employee Invoices"
)]
pub async fn get_employee_invoice(
    _actor: Actor,
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> AppResult<Json<EmployeeInvoice>> {
    Ok(Json(state.invoices().get_employee_invoice(invoice_id).await?))
}

#[utoipa::path(
    patch,
    path = "/api/v1/employee-invoices/{invoice_id}/status",
    request_body = UpdateInvoiceStatusRequest,
    params(("invoice_id" = Uuid, Path, description = "Invoice ID")),
    responses(
        (status = 200, description = "Status changed", body = EmployeeInvoice),
        (status = 403, description = "The actor's role may not take this step"),
        (status = 409, description = "The invoice changed concurrently"),
        (status = 422, description = "No such transition"),
    ),
    security(("bearer_auth" = [])),
    tag = "Employee Invoices"
)]
pub async fn update_employee_invoice_status(
    actor: Actor,
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
    Json(body): Json<UpdateInvoiceStatusRequest>,
) -> AppResult<Json<EmployeeInvoice>> {
    Ok(Json(
        state
            .invoices()
            .update_employee_invoice_status(&actor, invoice_id, body.status)
            .await?,
    ))
}

/// Invoices waiting on the caller's role
#[utoipa::path(
    get,
    path = "/api/v1/review-queue",
    responses((status = 200, description = "Review queue", body = ReviewQueue)),
    security(("bearer_auth" = [])),
    tag = "Review"
)]
pub async fn review_queue(
    actor: Actor,
    State(state): State<AppState>,
) -> AppResult<Json<ReviewQueue>> {
    Ok(Json(state.invoices().review_queue(&actor).await?))
}
