// src/handlers/ledger.rs

use crate::{
    errors::AppResult,
    models::{
        Actor, BankAccount, BankStatement, CreateBankAccountRequest, CreateBankStatementRequest,
        CreatePettyCashRequest, PettyCash, PettyCashQuery, StatementQuery,
        UpdatePettyCashStatusRequest,
    },
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

#[utoipa::path(
    post,
    path = "/api/v1/bank-accounts",
    request_body = CreateBankAccountRequest,
    responses(
        (status = 201, description = "Account created", body = BankAccount),
        (status = 409, description = "Number or name already in use"),
    ),
    security(("bearer_auth" = [])),
    tag = "Ledger"
)]
pub async fn create_bank_account(
    actor: Actor,
    State(state): State<AppState>,
    Json(body): Json<CreateBankAccountRequest>,
) -> AppResult<(StatusCode, Json<BankAccount>)> {
    let account = state.ledger().create_bank_account(&actor, body).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

#[utoipa::path(
    get,
    path = "/api/v1/bank-accounts",
    responses((status = 200, description = "Accounts by number", body = Vec<BankAccount>)),
    security(("bearer_auth" = [])),
    tag = "Ledger"
)]
pub async fn list_bank_accounts(
    _actor: Actor,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<BankAccount>>> {
    Ok(Json(state.ledger().list_bank_accounts().await?))
}

/// Append a statement row; the balance is carried from the previous row
#[utoipa::path(
    post,
    path = "/api/v1/bank-statements",
    request_body = CreateBankStatementRequest,
    responses(
        (status = 201, description = "Statement appended", body = BankStatement),
        (status = 400, description = "Negative amounts or missing starting balance"),
        (status = 404, description = "Bank account not found"),
        (status = 409, description = "Concurrent append, retries exhausted"),
    ),
    security(("bearer_auth" = [])),
    tag = "Ledger"
)]
pub async fn create_bank_statement(
    actor: Actor,
    State(state): State<AppState>,
    Json(body): Json<CreateBankStatementRequest>,
) -> AppResult<(StatusCode, Json<BankStatement>)> {
    let statement = state.ledger().append_bank_statement(&actor, body).await?;
    Ok((StatusCode::CREATED, Json(statement)))
}

#[utoipa::path(
    get,
    path = "/api/v1/bank-statements",
    params(StatementQuery),
    responses((status = 200, description = "Statements by account and sequence", body = Vec<BankStatement>)),
    security(("bearer_auth" = [])),
    tag = "Ledger"
)]
pub async fn search_bank_statements(
    _actor: Actor,
    State(state): State<AppState>,
    Query(query): Query<StatementQuery>,
) -> AppResult<Json<Vec<BankStatement>>> {
    Ok(Json(state.ledger().search_bank_statements(&query).await?))
}

/// Record a petty-cash spend
#[utoipa::path(
    post,
    path = "/api/v1/petty-cash",
    request_body = CreatePettyCashRequest,
    responses(
        (status = 201, description = "Spend recorded as pending", body = PettyCash),
        (status = 400, description = "Both a user and a driver were charged, or fields are missing"),
        (status = 404, description = "Charged user or driver not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Petty Cash"
)]
pub async fn create_petty_cash(
    actor: Actor,
    State(state): State<AppState>,
    Json(body): Json<CreatePettyCashRequest>,
) -> AppResult<(StatusCode, Json<PettyCash>)> {
    let record = state.ledger().create_petty_cash(&actor, body).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

#[utoipa::path(
    get,
    path = "/api/v1/petty-cash",
    params(PettyCashQuery),
    responses((status = 200, description = "Newest first", body = Vec<PettyCash>)),
    security(("bearer_auth" = [])),
    tag = "Petty Cash"
)]
pub async fn list_petty_cash(
    _actor: Actor,
    State(state): State<AppState>,
    Query(query): Query<PettyCashQuery>,
) -> AppResult<Json<Vec<PettyCash>>> {
    Ok(Json(state.ledger().list_petty_cash(query.status).await?))
}

#[utoipa::path(
    patch,
    path = "/api/v1/petty-cash/{petty_cash_id}/status",
    request_body = UpdatePettyCashStatusRequest,
    params(("petty_cash_id" = Uuid, Path, description = "Petty cash ID")),
    responses(
        (status = 200, description = "Reviewed", body = PettyCash),
        (status = 403, description = "Only an Admin or Accountant may review"),
        (status = 422, description = "The record is no longer pending"),
    ),
    security(("bearer_auth" = [])),
    tag = "Petty Cash"
)]
pub async fn update_petty_cash_status(
    actor: Actor,
    State(state): State<AppState>,
    Path(petty_cash_id): Path<Uuid>,
    Json(body): Json<UpdatePettyCashStatusRequest>,
) -> AppResult<Json<PettyCash>> {
    Ok(Json(
        state
            .ledger()
            .set_petty_cash_status(&actor, petty_cash_id, body.status)
            .await?,
    ))
}
