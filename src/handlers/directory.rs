// src/handlers/directory.rs

use crate::{
    errors::AppResult,
    models::{Actor, CreateDriverRequest, CreateUserRequest, Driver, User},
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

/// Register a staff user
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 403, description = "Only an Admin may create users"),
        (status = 409, description = "Email already registered"),
    ),
    security(("bearer_auth" = [])),
    tag = "Directory"
)]
pub async fn create_user(
    actor: Actor,
    State(state): State<AppState>,
    Json(body): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    let user = state.directory().create_user(&actor, body).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    responses((status = 200, description = "Users by sequence", body = Vec<User>)),
    security(("bearer_auth" = [])),
    tag = "Directory"
)]
pub async fn list_users(_actor: Actor, State(state): State<AppState>) -> AppResult<Json<Vec<User>>> {
    Ok(Json(state.directory().list_users().await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}",
    params(("user_id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = User),
        (status = 404, description = "User not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Directory"
)]
pub async fn get_user(
    _actor: Actor,
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<User>> {
    Ok(Json(state.directory().get_user(user_id).await?))
}

/// Register a driver
#[utoipa::path(
    post,
    path = "/api/v1/drivers",
    request_body = CreateDriverRequest,
    responses(
        (status = 201, description = "Driver created", body = Driver),
        (status = 400, description = "Missing name or phone"),
    ),
    security(("bearer_auth" = [])),
    tag = "Directory"
)]
pub async fn create_driver(
    actor: Actor,
    State(state): State<AppState>,
    Json(body): Json<CreateDriverRequest>,
) -> AppResult<(StatusCode, Json<Driver>)> {
    let driver = state.directory().create_driver(&actor, body).await?;
    Ok((StatusCode::CREATED, Json(driver)))
}

#[utoipa::path(
    get,
    path = "/api/v1/drivers",
    responses((status = 200, description = "Drivers by sequence", body = Vec<Driver>)),
    security(("bearer_auth" = [])),
    tag = "Directory"
)]
pub async fn list_drivers(
    _actor: Actor,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Driver>>> {
    Ok(Json(state.directory().list_drivers().await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/drivers/{driver_id}",
    params(("driver_id" = Uuid, Path, description = "Driver ID")),
    responses(
        (status = 200, description = "Driver", body = Driver),
        (status = 404, description = "Driver not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Directory"
)]
pub async fn get_driver(
    _actor: Actor,
    State(state): State<AppState>,
    Path(driver_id): Path<Uuid>,
) -> AppResult<Json<Driver>> {
    Ok(Json(state.directory().get_driver(driver_id).await?))
}
