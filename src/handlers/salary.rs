// src/handlers/salary.rs

use crate::{
    errors::AppResult,
    models::{
        Actor, CreateSalaryConfigRequest, SalaryBreakdown, SalaryConfig, SalaryPreviewRequest,
        UpdateSalaryConfigRequest, VehicleType,
    },
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

/// Create the salary band table of a vehicle type
#[utoipa::path(
    post,
    path = "/api/v1/salary-configs",
    request_body = CreateSalaryConfigRequest,
    responses(
        (status = 201, description = "Configuration created", body = SalaryConfig),
        (status = 400, description = "Bands overlap, leave gaps or are malformed"),
        (status = 403, description = "Only an Admin may create configurations"),
        (status = 409, description = "The vehicle type already has a configuration"),
    ),
    security(("bearer_auth" = [])),
    tag = "Salary"
)]
pub async fn create_salary_config(
    actor: Actor,
    State(state): State<AppState>,
    Json(body): Json<CreateSalaryConfigRequest>,
) -> AppResult<(StatusCode, Json<SalaryConfig>)> {
    let config = state.salaries().create(&actor, body).await?;
    Ok((StatusCode::CREATED, Json(config)))
}

/// List every salary configuration
#[utoipa::path(
    get,
    path = "/api/v1/salary-configs",
    responses(
        (status = 200, description = "All configurations", body = Vec<SalaryConfig>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Salary"
)]
pub async fn list_salary_configs(
    _actor: Actor,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<SalaryConfig>>> {
    Ok(Json(state.salaries().list().await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/salary-configs/{vehicle_type}",
    params(("vehicle_type" = VehicleType, Path, description = "car or bike")),
    responses(
        (status = 200, description = "Configuration", body = SalaryConfig),
        (status = 422, description = "No configuration for this vehicle type"),
    ),
    security(("bearer_auth" = [])),
    tag = "Salary"
)]
pub async fn get_salary_config(
    _actor: Actor,
    State(state): State<AppState>,
    Path(vehicle_type): Path<VehicleType>,
) -> AppResult<Json<SalaryConfig>> {
    Ok(Json(state.salaries().get(vehicle_type).await?))
}

/// Replace the band list of a vehicle type
#[utoipa::path(
    put,
    path = "/api/v1/salary-configs/{vehicle_type}",
    request_body = UpdateSalaryConfigRequest,
    params(("vehicle_type" = VehicleType, Path, description = "car or bike")),
    responses(
        (status = 200, description = "Configuration replaced", body = SalaryConfig),
        (status = 400, description = "Bands overlap, leave gaps or are malformed"),
        (status = 403, description = "Only an Admin may update configurations"),
        (status = 422, description = "No configuration for this vehicle type"),
    ),
    security(("bearer_auth" = [])),
    tag = "Salary"
)]
pub async fn update_salary_config(
    actor: Actor,
    State(state): State<AppState>,
    Path(vehicle_type): Path<VehicleType>,
    Json(body): Json<UpdateSalaryConfigRequest>,
) -> AppResult<Json<SalaryConfig>> {
    Ok(Json(
        state.salaries().update(&actor, vehicle_type, body).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/salary-configs/{vehicle_type}",
    params(("vehicle_type" = VehicleType, Path, description = "car or bike")),
    responses(
        (status = 204, description = "Configuration deleted"),
        (status = 403, description = "Only an Admin may delete configurations"),
        (status = 422, description = "No configuration for this vehicle type"),
    ),
    security(("bearer_auth" = [])),
    tag = "Salary"
)]
pub async fn delete_salary_config(
    actor: Actor,
    State(state): State<AppState>,
    Path(vehicle_type): Path<VehicleType>,
) -> AppResult<StatusCode> {
    state.salaries().delete(&actor, vehicle_type).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Price a hypothetical invoice against the current bands
#[utoipa::path(
    post,
    path = "/api/v1/salary-configs/{vehicle_type}/preview",
    request_body = SalaryPreviewRequest,
    params(("vehicle_type" = VehicleType, Path, description = "car or bike")),
    responses(
        (status = 200, description = "Order pay breakdown", body = SalaryBreakdown),
        (status = 422, description = "No configuration, or no band covers the count"),
    ),
    security(("bearer_auth" = [])),
    tag = "Salary"
)]
pub async fn preview_salary(
    _actor: Actor,
    State(state): State<AppState>,
    Path(vehicle_type): Path<VehicleType>,
    Json(body): Json<SalaryPreviewRequest>,
) -> AppResult<Json<SalaryBreakdown>> {
    Ok(Json(state.salaries().preview(vehicle_type, &body).await?))
}
