use super::{Role, VehicleType};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// ─── Users ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub sequence: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub role: Role,
}

// ─── Drivers ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Driver {
    pub id: Uuid,
    pub sequence: i64,
    pub name: String,
    pub phone: String,
    pub vehicle_type: VehicleType,
    pub license_expiry: Option<NaiveDate>,
    /// Expiry date the last licence warning was raised for.
    pub expiry_notified_for: Option<NaiveDate>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDriverRequest {
    pub name: String,
    pub phone: String,
    pub vehicle_type: VehicleType,
    pub license_expiry: Option<NaiveDate>,
}
