use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

// ─── Vehicle Type ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, ToSchema, PartialEq, Eq, Hash)]
#[sqlx(type_name = "vehicle_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    Car,
    Bike,
}

impl VehicleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleType::Car => "car",
            VehicleType::Bike => "bike",
        }
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Salary Rules ─────────────────────────────────────────────────────────────

/// One order-count band. A driver whose count falls in
/// `min_orders..=max_orders` earns `count * multiplier + fixed_amount`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct SalaryRule {
    pub min_orders: i32,
    /// `null` means the band has no upper bound. Only the last band may be open.
    pub max_orders: Option<i32>,
    #[serde(default)]
    pub multiplier: Decimal,
    #[serde(default)]
    pub fixed_amount: Decimal,
    /// When set, the band is ignored while evaluating additional orders.
    #[serde(default)]
    pub apply_to_main_orders_only: bool,
}

impl SalaryRule {
    pub fn contains(&self, orders: i32) -> bool {
        orders >= self.min_orders && self.max_orders.is_none_or(|max| orders <= max)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct SalaryConfig {
    pub id: Uuid,
    pub vehicle_type: VehicleType,
    /// Sorted by `min_orders`, contiguous and non-overlapping.
    pub rules: Vec<SalaryRule>,
    pub last_updated_by: Uuid,
    pub last_updated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSalaryConfigRequest {
    pub vehicle_type: VehicleType,
    pub rules: Vec<SalaryRule>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateSalaryConfigRequest {
    pub rules: Vec<SalaryRule>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SalaryPreviewRequest {
    pub main_orders: i32,
    #[serde(default)]
    pub additional_orders: i32,
}

/// Order pay derived from the band table for one invoice.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq)]
pub struct SalaryBreakdown {
    pub main_order_pay: Decimal,
    pub additional_order_pay: Decimal,
    pub total: Decimal,
}
