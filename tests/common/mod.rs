#![allow(dead_code)]

use chrono::NaiveDate;
use fleetdesk::{
    config::Config,
    models::{
        Actor, CreateDriverInvoiceRequest, CreateDriverRequest, CreateSalaryConfigRequest,
        CreateUserRequest, Driver, Role, SalaryConfig, SalaryRule, User, VehicleType,
    },
    state::AppState,
    store::MemoryStore,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use uuid::Uuid;

pub const JWT_SECRET: &str = "test-secret";

pub fn state() -> AppState {
    AppState::new(Arc::new(MemoryStore::new()), Config::for_tests(JWT_SECRET))
}

pub fn actor(role: Role) -> Actor {
    let name = match role {
        Role::Admin => "Ada Admin",
        Role::Manager => "Max Manager",
        Role::Accountant => "Alex Accountant",
        Role::Employee => "Eli Employee",
    };
    Actor::new(Uuid::new_v4(), name, role)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn band(min: i32, max: Option<i32>, multiplier: Decimal) -> SalaryRule {
    SalaryRule {
        min_orders: min,
        max_orders: max,
        multiplier,
        fixed_amount: Decimal::ZERO,
        apply_to_main_orders_only: false,
    }
}

/// 0-449 @ 0.40, 450-499 @ 0.45, 500+ @ 0.50
pub fn car_bands() -> Vec<SalaryRule> {
    vec![
        band(0, Some(449), dec!(0.40)),
        band(450, Some(499), dec!(0.45)),
        band(500, None, dec!(0.50)),
    ]
}

pub async fn seed_car_config(state: &AppState) -> SalaryConfig {
    state
        .salaries()
        .create(
            &actor(Role::Admin),
            CreateSalaryConfigRequest {
                vehicle_type: VehicleType::Car,
                rules: car_bands(),
            },
        )
        .await
        .unwrap()
}

pub async fn seed_driver(state: &AppState, name: &str) -> Driver {
    state
        .directory()
        .create_driver(
            &actor(Role::Manager),
            CreateDriverRequest {
                name: name.to_string(),
                phone: "+965 5555 0000".to_string(),
                vehicle_type: VehicleType::Car,
                license_expiry: None,
            },
        )
        .await
        .unwrap()
}

pub async fn seed_user(state: &AppState, name: &str, role: Role) -> User {
    state
        .directory()
        .create_user(
            &actor(Role::Admin),
            CreateUserRequest {
                name: name.to_string(),
                email: format!("{}@fleet.test", name.to_lowercase().replace(' ', ".")),
                role,
            },
        )
        .await
        .unwrap()
}

pub fn invoice_request(driver_id: Uuid, main_order: i32, invoice_date: NaiveDate) -> CreateDriverInvoiceRequest {
    CreateDriverInvoiceRequest {
        driver_id,
        invoice_date,
        deduction_date: None,
        main_order,
        additional_order: 0,
        hour: dec!(160),
        cash: Decimal::ZERO,
        additional_salary: Decimal::ZERO,
        deduction_reason: None,
        talabat_deduction_amount: Decimal::ZERO,
        company_deduction_amount: Decimal::ZERO,
        petty_cash_deduction_amount: Decimal::ZERO,
        remarks: None,
        file: None,
    }
}
