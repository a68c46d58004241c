// src/services/salary.rs

use crate::{
    errors::{AppError, AppResult},
    models::{
        Actor, CreateSalaryConfigRequest, Role, SalaryBreakdown, SalaryConfig,
        SalaryPreviewRequest, SalaryRule, UpdateSalaryConfigRequest, VehicleType,
    },
    services::ensure_role,
    store::Store,
};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Which order count is being priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderKind {
    Main,
    Additional,
}

/// Band table of one vehicle type. Built from a validated config, so bands
/// are sorted, contiguous and non-overlapping.
#[derive(Debug, Clone, Copy)]
pub struct SalaryRuleTable<'a> {
    vehicle_type: VehicleType,
    rules: &'a [SalaryRule],
}

impl<'a> SalaryRuleTable<'a> {
    pub fn new(config: &'a SalaryConfig) -> Self {
        Self {
            vehicle_type: config.vehicle_type,
            rules: &config.rules,
        }
    }

    /// Sorts the bands by `min_orders` and checks that they tile the
    /// order-count line without gaps or overlaps.
    pub fn validate(mut rules: Vec<SalaryRule>) -> AppResult<Vec<SalaryRule>> {
        if rules.is_empty() {
            return Err(AppError::Validation(
                "A salary configuration needs at least one band".to_string(),
            ));
        }

        rules.sort_by_key(|r| r.min_orders);

        for (index, rule) in rules.iter().enumerate() {
            if rule.min_orders < 0 {
                return Err(AppError::Validation(format!(
                    "Band {index}: min_orders must not be negative"
                )));
            }
            if rule.max_orders.is_some_and(|max| max < rule.min_orders) {
                return Err(AppError::Validation(format!(
                    "Band {index}: max_orders must be >= min_orders"
                )));
            }
            if rule.multiplier < Decimal::ZERO || rule.fixed_amount < Decimal::ZERO {
                return Err(AppError::Validation(format!(
                    "Band {index}: multiplier and fixed_amount must not be negative"
                )));
            }
        }

        for (index, pair) in rules.windows(2).enumerate() {
            let (current, next) = (&pair[0], &pair[1]);
            let Some(max) = current.max_orders else {
                return Err(AppError::Validation(format!(
                    "Band {index} is unbounded but is not the last band"
                )));
            };
            let Some(expected) = max.checked_add(1) else {
                return Err(AppError::Validation(format!(
                    "Band {index} ends at the largest order count but is not the last band"
                )));
            };
            if expected != next.min_orders {
                return Err(AppError::Validation(format!(
                    "Bands {index} and {} must be contiguous: expected min_orders {expected}, got {}",
                    index + 1,
                    next.min_orders
                )));
            }
        }

        Ok(rules)
    }

    /// `orders * multiplier + fixed_amount` of the band containing `orders`.
    /// A main-only band contributes nothing to additional orders.
    pub fn evaluate(&self, orders: i32, kind: OrderKind) -> AppResult<Decimal> {
        let rule = self
            .rules
            .iter()
            .find(|r| r.contains(orders))
            .ok_or(AppError::BandNotFound {
                vehicle_type: self.vehicle_type,
                orders,
            })?;

        if kind == OrderKind::Additional && rule.apply_to_main_orders_only {
            return Ok(Decimal::ZERO);
        }

        let amount = Decimal::from(orders) * rule.multiplier + rule.fixed_amount;
        debug!(
            vehicle_type = %self.vehicle_type,
            orders,
            ?kind,
            band_min = rule.min_orders,
            %amount,
            "salary band evaluated"
        );
        Ok(amount)
    }

    /// Main and additional order pay of one invoice. Zero additional orders
    /// earn nothing and skip the band lookup.
    pub fn breakdown(&self, main_orders: i32, additional_orders: i32) -> AppResult<SalaryBreakdown> {
        if main_orders < 0 || additional_orders < 0 {
            return Err(AppError::Validation(
                "Order counts must not be negative".to_string(),
            ));
        }
        let main_order_pay = self.evaluate(main_orders, OrderKind::Main)?;
        let additional_order_pay = if additional_orders == 0 {
            Decimal::ZERO
        } else {
            self.evaluate(additional_orders, OrderKind::Additional)?
        };
        Ok(SalaryBreakdown {
            main_order_pay,
            additional_order_pay,
            total: main_order_pay + additional_order_pay,
        })
    }
}

pub struct SalaryService {
    store: Arc<dyn Store>,
}

impl SalaryService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(
        &self,
        actor: &Actor,
        request: CreateSalaryConfigRequest,
    ) -> AppResult<SalaryConfig> {
        ensure_role(actor, &[Role::Admin], "create salary configurations")?;
        let rules = SalaryRuleTable::validate(request.rules)?;

        let now = Utc::now();
        let config = SalaryConfig {
            id: Uuid::new_v4(),
            vehicle_type: request.vehicle_type,
            rules,
            last_updated_by: actor.id,
            last_updated_at: now,
            created_at: now,
        };
        self.store.insert_salary_config(&config).await?;

        info!(vehicle_type = %config.vehicle_type, bands = config.rules.len(), actor = %actor.id, "salary configuration created");
        Ok(config)
    }

    pub async fn get(&self, vehicle_type: VehicleType) -> AppResult<SalaryConfig> {
        self.store
            .get_salary_config(vehicle_type)
            .await?
            .ok_or(AppError::ConfigurationMissing(vehicle_type))
    }

    pub async fn list(&self) -> AppResult<Vec<SalaryConfig>> {
        self.store.list_salary_configs().await
    }

    /// Full replace of the band list.
    pub async fn update(
        &self,
        actor: &Actor,
        vehicle_type: VehicleType,
        request: UpdateSalaryConfigRequest,
    ) -> AppResult<SalaryConfig> {
        ensure_role(actor, &[Role::Admin], "update salary configurations")?;
        let rules = SalaryRuleTable::validate(request.rules)?;

        let mut config = self.get(vehicle_type).await?;
        config.rules = rules;
        config.last_updated_by = actor.id;
        config.last_updated_at = Utc::now();
        self.store.replace_salary_config(&config).await?;

        info!(vehicle_type = %vehicle_type, bands = config.rules.len(), actor = %actor.id, "salary configuration updated");
        Ok(config)
    }

    pub async fn delete(&self, actor: &Actor, vehicle_type: VehicleType) -> AppResult<()> {
        ensure_role(actor, &[Role::Admin], "delete salary configurations")?;
        if !self.store.delete_salary_config(vehicle_type).await? {
            return Err(AppError::ConfigurationMissing(vehicle_type));
        }
        info!(vehicle_type = %vehicle_type, actor = %actor.id, "salary configuration deleted");
        Ok(())
    }

    pub async fn breakdown(
        &self,
        vehicle_type: VehicleType,
        main_orders: i32,
        additional_orders: i32,
    ) -> AppResult<SalaryBreakdown> {
        let config = self.get(vehicle_type).await?;
        SalaryRuleTable::new(&config).breakdown(main_orders, additional_orders)
    }

    pub async fn preview(
        &self,
        vehicle_type: VehicleType,
        request: &SalaryPreviewRequest,
    ) -> AppResult<SalaryBreakdown> {
        self.breakdown(vehicle_type, request.main_orders, request.additional_orders)
            .await
    }
}
