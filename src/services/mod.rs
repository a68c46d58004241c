// src/services/mod.rs

pub mod archive;
pub mod directory;
pub mod invoice;
pub mod ledger;
pub mod lifecycle;
pub mod notification;
pub mod salary;
pub mod scheduler;
pub mod sequence;

use crate::{
    errors::{AppError, AppResult},
    models::{Actor, Role},
};

/// Fails with `Forbidden` unless the actor holds one of `allowed`.
pub(crate) fn ensure_role(actor: &Actor, allowed: &[Role], action: &str) -> AppResult<()> {
    if allowed.contains(&actor.role) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "Role {} may not {action}",
            actor.role
        )))
    }
}

pub(crate) fn require_text(value: &str, field: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}
