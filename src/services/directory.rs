// src/services/directory.rs

use crate::{
    errors::{AppError, AppResult},
    models::{
        Actor, CreateDriverRequest, CreateUserRequest, Driver, Notification, NotificationKind,
        Recipients, Role, User,
    },
    services::{
        ensure_role, require_text,
        sequence::{SequenceAllocator, SequenceScope},
    },
    store::Store,
};
use chrono::{Duration, NaiveDate, Utc};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub struct DirectoryService {
    store: Arc<dyn Store>,
    sequences: SequenceAllocator,
}

impl DirectoryService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            sequences: SequenceAllocator::new(store.clone()),
            store,
        }
    }

    pub async fn create_user(&self, actor: &Actor, request: CreateUserRequest) -> AppResult<User> {
        ensure_role(actor, &[Role::Admin], "create users")?;
        let name = require_text(&request.name, "name")?;
        let email = require_text(&request.email, "email")?.to_lowercase();
        if !email.contains('@') {
            return Err(AppError::Validation(format!("'{email}' is not an email address")));
        }

        let user = User {
            id: Uuid::new_v4(),
            sequence: self.sequences.next(SequenceScope::User).await?,
            name,
            email,
            role: request.role,
            created_at: Utc::now(),
        };
        self.store.insert_user(&user).await?;

        info!(user = %user.id, role = %user.role, actor = %actor.id, "user created");
        Ok(user)
    }

    pub async fn get_user(&self, id: Uuid) -> AppResult<User> {
        self.store
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {id}")))
    }

    pub async fn list_users(&self) -> AppResult<Vec<User>> {
        self.store.list_users().await
    }

    pub async fn create_driver(
        &self,
        actor: &Actor,
        request: CreateDriverRequest,
    ) -> AppResult<Driver> {
        let driver = Driver {
            id: Uuid::new_v4(),
            sequence: self.sequences.next(SequenceScope::Driver).await?,
            name: require_text(&request.name, "name")?,
            phone: require_text(&request.phone, "phone")?,
            vehicle_type: request.vehicle_type,
            license_expiry: request.license_expiry,
            expiry_notified_for: None,
            is_active: true,
            created_at: Utc::now(),
        };
        self.store.insert_driver(&driver).await?;

        info!(driver = %driver.id, sequence = driver.sequence, actor = %actor.id, "driver created");
        Ok(driver)
    }

    pub async fn get_driver(&self, id: Uuid) -> AppResult<Driver> {
        self.store
            .get_driver(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Driver {id}")))
    }

    pub async fn list_drivers(&self) -> AppResult<Vec<Driver>> {
        self.store.list_drivers().await
    }

    /// Warns Admin and Manager about licences expiring within `warning_days`
    /// of `today`, once per expiry date. Returns how many warnings were raised.
    pub async fn scan_expiring_licences(
        &self,
        today: NaiveDate,
        warning_days: i64,
    ) -> AppResult<usize> {
        let until = Duration::try_days(warning_days)
            .filter(|_| warning_days >= 0)
            .and_then(|window| today.checked_add_signed(window))
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "A licence warning window of {warning_days} days is out of range"
                ))
            })?;
        let mut raised = 0;

        for driver in self.store.drivers_with_expiring_licence(until).await? {
            let Some(expiry) = driver.license_expiry else {
                continue;
            };
            if driver.expiry_notified_for == Some(expiry) {
                continue;
            }

            let message = if expiry < today {
                format!("Licence of driver {} expired on {expiry}", driver.name)
            } else {
                format!("Licence of driver {} expires on {expiry}", driver.name)
            };
            let notification = Notification::new(
                NotificationKind::LicenceExpiring,
                Recipients::roles([Role::Admin, Role::Manager]),
                None,
                Some(driver.id),
                message,
            );
            match self
                .store
                .record_licence_warning(driver.id, expiry, &notification)
                .await
            {
                Ok(()) => raised += 1,
                Err(err) => warn!(driver = %driver.id, error = %err, "licence warning not recorded"),
            }
        }

        if raised > 0 {
            info!(raised, "licence expiry warnings raised");
        }
        Ok(raised)
    }
}
