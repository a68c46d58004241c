use super::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, ToSchema, PartialEq, Eq)]
#[sqlx(type_name = "notification_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    InvoiceSubmitted,
    InvoiceForwarded,
    InvoiceApproved,
    InvoiceRejected,
    InvoicesReset,
    SalaryOverridden,
    PettyCashRequested,
    LicenceExpiring,
    Message,
}

/// Who a notification is for. A user sees it when their role is in `roles`
/// or their id equals `for_user_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recipients {
    pub roles: Vec<Role>,
    pub for_user_id: Option<Uuid>,
}

impl Recipients {
    pub fn roles(roles: impl IntoIterator<Item = Role>) -> Self {
        let mut unique = Vec::new();
        for role in roles {
            if !unique.contains(&role) {
                unique.push(role);
            }
        }
        Self {
            roles: unique,
            for_user_id: None,
        }
    }

    pub fn user(user_id: Uuid) -> Self {
        Self {
            roles: Vec::new(),
            for_user_id: Some(user_id),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty() && self.for_user_id.is_none()
    }
}

/// Immutable once written; read-state is kept per user by the store.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Notification {
    pub id: Uuid,
    pub roles: Vec<Role>,
    pub for_user_id: Option<Uuid>,
    pub kind: NotificationKind,
    pub sender_id: Option<Uuid>,
    pub target_id: Option<Uuid>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        kind: NotificationKind,
        recipients: Recipients,
        sender_id: Option<Uuid>,
        target_id: Option<Uuid>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            roles: recipients.roles,
            for_user_id: recipients.for_user_id,
            kind,
            sender_id,
            target_id,
            message: message.into(),
            created_at: Utc::now(),
        }
    }

    pub fn is_visible_to(&self, user_id: Uuid, role: Role) -> bool {
        self.roles.contains(&role) || self.for_user_id == Some(user_id)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub roles: Vec<Role>,
    pub for_user_id: Option<Uuid>,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MarkReadResponse {
    pub marked: u64,
}
