// src/services/notification.rs

use crate::{
    errors::{AppError, AppResult},
    models::{
        Actor, InvoiceStatus, MarkReadResponse, Notification, NotificationKind, Recipients,
        ReviewOutcome, Role, SendMessageRequest,
    },
    services::{lifecycle::ReviewRule, require_text},
    store::Store,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Kind and recipients of the notification raised by a review step.
///
/// Approval informs the rule's roles plus the submitter's role when it
/// differs from the approver's. Rejection goes back to the submitter only:
/// to their role, or to them personally when they share the rejecting
/// actor's role.
pub fn recipients_for(
    rule: &ReviewRule,
    actor_role: Role,
    submitter_id: Uuid,
    submitter_role: Role,
) -> (NotificationKind, Recipients) {
    match rule.to.outcome() {
        ReviewOutcome::Rejected => {
            let recipients = if submitter_role == actor_role {
                Recipients::user(submitter_id)
            } else {
                Recipients::roles([submitter_role])
            };
            (NotificationKind::InvoiceRejected, recipients)
        }
        ReviewOutcome::Approved => {
            let mut roles = rule.notify.clone();
            if submitter_role != actor_role {
                roles.push(submitter_role);
            }
            (NotificationKind::InvoiceApproved, Recipients::roles(roles))
        }
        ReviewOutcome::Undecided => (
            NotificationKind::InvoiceForwarded,
            Recipients::roles(rule.notify.iter().copied()),
        ),
    }
}

pub fn review_message(kind_label: &str, serial: i64, status: InvoiceStatus, actor: &Actor) -> String {
    format!("{kind_label} #{serial} moved to {status} by {}", actor.name)
}

pub struct NotificationDispatcher {
    store: Arc<dyn Store>,
}

impl NotificationDispatcher {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Newest first.
    pub async fn unread_for(&self, actor: &Actor) -> AppResult<Vec<Notification>> {
        self.store.unread_notifications(actor.id, actor.role).await
    }

    pub async fn mark_all_read(&self, actor: &Actor) -> AppResult<MarkReadResponse> {
        let marked = self
            .store
            .mark_all_read(actor.id, actor.role, Utc::now())
            .await?;
        info!(user = %actor.id, marked, "notifications marked read");
        Ok(MarkReadResponse { marked })
    }

    pub async fn send_message(
        &self,
        actor: &Actor,
        request: SendMessageRequest,
    ) -> AppResult<Notification> {
        let message = require_text(&request.message, "message")?;
        let recipients = Recipients {
            for_user_id: request.for_user_id,
            ..Recipients::roles(request.roles)
        };
        if recipients.is_empty() {
            return Err(AppError::Validation(
                "A message needs at least one recipient role or user".to_string(),
            ));
        }
        if let Some(user_id) = recipients.for_user_id {
            if self.store.get_user(user_id).await?.is_none() {
                return Err(AppError::NotFound(format!("User {user_id}")));
            }
        }

        let notification = Notification::new(
            NotificationKind::Message,
            recipients,
            Some(actor.id),
            None,
            message,
        );
        self.store.insert_notification(&notification).await?;

        info!(notification = %notification.id, sender = %actor.id, "message sent");
        Ok(notification)
    }

    pub async fn for_target(&self, target_id: Uuid) -> AppResult<Vec<Notification>> {
        self.store.list_notifications_for_target(target_id).await
    }
}
