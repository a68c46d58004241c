// src/services/lifecycle.rs

//! The approval chain as data: which status an invoice starts in for each
//! submitter role, which role may move it along which edge, and who is told.

use crate::{
    errors::{AppError, AppResult},
    models::{InvoiceStatus, Role},
};
use std::collections::HashMap;

/// Where a freshly submitted invoice lands and who must act next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitialRoute {
    pub status: InvoiceStatus,
    pub notify: Vec<Role>,
}

/// One permitted review edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRule {
    pub actor: Role,
    pub from: InvoiceStatus,
    pub to: InvoiceStatus,
    /// Roles informed regardless of who submitted the invoice.
    pub notify: Vec<Role>,
}

#[derive(Debug, Clone)]
pub struct ReviewPolicy {
    initial: HashMap<Role, InitialRoute>,
    rules: Vec<ReviewRule>,
    resetters: Vec<Role>,
    overriders: Vec<Role>,
    petty_cash_reviewers: Vec<Role>,
    audit_watchers: Vec<Role>,
    queues: HashMap<Role, InvoiceStatus>,
}

impl Default for ReviewPolicy {
    fn default() -> Self {
        use InvoiceStatus::*;

        let initial = HashMap::from([
            (
                Role::Employee,
                InitialRoute {
                    status: PendingManagerReview,
                    notify: vec![Role::Manager],
                },
            ),
            (
                Role::Manager,
                InitialRoute {
                    status: PendingAdminReview,
                    notify: vec![Role::Admin],
                },
            ),
            (
                Role::Accountant,
                InitialRoute {
                    status: PendingAdminReview,
                    notify: vec![Role::Admin],
                },
            ),
            (
                Role::Admin,
                InitialRoute {
                    status: Approved,
                    notify: vec![Role::Accountant],
                },
            ),
        ]);

        let rules = vec![
            ReviewRule {
                actor: Role::Manager,
                from: PendingManagerReview,
                to: PendingAdminReview,
                notify: vec![Role::Admin],
            },
            ReviewRule {
                actor: Role::Manager,
                from: PendingManagerReview,
                to: ManagerRejected,
                notify: vec![],
            },
            ReviewRule {
                actor: Role::Admin,
                from: PendingAdminReview,
                to: Approved,
                notify: vec![Role::Accountant],
            },
            ReviewRule {
                actor: Role::Admin,
                from: PendingAdminReview,
                to: AdminRejected,
                notify: vec![],
            },
            // publishing an approved driver invoice shares it with every role
            ReviewRule {
                actor: Role::Admin,
                from: Approved,
                to: VisibleToAll,
                notify: vec![Role::Manager, Role::Accountant, Role::Employee],
            },
        ];

        Self {
            initial,
            rules,
            resetters: vec![Role::Admin, Role::Employee, Role::Manager],
            overriders: vec![Role::Accountant, Role::Admin],
            petty_cash_reviewers: vec![Role::Admin, Role::Accountant],
            audit_watchers: vec![Role::Admin, Role::Accountant],
            queues: HashMap::from([
                (Role::Manager, PendingManagerReview),
                (Role::Admin, PendingAdminReview),
                (Role::Accountant, Approved),
            ]),
        }
    }
}

impl ReviewPolicy {
    pub fn initial_route(&self, submitter: Role) -> AppResult<&InitialRoute> {
        self.initial.get(&submitter).ok_or_else(|| {
            AppError::Forbidden(format!("Role {submitter} may not submit invoices"))
        })
    }

    /// Looks up the edge `from -> to`. An edge that exists for another role
    /// is `Forbidden`; an edge that does not exist at all is `InvalidTransition`.
    pub fn transition(
        &self,
        actor: Role,
        from: InvoiceStatus,
        to: InvoiceStatus,
    ) -> AppResult<&ReviewRule> {
        let mut edges = self.rules.iter().filter(|r| r.from == from && r.to == to);
        let Some(first) = edges.next() else {
            return Err(AppError::InvalidTransition(format!("{from} -> {to}")));
        };
        std::iter::once(first)
            .chain(edges)
            .find(|r| r.actor == actor)
            .ok_or_else(|| AppError::Forbidden(format!("Role {actor} may not move {from} -> {to}")))
    }

    /// Every status reachable from `from` in one review step, by any role.
    pub fn reachable_from(&self, from: InvoiceStatus) -> Vec<InvoiceStatus> {
        let mut reachable = Vec::new();
        for rule in self.rules.iter().filter(|r| r.from == from) {
            if !reachable.contains(&rule.to) {
                reachable.push(rule.to);
            }
        }
        reachable
    }

    pub fn can_reset(&self, role: Role) -> bool {
        self.resetters.contains(&role)
    }

    pub fn can_override(&self, role: Role) -> bool {
        self.overriders.contains(&role)
    }

    pub fn can_review_petty_cash(&self, role: Role) -> bool {
        self.petty_cash_reviewers.contains(&role)
    }

    /// Roles told about resets and salary overrides.
    pub fn audit_watchers(&self) -> &[Role] {
        &self.audit_watchers
    }

    /// The status a role has to act on, if any.
    pub fn queue_status(&self, role: Role) -> Option<InvoiceStatus> {
        self.queues.get(&role).copied()
    }
}
