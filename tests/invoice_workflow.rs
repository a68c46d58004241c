mod common;

use common::{actor, date, invoice_request, seed_car_config, seed_driver, seed_user, state};
use fleetdesk::{
    errors::AppError,
    models::{
        CreateEmployeeInvoiceRequest, InvoiceStatus, NotificationKind, OverrideSalaryRequest,
        ReviewOutcome, Role, VehicleType,
    },
    store::InvoiceStore,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[tokio::test]
async fn employee_invoice_for_450_orders_is_paid_202_50_and_approval_reaches_the_accountant()
-> anyhow::Result<()> {
    let state = state();
    seed_car_config(&state).await;
    let driver = seed_driver(&state, "Omar").await;
    let invoices = state.invoices();

    let employee = actor(Role::Employee);
    let invoice = invoices
        .create_driver_invoice(&employee, invoice_request(driver.id, 450, date(2025, 3, 10)))
        .await?;
    assert_eq!(invoice.computed_salary, dec!(202.50));
    assert_eq!(invoice.main_order_pay, dec!(202.50));
    assert_eq!(invoice.status, InvoiceStatus::PendingManagerReview);
    assert_eq!(invoice.outcome, ReviewOutcome::Undecided);

    let invoice = invoices
        .update_driver_invoice_status(&actor(Role::Manager), invoice.id, InvoiceStatus::PendingAdminReview)
        .await?;
    assert_eq!(invoice.status, InvoiceStatus::PendingAdminReview);

    let invoice = invoices
        .update_driver_invoice_status(&actor(Role::Admin), invoice.id, InvoiceStatus::Approved)
        .await?;
    assert_eq!(invoice.status, InvoiceStatus::Approved);
    assert_eq!(invoice.outcome, ReviewOutcome::Approved);

    let notifications = state.notifications().for_target(invoice.id).await?;
    let kinds: Vec<_> = notifications.iter().map(|n| n.kind).collect();
    assert_eq!(
        kinds,
        vec![
            NotificationKind::InvoiceSubmitted,
            NotificationKind::InvoiceForwarded,
            NotificationKind::InvoiceApproved,
        ]
    );
    assert_eq!(notifications[0].roles, vec![Role::Manager]);
    assert_eq!(notifications[1].roles, vec![Role::Admin]);

    let approvals: Vec<_> = notifications
        .iter()
        .filter(|n| n.kind == NotificationKind::InvoiceApproved)
        .collect();
    assert_eq!(approvals.len(), 1);
    assert!(approvals[0].roles.contains(&Role::Accountant));
    Ok(())
}

#[tokio::test]
async fn initial_status_depends_on_the_submitter() -> anyhow::Result<()> {
    let state = state();
    seed_car_config(&state).await;
    let driver = seed_driver(&state, "Omar").await;

    let cases = [
        (Role::Employee, InvoiceStatus::PendingManagerReview),
        (Role::Manager, InvoiceStatus::PendingAdminReview),
        (Role::Accountant, InvoiceStatus::PendingAdminReview),
        (Role::Admin, InvoiceStatus::Approved),
    ];
    for (role, expected) in cases {
        let invoice = state
            .invoices()
            .create_driver_invoice(&actor(role), invoice_request(driver.id, 10, date(2025, 3, 1)))
            .await?;
        assert_eq!(invoice.status, expected, "{role}");
    }

    let serials: Vec<_> = state
        .invoices()
        .list_driver_invoices(&Default::default())
        .await?
        .iter()
        .map(|i| i.serial)
        .collect();
    assert_eq!(serials, vec![4, 3, 2, 1]);
    Ok(())
}

#[tokio::test]
async fn pending_manager_review_cannot_jump_ahead() -> anyhow::Result<()> {
    let state = state();
    seed_car_config(&state).await;
    let driver = seed_driver(&state, "Omar").await;
    let invoice = state
        .invoices()
        .create_driver_invoice(&actor(Role::Employee), invoice_request(driver.id, 100, date(2025, 3, 1)))
        .await?;

    for target in [
        InvoiceStatus::Approved,
        InvoiceStatus::Archived,
        InvoiceStatus::AdminRejected,
        InvoiceStatus::Overridden,
    ] {
        let result = state
            .invoices()
            .update_driver_invoice_status(&actor(Role::Admin), invoice.id, target)
            .await;
        assert!(matches!(result, Err(AppError::InvalidTransition(_))), "{target}");
    }

    let result = state
        .invoices()
        .update_driver_invoice_status(&actor(Role::Employee), invoice.id, InvoiceStatus::PendingAdminReview)
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));

    let stored = state.invoices().get_driver_invoice(invoice.id).await?;
    assert_eq!(stored.status, InvoiceStatus::PendingManagerReview);
    Ok(())
}

#[tokio::test]
async fn rejection_notifies_only_the_submitter() -> anyhow::Result<()> {
    let state = state();
    seed_car_config(&state).await;
    let driver = seed_driver(&state, "Omar").await;

    let employee = actor(Role::Employee);
    let invoice = state
        .invoices()
        .create_driver_invoice(&employee, invoice_request(driver.id, 100, date(2025, 3, 1)))
        .await?;
    let rejected = state
        .invoices()
        .update_driver_invoice_status(&actor(Role::Manager), invoice.id, InvoiceStatus::ManagerRejected)
        .await?;
    assert_eq!(rejected.outcome, ReviewOutcome::Rejected);

    let notifications = state.notifications().for_target(invoice.id).await?;
    let rejection = notifications
        .iter()
        .find(|n| n.kind == NotificationKind::InvoiceRejected)
        .expect("rejection notification");
    assert_eq!(rejection.roles, vec![Role::Employee]);

    // a Manager's invoice rejected by an Admin goes back to the Manager role
    let manager = actor(Role::Manager);
    let invoice = state
        .invoices()
        .create_driver_invoice(&manager, invoice_request(driver.id, 100, date(2025, 3, 1)))
        .await?;
    state
        .invoices()
        .update_driver_invoice_status(&actor(Role::Admin), invoice.id, InvoiceStatus::AdminRejected)
        .await?;
    let rejection = state
        .notifications()
        .for_target(invoice.id)
        .await?
        .into_iter()
        .find(|n| n.kind == NotificationKind::InvoiceRejected)
        .expect("rejection notification");
    assert_eq!(rejection.roles, vec![Role::Manager]);
    assert_eq!(rejection.for_user_id, None);
    Ok(())
}

#[tokio::test]
async fn rejected_invoices_are_terminal() -> anyhow::Result<()> {
    let state = state();
    seed_car_config(&state).await;
    let driver = seed_driver(&state, "Omar").await;
    let invoice = state
        .invoices()
        .create_driver_invoice(&actor(Role::Employee), invoice_request(driver.id, 100, date(2025, 3, 1)))
        .await?;
    state
        .invoices()
        .update_driver_invoice_status(&actor(Role::Manager), invoice.id, InvoiceStatus::ManagerRejected)
        .await?;

    let result = state
        .invoices()
        .update_driver_invoice_status(&actor(Role::Manager), invoice.id, InvoiceStatus::PendingAdminReview)
        .await;
    assert!(matches!(result, Err(AppError::InvalidTransition(_))));
    Ok(())
}

#[tokio::test]
async fn missing_configuration_and_uncovered_counts_fail() -> anyhow::Result<()> {
    let state = state();
    let driver = seed_driver(&state, "Omar").await;

    let result = state
        .invoices()
        .create_driver_invoice(&actor(Role::Employee), invoice_request(driver.id, 100, date(2025, 3, 1)))
        .await;
    assert!(matches!(
        result,
        Err(AppError::ConfigurationMissing(VehicleType::Car))
    ));

    let result = state
        .invoices()
        .create_driver_invoice(&actor(Role::Employee), invoice_request(driver.id, -1, date(2025, 3, 1)))
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
    assert!(state.invoices().list_driver_invoices(&Default::default()).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn stale_status_write_is_a_conflict() -> anyhow::Result<()> {
    let state = state();
    seed_car_config(&state).await;
    let driver = seed_driver(&state, "Omar").await;
    let invoice = state
        .invoices()
        .create_driver_invoice(&actor(Role::Employee), invoice_request(driver.id, 100, date(2025, 3, 1)))
        .await?;

    let mut stale = invoice.clone();
    state
        .invoices()
        .update_driver_invoice_status(&actor(Role::Manager), invoice.id, InvoiceStatus::ManagerRejected)
        .await?;

    stale.apply_status(InvoiceStatus::PendingAdminReview, chrono::Utc::now());
    let result = state
        .store
        .update_driver_invoice(&stale, InvoiceStatus::PendingManagerReview, None)
        .await;
    assert!(matches!(result, Err(AppError::Conflict(_))));

    let stored = state.invoices().get_driver_invoice(invoice.id).await?;
    assert_eq!(stored.status, InvoiceStatus::ManagerRejected);
    Ok(())
}

#[tokio::test]
async fn override_requires_an_approved_invoice_and_keeps_the_computed_pay() -> anyhow::Result<()> {
    let state = state();
    seed_car_config(&state).await;
    let driver = seed_driver(&state, "Omar").await;
    let pending = state
        .invoices()
        .create_driver_invoice(&actor(Role::Employee), invoice_request(driver.id, 450, date(2025, 3, 1)))
        .await?;
    let approved = state
        .invoices()
        .create_driver_invoice(&actor(Role::Admin), invoice_request(driver.id, 450, date(2025, 3, 2)))
        .await?;

    let request = || OverrideSalaryRequest {
        amount: dec!(250),
        reason: "Bonus for holiday shifts".to_string(),
    };

    let result = state
        .invoices()
        .override_driver_salary(&actor(Role::Accountant), pending.id, request())
        .await;
    assert!(matches!(result, Err(AppError::InvalidTransition(_))));

    let result = state
        .invoices()
        .override_driver_salary(&actor(Role::Manager), approved.id, request())
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));

    let accountant = actor(Role::Accountant);
    let overridden = state
        .invoices()
        .override_driver_salary(&accountant, approved.id, request())
        .await?;
    assert_eq!(overridden.status, InvoiceStatus::Overridden);
    assert_eq!(overridden.salary_override, Some(dec!(250)));
    assert_eq!(overridden.computed_salary, dec!(202.50));
    assert_eq!(overridden.overridden_by, Some(accountant.id));
    assert_eq!(overridden.effective_salary(), dec!(250));

    let kinds: Vec<_> = state
        .notifications()
        .for_target(approved.id)
        .await?
        .iter()
        .map(|n| n.kind)
        .collect();
    assert!(kinds.contains(&NotificationKind::SalaryOverridden));
    Ok(())
}

#[tokio::test]
async fn reset_archives_one_driver_and_stamps_the_actor() -> anyhow::Result<()> {
    let state = state();
    seed_car_config(&state).await;
    let omar = seed_driver(&state, "Omar").await;
    let sara = seed_driver(&state, "Sara").await;
    let invoices = state.invoices();

    let pending = invoices
        .create_driver_invoice(&actor(Role::Employee), invoice_request(omar.id, 100, date(2025, 3, 1)))
        .await?;
    let rejected = invoices
        .create_driver_invoice(&actor(Role::Employee), invoice_request(omar.id, 100, date(2025, 3, 2)))
        .await?;
    invoices
        .update_driver_invoice_status(&actor(Role::Manager), rejected.id, InvoiceStatus::ManagerRejected)
        .await?;
    let other = invoices
        .create_driver_invoice(&actor(Role::Admin), invoice_request(sara.id, 100, date(2025, 3, 1)))
        .await?;

    let result = invoices.reset_driver_invoices(&actor(Role::Accountant), Some(omar.id)).await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));

    let manager = actor(Role::Manager);
    let response = invoices.reset_driver_invoices(&manager, Some(omar.id)).await?;
    assert_eq!(response.invoices_reset, 1);

    let pending = invoices.get_driver_invoice(pending.id).await?;
    assert_eq!(pending.status, InvoiceStatus::Archived);
    assert_eq!(pending.reset_by, Some(manager.id));
    assert_eq!(pending.archived_by, Some(manager.id));
    assert!(pending.archived_at.is_some());

    assert_eq!(
        invoices.get_driver_invoice(rejected.id).await?.status,
        InvoiceStatus::ManagerRejected
    );
    assert_eq!(
        invoices.get_driver_invoice(other.id).await?.status,
        InvoiceStatus::Approved
    );

    let response = invoices.reset_driver_invoices(&actor(Role::Admin), None).await?;
    assert_eq!(response.invoices_reset, 1);
    assert_eq!(
        invoices.get_driver_invoice(other.id).await?.status,
        InvoiceStatus::Archived
    );

    let resets = state
        .notifications()
        .for_target(omar.id)
        .await?
        .into_iter()
        .filter(|n| n.kind == NotificationKind::InvoicesReset)
        .count();
    assert_eq!(resets, 1);
    Ok(())
}

#[tokio::test]
async fn salary_summary_counts_approved_work_of_the_month() -> anyhow::Result<()> {
    let state = state();
    seed_car_config(&state).await;
    let driver = seed_driver(&state, "Omar").await;
    let invoices = state.invoices();
    let admin = actor(Role::Admin);

    let mut march = invoice_request(driver.id, 450, date(2025, 3, 10));
    march.additional_salary = dec!(30);
    march.talabat_deduction_amount = dec!(12.5);
    march.petty_cash_deduction_amount = dec!(7.5);
    invoices.create_driver_invoice(&admin, march).await?;

    let overridden = invoices
        .create_driver_invoice(&admin, invoice_request(driver.id, 100, date(2025, 3, 20)))
        .await?;
    invoices
        .override_driver_salary(
            &actor(Role::Accountant),
            overridden.id,
            OverrideSalaryRequest {
                amount: dec!(60),
                reason: "Manual count".to_string(),
            },
        )
        .await?;

    // pending and other-month invoices are ignored
    invoices
        .create_driver_invoice(&actor(Role::Employee), invoice_request(driver.id, 500, date(2025, 3, 15)))
        .await?;
    invoices
        .create_driver_invoice(&admin, invoice_request(driver.id, 500, date(2025, 4, 1)))
        .await?;

    let summary = invoices.driver_salary_summary(driver.id, "2025-03").await?;
    assert_eq!(summary.invoice_count, 2);
    assert_eq!(summary.order_pay, dec!(262.50));
    assert_eq!(summary.additional_salary, dec!(30));
    assert_eq!(summary.deductions, dec!(20));
    assert_eq!(summary.net_salary, dec!(272.50));

    let result = invoices.driver_salary_summary(driver.id, "03/2025").await;
    assert!(matches!(result, Err(AppError::Validation(_))));
    Ok(())
}

#[tokio::test]
async fn employee_invoices_follow_the_same_chain() -> anyhow::Result<()> {
    let state = state();
    let staff = seed_user(&state, "Nora Staff", Role::Employee).await;
    let invoices = state.invoices();

    let invoice = invoices
        .create_employee_invoice(
            &actor(Role::Employee),
            CreateEmployeeInvoiceRequest {
                user_id: staff.id,
                invoice_date: date(2025, 3, 5),
                deduction_date: None,
                additional_salary: dec!(50),
                deduction_reason: Some("Late arrival".to_string()),
                company_deduction_amount: dec!(10),
                remarks: None,
                file: None,
            },
        )
        .await?;
    assert_eq!(invoice.status, InvoiceStatus::PendingManagerReview);

    let result = invoices
        .update_employee_invoice_status(&actor(Role::Manager), invoice.id, InvoiceStatus::VisibleToAll)
        .await;
    assert!(matches!(result, Err(AppError::InvalidTransition(_))));

    invoices
        .update_employee_invoice_status(&actor(Role::Manager), invoice.id, InvoiceStatus::PendingAdminReview)
        .await?;
    let approved = invoices
        .update_employee_invoice_status(&actor(Role::Admin), invoice.id, InvoiceStatus::Approved)
        .await?;
    assert_eq!(approved.outcome, ReviewOutcome::Approved);

    let queue = invoices.review_queue(&actor(Role::Accountant)).await?;
    assert_eq!(queue.employee_invoices.len(), 1);
    assert!(queue.driver_invoices.is_empty());

    let queue = invoices.review_queue(&actor(Role::Manager)).await?;
    assert!(queue.employee_invoices.is_empty());
    Ok(())
}

#[tokio::test]
async fn employee_invoice_for_unknown_user_is_not_found() {
    let state = state();
    let result = state
        .invoices()
        .create_employee_invoice(
            &actor(Role::Manager),
            CreateEmployeeInvoiceRequest {
                user_id: uuid::Uuid::new_v4(),
                invoice_date: date(2025, 3, 5),
                deduction_date: None,
                additional_salary: Decimal::ZERO,
                deduction_reason: None,
                company_deduction_amount: Decimal::ZERO,
                remarks: None,
                file: None,
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn published_invoice_is_shared_with_every_role_and_still_paid() -> anyhow::Result<()> {
    let state = state();
    seed_car_config(&state).await;
    let driver = seed_driver(&state, "Omar").await;
    let invoices = state.invoices();

    let invoice = invoices
        .create_driver_invoice(&actor(Role::Admin), invoice_request(driver.id, 450, date(2025, 3, 10)))
        .await?;

    let result = invoices
        .update_driver_invoice_status(&actor(Role::Manager), invoice.id, InvoiceStatus::VisibleToAll)
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));

    let published = invoices
        .update_driver_invoice_status(&actor(Role::Admin), invoice.id, InvoiceStatus::VisibleToAll)
        .await?;
    assert_eq!(published.status, InvoiceStatus::VisibleToAll);
    assert_eq!(published.outcome, ReviewOutcome::Approved);

    for role in [Role::Admin, Role::Manager, Role::Accountant, Role::Employee] {
        let queue = invoices.review_queue(&actor(role)).await?;
        let ids: Vec<_> = queue.driver_invoices.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![invoice.id], "{role}");
    }

    let shared = state
        .notifications()
        .for_target(invoice.id)
        .await?
        .into_iter()
        .find(|n| n.kind == NotificationKind::InvoiceForwarded)
        .expect("publish notification");
    assert_eq!(shared.roles, vec![Role::Manager, Role::Accountant, Role::Employee]);

    let summary = invoices.driver_salary_summary(driver.id, "2025-03").await?;
    assert_eq!(summary.invoice_count, 1);
    assert_eq!(summary.order_pay, dec!(202.50));

    // published invoices can no longer be overridden
    let result = invoices
        .override_driver_salary(
            &actor(Role::Accountant),
            invoice.id,
            OverrideSalaryRequest {
                amount: dec!(1),
                reason: "Late correction".to_string(),
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::InvalidTransition(_))));
    Ok(())
}

#[tokio::test]
async fn reset_moves_published_invoices_to_their_archive_state() -> anyhow::Result<()> {
    let state = state();
    seed_car_config(&state).await;
    let driver = seed_driver(&state, "Omar").await;
    let invoices = state.invoices();
    let admin = actor(Role::Admin);

    let invoice = invoices
        .create_driver_invoice(&admin, invoice_request(driver.id, 450, date(2025, 3, 10)))
        .await?;
    invoices
        .update_driver_invoice_status(&admin, invoice.id, InvoiceStatus::VisibleToAll)
        .await?;

    let response = invoices.reset_driver_invoices(&actor(Role::Employee), Some(driver.id)).await?;
    assert_eq!(response.invoices_reset, 1);

    let reset = invoices.get_driver_invoice(invoice.id).await?;
    assert_eq!(reset.status, InvoiceStatus::VisibleToAllArchived);
    assert_eq!(reset.outcome, ReviewOutcome::Approved);
    assert!(invoices.review_queue(&actor(Role::Manager)).await?.driver_invoices.is_empty());

    let summary = invoices.driver_salary_summary(driver.id, "2025-03").await?;
    assert_eq!(summary.invoice_count, 1);
    Ok(())
}
