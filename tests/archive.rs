mod common;

use common::{actor, date, invoice_request, seed_car_config, seed_driver, state};
use fleetdesk::{
    errors::AppError,
    models::{CreatePettyCashRequest, InvoiceStatus, PettyCashStatus, ReviewOutcome, Role},
};
use rust_decimal_macros::dec;

#[tokio::test]
async fn sweep_archives_last_month_once() -> anyhow::Result<()> {
    let state = state();
    seed_car_config(&state).await;
    let driver = seed_driver(&state, "Omar").await;
    let invoices = state.invoices();

    let february = invoices
        .create_driver_invoice(&actor(Role::Admin), invoice_request(driver.id, 450, date(2025, 2, 20)))
        .await?;
    let march = invoices
        .create_driver_invoice(&actor(Role::Admin), invoice_request(driver.id, 450, date(2025, 3, 2)))
        .await?;

    let run = state
        .archive()
        .archive_invoices(date(2025, 3, 5))
        .await?
        .expect("first sweep of the month runs");
    assert_eq!(run.period, date(2025, 3, 1));
    assert_eq!(run.driver_invoices, 1);

    let archived = invoices.get_driver_invoice(february.id).await?;
    assert_eq!(archived.status, InvoiceStatus::Archived);
    assert_eq!(archived.outcome, ReviewOutcome::Approved);
    assert_eq!(archived.archived_by, None);
    assert_eq!(
        invoices.get_driver_invoice(march.id).await?.status,
        InvoiceStatus::Approved
    );

    assert!(state.archive().archive_invoices(date(2025, 3, 28)).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn missed_months_are_caught_up_in_one_run() -> anyhow::Result<()> {
    let state = state();
    seed_car_config(&state).await;
    let driver = seed_driver(&state, "Omar").await;
    let invoices = state.invoices();

    state.archive().archive_invoices(date(2025, 1, 3)).await?;

    let mut ids = Vec::new();
    for day in [date(2025, 1, 10), date(2025, 2, 10), date(2025, 3, 10)] {
        let invoice = invoices
            .create_driver_invoice(&actor(Role::Employee), invoice_request(driver.id, 100, day))
            .await?;
        ids.push(invoice.id);
    }
    let current = invoices
        .create_driver_invoice(&actor(Role::Employee), invoice_request(driver.id, 100, date(2025, 4, 1)))
        .await?;

    // the scheduler was down for February and March
    let run = state
        .archive()
        .archive_invoices(date(2025, 4, 2))
        .await?
        .expect("catch-up run");
    assert_eq!(run.period, date(2025, 4, 1));
    assert_eq!(run.driver_invoices, 3);
    assert_eq!(run.sequence, 2);

    for id in ids {
        let invoice = invoices.get_driver_invoice(id).await?;
        assert_eq!(invoice.status, InvoiceStatus::Archived);
        assert_eq!(invoice.outcome, ReviewOutcome::Undecided);
    }
    assert_eq!(
        invoices.get_driver_invoice(current.id).await?.status,
        InvoiceStatus::PendingManagerReview
    );
    Ok(())
}

#[tokio::test]
async fn rejected_invoices_stay_rejected() -> anyhow::Result<()> {
    let state = state();
    seed_car_config(&state).await;
    let driver = seed_driver(&state, "Omar").await;
    let invoices = state.invoices();

    let invoice = invoices
        .create_driver_invoice(&actor(Role::Employee), invoice_request(driver.id, 100, date(2025, 2, 10)))
        .await?;
    invoices
        .update_driver_invoice_status(&actor(Role::Manager), invoice.id, InvoiceStatus::ManagerRejected)
        .await?;

    let run = state.archive().archive_invoices(date(2025, 3, 1)).await?;
    assert_eq!(run.map(|r| r.driver_invoices), Some(0));
    assert_eq!(
        invoices.get_driver_invoice(invoice.id).await?.status,
        InvoiceStatus::ManagerRejected
    );
    Ok(())
}

#[tokio::test]
async fn archived_approved_work_still_counts_towards_pay() -> anyhow::Result<()> {
    let state = state();
    seed_car_config(&state).await;
    let driver = seed_driver(&state, "Omar").await;

    state
        .invoices()
        .create_driver_invoice(&actor(Role::Admin), invoice_request(driver.id, 450, date(2025, 2, 14)))
        .await?;
    state.archive().archive_invoices(date(2025, 3, 1)).await?;

    let summary = state.invoices().driver_salary_summary(driver.id, "2025-02").await?;
    assert_eq!(summary.invoice_count, 1);
    assert_eq!(summary.order_pay, dec!(202.50));
    Ok(())
}

#[tokio::test]
async fn approved_petty_cash_is_archived_with_the_month() -> anyhow::Result<()> {
    let state = state();
    let accountant = actor(Role::Accountant);
    let record = state
        .ledger()
        .create_petty_cash(
            &accountant,
            CreatePettyCashRequest {
                request_applicant: "Warehouse".to_string(),
                spends_reason: "Packing tape".to_string(),
                cash_amount: dec!(12),
                spend_type: "supplies".to_string(),
                request_date: date(2025, 2, 3),
                deducted_from_user: None,
                deducted_from_driver: None,
                starting_balance: Some(dec!(500)),
            },
        )
        .await?;
    state
        .ledger()
        .set_petty_cash_status(&accountant, record.id, PettyCashStatus::Approved)
        .await?;

    let run = state.archive().archive_invoices(date(2025, 3, 1)).await?;
    assert_eq!(run.map(|r| r.petty_cash), Some(1));

    let archived = state.ledger().list_petty_cash(Some(PettyCashStatus::Archived)).await?;
    assert_eq!(archived.len(), 1);
    assert_eq!(archived[0].current_balance, dec!(488));
    Ok(())
}

#[tokio::test]
async fn only_admins_trigger_a_sweep() -> anyhow::Result<()> {
    let state = state();
    let result = state.archive().trigger(&actor(Role::Manager), date(2025, 3, 1)).await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));

    let run = state.archive().trigger(&actor(Role::Admin), date(2025, 3, 1)).await?;
    assert!(run.is_some());
    Ok(())
}

#[tokio::test]
async fn published_invoices_are_archived_separately() -> anyhow::Result<()> {
    let state = state();
    seed_car_config(&state).await;
    let driver = seed_driver(&state, "Omar").await;
    let invoices = state.invoices();
    let admin = actor(Role::Admin);

    let invoice = invoices
        .create_driver_invoice(&admin, invoice_request(driver.id, 450, date(2025, 2, 10)))
        .await?;
    invoices
        .update_driver_invoice_status(&admin, invoice.id, InvoiceStatus::VisibleToAll)
        .await?;

    let run = state.archive().archive_invoices(date(2025, 3, 1)).await?;
    assert_eq!(run.map(|r| r.driver_invoices), Some(1));

    let archived = invoices.get_driver_invoice(invoice.id).await?;
    assert_eq!(archived.status, InvoiceStatus::VisibleToAllArchived);
    assert_eq!(archived.outcome, ReviewOutcome::Approved);
    assert!(archived.archived_at.is_some());

    let queue = invoices.review_queue(&actor(Role::Employee)).await?;
    assert!(queue.driver_invoices.is_empty());
    Ok(())
}
