mod common;

use common::{actor, date, seed_driver, seed_user, state};
use fleetdesk::{
    errors::AppError,
    models::{
        CreateBankAccountRequest, CreateBankStatementRequest, CreatePettyCashRequest,
        NotificationKind, PettyCashStatus, Role, StatementQuery,
    },
    state::AppState,
};
use chrono::{Datelike, NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

async fn open_account(state: &AppState, number: &str, name: &str) {
    state
        .ledger()
        .create_bank_account(
            &actor(Role::Accountant),
            CreateBankAccountRequest {
                account_number: number.to_string(),
                account_name: name.to_string(),
            },
        )
        .await
        .unwrap();
}

fn statement(
    account: &str,
    deposits: Decimal,
    spends: Decimal,
    day: NaiveDate,
    starting_balance: Option<Decimal>,
) -> CreateBankStatementRequest {
    CreateBankStatementRequest {
        account_number: account.to_string(),
        deposits,
        spends,
        statement_date: day,
        starting_balance,
        description: None,
    }
}

fn spend(amount: Decimal, starting_balance: Option<Decimal>) -> CreatePettyCashRequest {
    CreatePettyCashRequest {
        request_applicant: "Dispatch desk".to_string(),
        spends_reason: "Fuel top-up".to_string(),
        cash_amount: amount,
        spend_type: "fuel".to_string(),
        request_date: date(2025, 3, 4),
        deducted_from_user: None,
        deducted_from_driver: None,
        starting_balance,
    }
}

#[tokio::test]
async fn first_statement_needs_a_starting_balance() -> anyhow::Result<()> {
    let state = state();
    open_account(&state, "0042", "Operations").await;
    let accountant = actor(Role::Accountant);

    let result = state
        .ledger()
        .append_bank_statement(&accountant, statement("0042", dec!(100), dec!(0), date(2025, 3, 1), None))
        .await;
    assert!(matches!(result, Err(AppError::MissingStartingBalance(_))));

    let first = state
        .ledger()
        .append_bank_statement(
            &accountant,
            statement("0042", dec!(200), dec!(50), date(2025, 3, 1), Some(dec!(1000))),
        )
        .await?;
    assert_eq!(first.sequence, 1);
    assert_eq!(first.balance, dec!(1150));

    let result = state
        .ledger()
        .append_bank_statement(
            &accountant,
            statement("0042", dec!(0), dec!(10), date(2025, 3, 2), Some(dec!(5))),
        )
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    let second = state
        .ledger()
        .append_bank_statement(&accountant, statement("0042", dec!(0), dec!(150), date(2025, 3, 2), None))
        .await?;
    assert_eq!(second.sequence, 2);
    assert_eq!(second.balance, dec!(1000));
    Ok(())
}

#[tokio::test]
async fn statements_for_unknown_accounts_are_rejected() {
    let state = state();
    let result = state
        .ledger()
        .append_bank_statement(
            &actor(Role::Accountant),
            statement("9999", dec!(1), dec!(0), date(2025, 3, 1), Some(dec!(0))),
        )
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    let result = state
        .ledger()
        .append_bank_statement(
            &actor(Role::Accountant),
            statement("9999", dec!(-1), dec!(0), date(2025, 3, 1), Some(dec!(0))),
        )
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn account_names_are_unique_ignoring_case() {
    let state = state();
    open_account(&state, "0042", "Operations").await;

    let result = state
        .ledger()
        .create_bank_account(
            &actor(Role::Accountant),
            CreateBankAccountRequest {
                account_number: "0043".to_string(),
                account_name: "OPERATIONS".to_string(),
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::Conflict(_))));

    let result = state
        .ledger()
        .create_bank_account(
            &actor(Role::Accountant),
            CreateBankAccountRequest {
                account_number: "0042".to_string(),
                account_name: "Payroll".to_string(),
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::Conflict(_))));
    assert_eq!(state.ledger().list_bank_accounts().await.unwrap().len(), 1);
}

#[tokio::test]
async fn search_filters_by_account_and_year() -> anyhow::Result<()> {
    let state = state();
    open_account(&state, "0042", "Operations").await;
    open_account(&state, "0077", "Payroll").await;
    let accountant = actor(Role::Accountant);
    let this_year = Utc::now().date_naive().year();
    let jan = NaiveDate::from_ymd_opt(this_year, 1, 15).unwrap();
    let last_year = NaiveDate::from_ymd_opt(this_year - 1, 11, 15).unwrap();

    let ledger = state.ledger();
    ledger
        .append_bank_statement(&accountant, statement("0042", dec!(10), dec!(0), last_year, Some(dec!(0))))
        .await?;
    ledger
        .append_bank_statement(&accountant, statement("0042", dec!(10), dec!(0), jan, None))
        .await?;
    ledger
        .append_bank_statement(&accountant, statement("0077", dec!(10), dec!(0), jan, Some(dec!(0))))
        .await?;

    let all = ledger.search_bank_statements(&StatementQuery::default()).await?;
    assert_eq!(all.len(), 3);

    let ops = ledger
        .search_bank_statements(&StatementQuery {
            account_number: Some("0042".to_string()),
            ..StatementQuery::default()
        })
        .await?;
    let sequences: Vec<_> = ops.iter().map(|s| s.sequence).collect();
    assert_eq!(sequences, vec![1, 2]);

    let current = ledger
        .search_bank_statements(&StatementQuery {
            account_number: Some("0042".to_string()),
            current_year: true,
            ..StatementQuery::default()
        })
        .await?;
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].statement_date, jan);
    assert_eq!(current[0].balance, dec!(20));
    Ok(())
}

#[tokio::test]
async fn petty_cash_chain_skips_rejected_rows() -> anyhow::Result<()> {
    let state = state();
    let accountant = actor(Role::Accountant);
    let ledger = state.ledger();

    let result = ledger.create_petty_cash(&accountant, spend(dec!(10), None)).await;
    assert!(matches!(result, Err(AppError::MissingStartingBalance(_))));

    let first = ledger.create_petty_cash(&accountant, spend(dec!(100), Some(dec!(500)))).await?;
    assert_eq!(first.serial_number, 1);
    assert_eq!(first.previous_balance, dec!(500));
    assert_eq!(first.current_balance, dec!(400));
    assert_eq!(first.status, PettyCashStatus::Pending);

    let second = ledger.create_petty_cash(&accountant, spend(dec!(50), None)).await?;
    assert_eq!(second.current_balance, dec!(350));
    ledger
        .set_petty_cash_status(&accountant, second.id, PettyCashStatus::Rejected)
        .await?;

    let third = ledger.create_petty_cash(&accountant, spend(dec!(20), None)).await?;
    assert_eq!(third.serial_number, 3);
    assert_eq!(third.previous_balance, dec!(400));
    assert_eq!(third.current_balance, dec!(380));
    Ok(())
}

#[tokio::test]
async fn rejecting_an_older_row_returns_its_amount_to_the_balance() -> anyhow::Result<()> {
    let state = state();
    let accountant = actor(Role::Accountant);
    let ledger = state.ledger();

    let fuel = ledger.create_petty_cash(&accountant, spend(dec!(100), Some(dec!(500)))).await?;
    let tolls = ledger.create_petty_cash(&accountant, spend(dec!(50), None)).await?;
    assert_eq!(tolls.current_balance, dec!(350));

    ledger
        .set_petty_cash_status(&accountant, fuel.id, PettyCashStatus::Rejected)
        .await?;

    let parking = ledger.create_petty_cash(&accountant, spend(dec!(20), None)).await?;
    assert_eq!(parking.previous_balance, dec!(450));
    assert_eq!(parking.current_balance, dec!(430));

    // attributed spends never touch the company balance
    let user = seed_user(&state, "Nora Staff", Role::Employee).await;
    let mut charged = spend(dec!(70), None);
    charged.deducted_from_user = Some(user.id);
    ledger.create_petty_cash(&accountant, charged).await?;

    let next = ledger.create_petty_cash(&accountant, spend(dec!(30), None)).await?;
    assert_eq!(next.previous_balance, dec!(430));
    assert_eq!(next.current_balance, dec!(400));
    Ok(())
}

#[tokio::test]
async fn double_attribution_fails_before_anything_is_written() {
    let state = state();
    let user = seed_user(&state, "Nora Staff", Role::Employee).await;
    let driver = seed_driver(&state, "Omar").await;

    let mut request = spend(dec!(25), Some(dec!(100)));
    request.deducted_from_user = Some(user.id);
    request.deducted_from_driver = Some(driver.id);

    let result = state
        .ledger()
        .create_petty_cash(&actor(Role::Accountant), request)
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
    assert!(state.ledger().list_petty_cash(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn attributed_spend_keeps_the_balance_and_notifies() -> anyhow::Result<()> {
    let state = state();
    let user = seed_user(&state, "Nora Staff", Role::Employee).await;
    let accountant = actor(Role::Accountant);
    let ledger = state.ledger();

    ledger.create_petty_cash(&accountant, spend(dec!(40), Some(dec!(300)))).await?;

    let mut request = spend(dec!(25), None);
    request.deducted_from_user = Some(user.id);
    let attributed = ledger.create_petty_cash(&accountant, request).await?;
    assert_eq!(attributed.previous_balance, dec!(260));
    assert_eq!(attributed.current_balance, dec!(260));

    let notifications = state.notifications().for_target(attributed.id).await?;
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].kind, NotificationKind::PettyCashRequested);
    assert_eq!(notifications[0].roles, vec![Role::Accountant]);
    assert_eq!(notifications[0].for_user_id, Some(user.id));

    let mut request = spend(dec!(5), None);
    request.deducted_from_driver = Some(uuid::Uuid::new_v4());
    let result = ledger.create_petty_cash(&accountant, request).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn petty_cash_review_rules() -> anyhow::Result<()> {
    let state = state();
    let ledger = state.ledger();
    let record = ledger
        .create_petty_cash(&actor(Role::Employee), spend(dec!(10), Some(dec!(100))))
        .await?;

    let result = ledger
        .set_petty_cash_status(&actor(Role::Manager), record.id, PettyCashStatus::Approved)
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));

    let result = ledger
        .set_petty_cash_status(&actor(Role::Admin), record.id, PettyCashStatus::Archived)
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    let admin = actor(Role::Admin);
    let approved = ledger
        .set_petty_cash_status(&admin, record.id, PettyCashStatus::Approved)
        .await?;
    assert_eq!(approved.status, PettyCashStatus::Approved);
    assert_eq!(approved.reviewed_by, Some(admin.id));

    let result = ledger
        .set_petty_cash_status(&actor(Role::Accountant), record.id, PettyCashStatus::Rejected)
        .await;
    assert!(matches!(result, Err(AppError::InvalidTransition(_))));
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn statement_balances_chain(
        opening in 0i64..1_000_000,
        entries in prop::collection::vec((0i64..50_000, 0i64..50_000), 1..12),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async {
            let state = state();
            open_account(&state, "0042", "Operations").await;
            let accountant = actor(Role::Accountant);

            let mut previous: Option<Decimal> = None;
            for (i, (deposit, spent)) in entries.iter().enumerate() {
                let deposits = Decimal::new(*deposit, 2);
                let spends = Decimal::new(*spent, 2);
                let start = if i == 0 { Some(Decimal::new(opening, 2)) } else { None };
                let row = state
                    .ledger()
                    .append_bank_statement(
                        &accountant,
                        statement("0042", deposits, spends, date(2025, 3, 1), start),
                    )
                    .await
                    .unwrap();

                let base = previous.unwrap_or(Decimal::new(opening, 2));
                assert_eq!(row.sequence, i as i64 + 1);
                assert_eq!(row.balance, base - spends + deposits);
                previous = Some(row.balance);
            }
        });
    }
}
