//! Credit ledger behaviour against a real sqlite store.

use division::config::Config;
use division::domain::AccountId;
use division::models::{Account, TransactionKind};
use division::services::LedgerError;
use division::SharedState;

async fn spawn_state() -> SharedState {
    let db_path =
        std::env::temp_dir().join(format!("division-ledger-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.admin.password = Some("admin-password".to_string());
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;

    SharedState::new(config)
        .await
        .expect("failed to create shared state")
}

async fn new_user(state: &SharedState, email: &str) -> Account {
    state
        .accounts
        .create("Test User", email, "password123")
        .await
        .expect("failed to create account")
}

#[tokio::test]
async fn signup_bonus_is_granted_and_journaled() {
    let state = spawn_state().await;
    let user = new_user(&state, "bonus@example.com").await;

    assert_eq!(user.credits, 25);

    let history = state.ledger.history(user.id, 10).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].kind, TransactionKind::SignupBonus);
    assert_eq!(history[0].amount, 25);
    assert_eq!(history[0].balance_after, 25);
}

#[tokio::test]
async fn debit_reduces_balance() {
    let state = spawn_state().await;
    let user = new_user(&state, "debit@example.com").await;

    let balance = state.ledger.debit(user.id, 10, None).await.unwrap();
    assert_eq!(balance, 15);
    assert_eq!(state.ledger.balance(user.id).await.unwrap(), 15);

    let history = state.ledger.history(user.id, 10).await.unwrap();
    assert_eq!(history[0].kind, TransactionKind::Usage);
    assert_eq!(history[0].amount, -10);
    assert_eq!(history[0].balance_after, 15);
}

#[tokio::test]
async fn insufficient_debit_leaves_balance_unchanged() {
    let state = spawn_state().await;
    let user = new_user(&state, "poor@example.com").await;

    let err = state.ledger.debit(user.id, 30, None).await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::InsufficientCredits {
            required: 30,
            available: 25
        }
    ));
    assert_eq!(state.ledger.balance(user.id).await.unwrap(), 25);
    assert_eq!(state.ledger.history(user.id, 10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn exact_balance_can_be_spent() {
    let state = spawn_state().await;
    let user = new_user(&state, "exact@example.com").await;

    assert_eq!(state.ledger.debit(user.id, 25, None).await.unwrap(), 0);
    assert!(matches!(
        state.ledger.debit(user.id, 5, None).await,
        Err(LedgerError::InsufficientCredits { .. })
    ));
}

#[tokio::test]
async fn zero_debit_is_a_no_op_and_negative_is_rejected() {
    let state = spawn_state().await;
    let user = new_user(&state, "zero@example.com").await;

    assert_eq!(state.ledger.debit(user.id, 0, None).await.unwrap(), 25);
    assert_eq!(state.ledger.history(user.id, 10).await.unwrap().len(), 1);

    assert!(matches!(
        state.ledger.debit(user.id, -5, None).await,
        Err(LedgerError::Validation(_))
    ));
    assert!(matches!(
        state
            .ledger
            .credit(user.id, 0, TransactionKind::AdminGrant, None)
            .await,
        Err(LedgerError::Validation(_))
    ));
}

#[tokio::test]
async fn administrator_debits_never_fail_or_change_balance() {
    let state = spawn_state().await;
    let admin = state
        .accounts
        .find_by_email("admin@division.local")
        .await
        .unwrap()
        .expect("admin should be provisioned");

    assert!(admin.is_admin);
    let before = state.ledger.balance(admin.id).await.unwrap();

    let after = state.ledger.debit(admin.id, 1_000, None).await.unwrap();
    assert_eq!(after, before);
    assert_eq!(state.ledger.balance(admin.id).await.unwrap(), before);
}

#[tokio::test]
async fn unknown_account_is_not_found() {
    let state = spawn_state().await;
    let ghost = AccountId::new(9_999);

    assert!(matches!(
        state.ledger.debit(ghost, 5, None).await,
        Err(LedgerError::NotFound(id)) if id == ghost
    ));
    assert!(matches!(
        state
            .ledger
            .credit(ghost, 5, TransactionKind::AdminGrant, None)
            .await,
        Err(LedgerError::NotFound(_))
    ));
    assert!(matches!(
        state.ledger.set_balance(ghost, 5).await,
        Err(LedgerError::NotFound(_))
    ));
}

#[tokio::test]
async fn set_balance_overwrites_and_journals_the_delta() {
    let state = spawn_state().await;
    let user = new_user(&state, "set@example.com").await;

    state.ledger.set_balance(user.id, 100).await.unwrap();
    assert_eq!(state.ledger.balance(user.id).await.unwrap(), 100);

    let history = state.ledger.history(user.id, 1).await.unwrap();
    assert_eq!(history[0].kind, TransactionKind::AdminSet);
    assert_eq!(history[0].amount, 75);
    assert_eq!(history[0].balance_after, 100);

    assert!(matches!(
        state.ledger.set_balance(user.id, -1).await,
        Err(LedgerError::Validation(_))
    ));
}

#[tokio::test]
async fn concurrent_debits_never_overspend() {
    let state = spawn_state().await;
    let user = new_user(&state, "race@example.com").await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let ledger = state.ledger.clone();
        let id = user.id;
        handles.push(tokio::spawn(async move { ledger.debit(id, 5, None).await }));
    }

    let mut applied = 0;
    let mut refused = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => applied += 1,
            Err(LedgerError::InsufficientCredits { .. }) => refused += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(applied, 5);
    assert_eq!(refused, 3);
    assert_eq!(state.ledger.balance(user.id).await.unwrap(), 0);
}

#[tokio::test]
async fn credit_that_would_overflow_is_rejected() {
    let state = spawn_state().await;
    let user = new_user(&state, "overflow@example.com").await;

    assert!(matches!(
        state
            .ledger
            .credit(user.id, i64::MAX, TransactionKind::AdminGrant, None)
            .await,
        Err(LedgerError::Validation(_))
    ));
    assert_eq!(state.ledger.balance(user.id).await.unwrap(), 25);
    assert_eq!(state.ledger.history(user.id, 10).await.unwrap().len(), 1);

    // Topping up to exactly the maximum is still allowed.
    let balance = state
        .ledger
        .credit(user.id, i64::MAX - 25, TransactionKind::AdminGrant, None)
        .await
        .unwrap();
    assert_eq!(balance, i64::MAX);

    assert!(matches!(
        state
            .ledger
            .credit(user.id, 1, TransactionKind::AdminGrant, None)
            .await,
        Err(LedgerError::Validation(_))
    ));
    assert_eq!(state.ledger.balance(user.id).await.unwrap(), i64::MAX);
}

#[tokio::test]
async fn balance_survives_reopening_the_store() {
    let db_path =
        std::env::temp_dir().join(format!("division-reopen-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.admin.password = Some("admin-password".to_string());
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;

    let id = {
        let state = SharedState::new(config.clone()).await.unwrap();
        let user = new_user(&state, "persist@example.com").await;
        state.ledger.debit(user.id, 5, None).await.unwrap();
        user.id
    };

    let state = SharedState::new(config).await.unwrap();
    assert_eq!(state.ledger.balance(id).await.unwrap(), 20);
    assert_eq!(state.ledger.history(id, 10).await.unwrap().len(), 2);
    assert_eq!(state.accounts.list_all().await.unwrap().len(), 2);
}
