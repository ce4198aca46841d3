//! Payment request workflow: submission, approval, rejection.

use division::config::Config;
use division::domain::RequestId;
use division::models::{Account, PaymentStatus, TransactionKind};
use division::services::PaymentError;
use division::SharedState;
use sea_orm::ConnectionTrait;

fn test_config() -> Config {
    let db_path =
        std::env::temp_dir().join(format!("division-payment-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.admin.password = Some("admin-password".to_string());
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config
}

async fn spawn_state() -> SharedState {
    SharedState::new(test_config())
        .await
        .expect("failed to create shared state")
}

async fn new_user(state: &SharedState, email: &str) -> Account {
    state
        .accounts
        .create("Buyer", email, "password123")
        .await
        .expect("failed to create account")
}

#[tokio::test]
async fn submit_records_pending_request_with_plan_snapshot() {
    let state = spawn_state().await;
    let user = new_user(&state, "buyer@example.com").await;

    let request = state
        .payments
        .submit(&user, "creator pack", "  UTR123456  ")
        .await
        .unwrap();

    assert_eq!(request.status, PaymentStatus::Pending);
    assert_eq!(request.plan, "Creator Pack");
    assert_eq!(request.credits, 100);
    assert_eq!(request.amount, 299);
    assert_eq!(request.transaction_ref, "UTR123456");
    assert_eq!(request.user_id, user.id);
    assert_eq!(request.user_email, "buyer@example.com");
    assert!(request.resolved_at.is_none());

    // Submitting does not touch the balance.
    assert_eq!(state.ledger.balance(user.id).await.unwrap(), 25);
}

#[tokio::test]
async fn blank_reference_and_unknown_plan_are_rejected() {
    let state = spawn_state().await;
    let user = new_user(&state, "invalid@example.com").await;

    assert!(matches!(
        state.payments.submit(&user, "Starter Pack", "   ").await,
        Err(PaymentError::Validation(_))
    ));
    assert!(matches!(
        state.payments.submit(&user, "Platinum Pack", "UTR1").await,
        Err(PaymentError::Validation(_))
    ));
    assert!(state.payments.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn approval_grants_snapshotted_credits_once() {
    let state = spawn_state().await;
    let user = new_user(&state, "approve@example.com").await;
    let request = state
        .payments
        .submit(&user, "Starter Pack", "UTR-A")
        .await
        .unwrap();

    let approved = state.payments.approve(request.id).await.unwrap();
    assert_eq!(approved.status, PaymentStatus::Approved);
    assert!(approved.resolved_at.is_some());
    assert_eq!(state.ledger.balance(user.id).await.unwrap(), 55);

    let history = state.ledger.history(user.id, 1).await.unwrap();
    assert_eq!(history[0].kind, TransactionKind::Purchase);
    assert_eq!(history[0].amount, 30);

    let err = state.payments.approve(request.id).await.unwrap_err();
    assert!(matches!(
        err,
        PaymentError::AlreadyFinalized {
            status: PaymentStatus::Approved,
            ..
        }
    ));
    assert_eq!(state.ledger.balance(user.id).await.unwrap(), 55);

    assert!(matches!(
        state.payments.reject(request.id).await,
        Err(PaymentError::AlreadyFinalized { .. })
    ));
}

#[tokio::test]
async fn rejection_is_terminal_and_grants_nothing() {
    let state = spawn_state().await;
    let user = new_user(&state, "reject@example.com").await;
    let request = state
        .payments
        .submit(&user, "Pro Pack", "UTR-R")
        .await
        .unwrap();

    let rejected = state.payments.reject(request.id).await.unwrap();
    assert_eq!(rejected.status, PaymentStatus::Rejected);
    assert_eq!(state.ledger.balance(user.id).await.unwrap(), 25);

    assert!(matches!(
        state.payments.approve(request.id).await,
        Err(PaymentError::AlreadyFinalized {
            status: PaymentStatus::Rejected,
            ..
        })
    ));
    assert_eq!(state.ledger.balance(user.id).await.unwrap(), 25);
}

#[tokio::test]
async fn unknown_request_is_not_found() {
    let state = spawn_state().await;
    let missing = RequestId::new(4242);

    assert!(matches!(
        state.payments.approve(missing).await,
        Err(PaymentError::NotFound(id)) if id == missing
    ));
    assert!(matches!(
        state.payments.reject(missing).await,
        Err(PaymentError::NotFound(_))
    ));
    assert!(matches!(
        state.payments.get(missing).await,
        Err(PaymentError::NotFound(_))
    ));
}

#[tokio::test]
async fn concurrent_approvals_credit_exactly_once() {
    let state = spawn_state().await;
    let user = new_user(&state, "double@example.com").await;
    let request = state
        .payments
        .submit(&user, "Creator Pack", "UTR-D")
        .await
        .unwrap();

    let a = {
        let payments = state.payments.clone();
        tokio::spawn(async move { payments.approve(request.id).await })
    };
    let b = {
        let payments = state.payments.clone();
        tokio::spawn(async move { payments.approve(request.id).await })
    };

    let results = [a.await.unwrap(), b.await.unwrap()];
    let applied = results.iter().filter(|r| r.is_ok()).count();
    let finalized = results
        .iter()
        .filter(|r| matches!(r, Err(PaymentError::AlreadyFinalized { .. })))
        .count();

    assert_eq!(applied, 1);
    assert_eq!(finalized, 1);
    assert_eq!(state.ledger.balance(user.id).await.unwrap(), 125);
}

#[tokio::test]
async fn listings_are_newest_first_and_filtered() {
    let state = spawn_state().await;
    let alice = new_user(&state, "alice@example.com").await;
    let bob = new_user(&state, "bob@example.com").await;

    let first = state
        .payments
        .submit(&alice, "Starter Pack", "UTR-1")
        .await
        .unwrap();
    let second = state
        .payments
        .submit(&bob, "Starter Pack", "UTR-2")
        .await
        .unwrap();
    let third = state
        .payments
        .submit(&alice, "Pro Pack", "UTR-3")
        .await
        .unwrap();

    state.payments.approve(second.id).await.unwrap();

    let all: Vec<_> = state
        .payments
        .list_all()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(all, vec![third.id, second.id, first.id]);

    let pending: Vec<_> = state
        .payments
        .list_pending()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(pending, vec![third.id, first.id]);

    let mine = state.payments.list_for_account(alice.id).await.unwrap();
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|r| r.user_id == alice.id));
}

#[tokio::test]
async fn approval_for_vanished_account_leaves_request_pending() {
    let mut config = test_config();
    // One pooled connection, so the pragma below applies to every query.
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;
    let state = SharedState::new(config).await.unwrap();

    let user = new_user(&state, "gone@example.com").await;
    let request = state
        .payments
        .submit(&user, "Starter Pack", "UTR-GONE")
        .await
        .unwrap();

    // Drop the account without cascading to its requests.
    state
        .store
        .conn
        .execute_unprepared("PRAGMA foreign_keys = OFF")
        .await
        .unwrap();
    state
        .store
        .conn
        .execute_unprepared(&format!("DELETE FROM accounts WHERE id = {}", user.id.value()))
        .await
        .unwrap();

    assert!(matches!(
        state.payments.approve(request.id).await,
        Err(PaymentError::AccountNotFound(id)) if id == user.id
    ));

    let stored = state.payments.get(request.id).await.unwrap();
    assert_eq!(stored.status, PaymentStatus::Pending);
    assert!(stored.resolved_at.is_none());
    assert_eq!(stored, request);
    assert_eq!(state.payments.list_pending().await.unwrap().len(), 1);
}

#[tokio::test]
async fn approval_that_would_overflow_the_balance_is_refused() {
    let state = spawn_state().await;
    let user = new_user(&state, "whale@example.com").await;
    state.ledger.set_balance(user.id, i64::MAX - 10).await.unwrap();

    let request = state
        .payments
        .submit(&user, "Starter Pack", "UTR-BIG")
        .await
        .unwrap();

    assert!(matches!(
        state.payments.approve(request.id).await,
        Err(PaymentError::Validation(_))
    ));

    let stored = state.payments.get(request.id).await.unwrap();
    assert_eq!(stored.status, PaymentStatus::Pending);
    assert!(stored.resolved_at.is_none());
    assert_eq!(state.ledger.balance(user.id).await.unwrap(), i64::MAX - 10);
}

#[tokio::test]
async fn resolved_requests_survive_reopening_the_store() {
    let config = test_config();

    let (approved, rejected, pending) = {
        let state = SharedState::new(config.clone()).await.unwrap();
        let user = new_user(&state, "durable@example.com").await;

        let a = state
            .payments
            .submit(&user, "Pro Pack", "UTR-P1")
            .await
            .unwrap();
        let b = state
            .payments
            .submit(&user, "Starter Pack", "UTR-P2")
            .await
            .unwrap();
        let c = state
            .payments
            .submit(&user, "Creator Pack", "UTR-P3")
            .await
            .unwrap();

        let approved = state.payments.approve(a.id).await.unwrap();
        let rejected = state.payments.reject(b.id).await.unwrap();
        (approved, rejected, c)
    };

    let state = SharedState::new(config).await.unwrap();

    let reloaded = state.payments.get(approved.id).await.unwrap();
    assert_eq!(reloaded, approved);
    assert_eq!(reloaded.status, PaymentStatus::Approved);
    assert!(reloaded.resolved_at.is_some());

    assert_eq!(state.payments.get(rejected.id).await.unwrap(), rejected);
    assert_eq!(state.payments.get(pending.id).await.unwrap(), pending);

    let user = state
        .accounts
        .find_by_email("durable@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.credits, 25 + approved.credits);
    assert_eq!(state.payments.list_for_account(user.id).await.unwrap().len(), 3);
}
