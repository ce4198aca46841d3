//! Login, signup and logout through the session service.

use division::config::Config;
use division::domain::Navigation;
use division::services::{AccountError, SessionError};
use division::SharedState;

async fn spawn_state() -> SharedState {
    let db_path =
        std::env::temp_dir().join(format!("division-session-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.admin.password = Some("admin-password".to_string());
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;

    SharedState::new(config)
        .await
        .expect("failed to create shared state")
}

#[tokio::test]
async fn signup_creates_account_and_logs_in() {
    let state = spawn_state().await;

    let outcome = state
        .sessions
        .signup("Jane", "Jane@Example.com", "password123", "password123")
        .await
        .unwrap();

    assert_eq!(outcome.navigation, Navigation::Generator);
    assert_eq!(outcome.account.email, "jane@example.com");
    assert_eq!(outcome.account.credits, 25);
    assert!(!outcome.account.is_admin);

    let current = state.sessions.current().await.unwrap().unwrap();
    assert_eq!(current.id, outcome.account.id);
}

#[tokio::test]
async fn signup_enforces_password_policy_before_creating() {
    let state = spawn_state().await;

    assert!(matches!(
        state
            .sessions
            .signup("Short", "short@example.com", "1234567", "1234567")
            .await,
        Err(SessionError::Validation(_))
    ));
    assert!(matches!(
        state
            .sessions
            .signup("Typo", "typo@example.com", "password123", "password124")
            .await,
        Err(SessionError::Validation(_))
    ));

    // Exactly the minimum length is accepted.
    state
        .sessions
        .signup("Ok", "ok@example.com", "12345678", "12345678")
        .await
        .unwrap();

    assert!(
        state
            .accounts
            .find_by_email("short@example.com")
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        state
            .accounts
            .find_by_email("typo@example.com")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn duplicate_email_leaves_session_untouched() {
    let state = spawn_state().await;

    let first = state
        .sessions
        .signup("First", "dup@example.com", "password123", "password123")
        .await
        .unwrap();

    let err = state
        .sessions
        .signup("Second", " DUP@example.com ", "password456", "password456")
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::DuplicateEmail));

    let current = state.sessions.current().await.unwrap().unwrap();
    assert_eq!(current.id, first.account.id);
    assert_eq!(current.name, "First");

    // Administrator plus the first signup.
    let accounts = state.accounts.list_all().await.unwrap();
    assert_eq!(accounts.len(), 2);
    assert_eq!(
        accounts
            .iter()
            .filter(|a| a.email == "dup@example.com")
            .count(),
        1
    );

    assert!(matches!(
        state
            .accounts
            .create("Third", "dup@example.com", "password789")
            .await,
        Err(AccountError::DuplicateEmail)
    ));
    assert_eq!(state.accounts.list_all().await.unwrap().len(), 2);
}

#[tokio::test]
async fn concurrent_signups_for_one_email_create_one_account() {
    let state = spawn_state().await;

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let accounts = state.accounts.clone();
            tokio::spawn(async move {
                accounts
                    .create(&format!("Racer {i}"), "same@example.com", "password123")
                    .await
            })
        })
        .collect();

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap());
    }

    let created = results.iter().filter(|r| r.is_ok()).count();
    let duplicates = results
        .iter()
        .filter(|r| matches!(r, Err(AccountError::DuplicateEmail)))
        .count();
    assert_eq!(created, 1);
    assert_eq!(duplicates, 3);

    let accounts = state.accounts.list_all().await.unwrap();
    assert_eq!(accounts.len(), 2);

    let winner = state
        .accounts
        .find_by_email("same@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(winner.credits, 25);
    assert_eq!(state.ledger.history(winner.id, 10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn login_with_wrong_password_does_not_change_session() {
    let state = spawn_state().await;
    state
        .accounts
        .create("Login", "login@example.com", "password123")
        .await
        .unwrap();

    assert!(matches!(
        state.sessions.login("login@example.com", "nope").await,
        Err(SessionError::InvalidCredentials)
    ));
    assert!(matches!(
        state.sessions.login("nobody@example.com", "password123").await,
        Err(SessionError::InvalidCredentials)
    ));
    assert!(state.sessions.current().await.unwrap().is_none());

    let outcome = state
        .sessions
        .login("LOGIN@example.com", "password123")
        .await
        .unwrap();
    assert_eq!(outcome.navigation, Navigation::Generator);
}

#[tokio::test]
async fn administrator_login_routes_to_admin_surface() {
    let state = spawn_state().await;

    let outcome = state
        .sessions
        .login("admin@division.local", "admin-password")
        .await
        .unwrap();

    assert!(outcome.account.is_admin);
    assert_eq!(outcome.navigation, Navigation::Admin);
    assert!(state.sessions.require_admin().await.is_ok());
}

#[tokio::test]
async fn logout_clears_session() {
    let state = spawn_state().await;
    state
        .sessions
        .signup("Bye", "bye@example.com", "password123", "password123")
        .await
        .unwrap();

    assert_eq!(state.sessions.logout().await.unwrap(), Navigation::Landing);
    assert!(state.sessions.current().await.unwrap().is_none());
    assert!(matches!(
        state.sessions.require_account().await,
        Err(SessionError::Unauthorized)
    ));
}

#[tokio::test]
async fn regular_accounts_cannot_act_as_admin() {
    let state = spawn_state().await;
    state
        .sessions
        .signup("User", "user@example.com", "password123", "password123")
        .await
        .unwrap();

    assert!(matches!(
        state.sessions.require_admin().await,
        Err(SessionError::Forbidden)
    ));
}

#[tokio::test]
async fn session_reflects_latest_stored_balance() {
    let state = spawn_state().await;
    let outcome = state
        .sessions
        .signup("Fresh", "fresh@example.com", "password123", "password123")
        .await
        .unwrap();

    state
        .ledger
        .debit(outcome.account.id, 10, None)
        .await
        .unwrap();

    let current = state.sessions.require_account().await.unwrap();
    assert_eq!(current.credits, 15);
}

#[tokio::test]
async fn update_changes_profile_but_not_credits() {
    let state = spawn_state().await;
    let mut account = state
        .accounts
        .create("Before", "before@example.com", "password123")
        .await
        .unwrap();
    let other = state
        .accounts
        .create("Other", "other@example.com", "password123")
        .await
        .unwrap();

    account.name = "After".to_string();
    account.email = "After@Example.com".to_string();
    account.credits = 9_999;
    state.accounts.update(&account).await.unwrap();

    let stored = state.accounts.get(account.id).await.unwrap();
    assert_eq!(stored.name, "After");
    assert_eq!(stored.email, "after@example.com");
    assert_eq!(stored.credits, 25);

    account.email = other.email.to_uppercase();
    assert!(matches!(
        state.accounts.update(&account).await,
        Err(AccountError::DuplicateEmail)
    ));
    assert_eq!(
        state.accounts.get(account.id).await.unwrap().email,
        "after@example.com"
    );

    let mut ghost = account.clone();
    ghost.id = division::domain::AccountId::new(9_999);
    ghost.email = "ghost@example.com".to_string();
    assert!(matches!(
        state.accounts.update(&ghost).await,
        Err(AccountError::NotFound(_))
    ));
}
