//! `SeaORM` implementation of the `SessionService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::db::Store;
use crate::domain::{AccountId, Navigation};
use crate::models::Account;
use crate::services::account_service::{AccountError, AccountService};
use crate::services::session_service::{SessionError, SessionOutcome, SessionService};

pub struct SeaOrmSessionService {
    store: Store,
    accounts: Arc<dyn AccountService>,
    min_password_length: usize,
}

impl SeaOrmSessionService {
    #[must_use]
    pub fn new(store: Store, accounts: Arc<dyn AccountService>, min_password_length: usize) -> Self {
        Self {
            store,
            accounts,
            min_password_length,
        }
    }

    fn validate_password(&self, password: &str, confirm: &str) -> Result<(), SessionError> {
        if password != confirm {
            return Err(SessionError::Validation("Passwords don't match".to_string()));
        }

        if password.chars().count() < self.min_password_length {
            return Err(SessionError::Validation(format!(
                "Password must be at least {} characters",
                self.min_password_length
            )));
        }

        Ok(())
    }

    async fn install(&self, account: Account) -> Result<SessionOutcome, SessionError> {
        self.store
            .set_active_account_id(Some(account.id.value()))
            .await?;

        let navigation = if account.is_admin {
            Navigation::Admin
        } else {
            Navigation::Generator
        };

        Ok(SessionOutcome {
            account,
            navigation,
        })
    }
}

#[async_trait]
impl SessionService for SeaOrmSessionService {
    async fn login(&self, email: &str, password: &str) -> Result<SessionOutcome, SessionError> {
        let account = match self.accounts.authenticate(email, password).await {
            Ok(account) => account,
            Err(AccountError::InvalidCredentials) => {
                warn!("Failed login attempt for {}", email.trim());
                return Err(SessionError::InvalidCredentials);
            }
            Err(e) => return Err(e.into()),
        };

        info!("Account {} logged in", account.id);
        self.install(account).await
    }

    async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<SessionOutcome, SessionError> {
        self.validate_password(password, confirm_password)?;

        let account = self.accounts.create(name, email, password).await?;

        info!("Account {} signed up", account.id);
        self.install(account).await
    }

    async fn logout(&self) -> Result<Navigation, SessionError> {
        if let Some(id) = self.store.active_account_id().await? {
            info!("Account {} logged out", id);
        }
        self.store.set_active_account_id(None).await?;
        Ok(Navigation::Landing)
    }

    async fn current(&self) -> Result<Option<Account>, SessionError> {
        let Some(id) = self.store.active_account_id().await? else {
            return Ok(None);
        };

        match self.accounts.get(AccountId::new(id)).await {
            Ok(account) => Ok(Some(account)),
            Err(AccountError::NotFound(_)) => {
                // Stale session pointing at a missing account.
                self.store.set_active_account_id(None).await?;
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn require_account(&self) -> Result<Account, SessionError> {
        self.current().await?.ok_or(SessionError::Unauthorized)
    }

    async fn require_admin(&self) -> Result<Account, SessionError> {
        let account = self.require_account().await?;
        if account.is_admin {
            Ok(account)
        } else {
            Err(SessionError::Forbidden)
        }
    }
}
