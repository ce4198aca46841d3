//! `SeaORM` implementation of the `AccountService` trait.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::{AdminConfig, SecurityConfig};
use crate::db::{NewAccount, ProfileUpdate, Store, generate_password};
use crate::domain::AccountId;
use crate::models::Account;
use crate::services::account_service::{AccountError, AccountService};

pub struct SeaOrmAccountService {
    store: Store,
    security: SecurityConfig,
    signup_bonus: i64,
}

impl SeaOrmAccountService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig, signup_bonus: i64) -> Self {
        Self {
            store,
            security,
            signup_bonus,
        }
    }

    fn validate_new(name: &str, email: &str, password: &str) -> Result<(), AccountError> {
        if name.trim().is_empty() {
            return Err(AccountError::Validation("Name is required".to_string()));
        }

        let email = email.trim();
        let valid_email = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
        if !valid_email {
            return Err(AccountError::Validation(format!(
                "Invalid email address: {email}"
            )));
        }

        if password.is_empty() {
            return Err(AccountError::Validation("Password is required".to_string()));
        }

        Ok(())
    }
}

#[async_trait]
impl AccountService for SeaOrmAccountService {
    async fn create(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Account, AccountError> {
        Self::validate_new(name, email, password)?;

        self.store
            .create_account(
                NewAccount {
                    name,
                    email,
                    password,
                    credits: self.signup_bonus,
                    is_admin: false,
                },
                &self.security,
            )
            .await?
            .ok_or(AccountError::DuplicateEmail)
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<Account, AccountError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AccountError::InvalidCredentials);
        }

        self.store
            .verify_account_password(email, password)
            .await?
            .ok_or(AccountError::InvalidCredentials)
    }

    async fn get(&self, id: AccountId) -> Result<Account, AccountError> {
        self.store
            .get_account(id.value())
            .await?
            .ok_or(AccountError::NotFound(id))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AccountError> {
        Ok(self.store.get_account_by_email(email).await?)
    }

    async fn list_all(&self) -> Result<Vec<Account>, AccountError> {
        Ok(self.store.list_accounts().await?)
    }

    async fn update(&self, account: &Account) -> Result<(), AccountError> {
        if account.name.trim().is_empty() {
            return Err(AccountError::Validation("Name is required".to_string()));
        }

        match self.store.update_account(account).await? {
            ProfileUpdate::Applied => Ok(()),
            ProfileUpdate::NotFound => Err(AccountError::NotFound(account.id)),
            ProfileUpdate::EmailTaken => Err(AccountError::DuplicateEmail),
        }
    }

    async fn provision_admin(&self, admin: &AdminConfig) -> Result<Option<String>, AccountError> {
        let configured = admin.password.clone().filter(|p| !p.is_empty());

        if configured.is_none() && self.store.has_admin().await? {
            return Ok(None);
        }

        let (password, generated) = match configured {
            Some(p) => (p, false),
            None => (generate_password(), true),
        };

        let created = self
            .store
            .ensure_admin(&admin.name, &admin.email, &password, &self.security)
            .await?;

        if created {
            info!("Provisioned administrator account {}", admin.email);
            if generated {
                warn!("No administrator password configured; a random one was generated");
                return Ok(Some(password));
            }
        }

        Ok(None)
    }
}
