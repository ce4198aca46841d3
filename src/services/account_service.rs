//! Domain service for the account store.
//!
//! Owns user records: creation with the signup bonus, credential checks,
//! lookups and administrator provisioning.

use thiserror::Error;

use crate::config::AdminConfig;
use crate::domain::AccountId;
use crate::models::Account;

/// Errors specific to account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("An account with this email already exists")]
    DuplicateEmail,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account not found: {0}")]
    NotFound(AccountId),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AccountError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AccountError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Domain service trait for accounts.
#[async_trait::async_trait]
pub trait AccountService: Send + Sync {
    /// Creates a regular account holding the signup bonus.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::DuplicateEmail`] if the email is taken.
    async fn create(&self, name: &str, email: &str, password: &str)
    -> Result<Account, AccountError>;

    /// Checks credentials. Administrators go through the same path.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::InvalidCredentials`] on unknown email or wrong password.
    async fn authenticate(&self, email: &str, password: &str) -> Result<Account, AccountError>;

    async fn get(&self, id: AccountId) -> Result<Account, AccountError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AccountError>;

    /// All accounts, oldest first.
    async fn list_all(&self) -> Result<Vec<Account>, AccountError>;

    /// Replaces name and email of an existing account.
    async fn update(&self, account: &Account) -> Result<(), AccountError>;

    /// Ensures the configured administrator exists. Returns the generated
    /// password when one had to be created because none was configured.
    async fn provision_admin(&self, admin: &AdminConfig) -> Result<Option<String>, AccountError>;
}
