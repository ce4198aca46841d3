//! Domain service for the client session.
//!
//! Handles login, signup and logout. The session stores only the id of the
//! active account; account fields are read from the account store on every
//! access.

use serde::Serialize;
use thiserror::Error;

use crate::domain::Navigation;
use crate::models::Account;
use crate::services::account_service::AccountError;

/// Errors specific to session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("An account with this email already exists")]
    DuplicateEmail,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not logged in")]
    Unauthorized,

    #[error("Administrator access required")]
    Forbidden,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AccountError> for SessionError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::DuplicateEmail => Self::DuplicateEmail,
            AccountError::InvalidCredentials => Self::InvalidCredentials,
            AccountError::Validation(msg) => Self::Validation(msg),
            AccountError::NotFound(id) => Self::Internal(format!("Account {id} not found")),
            AccountError::Database(msg) => Self::Database(msg),
            AccountError::Internal(msg) => Self::Internal(msg),
        }
    }
}

impl From<anyhow::Error> for SessionError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Result of a login or signup.
#[derive(Debug, Clone, Serialize)]
pub struct SessionOutcome {
    pub account: Account,
    pub navigation: Navigation,
}

/// Domain service trait for the session.
#[async_trait::async_trait]
pub trait SessionService: Send + Sync {
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidCredentials`] and leaves the session
    /// untouched if authentication fails.
    async fn login(&self, email: &str, password: &str) -> Result<SessionOutcome, SessionError>;

    /// Validates the password policy, creates the account and logs in.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Validation`] for a short or mismatched
    /// password and [`SessionError::DuplicateEmail`] for a taken email.
    async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<SessionOutcome, SessionError>;

    async fn logout(&self) -> Result<Navigation, SessionError>;

    /// The logged-in account, if any.
    async fn current(&self) -> Result<Option<Account>, SessionError>;

    async fn require_account(&self) -> Result<Account, SessionError>;

    async fn require_admin(&self) -> Result<Account, SessionError>;
}
