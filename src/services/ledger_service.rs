//! Domain service for the credit ledger.
//!
//! The only path through which balances change. Every mutation is applied
//! against the stored account record; nothing else holds a copy of the
//! balance.

use thiserror::Error;

use crate::domain::AccountId;
use crate::models::{CreditTransaction, TransactionKind};

/// Errors specific to ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Insufficient credits: {required} required, {available} available")]
    InsufficientCredits { required: i64, available: i64 },

    #[error("Account not found: {0}")]
    NotFound(AccountId),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for LedgerError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for LedgerError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Domain service trait for the ledger.
#[async_trait::async_trait]
pub trait LedgerService: Send + Sync {
    /// Spends `amount` credits and returns the resulting balance.
    ///
    /// Administrators always succeed and their balance is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InsufficientCredits`] if the balance does not
    /// cover `amount`; the balance is unchanged in that case.
    async fn debit(
        &self,
        account: AccountId,
        amount: i64,
        description: Option<String>,
    ) -> Result<i64, LedgerError>;

    /// Adds `amount` (> 0) credits and returns the resulting balance.
    async fn credit(
        &self,
        account: AccountId,
        amount: i64,
        kind: TransactionKind,
        description: Option<String>,
    ) -> Result<i64, LedgerError>;

    /// Administrative override of the balance (`amount >= 0`).
    async fn set_balance(&self, account: AccountId, amount: i64) -> Result<(), LedgerError>;

    async fn balance(&self, account: AccountId) -> Result<i64, LedgerError>;

    /// Journal entries, newest first.
    async fn history(
        &self,
        account: AccountId,
        limit: u64,
    ) -> Result<Vec<CreditTransaction>, LedgerError>;
}
