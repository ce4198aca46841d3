//! Domain service for manual credit purchases.
//!
//! A user submits a claim (plan + bank transfer reference), an administrator
//! approves or rejects it. Approval grants the plan's credits through the
//! ledger in the same transaction as the status change.

use thiserror::Error;

use crate::domain::{AccountId, RequestId};
use crate::models::{Account, PaymentRequest, PaymentStatus};

/// Errors specific to payment request operations.
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Payment request not found: {0}")]
    NotFound(RequestId),

    #[error("Payment request {id} is already {status}")]
    AlreadyFinalized { id: RequestId, status: PaymentStatus },

    #[error("Requesting account {0} no longer exists")]
    AccountNotFound(AccountId),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for PaymentError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for PaymentError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Domain service trait for payment requests.
#[async_trait::async_trait]
pub trait PaymentService: Send + Sync {
    /// Records a pending claim for `plan` paid with `transaction_ref`.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::Validation`] for a blank reference or an
    /// unknown plan; nothing is stored in that case.
    async fn submit(
        &self,
        account: &Account,
        plan: &str,
        transaction_ref: &str,
    ) -> Result<PaymentRequest, PaymentError>;

    async fn get(&self, id: RequestId) -> Result<PaymentRequest, PaymentError>;

    /// Pending requests, newest first.
    async fn list_pending(&self) -> Result<Vec<PaymentRequest>, PaymentError>;

    /// All requests, newest first.
    async fn list_all(&self) -> Result<Vec<PaymentRequest>, PaymentError>;

    async fn list_for_account(
        &self,
        account: AccountId,
    ) -> Result<Vec<PaymentRequest>, PaymentError>;

    /// # Errors
    ///
    /// Returns [`PaymentError::AlreadyFinalized`] unless the request is pending.
    async fn approve(&self, id: RequestId) -> Result<PaymentRequest, PaymentError>;

    /// # Errors
    ///
    /// Returns [`PaymentError::AlreadyFinalized`] unless the request is pending.
    async fn reject(&self, id: RequestId) -> Result<PaymentRequest, PaymentError>;
}
