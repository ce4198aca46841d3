//! `SeaORM` implementation of the `LedgerService` trait.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::db::{CreditOutcome, DebitOutcome, Store};
use crate::domain::AccountId;
use crate::models::{CreditTransaction, TransactionKind};
use crate::services::ledger_service::{LedgerError, LedgerService};

pub struct SeaOrmLedgerService {
    store: Store,
}

impl SeaOrmLedgerService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl LedgerService for SeaOrmLedgerService {
    async fn debit(
        &self,
        account: AccountId,
        amount: i64,
        description: Option<String>,
    ) -> Result<i64, LedgerError> {
        if amount < 0 {
            return Err(LedgerError::Validation(
                "Debit amount cannot be negative".to_string(),
            ));
        }

        let current = self
            .store
            .get_account(account.value())
            .await?
            .ok_or(LedgerError::NotFound(account))?;

        if current.is_admin || amount == 0 {
            return Ok(current.credits);
        }

        match self
            .store
            .debit_credits(account.value(), amount, TransactionKind::Usage, description)
            .await?
        {
            DebitOutcome::Applied { balance_after } => {
                metrics::counter!("ledger_debits_total").increment(1);
                info!(
                    "Debited {} credits from account {} (balance {})",
                    amount, account, balance_after
                );
                Ok(balance_after)
            }
            DebitOutcome::Insufficient { balance } => {
                warn!(
                    "Refused debit of {} credits from account {} (balance {})",
                    amount, account, balance
                );
                Err(LedgerError::InsufficientCredits {
                    required: amount,
                    available: balance,
                })
            }
            DebitOutcome::NotFound => Err(LedgerError::NotFound(account)),
        }
    }

    async fn credit(
        &self,
        account: AccountId,
        amount: i64,
        kind: TransactionKind,
        description: Option<String>,
    ) -> Result<i64, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::Validation(
                "Credit amount must be greater than zero".to_string(),
            ));
        }

        let balance = match self
            .store
            .credit_credits(account.value(), amount, kind, description)
            .await?
        {
            CreditOutcome::Applied { balance_after } => balance_after,
            CreditOutcome::Overflow { balance } => {
                warn!(
                    "Refused to credit {} to account {}: balance {} would overflow",
                    amount, account, balance
                );
                return Err(LedgerError::Validation(format!(
                    "Crediting {amount} would overflow the balance of {balance}"
                )));
            }
            CreditOutcome::NotFound => return Err(LedgerError::NotFound(account)),
        };

        metrics::counter!("ledger_credits_total").increment(1);
        info!(
            "Credited {} credits to account {} ({}, balance {})",
            amount, account, kind, balance
        );
        Ok(balance)
    }

    async fn set_balance(&self, account: AccountId, amount: i64) -> Result<(), LedgerError> {
        if amount < 0 {
            return Err(LedgerError::Validation(
                "Credit balance cannot be negative".to_string(),
            ));
        }

        self.store
            .set_credits(account.value(), amount, Some("Set by administrator".to_string()))
            .await?
            .ok_or(LedgerError::NotFound(account))?;

        Ok(())
    }

    async fn balance(&self, account: AccountId) -> Result<i64, LedgerError> {
        self.store
            .get_account(account.value())
            .await?
            .map(|a| a.credits)
            .ok_or(LedgerError::NotFound(account))
    }

    async fn history(
        &self,
        account: AccountId,
        limit: u64,
    ) -> Result<Vec<CreditTransaction>, LedgerError> {
        if self.store.get_account(account.value()).await?.is_none() {
            return Err(LedgerError::NotFound(account));
        }

        Ok(self.store.credit_history(account.value(), limit).await?)
    }
}
