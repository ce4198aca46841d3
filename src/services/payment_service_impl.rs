//! `SeaORM` implementation of the `PaymentService` trait.

use async_trait::async_trait;
use tracing::warn;

use crate::config::{PlanConfig, find_plan};
use crate::db::{Store, TransitionOutcome};
use crate::domain::{AccountId, RequestId};
use crate::models::{Account, NewPaymentRequest, PaymentRequest, PaymentStatus};
use crate::services::payment_service::{PaymentError, PaymentService};

pub struct SeaOrmPaymentService {
    store: Store,
    plans: Vec<PlanConfig>,
}

impl SeaOrmPaymentService {
    #[must_use]
    pub const fn new(store: Store, plans: Vec<PlanConfig>) -> Self {
        Self { store, plans }
    }

    fn finish(
        id: RequestId,
        outcome: TransitionOutcome,
        status: PaymentStatus,
    ) -> Result<PaymentRequest, PaymentError> {
        match outcome {
            TransitionOutcome::Applied(request) => {
                metrics::counter!("payment_requests_total", "status" => status.as_str())
                    .increment(1);
                Ok(request)
            }
            TransitionOutcome::NotFound => Err(PaymentError::NotFound(id)),
            TransitionOutcome::AlreadyFinalized(current) => {
                warn!(
                    "Refused to mark payment request {} {}: already {}",
                    id, status, current
                );
                Err(PaymentError::AlreadyFinalized {
                    id,
                    status: current,
                })
            }
            TransitionOutcome::AccountMissing(user_id) => {
                Err(PaymentError::AccountNotFound(AccountId::new(user_id)))
            }
            TransitionOutcome::BalanceOverflow { user_id, balance } => {
                warn!(
                    "Refused to approve payment request {}: account {} balance {} would overflow",
                    id, user_id, balance
                );
                Err(PaymentError::Validation(format!(
                    "Approving request {id} would overflow the balance of account {user_id}"
                )))
            }
        }
    }
}

#[async_trait]
impl PaymentService for SeaOrmPaymentService {
    async fn submit(
        &self,
        account: &Account,
        plan: &str,
        transaction_ref: &str,
    ) -> Result<PaymentRequest, PaymentError> {
        let transaction_ref = transaction_ref.trim();
        if transaction_ref.is_empty() {
            return Err(PaymentError::Validation(
                "Please enter the UTR/Transaction ID".to_string(),
            ));
        }

        let plan = find_plan(&self.plans, plan)
            .ok_or_else(|| PaymentError::Validation(format!("Unknown plan: {}", plan.trim())))?;

        let request = self
            .store
            .create_payment_request(NewPaymentRequest {
                user_id: account.id,
                user_email: account.email.clone(),
                plan: plan.name.clone(),
                amount: plan.price,
                credits: plan.credits,
                transaction_ref: transaction_ref.to_string(),
            })
            .await?;

        metrics::counter!("payment_requests_total", "status" => "pending").increment(1);
        Ok(request)
    }

    async fn get(&self, id: RequestId) -> Result<PaymentRequest, PaymentError> {
        self.store
            .get_payment_request(id.value())
            .await?
            .ok_or(PaymentError::NotFound(id))
    }

    async fn list_pending(&self) -> Result<Vec<PaymentRequest>, PaymentError> {
        Ok(self
            .store
            .list_payment_requests_by_status(PaymentStatus::Pending)
            .await?)
    }

    async fn list_all(&self) -> Result<Vec<PaymentRequest>, PaymentError> {
        Ok(self.store.list_payment_requests().await?)
    }

    async fn list_for_account(
        &self,
        account: AccountId,
    ) -> Result<Vec<PaymentRequest>, PaymentError> {
        Ok(self
            .store
            .list_payment_requests_for_account(account.value())
            .await?)
    }

    async fn approve(&self, id: RequestId) -> Result<PaymentRequest, PaymentError> {
        let outcome = self.store.approve_payment_request(id.value()).await?;
        Self::finish(id, outcome, PaymentStatus::Approved)
    }

    async fn reject(&self, id: RequestId) -> Result<PaymentRequest, PaymentError> {
        let outcome = self.store.reject_payment_request(id.value()).await?;
        Self::finish(id, outcome, PaymentStatus::Rejected)
    }
}
