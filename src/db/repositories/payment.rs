use anyhow::{Context, Result};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::info;

use crate::db::now_timestamp;
use crate::db::repositories::ledger::{CreditOutcome, credit_in};
use crate::entities::{payment_requests, prelude::*};
use crate::models::{NewPaymentRequest, PaymentRequest, PaymentStatus, TransactionKind};

/// Result of trying to move a request out of `pending`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    Applied(PaymentRequest),
    NotFound,
    AlreadyFinalized(PaymentStatus),
    /// The requesting account no longer exists; nothing was changed.
    AccountMissing(i32),
    /// Granting the credits would overflow the requester's balance.
    BalanceOverflow { user_id: i32, balance: i64 },
}

/// Repository for payment request operations
pub struct PaymentRepository {
    conn: DatabaseConnection,
}

impl PaymentRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, request: NewPaymentRequest) -> Result<PaymentRequest> {
        let model = payment_requests::ActiveModel {
            user_id: Set(request.user_id.value()),
            user_email: Set(request.user_email),
            plan: Set(request.plan),
            amount: Set(request.amount),
            credits: Set(request.credits),
            transaction_ref: Set(request.transaction_ref),
            status: Set(PaymentStatus::Pending.as_str().to_string()),
            created_at: Set(now_timestamp()),
            resolved_at: Set(None),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert payment request")?;

        info!(
            "Payment request {} submitted by account {} for '{}'",
            model.id, model.user_id, model.plan
        );
        PaymentRequest::try_from(model)
    }

    pub async fn get(&self, id: i32) -> Result<Option<PaymentRequest>> {
        PaymentRequests::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query payment request")?
            .map(PaymentRequest::try_from)
            .transpose()
    }

    /// Newest first; requests submitted in the same instant are ordered by
    /// id, newest first.
    pub async fn list_all(&self) -> Result<Vec<PaymentRequest>> {
        let rows = PaymentRequests::find()
            .order_by_desc(payment_requests::Column::CreatedAt)
            .order_by_desc(payment_requests::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list payment requests")?;

        rows.into_iter().map(PaymentRequest::try_from).collect()
    }

    pub async fn list_by_status(&self, status: PaymentStatus) -> Result<Vec<PaymentRequest>> {
        let rows = PaymentRequests::find()
            .filter(payment_requests::Column::Status.eq(status.as_str()))
            .order_by_desc(payment_requests::Column::CreatedAt)
            .order_by_desc(payment_requests::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list payment requests by status")?;

        rows.into_iter().map(PaymentRequest::try_from).collect()
    }

    pub async fn list_for_account(&self, user_id: i32) -> Result<Vec<PaymentRequest>> {
        let rows = PaymentRequests::find()
            .filter(payment_requests::Column::UserId.eq(user_id))
            .order_by_desc(payment_requests::Column::CreatedAt)
            .order_by_desc(payment_requests::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list payment requests for account")?;

        rows.into_iter().map(PaymentRequest::try_from).collect()
    }

    /// Marks a pending request approved and credits the requester with the
    /// snapshotted credit quantity, in one transaction.
    pub async fn approve(&self, id: i32) -> Result<TransitionOutcome> {
        let txn = self.conn.begin().await?;

        if let Some(outcome) = Self::close_pending(&txn, id, PaymentStatus::Approved).await? {
            txn.rollback().await?;
            return Ok(outcome);
        }

        let model = PaymentRequests::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Payment request {id} vanished during approval"))?;

        let granted = credit_in(
            &txn,
            model.user_id,
            model.credits,
            TransactionKind::Purchase,
            Some(format!("{} (request #{}, UTR {})", model.plan, model.id, model.transaction_ref)),
        )
        .await?;

        match granted {
            CreditOutcome::Applied { .. } => {}
            CreditOutcome::NotFound => {
                txn.rollback().await?;
                return Ok(TransitionOutcome::AccountMissing(model.user_id));
            }
            CreditOutcome::Overflow { balance } => {
                txn.rollback().await?;
                return Ok(TransitionOutcome::BalanceOverflow {
                    user_id: model.user_id,
                    balance,
                });
            }
        }

        txn.commit().await?;

        info!(
            "Payment request {} approved: {} credits to account {}",
            model.id, model.credits, model.user_id
        );
        Ok(TransitionOutcome::Applied(PaymentRequest::try_from(model)?))
    }

    pub async fn reject(&self, id: i32) -> Result<TransitionOutcome> {
        let txn = self.conn.begin().await?;

        if let Some(outcome) = Self::close_pending(&txn, id, PaymentStatus::Rejected).await? {
            txn.rollback().await?;
            return Ok(outcome);
        }

        let model = PaymentRequests::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Payment request {id} vanished during rejection"))?;

        txn.commit().await?;

        info!("Payment request {} rejected", model.id);
        Ok(TransitionOutcome::Applied(PaymentRequest::try_from(model)?))
    }

    /// Guarded `pending -> to` update. Returns `None` when the transition was
    /// applied, otherwise the reason it was not.
    async fn close_pending(
        txn: &DatabaseTransaction,
        id: i32,
        to: PaymentStatus,
    ) -> Result<Option<TransitionOutcome>> {
        let result = PaymentRequests::update_many()
            .col_expr(payment_requests::Column::Status, Expr::value(to.as_str()))
            .col_expr(
                payment_requests::Column::ResolvedAt,
                Expr::value(Some(now_timestamp())),
            )
            .filter(payment_requests::Column::Id.eq(id))
            .filter(payment_requests::Column::Status.eq(PaymentStatus::Pending.as_str()))
            .exec(txn)
            .await
            .context("Failed to update payment request status")?;

        if result.rows_affected > 0 {
            return Ok(None);
        }

        let existing = PaymentRequests::find_by_id(id).one(txn).await?;
        Ok(Some(match existing {
            None => TransitionOutcome::NotFound,
            Some(model) => TransitionOutcome::AlreadyFinalized(model.status.parse()?),
        }))
    }
}
