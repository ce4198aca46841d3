use anyhow::{Context, Result};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{debug, info};

use crate::db::now_timestamp;
use crate::entities::{accounts, credit_transactions, prelude::*};
use crate::models::{CreditTransaction, TransactionKind};

/// Result of a guarded debit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebitOutcome {
    Applied { balance_after: i64 },
    Insufficient { balance: i64 },
    NotFound,
}

/// Result of a credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditOutcome {
    Applied { balance_after: i64 },
    /// The new balance would not fit in an `i64`; nothing was changed.
    Overflow { balance: i64 },
    NotFound,
}

pub struct LedgerRepository {
    conn: DatabaseConnection,
}

impl LedgerRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Subtracts `amount` iff the balance covers it.
    ///
    /// The check and the write are one `UPDATE ... WHERE credits >= amount`
    /// statement, so two concurrent debits can never both spend the same
    /// credits.
    pub async fn debit(
        &self,
        account_id: i32,
        amount: i64,
        kind: TransactionKind,
        description: Option<String>,
    ) -> Result<DebitOutcome> {
        let txn = self.conn.begin().await?;

        let result = Accounts::update_many()
            .col_expr(
                accounts::Column::Credits,
                Expr::col(accounts::Column::Credits).sub(amount),
            )
            .col_expr(accounts::Column::UpdatedAt, Expr::value(now_timestamp()))
            .filter(accounts::Column::Id.eq(account_id))
            .filter(accounts::Column::Credits.gte(amount))
            .exec(&txn)
            .await
            .context("Failed to debit account")?;

        if result.rows_affected == 0 {
            let balance = current_balance(&txn, account_id).await?;
            txn.rollback().await?;
            return Ok(balance.map_or(DebitOutcome::NotFound, |balance| {
                DebitOutcome::Insufficient { balance }
            }));
        }

        let balance_after = current_balance(&txn, account_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Account {account_id} vanished during debit"))?;

        append_journal(&txn, account_id, kind, -amount, balance_after, description).await?;
        txn.commit().await?;

        debug!(
            "Debited {} credits from account {} (balance {})",
            amount, account_id, balance_after
        );
        Ok(DebitOutcome::Applied { balance_after })
    }

    /// Adds `amount` to the balance.
    pub async fn credit(
        &self,
        account_id: i32,
        amount: i64,
        kind: TransactionKind,
        description: Option<String>,
    ) -> Result<CreditOutcome> {
        let txn = self.conn.begin().await?;

        let outcome = credit_in(&txn, account_id, amount, kind, description).await?;
        if matches!(outcome, CreditOutcome::Applied { .. }) {
            txn.commit().await?;
        } else {
            txn.rollback().await?;
        }

        Ok(outcome)
    }

    /// Replaces the balance outright. Returns the previous balance, or `None`
    /// if the account does not exist.
    pub async fn set_balance(
        &self,
        account_id: i32,
        new_balance: i64,
        description: Option<String>,
    ) -> Result<Option<i64>> {
        let txn = self.conn.begin().await?;

        let Some(previous) = current_balance(&txn, account_id).await? else {
            txn.rollback().await?;
            return Ok(None);
        };

        Accounts::update_many()
            .col_expr(accounts::Column::Credits, Expr::value(new_balance))
            .col_expr(accounts::Column::UpdatedAt, Expr::value(now_timestamp()))
            .filter(accounts::Column::Id.eq(account_id))
            .exec(&txn)
            .await
            .context("Failed to set account balance")?;

        append_journal(
            &txn,
            account_id,
            TransactionKind::AdminSet,
            new_balance - previous,
            new_balance,
            description,
        )
        .await?;

        txn.commit().await?;

        info!(
            "Balance of account {} set {} -> {}",
            account_id, previous, new_balance
        );
        Ok(Some(previous))
    }

    /// Journal entries for an account, newest first.
    pub async fn history(&self, account_id: i32, limit: u64) -> Result<Vec<CreditTransaction>> {
        let rows = CreditTransactions::find()
            .filter(credit_transactions::Column::AccountId.eq(account_id))
            .order_by_desc(credit_transactions::Column::Id)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to query credit history")?;

        rows.into_iter().map(CreditTransaction::try_from).collect()
    }
}

/// Credits an account on an existing connection or transaction.
///
/// Used by the payment workflow so that approval and the credit grant commit
/// together. The update only matches while `credits + amount` still fits in
/// an `i64`; SQLite would otherwise silently widen the column to REAL.
pub(crate) async fn credit_in<C: ConnectionTrait>(
    db: &C,
    account_id: i32,
    amount: i64,
    kind: TransactionKind,
    description: Option<String>,
) -> Result<CreditOutcome> {
    let result = Accounts::update_many()
        .col_expr(
            accounts::Column::Credits,
            Expr::col(accounts::Column::Credits).add(amount),
        )
        .col_expr(accounts::Column::UpdatedAt, Expr::value(now_timestamp()))
        .filter(accounts::Column::Id.eq(account_id))
        .filter(accounts::Column::Credits.lte(i64::MAX.saturating_sub(amount)))
        .exec(db)
        .await
        .context("Failed to credit account")?;

    if result.rows_affected == 0 {
        let balance = current_balance(db, account_id).await?;
        return Ok(balance.map_or(CreditOutcome::NotFound, |balance| {
            CreditOutcome::Overflow { balance }
        }));
    }

    let balance_after = current_balance(db, account_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Account {account_id} vanished during credit"))?;

    append_journal(db, account_id, kind, amount, balance_after, description).await?;

    debug!(
        "Credited {} to account {} (balance {})",
        amount, account_id, balance_after
    );
    Ok(CreditOutcome::Applied { balance_after })
}

pub(crate) async fn append_journal<C: ConnectionTrait>(
    db: &C,
    account_id: i32,
    kind: TransactionKind,
    amount: i64,
    balance_after: i64,
    description: Option<String>,
) -> Result<()> {
    credit_transactions::ActiveModel {
        account_id: Set(account_id),
        kind: Set(kind.as_str().to_string()),
        amount: Set(amount),
        balance_after: Set(balance_after),
        description: Set(description),
        created_at: Set(now_timestamp()),
        ..Default::default()
    }
    .insert(db)
    .await
    .context("Failed to append credit journal entry")?;

    Ok(())
}

async fn current_balance<C: ConnectionTrait>(db: &C, account_id: i32) -> Result<Option<i64>> {
    let account = Accounts::find_by_id(account_id)
        .one(db)
        .await
        .context("Failed to read account balance")?;

    Ok(account.map(|a| a.credits))
}
