use crate::entities::{credit_transactions, payment_requests, prelude::*};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_payment_requests_status")
                    .table(PaymentRequests)
                    .col(payment_requests::Column::Status)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_payment_requests_user_id")
                    .table(PaymentRequests)
                    .col(payment_requests::Column::UserId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_credit_transactions_account_id")
                    .table(CreditTransactions)
                    .col(credit_transactions::Column::AccountId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_credit_transactions_account_id")
                    .table(CreditTransactions)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_payment_requests_user_id")
                    .table(PaymentRequests)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_payment_requests_status")
                    .table(PaymentRequests)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}
