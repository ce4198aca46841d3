use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Accounts)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(PaymentRequests)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(CreditTransactions)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Session)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // The session table always holds exactly one row.
        let insert = sea_orm_migration::sea_query::Query::insert()
            .into_table(Session)
            .columns([
                crate::entities::session::Column::Id,
                crate::entities::session::Column::UpdatedAt,
            ])
            .values_panic([1.into(), chrono::Utc::now().to_rfc3339().into()])
            .to_owned();

        manager.exec_stmt(insert).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Session).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CreditTransactions).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PaymentRequests).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts).to_owned())
            .await?;

        Ok(())
    }
}
