use anyhow::{Context, Result};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use crate::db::now_timestamp;
use crate::entities::{prelude::*, session};

const SESSION_ROW: i32 = 1;

/// Persists which account is logged in on this client. Only the id is
/// stored; account fields are always read from the accounts table.
pub struct SessionRepository {
    conn: DatabaseConnection,
}

impl SessionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn active_account_id(&self) -> Result<Option<i32>> {
        let row = Session::find_by_id(SESSION_ROW)
            .one(&self.conn)
            .await
            .context("Failed to read session")?;

        Ok(row.and_then(|r| r.account_id))
    }

    pub async fn set_active_account_id(&self, account_id: Option<i32>) -> Result<()> {
        Session::update_many()
            .col_expr(session::Column::AccountId, Expr::value(account_id))
            .col_expr(session::Column::UpdatedAt, Expr::value(now_timestamp()))
            .filter(session::Column::Id.eq(SESSION_ROW))
            .exec(&self.conn)
            .await
            .context("Failed to write session")?;

        Ok(())
    }
}
