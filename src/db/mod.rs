use anyhow::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::{Config, SecurityConfig};
use crate::models::{Account, CreditTransaction, NewPaymentRequest, PaymentRequest, PaymentStatus, TransactionKind};

pub mod migrator;
pub mod repositories;

pub use repositories::account::{NewAccount, ProfileUpdate, generate_password, hash_password};
pub use repositories::ledger::{CreditOutcome, DebitOutcome};
pub use repositories::payment::TransitionOutcome;

/// Fixed-width UTC timestamp, so stored values sort lexicographically.
#[must_use]
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn from_config(config: &Config) -> Result<Self> {
        Self::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let path_str = db_url.trim_start_matches("sqlite:");
        if !path_str.starts_with(":memory:") {
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    fn account_repo(&self) -> repositories::account::AccountRepository {
        repositories::account::AccountRepository::new(self.conn.clone())
    }

    fn ledger_repo(&self) -> repositories::ledger::LedgerRepository {
        repositories::ledger::LedgerRepository::new(self.conn.clone())
    }

    fn payment_repo(&self) -> repositories::payment::PaymentRepository {
        repositories::payment::PaymentRepository::new(self.conn.clone())
    }

    fn session_repo(&self) -> repositories::session::SessionRepository {
        repositories::session::SessionRepository::new(self.conn.clone())
    }

    // Accounts

    pub async fn create_account(
        &self,
        new: NewAccount<'_>,
        security: &SecurityConfig,
    ) -> Result<Option<Account>> {
        self.account_repo().create(new, security).await
    }

    pub async fn get_account(&self, id: i32) -> Result<Option<Account>> {
        self.account_repo().get_by_id(id).await
    }

    pub async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        self.account_repo().get_by_email(email).await
    }

    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        self.account_repo().list_all().await
    }

    pub async fn verify_account_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Account>> {
        self.account_repo().verify_password(email, password).await
    }

    pub async fn update_account(&self, account: &Account) -> Result<ProfileUpdate> {
        self.account_repo().update(account).await
    }

    pub async fn ensure_admin(
        &self,
        name: &str,
        email: &str,
        password: &str,
        security: &SecurityConfig,
    ) -> Result<bool> {
        self.account_repo()
            .ensure_admin(name, email, password, security)
            .await
    }

    pub async fn has_admin(&self) -> Result<bool> {
        self.account_repo().has_admin().await
    }

    // Ledger

    pub async fn debit_credits(
        &self,
        account_id: i32,
        amount: i64,
        kind: TransactionKind,
        description: Option<String>,
    ) -> Result<DebitOutcome> {
        self.ledger_repo()
            .debit(account_id, amount, kind, description)
            .await
    }

    pub async fn credit_credits(
        &self,
        account_id: i32,
        amount: i64,
        kind: TransactionKind,
        description: Option<String>,
    ) -> Result<CreditOutcome> {
        self.ledger_repo()
            .credit(account_id, amount, kind, description)
            .await
    }

    pub async fn set_credits(
        &self,
        account_id: i32,
        amount: i64,
        description: Option<String>,
    ) -> Result<Option<i64>> {
        self.ledger_repo()
            .set_balance(account_id, amount, description)
            .await
    }

    pub async fn credit_history(
        &self,
        account_id: i32,
        limit: u64,
    ) -> Result<Vec<CreditTransaction>> {
        self.ledger_repo().history(account_id, limit).await
    }

    // Payment requests

    pub async fn create_payment_request(&self, request: NewPaymentRequest) -> Result<PaymentRequest> {
        self.payment_repo().create(request).await
    }

    pub async fn get_payment_request(&self, id: i32) -> Result<Option<PaymentRequest>> {
        self.payment_repo().get(id).await
    }

    pub async fn list_payment_requests(&self) -> Result<Vec<PaymentRequest>> {
        self.payment_repo().list_all().await
    }

    pub async fn list_payment_requests_by_status(
        &self,
        status: PaymentStatus,
    ) -> Result<Vec<PaymentRequest>> {
        self.payment_repo().list_by_status(status).await
    }

    pub async fn list_payment_requests_for_account(
        &self,
        account_id: i32,
    ) -> Result<Vec<PaymentRequest>> {
        self.payment_repo().list_for_account(account_id).await
    }

    pub async fn approve_payment_request(&self, id: i32) -> Result<TransitionOutcome> {
        self.payment_repo().approve(id).await
    }

    pub async fn reject_payment_request(&self, id: i32) -> Result<TransitionOutcome> {
        self.payment_repo().reject(id).await
    }

    // Session

    pub async fn active_account_id(&self) -> Result<Option<i32>> {
        self.session_repo().active_account_id().await
    }

    pub async fn set_active_account_id(&self, account_id: Option<i32>) -> Result<()> {
        self.session_repo().set_active_account_id(account_id).await
    }
}
