use std::sync::Arc;

use crate::clients::{GeminiClient, ImageGateway};
use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AccountService, DefaultGenerationService, GenerationService, LedgerService, PaymentService,
    SeaOrmAccountService, SeaOrmLedgerService, SeaOrmPaymentService, SeaOrmSessionService,
    SessionService,
};

/// Build a shared HTTP client for the image gateway.
fn build_shared_http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .user_agent(concat!("Division/", env!("CARGO_PKG_VERSION")))
        .pool_max_idle_per_host(4)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub accounts: Arc<dyn AccountService>,

    pub ledger: Arc<dyn LedgerService>,

    pub payments: Arc<dyn PaymentService>,

    pub sessions: Arc<dyn SessionService>,

    pub generation: Arc<dyn GenerationService>,

    /// Administrator password generated during this start-up, if any. It is
    /// never stored in plain text, so this is the only chance to show it.
    pub bootstrap_password: Option<String>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let http_client = build_shared_http_client(config.gateway.request_timeout_seconds)?;
        let gateway = Arc::new(GeminiClient::new(http_client, &config.gateway));
        Self::with_gateway(config, gateway).await
    }

    /// Builds the state around an arbitrary gateway implementation.
    pub async fn with_gateway(
        config: Config,
        gateway: Arc<dyn ImageGateway>,
    ) -> anyhow::Result<Self> {
        let store = Store::from_config(&config).await?;

        let accounts: Arc<dyn AccountService> = Arc::new(SeaOrmAccountService::new(
            store.clone(),
            config.security.clone(),
            config.credits.signup_bonus,
        ));

        let bootstrap_password = accounts
            .provision_admin(&config.admin)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to provision administrator: {e}"))?;

        let ledger: Arc<dyn LedgerService> = Arc::new(SeaOrmLedgerService::new(store.clone()));

        let payments: Arc<dyn PaymentService> = Arc::new(SeaOrmPaymentService::new(
            store.clone(),
            config.plans.clone(),
        ));

        let sessions: Arc<dyn SessionService> = Arc::new(SeaOrmSessionService::new(
            store.clone(),
            accounts.clone(),
            config.security.min_password_length,
        ));

        let generation: Arc<dyn GenerationService> = Arc::new(DefaultGenerationService::new(
            ledger.clone(),
            gateway,
            config.credits.clone(),
        ));

        Ok(Self {
            config: Arc::new(config),
            store,
            accounts,
            ledger,
            payments,
            sessions,
            generation,
            bootstrap_password,
        })
    }
}
