//! Default implementation of the `GenerationService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::clients::{GatewayError, ImageGateway};
use crate::config::CreditsConfig;
use crate::models::style::{apply_style, find_style};
use crate::models::{Account, TransactionKind};
use crate::services::generation_service::{
    EditOutcome, GenerationError, GenerationOutcome, GenerationService,
};
use crate::services::ledger_service::LedgerService;

pub struct DefaultGenerationService {
    ledger: Arc<dyn LedgerService>,
    gateway: Arc<dyn ImageGateway>,
    credits: CreditsConfig,
}

impl DefaultGenerationService {
    #[must_use]
    pub fn new(
        ledger: Arc<dyn LedgerService>,
        gateway: Arc<dyn ImageGateway>,
        credits: CreditsConfig,
    ) -> Self {
        Self {
            ledger,
            gateway,
            credits,
        }
    }

    /// Re-credits a failed request when configured to. Administrators were
    /// never charged, so they are skipped.
    async fn settle_failure(&self, account: &Account, cost: i64, err: &GatewayError) {
        if !self.credits.refund_on_failure || account.is_admin || cost == 0 {
            warn!(
                "Gateway call for account {} failed, {} credits not refunded: {}",
                account.id, cost, err
            );
            return;
        }

        match self
            .ledger
            .credit(
                account.id,
                cost,
                TransactionKind::Refund,
                Some(err.failure().to_string()),
            )
            .await
        {
            Ok(balance) => info!(
                "Refunded {} credits to account {} (balance {})",
                cost, account.id, balance
            ),
            Err(e) => warn!("Failed to refund account {}: {}", account.id, e),
        }
    }
}

fn require_prompt(prompt: &str) -> Result<(), GenerationError> {
    if prompt.trim().is_empty() {
        return Err(GenerationError::Validation(
            "Prompt cannot be empty".to_string(),
        ));
    }
    Ok(())
}

#[async_trait]
impl GenerationService for DefaultGenerationService {
    async fn generate(
        &self,
        account: &Account,
        prompt: &str,
        count: u32,
        style: Option<&str>,
    ) -> Result<GenerationOutcome, GenerationError> {
        require_prompt(prompt)?;

        let max = self.credits.max_images_per_request;
        if count == 0 || count > max {
            return Err(GenerationError::Validation(format!(
                "Number of images must be between 1 and {max}"
            )));
        }

        let preset = match style {
            Some(id) => Some(
                find_style(id)
                    .ok_or_else(|| GenerationError::Validation(format!("Unknown style: {id}")))?,
            ),
            None => None,
        };
        let full_prompt = apply_style(prompt, preset);

        let cost = self.credits.generation_cost * i64::from(count);
        let balance = self
            .ledger
            .debit(
                account.id,
                cost,
                Some(format!("Generated {count} image(s)")),
            )
            .await?;

        match self.gateway.generate(&full_prompt, count).await {
            Ok(result) => {
                info!(
                    "Account {} generated {} of {} image(s)",
                    account.id,
                    result.images.len(),
                    count
                );
                Ok(GenerationOutcome {
                    images: result.images,
                    partial_failure_note: result.partial_failure_note,
                    credits_spent: if account.is_admin { 0 } else { cost },
                    balance,
                })
            }
            Err(e) => {
                self.settle_failure(account, cost, &e).await;
                Err(e.into())
            }
        }
    }

    async fn edit(
        &self,
        account: &Account,
        prompt: &str,
        image: &[u8],
        mime_type: &str,
    ) -> Result<EditOutcome, GenerationError> {
        require_prompt(prompt)?;

        if image.is_empty() {
            return Err(GenerationError::Validation(
                "Source image is empty".to_string(),
            ));
        }
        if !mime_type.starts_with("image/") {
            return Err(GenerationError::Validation(format!(
                "Unsupported file type: {mime_type}"
            )));
        }

        let cost = self.credits.edit_cost;
        let balance = self
            .ledger
            .debit(account.id, cost, Some("Edited an image".to_string()))
            .await?;

        match self.gateway.edit(prompt.trim(), image, mime_type).await {
            Ok(image) => {
                info!("Account {} edited an image", account.id);
                Ok(EditOutcome {
                    image,
                    credits_spent: if account.is_admin { 0 } else { cost },
                    balance,
                })
            }
            Err(e) => {
                self.settle_failure(account, cost, &e).await;
                Err(e.into())
            }
        }
    }
}
