//! Domain service for paid image generation and editing.
//!
//! Composes the ledger and the image gateway: credits are debited before the
//! provider is called.

use thiserror::Error;

use crate::clients::GatewayError;
use crate::models::Account;
use crate::services::ledger_service::LedgerError;

/// Errors specific to generation requests.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Insufficient credits: {required} required, {available} available")]
    InsufficientCredits { required: i64, available: i64 },

    #[error(transparent)]
    Gateway(GatewayError),

    #[error("Ledger error: {0}")]
    Ledger(LedgerError),
}

impl From<LedgerError> for GenerationError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientCredits {
                required,
                available,
            } => Self::InsufficientCredits {
                required,
                available,
            },
            LedgerError::Validation(msg) => Self::Validation(msg),
            other => Self::Ledger(other),
        }
    }
}

impl From<GatewayError> for GenerationError {
    fn from(err: GatewayError) -> Self {
        Self::Gateway(err)
    }
}

/// Images produced by a paid generation.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub images: Vec<Vec<u8>>,
    pub partial_failure_note: Option<String>,
    pub credits_spent: i64,
    pub balance: i64,
}

/// Result of a paid edit.
#[derive(Debug, Clone)]
pub struct EditOutcome {
    pub image: Vec<u8>,
    pub credits_spent: i64,
    pub balance: i64,
}

#[async_trait::async_trait]
pub trait GenerationService: Send + Sync {
    /// Charges `count * generation_cost` and asks the gateway for `count`
    /// images. `style` names an optional preset appended to the prompt.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::InsufficientCredits`] without calling the
    /// gateway if the balance is too low, and [`GenerationError::Gateway`]
    /// if the provider produced nothing.
    async fn generate(
        &self,
        account: &Account,
        prompt: &str,
        count: u32,
        style: Option<&str>,
    ) -> Result<GenerationOutcome, GenerationError>;

    /// Charges `edit_cost` and asks the gateway to edit `image`.
    async fn edit(
        &self,
        account: &Account,
        prompt: &str,
        image: &[u8],
        mime_type: &str,
    ) -> Result<EditOutcome, GenerationError>;
}
