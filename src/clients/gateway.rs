//! Boundary to the external image-generation provider.

use std::fmt;
use thiserror::Error;

/// Why a provider call produced nothing usable.
///
/// The `Display` prefixes (`offline:`, `provider error:`, `no usable result:`)
/// are stable and can be matched on by callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayFailure {
    /// The provider could not be reached at all.
    Offline,
    /// The provider answered with an error or an abnormal completion.
    Provider(String),
    /// The call succeeded but returned no image.
    NoResult(String),
}

impl fmt::Display for GatewayFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Offline => write!(
                f,
                "offline: You appear to be offline. Please check your internet connection."
            ),
            Self::Provider(reason) => write!(f, "provider error: {reason}"),
            Self::NoResult(reason) => write!(f, "no usable result: {reason}"),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Failed to generate images: {0}")]
    Generation(GatewayFailure),

    #[error("Failed to edit image: {0}")]
    Edit(GatewayFailure),
}

impl GatewayError {
    #[must_use]
    pub const fn failure(&self) -> &GatewayFailure {
        match self {
            Self::Generation(f) | Self::Edit(f) => f,
        }
    }
}

/// Images returned by a generation call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedImages {
    /// Raw PNG bytes.
    pub images: Vec<Vec<u8>>,
    /// Set when some, but not all, requested images were withheld.
    pub partial_failure_note: Option<String>,
}

#[async_trait::async_trait]
pub trait ImageGateway: Send + Sync {
    /// Produces up to `count` images for `prompt`.
    ///
    /// # Errors
    ///
    /// Fails when not a single image could be produced.
    async fn generate(&self, prompt: &str, count: u32) -> Result<GeneratedImages, GatewayError>;

    /// Edits `image` according to `prompt` and returns the new image bytes.
    async fn edit(
        &self,
        prompt: &str,
        image: &[u8],
        mime_type: &str,
    ) -> Result<Vec<u8>, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_prefixes_are_stable() {
        let offline = GatewayError::Generation(GatewayFailure::Offline).to_string();
        assert!(offline.starts_with("Failed to generate images: offline: "));

        let provider = GatewayError::Edit(GatewayFailure::Provider("quota".to_string()));
        assert_eq!(
            provider.to_string(),
            "Failed to edit image: provider error: quota"
        );

        let empty = GatewayFailure::NoResult("nothing".to_string());
        assert!(empty.to_string().starts_with("no usable result: "));
    }
}
