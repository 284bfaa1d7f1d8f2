//! Provider adapter port.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{ProviderId, SendParams, SendResult, SenderConfig};

/// Provider adapter trait - abstraction over campaign-sending APIs.
///
/// Implementations are stateless and shared across limiters.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Which provider this adapter talks to.
    fn id(&self) -> ProviderId;

    /// Synchronous pre-flight check run before a request is queued.
    fn validate_config(&self, config: &SenderConfig) -> Result<(), ProviderError>;

    /// Push one lead to the provider.
    ///
    /// Terminal outcomes (created, duplicate, rejected lead) come back as `Ok`.
    /// Rate limiting and transport failures come back as `Err` so the caller
    /// can retry them.
    async fn send_lead(
        &self,
        config: &SenderConfig,
        params: &SendParams,
    ) -> Result<SendResult, ProviderError>;

    /// Whether leads are pushed into a campaign (and so need a campaign id).
    fn supports_campaigns(&self) -> bool;
}

/// The retryable failure classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryableErrorKind {
    RateLimited,
    Transport,
}

/// Provider call errors.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Provider rate limit: {detail}")]
    RateLimited {
        detail: String,
        retry_after: Option<Duration>,
    },

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Provider call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid sender config: {0}")]
    InvalidConfig(String),

    #[error("Provider rejected lead ({status}): {detail}")]
    Rejected { status: u16, detail: String },
}

impl ProviderError {
    pub fn rate_limited(detail: impl Into<String>) -> Self {
        Self::RateLimited {
            detail: detail.into(),
            retry_after: None,
        }
    }

    /// `Some` if the failure should go through backoff and requeue.
    pub fn retry_kind(&self) -> Option<RetryableErrorKind> {
        match self {
            ProviderError::RateLimited { .. } => Some(RetryableErrorKind::RateLimited),
            ProviderError::Transport(_) | ProviderError::Timeout(_) => {
                Some(RetryableErrorKind::Transport)
            }
            ProviderError::InvalidConfig(_) | ProviderError::Rejected { .. } => None,
        }
    }

    /// Provider-suggested wait, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ProviderError::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_kind() {
        assert_eq!(
            ProviderError::rate_limited("slow down").retry_kind(),
            Some(RetryableErrorKind::RateLimited)
        );
        assert_eq!(
            ProviderError::Timeout(Duration::from_secs(1)).retry_kind(),
            Some(RetryableErrorKind::Transport)
        );
        assert_eq!(
            ProviderError::Rejected {
                status: 400,
                detail: "bad email".into()
            }
            .retry_kind(),
            None
        );
        assert_eq!(ProviderError::InvalidConfig("x".into()).retry_kind(), None);
    }
}
