//! Domain-level error types.

use std::time::Duration;

use thiserror::Error;

use crate::domain::ProviderId;

/// Domain errors - invalid input reaching the core.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),
}

/// Why a queued send was rejected instead of resolved.
///
/// This is the only error a caller awaiting a send handle can observe; every
/// other outcome arrives as a `SendResult`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Send aborted before dispatch")]
    Aborted,

    #[error("Batch was reset before dispatch")]
    BatchReset,

    #[error("Limiter dropped the request without answering")]
    Dropped,
}

/// Sender resolution errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("No sending provider is configured")]
    NoProviderConfigured,

    #[error("Missing credentials for provider {0}")]
    MissingCredentials(ProviderId),

    #[error("Missing campaign id for provider {0}")]
    MissingCampaign(ProviderId),
}

/// A rate profile the limiter cannot run with.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProfileError {
    #[error("max_tokens must be at least 1, got {0}")]
    MaxTokens(f64),

    #[error("refill_rate_per_second must be finite and positive, got {0}")]
    RefillRate(f64),

    #[error("initial_backoff {initial:?} exceeds max_backoff {max:?}")]
    Backoff { initial: Duration, max: Duration },
}
