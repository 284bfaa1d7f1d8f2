//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod history;
mod provider;

pub use history::{HistoryError, SendHistory};
pub use provider::{ProviderAdapter, ProviderError, RetryableErrorKind};
