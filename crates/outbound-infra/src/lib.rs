//! # Outbound Infrastructure
//!
//! The rate-limited send queue plus concrete implementations of the ports
//! defined in `outbound-core`.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - Limiter and in-memory history only, no HTTP client
//! - `providers` - Instantly and Smartlead adapters via reqwest

pub mod history;
pub mod rate_limit;

#[cfg(feature = "providers")]
pub mod providers;

pub use history::InMemorySendHistory;
pub use rate_limit::{
    LimiterRegistry, LimiterRegistryBuilder, ProgressObserver, RateLimiter, RegistryError,
    SendHandle, TokenBucket,
};

#[cfg(feature = "providers")]
pub use providers::{InstantlyAdapter, SmartleadAdapter, http_client};
