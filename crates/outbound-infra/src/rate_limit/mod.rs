//! Rate-limited send queue: token bucket, per-provider limiter and registry.

mod bucket;
mod limiter;
mod registry;

pub use bucket::TokenBucket;
pub use limiter::{ProgressObserver, RateLimiter, SendHandle};
pub use registry::{LimiterRegistry, LimiterRegistryBuilder, RegistryError};
