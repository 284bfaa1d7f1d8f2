//! Domain entities - the send pipeline's business objects.

mod profile;
mod progress;
mod provider;
mod record;
mod send;
mod settings;

pub use profile::RateLimitProfile;
pub use progress::{LimiterStatus, Progress};
pub use provider::ProviderId;
pub use record::SendRecord;
pub use send::{SendParams, SendResult, SendStatus, SenderConfig};
pub use settings::{OutboundSettings, ProviderCredentials};
