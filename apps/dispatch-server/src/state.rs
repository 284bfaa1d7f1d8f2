//! Application state - shared across all handlers.

use std::sync::Arc;

use outbound_core::domain::{OutboundSettings, ProviderId};
use outbound_core::ports::{ProviderAdapter, SendHistory};
use outbound_infra::{
    InMemorySendHistory, InstantlyAdapter, LimiterRegistry, RegistryError, SmartleadAdapter,
    http_client,
};

use crate::config::AppConfig;

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<LimiterRegistry>,
    pub settings: Arc<OutboundSettings>,
    pub history: Arc<dyn SendHistory>,
}

impl AppState {
    /// Build the provider adapters and one limiter per provider.
    pub fn new(config: &AppConfig) -> Result<Self, StateError> {
        let client = http_client(config.send_timeout)?;
        let history: Arc<dyn SendHistory> = Arc::new(InMemorySendHistory::new());

        let mut builder = LimiterRegistry::builder(config.primary_provider)
            .with_history(history.clone());
        for provider in ProviderId::ALL {
            let provider_config = config.provider(provider);
            let adapter: Arc<dyn ProviderAdapter> =
                match (provider, provider_config.base_url.as_deref()) {
                    (ProviderId::Instantly, Some(url)) => {
                        Arc::new(InstantlyAdapter::with_base_url(client.clone(), url))
                    }
                    (ProviderId::Instantly, None) => Arc::new(InstantlyAdapter::new(client.clone())),
                    (ProviderId::Smartlead, Some(url)) => {
                        Arc::new(SmartleadAdapter::with_base_url(client.clone(), url))
                    }
                    (ProviderId::Smartlead, None) => Arc::new(SmartleadAdapter::new(client.clone())),
                };
            if provider_config.credentials.is_none() {
                tracing::warn!(provider = %provider, "No API key configured; sends will be refused");
            }
            builder = builder.with_adapter_profile(adapter, provider_config.profile.clone());
        }

        let state = Self::from_parts(builder.build()?, config.settings(), history);
        tracing::info!(
            primary = %config.primary_provider,
            "Application state initialized"
        );
        Ok(state)
    }

    /// Assemble state from a prepared registry and log batch progress.
    pub fn from_parts(
        registry: LimiterRegistry,
        settings: OutboundSettings,
        history: Arc<dyn SendHistory>,
    ) -> Self {
        for provider in registry.providers() {
            if let Some(limiter) = registry.limiter(provider) {
                limiter.set_progress_observer(move |progress| {
                    tracing::debug!(
                        provider = %provider,
                        queued = progress.queued,
                        in_flight = progress.in_flight,
                        completed = progress.completed,
                        total = progress.total,
                        "Batch progress"
                    );
                });
            }
        }

        Self {
            registry: Arc::new(registry),
            settings: Arc::new(settings),
            history,
        }
    }
}
