//! Provider → limiter registry.
//!
//! Built once at startup and passed by reference. Holds exactly one
//! `RateLimiter` per registered provider.

use std::collections::HashMap;
use std::sync::Arc;

use outbound_core::ProfileError;
use outbound_core::domain::{ProviderId, RateLimitProfile};
use outbound_core::ports::{ProviderAdapter, SendHistory};

use super::limiter::RateLimiter;

/// Registry construction errors.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RegistryError {
    #[error("No adapter registered for primary provider {0}")]
    MissingPrimary(ProviderId),

    #[error("Provider {0} registered twice")]
    Duplicate(ProviderId),

    #[error("Invalid rate profile for {provider}: {source}")]
    InvalidProfile {
        provider: ProviderId,
        source: ProfileError,
    },
}

/// One long-lived limiter per provider.
#[derive(Debug, Clone)]
pub struct LimiterRegistry {
    limiters: HashMap<ProviderId, RateLimiter>,
    primary: RateLimiter,
}

impl LimiterRegistry {
    pub fn builder(primary: ProviderId) -> LimiterRegistryBuilder {
        LimiterRegistryBuilder {
            primary,
            entries: Vec::new(),
            history: None,
        }
    }

    /// Limiter for a provider name, falling back to the primary provider when
    /// the name is absent, unknown or not registered.
    pub fn get_limiter(&self, provider: Option<&str>) -> &RateLimiter {
        let parsed = provider.and_then(|name| match name.parse::<ProviderId>() {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::debug!(error = %e, "Falling back to primary provider");
                None
            }
        });

        parsed
            .and_then(|id| self.limiters.get(&id))
            .unwrap_or(&self.primary)
    }

    pub fn limiter(&self, provider: ProviderId) -> Option<&RateLimiter> {
        self.limiters.get(&provider)
    }

    pub fn primary(&self) -> &RateLimiter {
        &self.primary
    }

    /// Registered providers in stable order.
    pub fn providers(&self) -> Vec<ProviderId> {
        ProviderId::ALL
            .into_iter()
            .filter(|p| self.limiters.contains_key(p))
            .collect()
    }
}

/// Collects adapters and their profiles before the registry is frozen.
pub struct LimiterRegistryBuilder {
    primary: ProviderId,
    entries: Vec<(Arc<dyn ProviderAdapter>, RateLimitProfile)>,
    history: Option<Arc<dyn SendHistory>>,
}

impl LimiterRegistryBuilder {
    /// Register an adapter with its provider's built-in profile.
    pub fn with_adapter(self, adapter: Arc<dyn ProviderAdapter>) -> Self {
        let profile = RateLimitProfile::for_provider(adapter.id());
        self.with_adapter_profile(adapter, profile)
    }

    pub fn with_adapter_profile(
        mut self,
        adapter: Arc<dyn ProviderAdapter>,
        profile: RateLimitProfile,
    ) -> Self {
        self.entries.push((adapter, profile));
        self
    }

    /// Audit sink shared by every limiter.
    pub fn with_history(mut self, history: Arc<dyn SendHistory>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn build(self) -> Result<LimiterRegistry, RegistryError> {
        let mut limiters = HashMap::with_capacity(self.entries.len());

        for (adapter, profile) in self.entries {
            let provider = adapter.id();
            if limiters.contains_key(&provider) {
                return Err(RegistryError::Duplicate(provider));
            }
            profile
                .validate()
                .map_err(|source| RegistryError::InvalidProfile { provider, source })?;
            tracing::info!(
                provider = %provider,
                max_tokens = profile.max_tokens,
                refill_per_sec = profile.refill_rate_per_second,
                max_concurrency = profile.max_concurrency,
                max_retries = profile.max_retries,
                "Registered provider limiter"
            );
            limiters.insert(
                provider,
                RateLimiter::new(adapter, profile, self.history.clone()),
            );
        }

        let primary = limiters
            .get(&self.primary)
            .cloned()
            .ok_or(RegistryError::MissingPrimary(self.primary))?;

        Ok(LimiterRegistry { limiters, primary })
    }
}
