//! Application configuration loaded from environment variables.

use std::env;
use std::time::Duration;

use outbound_core::domain::{OutboundSettings, ProviderCredentials, ProviderId, RateLimitProfile};

/// Connection details and limiter profile for one provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub credentials: Option<ProviderCredentials>,
    /// Overrides the adapter's default API host.
    pub base_url: Option<String>,
    pub profile: RateLimitProfile,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub primary_provider: ProviderId,
    /// Timeout applied by the shared HTTP client to every provider call.
    pub send_timeout: Duration,
    pub instantly: ProviderConfig,
    pub smartlead: ProviderConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let primary_provider = match lookup("PRIMARY_PROVIDER") {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Invalid PRIMARY_PROVIDER, using instantly");
                ProviderId::Instantly
            }),
            None => ProviderId::Instantly,
        };

        let send_timeout = Duration::from_secs(parsed(&lookup, "SEND_TIMEOUT_SECS").unwrap_or(30));

        Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parsed(&lookup, "PORT").unwrap_or(8080),
            primary_provider,
            send_timeout,
            instantly: provider_config(&lookup, ProviderId::Instantly, send_timeout),
            smartlead: provider_config(&lookup, ProviderId::Smartlead, send_timeout),
        }
    }

    pub fn provider(&self, provider: ProviderId) -> &ProviderConfig {
        match provider {
            ProviderId::Instantly => &self.instantly,
            ProviderId::Smartlead => &self.smartlead,
        }
    }

    /// Sender settings for resolution, preferring the primary provider.
    pub fn settings(&self) -> OutboundSettings {
        OutboundSettings {
            preferred_provider: Some(self.primary_provider),
            instantly: self.instantly.credentials.clone(),
            smartlead: self.smartlead.credentials.clone(),
        }
    }
}

fn parsed<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparseable config value");
            None
        }
    }
}

/// Apply an override only if the resulting profile is still usable.
fn checked(
    profile: RateLimitProfile,
    apply: impl FnOnce(RateLimitProfile) -> RateLimitProfile,
    key: &str,
) -> RateLimitProfile {
    let candidate = apply(profile.clone());
    match candidate.validate() {
        Ok(()) => candidate,
        Err(e) => {
            tracing::warn!(key, error = %e, "Ignoring rate profile override");
            profile
        }
    }
}

/// Read `<PROVIDER>_*` variables on top of the built-in profile.
fn provider_config(
    lookup: &impl Fn(&str) -> Option<String>,
    provider: ProviderId,
    send_timeout: Duration,
) -> ProviderConfig {
    let prefix = provider.as_str().to_uppercase();
    let key = |suffix: &str| format!("{prefix}_{suffix}");

    let credentials = lookup(&key("API_KEY"))
        .filter(|k| !k.trim().is_empty())
        .map(|api_key| {
            let campaign = lookup(&key("CAMPAIGN_ID")).filter(|c| !c.trim().is_empty());
            ProviderCredentials::new(api_key, campaign)
        });

    let mut profile =
        RateLimitProfile::for_provider(provider).with_request_timeout(Some(send_timeout));
    if let Some(max_tokens) = parsed(lookup, &key("MAX_TOKENS")) {
        profile = checked(profile, |p| p.with_max_tokens(max_tokens), &key("MAX_TOKENS"));
    }
    if let Some(rate) = parsed(lookup, &key("REFILL_PER_SEC")) {
        profile = checked(profile, |p| p.with_refill_rate(rate), &key("REFILL_PER_SEC"));
    }
    if let Some(concurrency) = parsed(lookup, &key("MAX_CONCURRENCY")) {
        profile = profile.with_max_concurrency(concurrency);
    }
    if let Some(retries) = parsed(lookup, &key("MAX_RETRIES")) {
        profile = profile.with_max_retries(retries);
    }

    ProviderConfig {
        credentials,
        base_url: lookup(&key("BASE_URL")).filter(|u| !u.trim().is_empty()),
        profile,
    }
}
