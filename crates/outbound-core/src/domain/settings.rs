//! User-level sender settings and their resolution into a `SenderConfig`.

use serde::{Deserialize, Serialize};

use super::{ProviderId, SenderConfig};
use crate::error::ResolveError;

/// API key and default campaign for one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCredentials {
    pub api_key: String,
    pub campaign_id: Option<String>,
}

impl ProviderCredentials {
    pub fn new(api_key: impl Into<String>, campaign_id: Option<String>) -> Self {
        Self {
            api_key: api_key.into(),
            campaign_id,
        }
    }
}

/// Which providers the user has connected and which one they prefer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundSettings {
    pub preferred_provider: Option<ProviderId>,
    pub instantly: Option<ProviderCredentials>,
    pub smartlead: Option<ProviderCredentials>,
}

impl OutboundSettings {
    pub fn credentials(&self, provider: ProviderId) -> Option<&ProviderCredentials> {
        let creds = match provider {
            ProviderId::Instantly => self.instantly.as_ref(),
            ProviderId::Smartlead => self.smartlead.as_ref(),
        };
        creds.filter(|creds| !creds.api_key.trim().is_empty())
    }

    /// Providers with usable credentials, in preference order.
    pub fn configured_providers(&self) -> Vec<ProviderId> {
        ProviderId::ALL
            .into_iter()
            .filter(|p| self.credentials(*p).is_some())
            .collect()
    }

    /// Pick the provider and credentials for a batch.
    ///
    /// Order: explicitly requested, then the preferred provider, then the
    /// first configured one. A campaign override replaces the stored campaign.
    pub fn resolve(
        &self,
        requested: Option<ProviderId>,
        campaign_override: Option<String>,
    ) -> Result<SenderConfig, ResolveError> {
        let provider = match requested.or(self.preferred_provider) {
            Some(provider) => provider,
            None => *self
                .configured_providers()
                .first()
                .ok_or(ResolveError::NoProviderConfigured)?,
        };

        let creds = self
            .credentials(provider)
            .ok_or(ResolveError::MissingCredentials(provider))?;

        let campaign_id = campaign_override
            .filter(|c| !c.trim().is_empty())
            .or_else(|| creds.campaign_id.clone())
            .ok_or(ResolveError::MissingCampaign(provider))?;

        Ok(SenderConfig::new(provider, creds.api_key.clone()).with_campaign(campaign_id))
    }
}
