//! Instantly lead API (v2).

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use outbound_core::domain::{ProviderId, SendParams, SendResult, SenderConfig};
use outbound_core::ports::{ProviderAdapter, ProviderError};

use super::{check_common, error_from_response, transport_error};

pub const DEFAULT_BASE_URL: &str = "https://api.instantly.ai";

/// Pushes leads into an Instantly campaign.
#[derive(Debug, Clone)]
pub struct InstantlyAdapter {
    client: Client,
    base_url: String,
}

impl InstantlyAdapter {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Serialize)]
struct LeadPayload<'a> {
    campaign: &'a str,
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    company_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    website: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    personalization: Option<&'a str>,
    custom_variables: BTreeMap<&'a str, &'a str>,
}

#[derive(Deserialize)]
struct LeadResponse {
    id: Option<String>,
}

#[async_trait]
impl ProviderAdapter for InstantlyAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Instantly
    }

    fn validate_config(&self, config: &SenderConfig) -> Result<(), ProviderError> {
        let campaign = check_common(ProviderId::Instantly, config)?;
        Uuid::parse_str(campaign).map_err(|_| {
            ProviderError::InvalidConfig(format!(
                "Instantly campaign id must be a UUID, got {campaign:?}"
            ))
        })?;
        Ok(())
    }

    async fn send_lead(
        &self,
        config: &SenderConfig,
        params: &SendParams,
    ) -> Result<SendResult, ProviderError> {
        let campaign = check_common(ProviderId::Instantly, config)?;

        let mut custom_variables: BTreeMap<&str, &str> = params
            .metadata
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        if let Some(subject) = params.subject.as_deref() {
            custom_variables.insert("subject", subject);
        }

        let payload = LeadPayload {
            campaign,
            email: params.email.trim(),
            first_name: params.first_name.as_deref(),
            last_name: params.last_name.as_deref(),
            company_name: params.company_name.as_deref(),
            website: params.website.as_deref(),
            personalization: params.body.as_deref(),
            custom_variables,
        };

        let response = self
            .client
            .post(format!("{}/api/v2/leads", self.base_url))
            .bearer_auth(&config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_success() {
            // A lead was created even if the body is not what we expect
            let lead_id = response
                .json::<LeadResponse>()
                .await
                .ok()
                .and_then(|lead| lead.id);
            return Ok(SendResult::created(lead_id));
        }
        if status == StatusCode::CONFLICT {
            return Ok(SendResult::existing(None));
        }

        Err(error_from_response(response).await)
    }

    fn supports_campaigns(&self) -> bool {
        true
    }
}
