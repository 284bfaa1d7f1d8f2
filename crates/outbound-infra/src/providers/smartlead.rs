//! Smartlead campaign lead upload API.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use outbound_core::domain::{ProviderId, SendParams, SendResult, SenderConfig};
use outbound_core::ports::{ProviderAdapter, ProviderError};

use super::{check_common, error_from_response, transport_error};

pub const DEFAULT_BASE_URL: &str = "https://server.smartlead.ai";

/// Uploads leads into a Smartlead campaign, one lead per request.
#[derive(Debug, Clone)]
pub struct SmartleadAdapter {
    client: Client,
    base_url: String,
}

impl SmartleadAdapter {
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
struct UploadPayload<'a> {
    lead_list: [Lead<'a>; 1],
    settings: UploadSettings,
}

#[derive(Serialize)]
struct Lead<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    company_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    website: Option<&'a str>,
    custom_fields: BTreeMap<&'a str, &'a str>,
}

#[derive(Serialize)]
struct UploadSettings {
    ignore_global_block_list: bool,
    ignore_unsubscribe_list: bool,
    ignore_duplicate_leads_in_other_campaign: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UploadResponse {
    upload_count: u32,
    already_added_to_campaign: u32,
    duplicate_count: u32,
    invalid_email_count: u32,
    block_count: u32,
    unsubscribed_leads: u32,
    is_lead_limit_exhausted: bool,
}

impl UploadResponse {
    fn into_result(self) -> SendResult {
        if self.upload_count > 0 {
            SendResult::created(None)
        } else if self.already_added_to_campaign > 0 || self.duplicate_count > 0 {
            SendResult::existing(None)
        } else if self.is_lead_limit_exhausted {
            SendResult::needs_attention("Smartlead lead limit exhausted")
        } else if self.invalid_email_count > 0 {
            SendResult::needs_attention("Smartlead rejected the email address")
        } else if self.block_count > 0 || self.unsubscribed_leads > 0 {
            SendResult::needs_attention("Lead is blocked or unsubscribed")
        } else {
            SendResult::needs_attention("Smartlead accepted the request but uploaded no lead")
        }
    }
}

#[async_trait]
impl ProviderAdapter for SmartleadAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Smartlead
    }

    fn validate_config(&self, config: &SenderConfig) -> Result<(), ProviderError> {
        let campaign = check_common(ProviderId::Smartlead, config)?;
        if !campaign.chars().all(|c| c.is_ascii_digit()) {
            return Err(ProviderError::InvalidConfig(format!(
                "Smartlead campaign id must be numeric, got {campaign:?}"
            )));
        }
        Ok(())
    }

    async fn send_lead(
        &self,
        config: &SenderConfig,
        params: &SendParams,
    ) -> Result<SendResult, ProviderError> {
        let campaign = check_common(ProviderId::Smartlead, config)?;

        let mut custom_fields: BTreeMap<&str, &str> = params
            .metadata
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        if let Some(subject) = params.subject.as_deref() {
            custom_fields.insert("subject", subject);
        }
        if let Some(body) = params.body.as_deref() {
            custom_fields.insert("body", body);
        }

        let payload = UploadPayload {
            lead_list: [Lead {
                email: params.email.trim(),
                first_name: params.first_name.as_deref(),
                last_name: params.last_name.as_deref(),
                company_name: params.company_name.as_deref(),
                website: params.website.as_deref(),
                custom_fields,
            }],
            settings: UploadSettings {
                ignore_global_block_list: false,
                ignore_unsubscribe_list: false,
                ignore_duplicate_leads_in_other_campaign: false,
            },
        };

        let response = self
            .client
            .post(format!(
                "{}/api/v1/campaigns/{}/leads",
                self.base_url, campaign
            ))
            .query(&[("api_key", config.api_key.as_str())])
            .json(&payload)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let upload: UploadResponse = response.json().await.map_err(|e| {
            ProviderError::Rejected {
                status: 200,
                detail: format!("unreadable Smartlead response: {e}"),
            }
        })?;
        Ok(upload.into_result())
    }

    fn supports_campaigns(&self) -> bool {
        true
    }
}
