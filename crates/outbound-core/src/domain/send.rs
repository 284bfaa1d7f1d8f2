use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ProviderId;
use crate::error::DomainError;

/// Provider credentials and target campaign for one batch of sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderConfig {
    pub provider: ProviderId,
    pub api_key: String,
    pub campaign_id: Option<String>,
}

impl SenderConfig {
    pub fn new(provider: ProviderId, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
            campaign_id: None,
        }
    }

    pub fn with_campaign(mut self, campaign_id: impl Into<String>) -> Self {
        self.campaign_id = Some(campaign_id.into());
        self
    }
}

/// An already-built lead: recipient, copy and free-form metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendParams {
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    /// Forwarded to the provider as custom variables.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl SendParams {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = Some(first.into());
        self.last_name = Some(last.into());
        self
    }

    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company_name = Some(company.into());
        self
    }

    pub fn with_copy(mut self, subject: impl Into<String>, body: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self.body = Some(body.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Cheap shape check on the recipient before anything is queued.
    pub fn validate(&self) -> Result<(), DomainError> {
        let email = self.email.trim();
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
            _ => Err(DomainError::Validation(format!(
                "invalid recipient email: {:?}",
                self.email
            ))),
        }
    }
}

/// Outcome category reported back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendStatus {
    New,
    Existing,
    NeedsAttention,
}

/// The result of one send. Delivered, never thrown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendResult {
    pub success: bool,
    pub status: SendStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl SendResult {
    /// A lead the provider created.
    pub fn created(lead_id: Option<String>) -> Self {
        Self {
            success: true,
            status: SendStatus::New,
            lead_id,
            detail: None,
        }
    }

    /// A lead the provider already had.
    pub fn existing(lead_id: Option<String>) -> Self {
        Self {
            success: true,
            status: SendStatus::Existing,
            lead_id,
            detail: None,
        }
    }

    pub fn needs_attention(detail: impl Into<String>) -> Self {
        Self {
            success: false,
            status: SendStatus::NeedsAttention,
            lead_id: None,
            detail: Some(detail.into()),
        }
    }

    /// Whether a free-text detail reads like a provider rate-limit response.
    ///
    /// Only meaningful on `needs_attention` results; successful results are
    /// never treated as rate-limited.
    pub fn looks_rate_limited(&self) -> bool {
        if self.status != SendStatus::NeedsAttention {
            return false;
        }
        let Some(detail) = self.detail.as_deref() else {
            return false;
        };
        let detail = detail.to_ascii_lowercase();
        ["rate limit", "rate-limit", "too many requests", "429"]
            .iter()
            .any(|marker| detail.contains(marker))
    }
}
