//! Data Transfer Objects - request/response types for the API.

use serde::{Deserialize, Serialize};

use outbound_core::domain::{LimiterStatus, ProviderId, Progress, SendParams, SendResult};

/// Request to push a batch of leads through one provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendBatchRequest {
    /// Provider name; falls back to the configured preference when absent.
    #[serde(default)]
    pub provider: Option<String>,
    /// Overrides the campaign stored with the provider credentials.
    #[serde(default)]
    pub campaign_id: Option<String>,
    pub leads: Vec<SendParams>,
}

/// Outcome for one lead of a batch. Exactly one of `result` or `error` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadOutcome {
    pub request_id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<SendResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LeadOutcome {
    pub fn sent(request_id: impl Into<String>, email: impl Into<String>, result: SendResult) -> Self {
        Self {
            request_id: request_id.into(),
            email: email.into(),
            result: Some(result),
            error: None,
        }
    }

    pub fn failed(
        request_id: impl Into<String>,
        email: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            email: email.into(),
            result: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendBatchResponse {
    pub provider: ProviderId,
    pub campaign_id: Option<String>,
    pub outcomes: Vec<LeadOutcome>,
}

/// Limiter diagnostics plus the current batch progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimiterStatusResponse {
    pub provider: ProviderId,
    pub status: LimiterStatus,
    pub progress: Progress,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
    pub providers: Vec<ProviderId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_request_defaults() {
        let req: SendBatchRequest =
            serde_json::from_str(r#"{"leads":[{"email":"ada@example.com"}]}"#).unwrap();
        assert!(req.provider.is_none());
        assert!(req.campaign_id.is_none());
        assert_eq!(req.leads[0].email, "ada@example.com");
    }

    #[test]
    fn test_outcome_skips_empty_side() {
        let json = serde_json::to_value(LeadOutcome::failed("r1", "a@example.com", "aborted"))
            .unwrap();
        assert_eq!(json["error"], "aborted");
        assert!(json.get("result").is_none());
    }
}
