use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ProviderId, SendResult};

/// Audit entry for a delivered send.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendRecord {
    pub id: Uuid,
    pub provider: ProviderId,
    pub email: String,
    pub campaign_id: Option<String>,
    pub result: SendResult,
    pub attempts: u32,
    pub sent_at: DateTime<Utc>,
}

impl SendRecord {
    /// Create a record stamped with the current time.
    pub fn new(
        id: Uuid,
        provider: ProviderId,
        email: String,
        campaign_id: Option<String>,
        result: SendResult,
        attempts: u32,
    ) -> Self {
        Self {
            id,
            provider,
            email,
            campaign_id,
            result,
            attempts,
            sent_at: Utc::now(),
        }
    }
}
