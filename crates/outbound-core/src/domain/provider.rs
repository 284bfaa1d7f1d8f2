use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of an external campaign-sending provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Instantly,
    Smartlead,
}

impl ProviderId {
    /// Every known provider, in resolution preference order.
    pub const ALL: [ProviderId; 2] = [ProviderId::Instantly, ProviderId::Smartlead];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Instantly => "instantly",
            ProviderId::Smartlead => "smartlead",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "instantly" => Ok(ProviderId::Instantly),
            "smartlead" => Ok(ProviderId::Smartlead),
            other => Err(DomainError::UnknownProvider(other.to_string())),
        }
    }
}
