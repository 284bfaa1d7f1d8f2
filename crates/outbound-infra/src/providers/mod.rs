//! HTTP adapters for the campaign providers.

mod instantly;
mod smartlead;

pub use instantly::InstantlyAdapter;
pub use smartlead::SmartleadAdapter;

use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};

use outbound_core::domain::{ProviderId, SenderConfig};
use outbound_core::ports::ProviderError;

const MAX_ERROR_DETAIL: usize = 500;

/// Build the shared HTTP client used by every adapter.
pub fn http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("outbound/", env!("CARGO_PKG_VERSION")))
        .build()
}

fn transport_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Transport(format!("request timed out: {err}"))
    } else {
        ProviderError::Transport(err.to_string())
    }
}

/// `Retry-After` in delta-seconds form. HTTP-date values are ignored.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?;
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Map a non-success response onto the provider error taxonomy.
async fn error_from_response(response: reqwest::Response) -> ProviderError {
    let status = response.status();
    let retry_after = retry_after(response.headers());
    let body = response.text().await.unwrap_or_default();

    let detail = match body.trim() {
        "" => status.canonical_reason().unwrap_or("no response body").to_string(),
        text => text.chars().take(MAX_ERROR_DETAIL).collect(),
    };

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        ProviderError::RateLimited {
            detail,
            retry_after,
        }
    } else if status.is_server_error() {
        ProviderError::Transport(format!("HTTP {}: {}", status.as_u16(), detail))
    } else {
        ProviderError::Rejected {
            status: status.as_u16(),
            detail,
        }
    }
}

/// Checks shared by every provider: routing, API key, campaign presence.
fn check_common(expected: ProviderId, config: &SenderConfig) -> Result<&str, ProviderError> {
    if config.provider != expected {
        return Err(ProviderError::InvalidConfig(format!(
            "config for {} sent to {} adapter",
            config.provider, expected
        )));
    }
    if config.api_key.trim().is_empty() {
        return Err(ProviderError::InvalidConfig(format!(
            "missing {expected} API key"
        )));
    }
    config
        .campaign_id
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ProviderError::InvalidConfig(format!("missing {expected} campaign id")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_retry_after_seconds() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after(&headers), None);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("12"));
        assert_eq!(retry_after(&headers), Some(Duration::from_secs(12)));

        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(retry_after(&headers), None);
    }

    #[test]
    fn test_check_common() {
        let ok = SenderConfig::new(ProviderId::Smartlead, "key").with_campaign(" 42 ");
        assert_eq!(check_common(ProviderId::Smartlead, &ok).unwrap(), "42");

        let misrouted = SenderConfig::new(ProviderId::Instantly, "key").with_campaign("42");
        assert!(check_common(ProviderId::Smartlead, &misrouted).is_err());

        let no_key = SenderConfig::new(ProviderId::Smartlead, " ").with_campaign("42");
        assert!(check_common(ProviderId::Smartlead, &no_key).is_err());

        let no_campaign = SenderConfig::new(ProviderId::Smartlead, "key");
        assert!(check_common(ProviderId::Smartlead, &no_campaign).is_err());
    }
}
