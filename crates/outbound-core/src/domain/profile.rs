use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::ProviderId;
use crate::error::ProfileError;

/// Rate characteristics of one provider. Built once at startup, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitProfile {
    /// Bucket capacity (burst size).
    pub max_tokens: f64,
    /// Credits added per second.
    pub refill_rate_per_second: f64,
    /// Maximum dispatches in flight at once.
    pub max_concurrency: usize,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub max_retries: u32,
    /// Upper bound on a single provider call. `None` waits forever.
    pub request_timeout: Option<Duration>,
}

impl Default for RateLimitProfile {
    fn default() -> Self {
        Self {
            max_tokens: 5.0,
            refill_rate_per_second: 2.0,
            max_concurrency: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
            max_retries: 5,
            request_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl RateLimitProfile {
    /// Built-in profile for a provider.
    pub fn for_provider(provider: ProviderId) -> Self {
        match provider {
            // Instantly allows short bursts comfortably
            ProviderId::Instantly => Self {
                max_tokens: 10.0,
                refill_rate_per_second: 5.0,
                max_concurrency: 5,
                initial_backoff: Duration::from_secs(1),
                max_backoff: Duration::from_secs(30),
                ..Default::default()
            },
            // Smartlead enforces 10 requests per 2 seconds per key
            ProviderId::Smartlead => Self {
                max_tokens: 5.0,
                refill_rate_per_second: 4.0,
                max_concurrency: 3,
                initial_backoff: Duration::from_secs(2),
                max_backoff: Duration::from_secs(60),
                ..Default::default()
            },
        }
    }

    /// Reject profiles that would stall the queue: a bucket that can never
    /// hold a whole token, or one that never refills.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if !self.max_tokens.is_finite() || self.max_tokens < 1.0 {
            return Err(ProfileError::MaxTokens(self.max_tokens));
        }
        let rate = self.refill_rate_per_second;
        if !rate.is_finite() || rate <= 0.0 {
            return Err(ProfileError::RefillRate(rate));
        }
        if self.initial_backoff > self.max_backoff {
            return Err(ProfileError::Backoff {
                initial: self.initial_backoff,
                max: self.max_backoff,
            });
        }
        Ok(())
    }

    /// Delay before the `retry_count`-th retry (1-based).
    ///
    /// `min(initial_backoff * 2^(retry_count - 1), max_backoff)`.
    pub fn backoff_for(&self, retry_count: u32) -> Duration {
        let exponent = retry_count.saturating_sub(1).min(31);
        self.initial_backoff
            .checked_mul(1u32 << exponent)
            .map_or(self.max_backoff, |delay| delay.min(self.max_backoff))
    }

    pub fn with_max_tokens(mut self, max_tokens: f64) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_refill_rate(mut self, per_second: f64) -> Self {
        self.refill_rate_per_second = per_second;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_until_capped() {
        let profile = RateLimitProfile::default()
            .with_backoff(Duration::from_millis(100), Duration::from_millis(1000));

        assert_eq!(profile.backoff_for(1), Duration::from_millis(100));
        assert_eq!(profile.backoff_for(2), Duration::from_millis(200));
        assert_eq!(profile.backoff_for(3), Duration::from_millis(400));
        assert_eq!(profile.backoff_for(4), Duration::from_millis(800));
        assert_eq!(profile.backoff_for(5), Duration::from_millis(1000));
        assert_eq!(profile.backoff_for(40), Duration::from_millis(1000));
    }

    #[test]
    fn test_backoff_does_not_overflow() {
        let profile = RateLimitProfile::default()
            .with_backoff(Duration::from_secs(u64::MAX / 2), Duration::from_secs(60));
        assert_eq!(profile.backoff_for(3), Duration::from_secs(60));
    }

    #[test]
    fn test_provider_profiles_are_sane() {
        for provider in ProviderId::ALL {
            let profile = RateLimitProfile::for_provider(provider);
            assert!(profile.max_tokens >= 1.0);
            assert!(profile.refill_rate_per_second > 0.0);
            assert!(profile.max_concurrency > 0);
            assert!(profile.initial_backoff <= profile.max_backoff);
            assert_eq!(profile.validate(), Ok(()));
        }
    }

    #[test]
    fn test_validate_rejects_stalling_profiles() {
        let base = RateLimitProfile::default();

        for tokens in [0.0, 0.5, -3.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                base.clone().with_max_tokens(tokens).validate(),
                Err(ProfileError::MaxTokens(_))
            ));
        }
        for rate in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                base.clone().with_refill_rate(rate).validate(),
                Err(ProfileError::RefillRate(_))
            ));
        }
        assert_eq!(
            base.clone()
                .with_backoff(Duration::from_secs(5), Duration::from_secs(1))
                .validate(),
            Err(ProfileError::Backoff {
                initial: Duration::from_secs(5),
                max: Duration::from_secs(1),
            })
        );
        assert_eq!(base.with_max_tokens(1.0).validate(), Ok(()));
    }
}
