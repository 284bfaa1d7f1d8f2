//! Token bucket with lazy refill.

use std::time::Duration;

use tokio::time::Instant;

use outbound_core::domain::RateLimitProfile;

/// Send credits accumulated over time, capped at `max_tokens`.
///
/// Refill happens on access; there is no background timer. A new bucket
/// starts full.
#[derive(Debug, Clone)]
pub struct TokenBucket {
    tokens: f64,
    max_tokens: f64,
    refill_rate: f64,
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(max_tokens: f64, refill_rate_per_second: f64) -> Self {
        let max_tokens = max_tokens.max(0.0);
        Self {
            tokens: max_tokens,
            max_tokens,
            refill_rate: refill_rate_per_second.max(0.0),
            last_refill: Instant::now(),
        }
    }

    pub fn from_profile(profile: &RateLimitProfile) -> Self {
        Self::new(profile.max_tokens, profile.refill_rate_per_second)
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.max_tokens);
        self.last_refill = now;
    }

    /// Spend one credit if available.
    pub fn try_consume(&mut self) -> bool {
        self.refill();
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Time until one whole credit is available; zero if one already is.
    pub fn time_until_next_token(&mut self) -> Duration {
        self.refill();
        if self.tokens >= 1.0 {
            return Duration::ZERO;
        }
        if self.refill_rate <= 0.0 {
            return Duration::MAX;
        }
        Duration::try_from_secs_f64((1.0 - self.tokens) / self.refill_rate)
            .unwrap_or(Duration::MAX)
    }

    /// Drop all credits. Used when the provider says we are over its limit.
    pub fn pause(&mut self) {
        self.refill();
        self.tokens = 0.0;
    }

    /// `(tokens, max_tokens)` snapshot.
    pub fn status(&mut self) -> (f64, f64) {
        self.refill();
        (self.tokens, self.max_tokens)
    }
}
