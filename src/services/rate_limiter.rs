//! Per-IP sliding-window rate limiting
//!
//! Used for:
//! - Login attempts (5 per 15 minutes by default)
//! - Contact form messages (5 per hour by default)
//! - The global API budget (200/500 requests per 15 minutes)

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Outcome of a rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// The request is allowed and has been counted
    Allowed { remaining: usize },
    /// The request is rejected; retry after the given number of seconds
    Limited { retry_after_secs: u64 },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed { .. })
    }
}

/// Sliding-window limiter keyed by client IP.
///
/// Every call to [`SlidingWindowLimiter::check`] counts as a hit, whether or
/// not the caller's request later succeeds.
pub struct SlidingWindowLimiter {
    max_hits: usize,
    window: Duration,
    hits: Arc<RwLock<HashMap<IpAddr, Vec<DateTime<Utc>>>>>,
}

impl SlidingWindowLimiter {
    /// Create a limiter allowing `max_hits` per `window_secs` per IP
    pub fn new(max_hits: usize, window_secs: u64) -> Self {
        Self {
            max_hits,
            window: Duration::seconds(window_secs as i64),
            hits: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn max_hits(&self) -> usize {
        self.max_hits
    }

    /// Record a hit for `ip` and decide whether it is within budget
    pub async fn check(&self, ip: IpAddr) -> RateLimitDecision {
        self.check_at(ip, Utc::now()).await
    }

    async fn check_at(&self, ip: IpAddr, now: DateTime<Utc>) -> RateLimitDecision {
        let mut hits = self.hits.write().await;
        let cutoff = now - self.window;

        let ip_hits = hits.entry(ip).or_default();
        ip_hits.retain(|time| *time > cutoff);

        if ip_hits.len() >= self.max_hits {
            // The oldest hit in the window decides when a slot frees up.
            let retry_after_secs = ip_hits
                .first()
                .map(|oldest| (*oldest + self.window - now).num_seconds().max(1) as u64)
                .unwrap_or(1);
            return RateLimitDecision::Limited { retry_after_secs };
        }

        ip_hits.push(now);
        RateLimitDecision::Allowed {
            remaining: self.max_hits - ip_hits.len(),
        }
    }

    /// Forget all hits for `ip`
    pub async fn reset(&self, ip: IpAddr) {
        self.hits.write().await.remove(&ip);
    }

    /// Drop expired entries (called periodically)
    pub async fn cleanup(&self) {
        let cutoff = Utc::now() - self.window;
        let mut hits = self.hits.write().await;
        hits.retain(|_, times| {
            times.retain(|time| *time > cutoff);
            !times.is_empty()
        });
    }

    /// Number of IPs currently tracked
    pub async fn tracked_ips(&self) -> usize {
        self.hits.read().await.len()
    }
}

/// The set of limiters shared by the HTTP layer
pub struct RateLimiters {
    pub login: SlidingWindowLimiter,
    pub contact: SlidingWindowLimiter,
    pub api: SlidingWindowLimiter,
}

impl RateLimiters {
    pub fn from_config(config: &crate::config::Config) -> Self {
        let limits = &config.rate_limit;
        Self {
            login: SlidingWindowLimiter::new(limits.login_max, limits.login_window_secs),
            contact: SlidingWindowLimiter::new(limits.contact_max, limits.contact_window_secs),
            api: SlidingWindowLimiter::new(
                limits.api_max_for(config.server.environment),
                limits.api_window_secs,
            ),
        }
    }

    pub async fn cleanup(&self) {
        self.login.cleanup().await;
        self.contact.cleanup().await;
        self.api.cleanup().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[tokio::test]
    async fn test_sixth_attempt_is_limited() {
        let limiter = SlidingWindowLimiter::new(5, 900);
        let ip = IpAddr::from_str("127.0.0.1").unwrap();

        for i in 0..5 {
            let decision = limiter.check(ip).await;
            assert_eq!(decision, RateLimitDecision::Allowed { remaining: 4 - i });
        }

        match limiter.check(ip).await {
            RateLimitDecision::Limited { retry_after_secs } => {
                assert!(retry_after_secs > 0 && retry_after_secs <= 900);
            }
            other => panic!("expected limited, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_ips_are_independent() {
        let limiter = SlidingWindowLimiter::new(1, 60);
        let a = IpAddr::from_str("10.0.0.1").unwrap();
        let b = IpAddr::from_str("10.0.0.2").unwrap();

        assert!(limiter.check(a).await.is_allowed());
        assert!(!limiter.check(a).await.is_allowed());
        assert!(limiter.check(b).await.is_allowed());
    }

    #[tokio::test]
    async fn test_window_slides() {
        let limiter = SlidingWindowLimiter::new(2, 60);
        let ip = IpAddr::from_str("10.0.0.1").unwrap();
        let start = Utc::now();

        assert!(limiter.check_at(ip, start).await.is_allowed());
        assert!(limiter.check_at(ip, start + Duration::seconds(30)).await.is_allowed());
        assert_eq!(
            limiter.check_at(ip, start + Duration::seconds(40)).await,
            RateLimitDecision::Limited { retry_after_secs: 20 }
        );

        // The first hit has left the window.
        assert!(limiter
            .check_at(ip, start + Duration::seconds(61))
            .await
            .is_allowed());
    }

    #[tokio::test]
    async fn test_reset_and_cleanup() {
        let limiter = SlidingWindowLimiter::new(1, 60);
        let ip = IpAddr::from_str("::1").unwrap();

        assert!(limiter.check(ip).await.is_allowed());
        limiter.reset(ip).await;
        assert!(limiter.check(ip).await.is_allowed());

        let old = Utc::now() - Duration::seconds(120);
        let other = IpAddr::from_str("10.1.1.1").unwrap();
        limiter.check_at(other, old).await;
        assert_eq!(limiter.tracked_ips().await, 2);

        limiter.cleanup().await;
        assert_eq!(limiter.tracked_ips().await, 1);
    }
}
