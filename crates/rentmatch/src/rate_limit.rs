//! Fixed-window request limiting keyed by client address and path.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::config::RateLimitConfig;

/// Counter state after recording one hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowHit {
    pub count: u32,
    pub resets_in: Duration,
}

/// Shared keyed counter with expiry (in-process map, Redis, ...).
pub trait RateLimitStore: Send + Sync {
    /// Increment `key`, opening a new window of `window` length when none is live.
    fn hit(&self, key: &str, window: Duration) -> Result<WindowHit, RateLimitError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("rate limit store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32 },
    Limited { retry_after_secs: u64 },
}

pub struct RateLimiter<S> {
    store: Arc<S>,
    max_requests: u32,
    window: Duration,
}

impl<S> RateLimiter<S>
where
    S: RateLimitStore + 'static,
{
    pub fn new(store: Arc<S>, config: &RateLimitConfig) -> Self {
        Self {
            store,
            max_requests: config.max_requests,
            window: Duration::from_secs(config.window_secs),
        }
    }

    pub fn check(&self, client: &str, path: &str) -> Result<RateDecision, RateLimitError> {
        let key = format!("{client}:{path}");
        let hit = self.store.hit(&key, self.window)?;

        if hit.count > self.max_requests {
            let retry_after_secs = hit.resets_in.as_secs().max(1);
            debug!(%key, count = hit.count, retry_after_secs, "request rate limited");
            return Ok(RateDecision::Limited { retry_after_secs });
        }

        Ok(RateDecision::Allowed {
            remaining: self.max_requests - hit.count,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// Counts without expiry; every window reports the full length remaining.
    #[derive(Default)]
    struct CountingStore {
        counts: Mutex<HashMap<String, u32>>,
    }

    impl RateLimitStore for CountingStore {
        fn hit(&self, key: &str, window: Duration) -> Result<WindowHit, RateLimitError> {
            let mut guard = self.counts.lock().expect("lock poisoned");
            let count = guard.entry(key.to_string()).or_insert(0);
            *count += 1;
            Ok(WindowHit {
                count: *count,
                resets_in: window,
            })
        }
    }

    struct DownStore;

    impl RateLimitStore for DownStore {
        fn hit(&self, _key: &str, _window: Duration) -> Result<WindowHit, RateLimitError> {
            Err(RateLimitError::Unavailable("connection refused".to_string()))
        }
    }

    fn limiter(max_requests: u32) -> RateLimiter<CountingStore> {
        RateLimiter::new(
            Arc::new(CountingStore::default()),
            &RateLimitConfig {
                max_requests,
                window_secs: 30,
            },
        )
    }

    #[test]
    fn allows_up_to_the_limit_then_blocks() {
        let limiter = limiter(2);
        assert_eq!(
            limiter.check("10.0.0.1", "/api/v1/viewings").unwrap(),
            RateDecision::Allowed { remaining: 1 }
        );
        assert_eq!(
            limiter.check("10.0.0.1", "/api/v1/viewings").unwrap(),
            RateDecision::Allowed { remaining: 0 }
        );
        assert_eq!(
            limiter.check("10.0.0.1", "/api/v1/viewings").unwrap(),
            RateDecision::Limited {
                retry_after_secs: 30
            }
        );
    }

    #[test]
    fn keys_by_client_and_path() {
        let limiter = limiter(1);
        assert!(matches!(
            limiter.check("10.0.0.1", "/a").unwrap(),
            RateDecision::Allowed { .. }
        ));
        assert!(matches!(
            limiter.check("10.0.0.2", "/a").unwrap(),
            RateDecision::Allowed { .. }
        ));
        assert!(matches!(
            limiter.check("10.0.0.1", "/b").unwrap(),
            RateDecision::Allowed { .. }
        ));
        assert!(matches!(
            limiter.check("10.0.0.1", "/a").unwrap(),
            RateDecision::Limited { .. }
        ));
    }

    #[test]
    fn surfaces_store_failures() {
        let limiter = RateLimiter::new(Arc::new(DownStore), &RateLimitConfig::default());
        assert!(matches!(
            limiter.check("10.0.0.1", "/a"),
            Err(RateLimitError::Unavailable(_))
        ));
    }
}
