// crates/aiops-broker/src/rate_limit.rs
// ============================================================================
// Module: Rate Limiter
// Description: Fixed-window counter rate limiter over a KeyValueStore.
// Purpose: Reject excess ingest requests per arbitrary key (e.g. source IP).
// Dependencies: aiops-core
// ============================================================================

use std::time::Duration;

use aiops_core::interfaces::KeyValueStore;

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitOutcome {
    /// Request is within the window's limit.
    Allowed {
        /// Requests remaining in the current window.
        remaining: u32,
    },
    /// Request exceeds the window's limit.
    Limited,
}

/// Checks and increments a fixed-window counter for `key`.
///
/// Store failures fail **open** (`spec.md` §4.1, §7): any
/// [`KeyValueError`](aiops_core::interfaces::KeyValueError) is treated as
/// [`RateLimitOutcome::Allowed`] with `remaining` equal to `limit`.
pub async fn check_and_increment(
    store: &dyn KeyValueStore,
    key: &str,
    limit: u32,
    window: Duration,
) -> RateLimitOutcome {
    let counter_key = format!("aiops:ratelimit:{key}");
    match store.incr_with_expiry(&counter_key, window).await {
        Ok(count) if count <= u64::from(limit) => {
            RateLimitOutcome::Allowed { remaining: limit.saturating_sub(u32::try_from(count).unwrap_or(limit)) }
        }
        Ok(_) => RateLimitOutcome::Limited,
        Err(_) => RateLimitOutcome::Allowed { remaining: limit },
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use std::collections::HashMap;
    use std::sync::Mutex;

    use aiops_core::interfaces::KeyValueError;
    use async_trait::async_trait;

    use super::*;

    #[derive(Default)]
    struct InMemoryKv {
        counters: Mutex<HashMap<String, u64>>,
    }

    #[async_trait]
    impl KeyValueStore for InMemoryKv {
        async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, KeyValueError> {
            Ok(None)
        }

        async fn set_with_ttl(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> Result<(), KeyValueError> {
            Ok(())
        }

        async fn incr_with_expiry(&self, key: &str, _ttl: Duration) -> Result<u64, KeyValueError> {
            let mut counters = self.counters.lock().unwrap();
            let entry = counters.entry(key.to_string()).or_insert(0);
            *entry += 1;
            Ok(*entry)
        }
    }

    #[tokio::test]
    async fn allows_requests_under_the_limit() {
        let store = InMemoryKv::default();
        let outcome = check_and_increment(&store, "1.2.3.4", 5, Duration::from_secs(60)).await;
        assert_eq!(outcome, RateLimitOutcome::Allowed { remaining: 4 });
    }

    #[tokio::test]
    async fn rejects_requests_over_the_limit() {
        let store = InMemoryKv::default();
        for _ in 0 .. 3 {
            check_and_increment(&store, "1.2.3.4", 3, Duration::from_secs(60)).await;
        }
        let outcome = check_and_increment(&store, "1.2.3.4", 3, Duration::from_secs(60)).await;
        assert_eq!(outcome, RateLimitOutcome::Limited);
    }
}
