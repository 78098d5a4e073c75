// crates/aiops-broker/src/dedup.rs
// ============================================================================
// Module: Fingerprint Deduplication
// Description: Fingerprint to IncidentId dedup cache with TTL.
// Purpose: Give the gateway an I1-enforcing dedup check backed by any
//          KeyValueStore implementation.
// Dependencies: aiops-core
// ============================================================================

use std::time::Duration;

use aiops_core::Fingerprint;
use aiops_core::IncidentId;
use aiops_core::interfaces::KeyValueStore;

use crate::ingest::fingerprint_cache_key;

/// Default dedup TTL, per `spec.md` §4.1.
pub const DEFAULT_DEDUP_TTL: Duration = Duration::from_secs(4 * 60 * 60);

/// Outcome of a dedup lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DedupOutcome {
    /// No prior incident for this fingerprint (or the store failed open);
    /// the caller should create a new incident.
    New,
    /// A prior incident already exists for this fingerprint.
    Duplicate(IncidentId),
}

/// Consults the fingerprint cache for an existing incident.
///
/// Store failures fail **open**: the caller proceeds as if no duplicate
/// exists (`spec.md` §4.1, §7). The caller is responsible for logging the
/// failure; this function only returns [`DedupOutcome::New`] in that case.
pub async fn check_duplicate(store: &dyn KeyValueStore, fingerprint: &Fingerprint) -> DedupOutcome {
    let key = fingerprint_cache_key(fingerprint);
    match store.get(&key).await {
        Ok(Some(bytes)) => match String::from_utf8(bytes) {
            Ok(id) => DedupOutcome::Duplicate(IncidentId::new(id)),
            Err(_) => DedupOutcome::New,
        },
        Ok(None) | Err(_) => DedupOutcome::New,
    }
}

/// Registers a fingerprint against a newly created incident with
/// [`DEFAULT_DEDUP_TTL`]. Store failures are swallowed: a missed
/// registration only risks a future false-negative dedup, which itself
/// fails open (`spec.md` §4.1).
pub async fn register(store: &dyn KeyValueStore, fingerprint: &Fingerprint, incident_id: &IncidentId) {
    register_with_ttl(store, fingerprint, incident_id, DEFAULT_DEDUP_TTL).await;
}

/// Same as [`register`], but with a caller-supplied TTL — the gateway uses
/// this to honor `AiopsConfig::gateway.dedup_ttl_seconds` instead of the
/// hardcoded default.
pub async fn register_with_ttl(
    store: &dyn KeyValueStore,
    fingerprint: &Fingerprint,
    incident_id: &IncidentId,
    ttl: Duration,
) {
    let key = fingerprint_cache_key(fingerprint);
    let _ = store.set_with_ttl(&key, incident_id.as_str().as_bytes().to_vec(), ttl).await;
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
        values: Mutex<HashMap<String, Vec<u8>>>,
    }

    #[async_trait]
    impl KeyValueStore for InMemoryKv {
        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KeyValueError> {
            Ok(self.values.lock().unwrap().get(key).cloned())
        }

        async fn set_with_ttl(&self, key: &str, value: Vec<u8>, _ttl: Duration) -> Result<(), KeyValueError> {
            self.values.lock().unwrap().insert(key.to_string(), value);
            Ok(())
        }

        async fn incr_with_expiry(&self, _key: &str, _ttl: Duration) -> Result<u64, KeyValueError> {
            Ok(1)
        }
    }

    #[tokio::test]
    async fn first_sighting_is_new() {
        let store = InMemoryKv::default();
        let fingerprint = aiops_core::compute_fingerprint("alertmanager", "X", "ns", None);
        assert_eq!(check_duplicate(&store, &fingerprint).await, DedupOutcome::New);
    }

    #[tokio::test]
    async fn registered_fingerprint_is_a_duplicate() {
        let store = InMemoryKv::default();
        let fingerprint = aiops_core::compute_fingerprint("alertmanager", "X", "ns", None);
        let incident_id = IncidentId::new("inc-1");
        register(&store, &fingerprint, &incident_id).await;
        assert_eq!(check_duplicate(&store, &fingerprint).await, DedupOutcome::Duplicate(incident_id));
    }
}
