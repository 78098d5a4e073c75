// crates/aiops-store-sqlite/src/kv.rs
// ============================================================================
// Module: SQLite Key/Value Store
// Description: aiops_core::interfaces::KeyValueStore over the shared SQLite
//              connection.
// Purpose: Back the gateway's fingerprint dedup cache and rate limiter on
//          the same durable store as everything else, per SPEC_FULL.md §3.
// Dependencies: aiops-core, crate::store
// ============================================================================

use std::time::Duration;

use aiops_core::interfaces::KeyValueError;
use aiops_core::interfaces::KeyValueStore;
use async_trait::async_trait;

use crate::store::SqliteIncidentStore;

/// Adapts [`SqliteIncidentStore`]'s synchronous cache operations to the
/// async [`KeyValueStore`] trait. Calls are cheap, in-process `SQLite`
/// operations, so no `spawn_blocking` indirection is used.
#[derive(Clone)]
pub struct SqliteKeyValueStore {
    store: SqliteIncidentStore,
}

impl SqliteKeyValueStore {
    /// Wraps an existing [`SqliteIncidentStore`].
    #[must_use]
    pub const fn new(store: SqliteIncidentStore) -> Self {
        Self { store }
    }

    fn now_unix() -> i64 {
        aiops_core::Timestamp::now().unix_timestamp()
    }
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KeyValueError> {
        self.store.kv_get(key, Self::now_unix()).map_err(|err| KeyValueError::Backend(err.to_string()))
    }

    async fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), KeyValueError> {
        let expires_at = Self::now_unix().saturating_add(i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX));
        self.store.kv_set(key, &value, expires_at).map_err(|err| KeyValueError::Backend(err.to_string()))
    }

    async fn incr_with_expiry(&self, key: &str, ttl: Duration) -> Result<u64, KeyValueError> {
        let now = Self::now_unix();
        let expires_at = now.saturating_add(i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX));
        self.store.kv_incr(key, now, expires_at).map_err(|err| KeyValueError::Backend(err.to_string()))
    }
}
