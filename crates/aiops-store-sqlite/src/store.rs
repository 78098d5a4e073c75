// crates/aiops-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Incident Store
// Description: Durable persistence for incidents, evidence, hypotheses,
//              remediation actions, verification results, and runbooks, plus
//              the key/value cache backing the gateway's dedup and
//              rate-limit counters.
// Purpose: The stand-in for `spec.md` §3's unspecified "relational tables".
// Dependencies: aiops-core, rusqlite, serde_json, thiserror
// ============================================================================

//! ## Overview
//! A single `SQLite` database, opened once and shared behind
//! `Arc<Mutex<Connection>>`, backs every row-shaped entity in the control
//! plane plus the gateway's key/value cache: WAL journal mode, a
//! `synchronous` pragma, a `busy_timeout`, and a `store_meta` schema-version
//! table — one writer at a time, guarded by the mutex, rather than a reader
//! pool.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use aiops_core::Evidence;
use aiops_core::Hypothesis;
use aiops_core::Incident;
use aiops_core::RemediationAction;
use aiops_core::VerificationResult;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for this store.
const SCHEMA_VERSION: i64 = 1;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SqliteSyncMode {
    /// Normal synchronous mode (balanced); matches `aiops-config`'s default.
    #[default]
    Normal,
    /// Full synchronous mode (safest).
    Full,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Full => "full",
        }
    }
}

/// Configuration for the `SQLite`-backed store.
#[derive(Debug, Clone)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    pub sync_mode: SqliteSyncMode,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Store I/O error (path validation, directory creation).
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// A row's JSON payload could not be encoded or decoded.
    #[error("sqlite store serialization error: {0}")]
    Serde(String),
    /// Invalid store configuration or path.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Listing Filters
// ============================================================================

/// Query filters for [`SqliteIncidentStore::list_incidents`], matching
/// `spec.md` §6's `GET /api/v1/incidents?status=&severity=&namespace=&limit=&offset=`.
#[derive(Debug, Clone, Default)]
pub struct IncidentFilters {
    /// Restrict to incidents with this status, if set.
    pub status: Option<aiops_core::IncidentStatus>,
    /// Restrict to incidents with this severity, if set.
    pub severity: Option<aiops_core::Severity>,
    /// Restrict to incidents in this namespace, if set.
    pub namespace: Option<String>,
    /// Maximum rows returned.
    pub limit: Option<usize>,
    /// Rows to skip before collecting `limit`.
    pub offset: Option<usize>,
}

impl IncidentFilters {
    fn matches(&self, incident: &Incident) -> bool {
        if let Some(status) = self.status
            && incident.status != status
        {
            return false;
        }
        if let Some(severity) = self.severity
            && incident.severity != severity
        {
            return false;
        }
        if let Some(namespace) = &self.namespace
            && incident.namespace.as_str() != namespace
        {
            return false;
        }
        true
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed persistence for the incident remediation control plane.
#[derive(Clone)]
pub struct SqliteIncidentStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteIncidentStore {
    /// Opens (creating if absent) a `SQLite`-backed store at `config.path`.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the path is invalid or the
    /// database cannot be opened or initialized.
    pub fn open(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(config)?;
        initialize_schema(&mut connection)?;
        Ok(Self { connection: Arc::new(Mutex::new(connection)) })
    }

    /// Opens an in-memory store, used by tests.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the in-memory database cannot be
    /// initialized.
    pub fn open_in_memory() -> Result<Self, SqliteStoreError> {
        let mut connection =
            Connection::open_in_memory().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        initialize_schema(&mut connection)?;
        Ok(Self { connection: Arc::new(Mutex::new(connection)) })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection.lock().map_err(|_| SqliteStoreError::Db("connection mutex poisoned".to_string()))
    }

    /// Inserts or replaces an incident row.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on serialization or database failure.
    pub fn put_incident(&self, incident: &Incident) -> Result<(), SqliteStoreError> {
        let json = serde_json::to_string(incident).map_err(|err| SqliteStoreError::Serde(err.to_string()))?;
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO incidents (id, fingerprint, data_json) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET fingerprint = excluded.fingerprint, data_json = excluded.data_json",
                params![incident.id.as_str(), incident.fingerprint.as_str(), json],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(())
    }

    /// Fetches an incident by id.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on deserialization or database failure.
    pub fn get_incident(&self, id: &str) -> Result<Option<Incident>, SqliteStoreError> {
        let guard = self.lock()?;
        let json: Option<String> = guard
            .query_row("SELECT data_json FROM incidents WHERE id = ?1", params![id], |row| row.get(0))
            .optional()
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        json.map(|value| serde_json::from_str(&value).map_err(|err| SqliteStoreError::Serde(err.to_string())))
            .transpose()
    }

    /// Lists incidents, newest first, applying `filters` and pagination
    /// in-process. Matches `spec.md` §6's `GET /api/v1/incidents` query
    /// parameters; there is no dedicated status/severity/namespace column
    /// to push the filter into `SQLite`, so rows are deserialized and
    /// filtered in Rust.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on deserialization or database failure.
    pub fn list_incidents(&self, filters: &IncidentFilters) -> Result<Vec<Incident>, SqliteStoreError> {
        let guard = self.lock()?;
        let mut statement = guard
            .prepare("SELECT data_json FROM incidents ORDER BY rowid DESC")
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let rows = statement
            .query_map(params![], |row| row.get::<_, String>(0))
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let mut matched = Vec::new();
        for row in rows {
            let json = row.map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            let incident: Incident =
                serde_json::from_str(&json).map_err(|err| SqliteStoreError::Serde(err.to_string()))?;
            if filters.matches(&incident) {
                matched.push(incident);
            }
        }
        let offset = filters.offset.unwrap_or(0);
        let limit = filters.limit.unwrap_or(matched.len());
        Ok(matched.into_iter().skip(offset).take(limit).collect())
    }

    /// Finds the open incident matching `fingerprint`, if any. Used by the
    /// gateway's non-KV dedup fallback and by tests; the primary dedup path
    /// is the [`KeyValueStore`](aiops_core::interfaces::KeyValueStore) cache.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on deserialization or database failure.
    pub fn find_incident_by_fingerprint(
        &self,
        fingerprint: &str,
    ) -> Result<Option<Incident>, SqliteStoreError> {
        let guard = self.lock()?;
        let json: Option<String> = guard
            .query_row(
                "SELECT data_json FROM incidents WHERE fingerprint = ?1 ORDER BY rowid DESC LIMIT 1",
                params![fingerprint],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        json.map(|value| serde_json::from_str(&value).map_err(|err| SqliteStoreError::Serde(err.to_string())))
            .transpose()
    }

    /// Appends an evidence row.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on serialization or database failure.
    pub fn put_evidence(&self, evidence: &Evidence) -> Result<(), SqliteStoreError> {
        let json = serde_json::to_string(evidence).map_err(|err| SqliteStoreError::Serde(err.to_string()))?;
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO evidence (id, incident_id, data_json) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET data_json = excluded.data_json",
                params![evidence.id.as_str(), evidence.incident_id.as_str(), json],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(())
    }

    /// Lists all evidence for an incident, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on deserialization or database failure.
    pub fn list_evidence(&self, incident_id: &str) -> Result<Vec<Evidence>, SqliteStoreError> {
        let guard = self.lock()?;
        let mut statement = guard
            .prepare("SELECT data_json FROM evidence WHERE incident_id = ?1 ORDER BY rowid ASC")
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let rows = statement
            .query_map(params![incident_id], |row| row.get::<_, String>(0))
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let mut out = Vec::new();
        for row in rows {
            let json = row.map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            out.push(serde_json::from_str(&json).map_err(|err| SqliteStoreError::Serde(err.to_string()))?);
        }
        Ok(out)
    }

    /// Inserts or replaces a hypothesis row.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on serialization or database failure.
    pub fn put_hypothesis(&self, hypothesis: &Hypothesis) -> Result<(), SqliteStoreError> {
        let json =
            serde_json::to_string(hypothesis).map_err(|err| SqliteStoreError::Serde(err.to_string()))?;
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO hypotheses (id, incident_id, data_json) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET data_json = excluded.data_json",
                params![hypothesis.id.as_str(), hypothesis.incident_id.as_str(), json],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(())
    }

    /// Lists all hypotheses for an incident, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on deserialization or database failure.
    pub fn list_hypotheses(&self, incident_id: &str) -> Result<Vec<Hypothesis>, SqliteStoreError> {
        let guard = self.lock()?;
        let mut statement = guard
            .prepare("SELECT data_json FROM hypotheses WHERE incident_id = ?1 ORDER BY rowid ASC")
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let rows = statement
            .query_map(params![incident_id], |row| row.get::<_, String>(0))
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let mut out = Vec::new();
        for row in rows {
            let json = row.map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            out.push(serde_json::from_str(&json).map_err(|err| SqliteStoreError::Serde(err.to_string()))?);
        }
        Ok(out)
    }

    /// Inserts or replaces a remediation action row.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on serialization or database failure.
    pub fn put_remediation_action(&self, action: &RemediationAction) -> Result<(), SqliteStoreError> {
        let json = serde_json::to_string(action).map_err(|err| SqliteStoreError::Serde(err.to_string()))?;
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO remediation_actions (id, incident_id, idempotency_key, data_json)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET data_json = excluded.data_json",
                params![action.id.as_str(), action.incident_id.as_str(), action.idempotency_key, json],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(())
    }

    /// Finds a remediation action by its idempotency key, used by the
    /// executor to detect and skip duplicate retries.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on deserialization or database failure.
    pub fn find_action_by_idempotency_key(
        &self,
        idempotency_key: &str,
    ) -> Result<Option<RemediationAction>, SqliteStoreError> {
        let guard = self.lock()?;
        let json: Option<String> = guard
            .query_row(
                "SELECT data_json FROM remediation_actions WHERE idempotency_key = ?1",
                params![idempotency_key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        json.map(|value| serde_json::from_str(&value).map_err(|err| SqliteStoreError::Serde(err.to_string())))
            .transpose()
    }

    /// Inserts a verification result row.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on serialization or database failure.
    pub fn put_verification_result(&self, result: &VerificationResult) -> Result<(), SqliteStoreError> {
        let json = serde_json::to_string(result).map_err(|err| SqliteStoreError::Serde(err.to_string()))?;
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO verification_results (action_id, incident_id, data_json) VALUES (?1, ?2, ?3)
                 ON CONFLICT(action_id) DO UPDATE SET data_json = excluded.data_json",
                params![result.action_id.as_str(), result.incident_id.as_str(), json],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(())
    }

    /// Persists a runbook document, keyed by its own uuid, per `spec.md`
    /// §4.6's "persists the runbook to a durable store keyed by uuid".
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on serialization or database failure.
    pub fn put_runbook(&self, runbook_id: &str, incident_id: &str, data_json: &str) -> Result<(), SqliteStoreError> {
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO runbooks (id, incident_id, data_json) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET data_json = excluded.data_json",
                params![runbook_id, incident_id, data_json],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(())
    }

    /// Fetches a previously persisted runbook document by id.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on database failure.
    pub fn get_runbook(&self, runbook_id: &str) -> Result<Option<String>, SqliteStoreError> {
        let guard = self.lock()?;
        guard
            .query_row("SELECT data_json FROM runbooks WHERE id = ?1", params![runbook_id], |row| row.get(0))
            .optional()
            .map_err(|err| SqliteStoreError::Db(err.to_string()))
    }

    /// Fetches a cache value, pruning it first if its TTL has elapsed.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on database failure.
    pub fn kv_get(&self, key: &str, now_unix: i64) -> Result<Option<Vec<u8>>, SqliteStoreError> {
        let guard = self.lock()?;
        guard
            .execute("DELETE FROM kv_cache WHERE key = ?1 AND expires_at <= ?2", params![key, now_unix])
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        guard
            .query_row("SELECT value FROM kv_cache WHERE key = ?1", params![key], |row| row.get(0))
            .optional()
            .map_err(|err| SqliteStoreError::Db(err.to_string()))
    }

    /// Sets a cache value with an absolute expiry timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on database failure.
    pub fn kv_set(&self, key: &str, value: &[u8], expires_at_unix: i64) -> Result<(), SqliteStoreError> {
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO kv_cache (key, value, expires_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at",
                params![key, value, expires_at_unix],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(())
    }

    /// Atomically increments a counter, creating it with `expires_at_unix`
    /// if absent or already expired, and returns the post-increment value.
    /// Backs the gateway's sliding-window rate limiter.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on database failure.
    pub fn kv_incr(&self, key: &str, now_unix: i64, expires_at_unix: i64) -> Result<u64, SqliteStoreError> {
        let guard = self.lock()?;
        let tx = guard
            .unchecked_transaction()
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        tx.execute("DELETE FROM kv_counters WHERE key = ?1 AND expires_at <= ?2", params![key, now_unix])
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        tx.execute(
            "INSERT INTO kv_counters (key, value, expires_at) VALUES (?1, 1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = value + 1",
            params![key, expires_at_unix],
        )
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let value: i64 = tx
            .query_row("SELECT value FROM kv_counters WHERE key = ?1", params![key], |row| row.get(0))
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(u64::try_from(value).unwrap_or(0))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) else {
        return Ok(());
    };
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid("store path contains an overlong component".to_string()));
        }
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid("store path must be a file, not a directory".to_string()));
    }
    Ok(())
}

fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection =
        Connection::open_with_flags(&config.path, flags).map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

fn apply_pragmas(connection: &Connection, config: &SqliteStoreConfig) -> Result<(), SqliteStoreError> {
    connection
        .execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    if version.is_none() {
        tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        tx.execute_batch(
            "CREATE TABLE IF NOT EXISTS incidents (
                id TEXT PRIMARY KEY,
                fingerprint TEXT NOT NULL,
                data_json TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_incidents_fingerprint ON incidents (fingerprint);
            CREATE TABLE IF NOT EXISTS evidence (
                id TEXT PRIMARY KEY,
                incident_id TEXT NOT NULL,
                data_json TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_evidence_incident ON evidence (incident_id);
            CREATE TABLE IF NOT EXISTS hypotheses (
                id TEXT PRIMARY KEY,
                incident_id TEXT NOT NULL,
                data_json TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_hypotheses_incident ON hypotheses (incident_id);
            CREATE TABLE IF NOT EXISTS remediation_actions (
                id TEXT PRIMARY KEY,
                incident_id TEXT NOT NULL,
                idempotency_key TEXT NOT NULL UNIQUE,
                data_json TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_actions_incident ON remediation_actions (incident_id);
            CREATE TABLE IF NOT EXISTS verification_results (
                action_id TEXT PRIMARY KEY,
                incident_id TEXT NOT NULL,
                data_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS runbooks (
                id TEXT PRIMARY KEY,
                incident_id TEXT NOT NULL,
                data_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS kv_cache (
                key TEXT PRIMARY KEY,
                value BLOB NOT NULL,
                expires_at INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS kv_counters (
                key TEXT PRIMARY KEY,
                value INTEGER NOT NULL,
                expires_at INTEGER NOT NULL
            );",
        )
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    }
    tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use std::collections::BTreeMap;

    use aiops_core::ClusterId;
    use aiops_core::IncidentStatus;
    use aiops_core::NamespaceId;
    use aiops_core::Severity;
    use aiops_core::Timestamp;

    use super::*;

    fn sample_incident() -> Incident {
        let now = Timestamp::now();
        Incident {
            id: "inc-1".into(),
            fingerprint: aiops_core::compute_fingerprint(
                "alertmanager",
                "PodCrashLooping",
                "default",
                Some("api"),
            ),
            title: "PodCrashLooping: api-7d-xyz".to_string(),
            severity: Severity::Critical,
            status: IncidentStatus::Open,
            source: "alertmanager".to_string(),
            cluster: ClusterId::new("prod-1"),
            namespace: NamespaceId::new("default"),
            service: None,
            labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
            started_at: now,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn round_trips_an_incident() {
        let store = SqliteIncidentStore::open_in_memory().unwrap();
        let incident = sample_incident();
        store.put_incident(&incident).unwrap();
        let fetched = store.get_incident(incident.id.as_str()).unwrap().unwrap();
        assert_eq!(fetched, incident);
    }

    #[test]
    fn finds_incident_by_fingerprint() {
        let store = SqliteIncidentStore::open_in_memory().unwrap();
        let incident = sample_incident();
        store.put_incident(&incident).unwrap();
        let found = store.find_incident_by_fingerprint(incident.fingerprint.as_str()).unwrap();
        assert_eq!(found.unwrap().id, incident.id);
    }

    #[test]
    fn missing_incident_returns_none() {
        let store = SqliteIncidentStore::open_in_memory().unwrap();
        assert!(store.get_incident("does-not-exist").unwrap().is_none());
    }

    #[test]
    fn kv_cache_round_trips_and_expires() {
        let store = SqliteIncidentStore::open_in_memory().unwrap();
        store.kv_set("fp:abc", b"1", 1_000).unwrap();
        assert_eq!(store.kv_get("fp:abc", 500).unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.kv_get("fp:abc", 1_001).unwrap(), None);
    }

    #[test]
    fn kv_counter_increments_and_resets_after_expiry() {
        let store = SqliteIncidentStore::open_in_memory().unwrap();
        assert_eq!(store.kv_incr("rl:tenant", 0, 60).unwrap(), 1);
        assert_eq!(store.kv_incr("rl:tenant", 1, 60).unwrap(), 2);
        assert_eq!(store.kv_incr("rl:tenant", 61, 120).unwrap(), 1);
    }

    #[test]
    fn remediation_action_found_by_idempotency_key() {
        let store = SqliteIncidentStore::open_in_memory().unwrap();
        let incident = sample_incident();
        store.put_incident(&incident).unwrap();
        let action = aiops_core::RemediationAction {
            id: "act-1".into(),
            incident_id: incident.id.clone(),
            hypothesis_id: None,
            action_type: aiops_core::ActionType::RestartPod,
            target: aiops_core::Target {
                cluster: "prod-1".to_string(),
                namespace: "default".to_string(),
                kind: "pod".to_string(),
                name: "api-7d-xyz".to_string(),
            },
            parameters: BTreeMap::new(),
            status: aiops_core::ActionStatus::Proposed,
            risk_level: aiops_core::RiskLevel::Low,
            blast_radius_score: 10.0,
            affected_replicas: 1,
            environment: "prod".to_string(),
            idempotency_key: "inc-1_restart_pod_api-7d-xyz_123".to_string(),
            approval: aiops_core::ApprovalAudit::not_required(),
        };
        store.put_remediation_action(&action).unwrap();
        let found = store.find_action_by_idempotency_key(&action.idempotency_key).unwrap();
        assert_eq!(found.unwrap().id, action.id);
    }
}
