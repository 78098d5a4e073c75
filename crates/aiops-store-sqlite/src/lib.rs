// crates/aiops-store-sqlite/src/lib.rs
// ============================================================================
// Module: AIOps SQLite Store
// Description: Public API for the SQLite-backed persistence crate.
// Purpose: Export the store type and its configuration surface.
// Dependencies: crate::store
// ============================================================================

//! ## Overview
//! `aiops-store-sqlite` persists incidents, evidence, hypotheses,
//! remediation actions, verification results, and runbooks, plus the
//! gateway's fingerprint/rate-limit key/value cache, behind a single
//! `SQLite` connection.

mod kv;
mod store;

pub use kv::SqliteKeyValueStore;
pub use store::IncidentFilters;
pub use store::SqliteIncidentStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
