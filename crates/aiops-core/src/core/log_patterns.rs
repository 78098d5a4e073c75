// crates/aiops-core/src/core/log_patterns.rs
// ============================================================================
// Module: Log Pattern Catalog
// Description: Literal substrings the Logs Collector scans each retrieved
//              line for and records on its evidence; the same strings the
//              Rules Engine's LogPattern conditions match against.
// Purpose: Give the collector (producer) and the rule catalog (consumer)
//          one shared, static list instead of two independently maintained
//          string sets that can drift apart.
// ============================================================================

/// Connection-refused failures, typically a downstream dependency that is
/// down or unreachable.
pub const CONNECTION_REFUSED: &str = "connection refused";
/// A Kubernetes readiness probe explicitly reporting failure in application
/// logs.
pub const READINESS_PROBE_FAILED: &str = "readiness probe failed";
/// Go-style I/O timeout, typically surfaced on a stalled network call.
pub const IO_TIMEOUT: &str = "i/o timeout";
/// Go-style TCP dial failure.
pub const DIAL_TCP: &str = "dial tcp";

/// Every literal pattern the Logs Collector scans for (case-insensitively)
/// and records on matching evidence.
pub const ALL: &[&str] = &[CONNECTION_REFUSED, READINESS_PROBE_FAILED, IO_TIMEOUT, DIAL_TCP];
