// crates/aiops-core/src/core/identifiers.rs
// ============================================================================
// Module: Incident Control Plane Identifiers
// Description: Canonical opaque identifiers used across the incident
//              remediation control plane.
// Purpose: Provide strongly typed, serializable identifiers with stable wire
//          forms so entity ids cannot be cross-assigned by accident.
// Dependencies: serde, uuid
// ============================================================================

//! ## Overview
//! Identifiers are opaque wrappers over `String`/`Uuid` that serialize
//! transparently on the wire. They carry no normalization beyond what is
//! documented on each type.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// Generates a newtype identifier wrapping an opaque UTF-8 string.
macro_rules! string_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[doc = concat!("Creates a new ", stringify!($name), ".")]
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }
    };
}

string_id!(IncidentId, "Incident identifier, a UUID rendered as a string.");
string_id!(EvidenceId, "Evidence record identifier.");
string_id!(HypothesisId, "Hypothesis identifier.");
string_id!(RemediationActionId, "Remediation action identifier.");
string_id!(RunbookId, "Runbook identifier.");
string_id!(GraphEntityId, "Composite graph entity id, `\"<kind>:<namespace>:<name>\"`.");
string_id!(ClusterId, "Cluster identifier as reported by the source alert.");
string_id!(NamespaceId, "Kubernetes namespace name.");
string_id!(ServiceId, "Logical service name (often the `app` label value).");

/// Stable deduplication key derived from `(source, alertname, namespace, service)`.
///
/// # Invariants
/// - Always exactly 32 lowercase hex characters (the first 32 hex digits of a
///   SHA-256 digest).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wraps a precomputed fingerprint value.
    ///
    /// # Invariants
    /// - Callers must only pass values produced by
    ///   [`crate::core::fingerprint::compute_fingerprint`].
    #[must_use]
    pub fn from_hex(hex: String) -> Self {
        Self(hex)
    }

    /// Returns the fingerprint as a hex string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Generates a new random-backed identifier (v4 UUID rendered as a string).
#[must_use]
pub fn new_uuid_string() -> String {
    Uuid::new_v4().to_string()
}
