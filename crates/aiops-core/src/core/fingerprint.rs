// crates/aiops-core/src/core/fingerprint.rs
// ============================================================================
// Module: Alert Fingerprinting
// Description: Stable deduplication fingerprint derivation.
// Purpose: Give every alert a deterministic key independent of arrival order.
// Dependencies: sha2
// ============================================================================

use sha2::Digest;
use sha2::Sha256;

use crate::core::identifiers::Fingerprint;

/// Computes the stable dedup fingerprint for an alert.
///
/// `fingerprint = first32hex(sha256("<source>:<alertname>:<namespace>:<service>"))`,
/// using `""` where `service` is absent.
#[must_use]
pub fn compute_fingerprint(source: &str, alertname: &str, namespace: &str, service: Option<&str>) -> Fingerprint {
    let service = service.unwrap_or("");
    let input = format!("{source}:{alertname}:{namespace}:{service}");
    let digest = Sha256::digest(input.as_bytes());
    let full_hex = hex_encode(&digest);
    Fingerprint::from_hex(full_hex[.. 32].to_string())
}

/// Encodes bytes as lowercase hex without pulling in a dedicated hex crate.
fn hex_encode(bytes: &[u8]) -> String {
    const HEX_CHARS: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX_CHARS[(byte >> 4) as usize] as char);
        out.push(HEX_CHARS[(byte & 0x0f) as usize] as char);
    }
    out
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions are permitted."
)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_stable_for_same_inputs() {
        let a = compute_fingerprint("alertmanager", "PodCrashLooping", "default", Some("api"));
        let b = compute_fingerprint("alertmanager", "PodCrashLooping", "default", Some("api"));
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 32);
    }

    #[test]
    fn fingerprint_differs_on_any_component() {
        let base = compute_fingerprint("alertmanager", "PodCrashLooping", "default", Some("api"));
        let other_ns = compute_fingerprint("alertmanager", "PodCrashLooping", "prod", Some("api"));
        let no_service = compute_fingerprint("alertmanager", "PodCrashLooping", "default", None);
        assert_ne!(base, other_ns);
        assert_ne!(base, no_service);
    }

    #[test]
    fn missing_service_uses_empty_string() {
        let with_empty = compute_fingerprint("alertmanager", "X", "ns", Some(""));
        let with_none = compute_fingerprint("alertmanager", "X", "ns", None);
        assert_eq!(with_empty, with_none);
    }
}
