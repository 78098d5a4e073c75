// crates/aiops-collectors/src/logs.rs
// ============================================================================
// Module: Logs Collector
// Description: Collects and classifies recent log lines from the log store.
// Purpose: Turn raw log volume into a single evidence record per collection
//          scope, with error/warning counts and stack-trace detection
//          driving signal_strength.
// Dependencies: crate::log_client, aiops-core, regex
// ============================================================================

use std::collections::BTreeSet;
use std::sync::OnceLock;
use std::time::Instant;

use aiops_core::CollectionOutcome;
use aiops_core::Collector;
use aiops_core::CollectorContext;
use aiops_core::CollectorError;
use aiops_core::Evidence;
use aiops_core::EvidenceType;
use aiops_core::Incident;
use aiops_core::Timestamp;
use aiops_core::log_patterns;
use aiops_core::new_uuid_string;
use async_trait::async_trait;
use regex::Regex;
use regex::RegexSet;

use crate::log_client::LogLine;
use crate::log_client::LogStoreClient;

const MAX_LINES: u32 = 1000;
const MAX_EXAMPLES: usize = 5;
const MAX_ERROR_SAMPLES: usize = 10;
const EXAMPLE_TRUNCATE: usize = 1000;
const ERROR_SAMPLE_TRUNCATE: usize = 500;

const CATEGORY_NAMES: &[&str] =
    &["error", "critical", "oom", "network", "auth", "missing", "null_pointer", "connection", "disk", "tls"];
const CATEGORY_PATTERNS: &[&str] = &[
    r"(?i)\b(error|err|exception|failed|failure)\b",
    r"(?i)\b(panic|fatal|critical)\b",
    r"(?i)oomkilled|out of memory",
    r"(?i)connection refused|\btimeout\b",
    r"(?i)permission denied|forbidden",
    r"(?i)not found|missing",
    r"(?i)null pointer|nil pointer|segfault",
    r"(?i)cannot connect",
    r"(?i)disk full|no space left",
    r"(?i)\btls\b|\bssl\b|certificate",
];

const STACK_TRACE_PATTERNS: &[&str] = &[
    r"at\s+[\w.$]+\(.*\.java:\d+\)",
    r#"File "[^"]+", line \d+, in"#,
    r"goroutine \d+ \[.*\]:|\.go:\d+",
    r"at .*\(.*\.js:\d+:\d+\)",
];

#[allow(clippy::expect_used, reason = "patterns are crate constants, compiled once at first use")]
fn category_set() -> &'static RegexSet {
    static SET: OnceLock<RegexSet> = OnceLock::new();
    SET.get_or_init(|| RegexSet::new(CATEGORY_PATTERNS).expect("category patterns are valid"))
}

#[allow(clippy::expect_used, reason = "pattern is a crate constant, compiled once at first use")]
fn warn_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bwarn(ing)?\b").expect("warn pattern is valid"))
}

#[allow(clippy::expect_used, reason = "patterns are crate constants, compiled once at first use")]
fn stack_trace_set() -> &'static RegexSet {
    static SET: OnceLock<RegexSet> = OnceLock::new();
    SET.get_or_init(|| RegexSet::new(STACK_TRACE_PATTERNS).expect("stack trace patterns are valid"))
}

/// Collector that queries the log store and reduces recent lines into one
/// evidence record per collection scope.
pub struct LogsCollector {
    client: LogStoreClient,
}

impl LogsCollector {
    /// Builds a collector over the given log store client.
    #[must_use]
    pub const fn new(client: LogStoreClient) -> Self {
        Self { client }
    }

    fn signal_strength(error_count: usize, warning_count: usize, categories_hit: &[bool]) -> f64 {
        let base = if error_count > 10 {
            0.9
        } else if error_count > 5 {
            0.8
        } else if error_count > 0 {
            0.6
        } else if warning_count > 10 {
            0.5
        } else {
            0.3
        };
        let critical_present = categories_hit[1] || categories_hit[2];
        if critical_present { base.max(0.95) } else { base }
    }
}

fn selector_for(ctx: &CollectorContext) -> String {
    match &ctx.service {
        Some(service) => format!(r#"{{namespace="{}",pod=~"{service}.*"}}"#, ctx.namespace),
        None => format!(r#"{{namespace="{}"}}"#, ctx.namespace),
    }
}

fn truncate(text: &str, max_len: usize) -> String {
    if text.len() <= max_len { text.to_string() } else { format!("{}...", &text[..max_len]) }
}

#[async_trait]
impl Collector for LogsCollector {
    fn name(&self) -> &str {
        "logs"
    }

    async fn collect(
        &self,
        ctx: &CollectorContext,
        incident: &Incident,
    ) -> Result<CollectionOutcome, CollectorError> {
        let start = Instant::now();
        let mut outcome = CollectionOutcome::default();

        let selector = selector_for(ctx);
        let start_ns = i128::from(ctx.window.start.unix_timestamp()) * 1_000_000_000;
        let end_ns = i128::from(ctx.window.end.unix_timestamp()) * 1_000_000_000;

        let lines = match self.client.query_range(&selector, start_ns, end_ns, MAX_LINES).await {
            Ok(lines) => lines,
            Err(err) => {
                outcome.errors.push(format!("query_range: {err}"));
                outcome.duration = start.elapsed();
                return Ok(outcome);
            }
        };

        let mut error_count = 0usize;
        let mut warning_count = 0usize;
        let mut categories_hit = vec![false; CATEGORY_NAMES.len()];
        let mut stack_trace_hit = false;
        let mut examples: Vec<String> = Vec::new();
        let mut error_samples: Vec<String> = Vec::new();
        let mut patterns_found: BTreeSet<&'static str> = BTreeSet::new();

        for line in &lines {
            if examples.len() < MAX_EXAMPLES {
                examples.push(truncate(&line.line, EXAMPLE_TRUNCATE));
            }

            let matches = category_set().matches(&line.line);
            let is_error_line = matches.matched(0);
            if is_error_line {
                error_count += 1;
                if error_samples.len() < MAX_ERROR_SAMPLES {
                    error_samples.push(truncate(&line.line, ERROR_SAMPLE_TRUNCATE));
                }
            } else if warn_regex().is_match(&line.line) {
                warning_count += 1;
            }
            for index in matches.iter() {
                categories_hit[index] = true;
            }
            if stack_trace_set().is_match(&line.line) {
                stack_trace_hit = true;
            }

            let lower = line.line.to_ascii_lowercase();
            for pattern in log_patterns::ALL {
                if lower.contains(pattern) {
                    patterns_found.insert(pattern);
                }
            }
        }

        let signal_strength = Self::signal_strength(error_count, warning_count, &categories_hit);
        let hit_categories: Vec<&str> = CATEGORY_NAMES
            .iter()
            .zip(categories_hit.iter())
            .filter_map(|(name, hit)| hit.then_some(*name))
            .collect();

        let entity_name = ctx.service.clone().unwrap_or_else(|| ctx.namespace.clone());
        outcome.evidence.push(Evidence {
            id: new_uuid_string().into(),
            incident_id: incident.id.clone(),
            evidence_type: EvidenceType::Logs,
            source: "loki".to_string(),
            entity_name,
            entity_namespace: ctx.namespace.clone(),
            data: serde_json::json!({
                "line_count": lines.len(),
                "error_count": error_count,
                "warning_count": warning_count,
                "categories": hit_categories,
                "log_patterns": patterns_found.iter().collect::<Vec<_>>(),
                "stack_trace_detected": stack_trace_hit,
                "examples": examples,
                "error_samples": error_samples,
            }),
            signal_strength: Evidence::clamp_signal_strength(signal_strength),
            time_window: ctx.window,
            collected_at: Timestamp::now(),
        });

        outcome.duration = start.elapsed();
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use super::*;

    #[test]
    fn many_errors_signal_high() {
        let categories_hit = vec![false; CATEGORY_NAMES.len()];
        assert!((LogsCollector::signal_strength(11, 0, &categories_hit) - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn oom_category_lifts_to_at_least_point_nine_five() {
        let mut categories_hit = vec![false; CATEGORY_NAMES.len()];
        categories_hit[2] = true;
        assert!(LogsCollector::signal_strength(0, 0, &categories_hit) >= 0.95);
    }

    #[test]
    fn quiet_logs_signal_low() {
        let categories_hit = vec![false; CATEGORY_NAMES.len()];
        assert!((LogsCollector::signal_strength(0, 0, &categories_hit) - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn selector_includes_pod_filter_when_service_scoped() {
        let ctx = CollectorContext {
            cluster: "prod".into(),
            namespace: "checkout".into(),
            service: Some("checkout-api".into()),
            window: aiops_core::TimeWindow::new(Timestamp::now(), Timestamp::now()),
        };
        assert_eq!(selector_for(&ctx), r#"{namespace="checkout",pod=~"checkout-api.*"}"#);
    }

    #[test]
    fn truncate_appends_ellipsis_past_limit() {
        let text = "a".repeat(10);
        assert_eq!(truncate(&text, 5), "aaaaa...");
        assert_eq!(truncate(&text, 20), text);
    }

    #[test]
    fn known_patterns_are_detected_case_insensitively() {
        let lower = "upstream dial tcp 10.0.0.1:443: i/o timeout".to_ascii_lowercase();
        let mut found: BTreeSet<&'static str> = BTreeSet::new();
        for pattern in log_patterns::ALL {
            if lower.contains(pattern) {
                found.insert(pattern);
            }
        }
        assert!(found.contains(log_patterns::DIAL_TCP));
        assert!(found.contains(log_patterns::IO_TIMEOUT));
        assert!(!found.contains(log_patterns::CONNECTION_REFUSED));
    }
}
