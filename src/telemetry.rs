//! Best-effort telemetry sinks used by the SDK facade.
//!
//! Adapters must never disturb the caller's control flow: the facade calls them through
//! [`guarded`], which swallows panics.

use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::LogConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

pub trait LogAdapter: Send + Sync {
    fn add_log(&self, event_name: &str, message: &str, severity: LogSeverity);
}

pub trait VersionAdapter: Send + Sync {
    fn register(&self, module: &str, version: &str);
}

/// Forwards events to `tracing` under target `truvideo::log`.
#[derive(Debug, Clone)]
pub struct TracingLogAdapter {
    pub print_enabled: bool,
    pub redact: bool,
}

impl Default for TracingLogAdapter {
    fn default() -> Self { Self { print_enabled: true, redact: true } }
}

impl TracingLogAdapter {
    pub fn from_config(cfg: &LogConfig) -> Self {
        Self { print_enabled: cfg.print_enabled, redact: cfg.redact_credentials }
    }
}

impl LogAdapter for TracingLogAdapter {
    fn add_log(&self, event_name: &str, message: &str, severity: LogSeverity) {
        if !self.print_enabled { return; }
        let msg = if self.redact { redact_credentials(message) } else { message.to_string() };
        match severity {
            LogSeverity::Debug => debug!(target: "truvideo::log", event = event_name, "{}", msg),
            LogSeverity::Info => info!(target: "truvideo::log", event = event_name, "{}", msg),
            LogSeverity::Warning => warn!(target: "truvideo::log", event = event_name, "{}", msg),
            LogSeverity::Error => error!(target: "truvideo::log", event = event_name, "{}", msg),
        }
    }
}

impl VersionAdapter for TracingLogAdapter {
    fn register(&self, module: &str, version: &str) {
        if self.print_enabled {
            info!(target: "truvideo::log", module = module, version = version, "module registered");
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogAdapter;

impl LogAdapter for NoopLogAdapter {
    fn add_log(&self, _event_name: &str, _message: &str, _severity: LogSeverity) {}
}

impl VersionAdapter for NoopLogAdapter {
    fn register(&self, _module: &str, _version: &str) {}
}

const SENSITIVE_KEYS: [&str; 2] = ["payload=", "signature="];

/// Mask the values of `payload=` and `signature=` pairs in a space separated message.
/// Only the first four characters of each value survive; a value runs until the next
/// `name=` field, so values containing spaces are masked whole.
pub fn redact_credentials(message: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut masking = false;
    for part in message.split(' ') {
        if masking && !starts_field(part) { continue; }
        masking = false;
        match SENSITIVE_KEYS.iter().find_map(|k| part.strip_prefix(k).map(|v| (*k, v))) {
            Some((key, value)) => {
                masking = true;
                if value.is_empty() {
                    out.push(part.to_string());
                } else {
                    let keep: String = value.chars().take(4).collect();
                    out.push(format!("{}{}***", key, keep));
                }
            }
            None => out.push(part.to_string()),
        }
    }
    out.join(" ")
}

fn starts_field(part: &str) -> bool {
    match part.split_once('=') {
        Some((name, _)) => !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'),
        None => false,
    }
}

/// Run an adapter call, discarding any panic it raises.
pub(crate) fn guarded<F: FnOnce()>(f: F) {
    if catch_unwind(AssertUnwindSafe(f)).is_err() {
        warn!(target: "truvideo::sdk", "telemetry adapter panicked; event dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redaction_masks_only_sensitive_pairs() {
        let m = "api_key=KEY1 external_id=u-1 payload=abcdefgh.123 signature=0011223344";
        let r = redact_credentials(m);
        assert_eq!(r, "api_key=KEY1 external_id=u-1 payload=abcd*** signature=0011***");
    }

    #[test]
    fn redaction_covers_values_with_spaces() {
        let m = "api_key=K payload=abc def ghi signature=0011 2233 external_id=u-1";
        assert_eq!(redact_credentials(m), "api_key=K payload=abc*** signature=0011*** external_id=u-1");
        assert_eq!(redact_credentials("payload= leaked tail"), "payload=");
    }

    #[test]
    fn redaction_leaves_empty_values() {
        assert_eq!(redact_credentials("payload= x=1"), "payload= x=1");
    }

    #[test]
    fn guarded_swallows_panics() {
        struct Exploding;
        impl LogAdapter for Exploding {
            fn add_log(&self, _: &str, _: &str, _: LogSeverity) { panic!("sink down"); }
        }
        let sink = Exploding;
        guarded(|| sink.add_log("e", "m", LogSeverity::Info));
    }

    #[test]
    fn severity_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&LogSeverity::Warning).unwrap(), "\"WARNING\"");
    }
}
