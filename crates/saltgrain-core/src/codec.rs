//! Grain codec and salt-call command builder
//!
//! The minion answers `grains.get <key> --out=json` with an envelope of the
//! form `{"local": <value>}`. Decoding never fails hard: anything that does
//! not parse, or a `null` value, means the grain is absent.
//!
//! `SaltCall` only builds command strings. Running them is the transport's
//! job, which keeps command shapes testable without a host.

use crate::types::{GrainKey, GrainValue};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Absolute path of the management agent CLI on the minion.
pub const SALT_CALL: &str = "/usr/lib/venv-salt-minion/bin/salt-call";

/// Where the minion keeps one file per running job.
pub const MINION_PROC_DIR: &str = "/var/cache/venv-salt-minion/proc";

/// Host-side log that collects every convergence run.
pub const STATE_APPLY_LOG: &str = "/var/log/state.apply.tf.log";

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    local: Value,
}

pub struct GrainCodec;

impl GrainCodec {
    /// Decode a `grains.get` response. `None` means absent: malformed JSON,
    /// a missing `local` field, `null`, or an object value.
    pub fn decode(raw: &str) -> Option<GrainValue> {
        let envelope: Envelope = match serde_json::from_str(raw.trim()) {
            Ok(e) => e,
            Err(e) => {
                debug!("grain response is not a JSON envelope, treating as absent: {}", e);
                return None;
            }
        };

        match envelope.local {
            Value::String(s) => Some(GrainValue::Scalar(s)),
            Value::Number(n) => Some(GrainValue::Scalar(n.to_string())),
            Value::Bool(b) => Some(GrainValue::Scalar(b.to_string())),
            Value::Array(items) => Some(GrainValue::List(
                items.into_iter().filter_map(element_to_string).collect(),
            )),
            Value::Null | Value::Object(_) => None,
        }
    }

    /// Decode a scalar grain; absent or list-valued grains read as `""`.
    pub fn decode_scalar(raw: &str) -> String {
        match Self::decode(raw) {
            Some(GrainValue::Scalar(s)) => s,
            _ => String::new(),
        }
    }

    /// Decode a list grain; absent or scalar-valued grains read as `[]`.
    pub fn decode_list(raw: &str) -> Vec<String> {
        match Self::decode(raw) {
            Some(GrainValue::List(items)) => items,
            _ => Vec::new(),
        }
    }

    /// Render one value as a single shell token.
    pub fn encode(value: &str) -> String {
        shell_escape(value)
    }
}

fn element_to_string(v: Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Quote a string for a POSIX shell. Safe strings pass through bare.
pub fn shell_escape(s: &str) -> String {
    if s.is_empty() {
        return "''".to_string();
    }
    if s.chars().all(|c| {
        c.is_ascii_alphanumeric()
            || matches!(c, '-' | '_' | '.' | '/' | ':' | '@' | '%' | '+' | ',')
    }) {
        return s.to_string();
    }
    let escaped = s.replace('\'', "'\\''");
    format!("'{}'", escaped)
}

/// Builds salt-call command lines without executing them.
#[derive(Clone, Debug)]
pub struct SaltCall {
    binary: String,
}

impl Default for SaltCall {
    fn default() -> Self {
        Self::new()
    }
}

impl SaltCall {
    pub fn new() -> Self {
        Self {
            binary: SALT_CALL.to_string(),
        }
    }

    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// `grains.setval <key> <value>`
    pub fn setval(&self, key: &GrainKey, value: &str) -> String {
        format!(
            "{} grains.setval {} {}",
            self.binary,
            shell_escape(key.as_str()),
            GrainCodec::encode(value)
        )
    }

    /// `grains.get <key> --out=json`
    pub fn get(&self, key: &GrainKey) -> String {
        format!("{} grains.get {} --out=json", self.binary, shell_escape(key.as_str()))
    }

    /// `grains.delkey <key> --out=json`
    pub fn delkey(&self, key: &GrainKey) -> String {
        format!("{} grains.delkey {} --out=json", self.binary, shell_escape(key.as_str()))
    }

    /// `grains.append <key> <value> --out=json`
    pub fn append(&self, key: &GrainKey, value: &str) -> String {
        format!(
            "{} grains.append {} {} --out=json",
            self.binary,
            shell_escape(key.as_str()),
            GrainCodec::encode(value)
        )
    }

    /// `grains.remove <key> <value> --out=json`
    pub fn remove(&self, key: &GrainKey, value: &str) -> String {
        format!(
            "{} grains.remove {} {} --out=json",
            self.binary,
            shell_escape(key.as_str()),
            GrainCodec::encode(value)
        )
    }

    /// Lists the proc files of in-flight `state.apply` jobs. Prints nothing
    /// and exits 0 when the minion is idle.
    pub fn busy_probe(&self, proc_dir: &str) -> String {
        format!(
            "grep -l state.apply {}/* 2>/dev/null || true",
            shell_escape(proc_dir)
        )
    }

    /// Run `state.apply`, append its combined output to `log_path`, then print
    /// the last `tail_lines` of that log. The exit status is the tail's, so a
    /// failing state run is reported through the log rather than as an error.
    pub fn state_apply(&self, log_path: &str, tail_lines: usize) -> String {
        let log = shell_escape(log_path);
        format!(
            "{} state.apply >> {} 2>&1; tail -n {} {}",
            self.binary, log, tail_lines, log
        )
    }
}
