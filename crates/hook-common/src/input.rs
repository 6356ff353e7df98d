//! Hook input parsing from stdin.

use crate::debug::DebugLog;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::io::{self, Read};

/// Session key used when the payload carries no `session_id`.
pub const MISSING_SESSION_KEY: &str = "None";

/// Session lifecycle payload received from the host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HookInput {
    /// Session ID; any JSON scalar is accepted
    #[serde(default)]
    pub session_id: Option<Value>,

    /// Working directory of the session
    #[serde(default)]
    pub cwd: Option<String>,

    /// Hook event name (e.g., "SessionStart", "SessionEnd")
    #[serde(default)]
    pub hook_event_name: Option<String>,

    /// What started the session (startup, resume, clear, compact)
    #[serde(default)]
    pub source: Option<String>,

    /// Why the session ended (SessionEnd only)
    #[serde(default)]
    pub reason: Option<String>,

    /// Path to the conversation transcript
    #[serde(default)]
    pub transcript_path: Option<String>,

    /// Additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl HookInput {
    /// Read the payload from stdin.
    ///
    /// Returns `None` for empty input and for input that is not a JSON
    /// object; the latter is recorded in the debug log.
    pub fn read_optional(debug: &DebugLog) -> Option<Self> {
        let mut raw = String::new();
        if let Err(e) = io::stdin().read_to_string(&mut raw) {
            debug.log(&format!("Failed to read hook input: {}", e));
            return None;
        }
        Self::parse_optional(&raw, debug)
    }

    /// Parse a raw payload, treating blank or malformed input as absent.
    pub fn parse_optional(raw: &str, debug: &DebugLog) -> Option<Self> {
        if raw.trim().is_empty() {
            return None;
        }

        match serde_json::from_str(raw) {
            Ok(input) => Some(input),
            Err(e) => {
                debug.log(&format!("Failed to decode JSON: {}", e));
                None
            }
        }
    }

    /// Session identifier as used in file names.
    ///
    /// Strings are taken verbatim, other scalars by their JSON text, and a
    /// missing or null id becomes [`MISSING_SESSION_KEY`]. Path separators
    /// are replaced so the key always names a file directly under the
    /// temp root.
    pub fn session_key(&self) -> String {
        let key = match &self.session_id {
            None | Some(Value::Null) => MISSING_SESSION_KEY.to_string(),
            Some(Value::String(id)) => id.clone(),
            Some(other) => other.to_string(),
        };
        key.replace(['/', '\\'], "_")
    }

    /// Get the session working directory if provided.
    pub fn get_cwd(&self) -> Option<&str> {
        self.cwd.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use std::fs;
    use tempfile::tempdir;

    fn scratch_log() -> (tempfile::TempDir, DebugLog) {
        let dir = tempdir().unwrap();
        let path = Utf8PathBuf::try_from(dir.path().join("debug.log")).unwrap();
        (dir, DebugLog::new(path))
    }

    #[test]
    fn test_parse_session_start() {
        let (_dir, debug) = scratch_log();
        let raw = r#"{"session_id": "abc", "cwd": "/work", "hook_event_name": "SessionStart", "source": "startup"}"#;
        let input = HookInput::parse_optional(raw, &debug).unwrap();
        assert_eq!(input.session_key(), "abc");
        assert_eq!(input.get_cwd(), Some("/work"));
        assert_eq!(input.source.as_deref(), Some("startup"));
    }

    #[test]
    fn test_unknown_fields_are_kept() {
        let (_dir, debug) = scratch_log();
        let raw = r#"{"session_id": "abc", "permission_mode": "default"}"#;
        let input = HookInput::parse_optional(raw, &debug).unwrap();
        assert_eq!(
            input.extra.get("permission_mode"),
            Some(&Value::String("default".to_string()))
        );
    }

    #[test]
    fn test_blank_input_is_absent_without_diagnostic() {
        let (_dir, debug) = scratch_log();
        assert!(HookInput::parse_optional("", &debug).is_none());
        assert!(HookInput::parse_optional("  \n\t", &debug).is_none());
        assert!(!debug.path().exists());
    }

    #[test]
    fn test_invalid_json_is_absent_with_diagnostic() {
        let (_dir, debug) = scratch_log();
        assert!(HookInput::parse_optional("{not json", &debug).is_none());

        let content = fs::read_to_string(debug.path()).unwrap();
        assert!(content.contains("Failed to decode JSON"));
    }

    #[test]
    fn test_non_object_json_is_absent() {
        let (_dir, debug) = scratch_log();
        assert!(HookInput::parse_optional("[1, 2]", &debug).is_none());
        assert!(debug.path().exists());
    }

    #[test]
    fn test_session_key_scalars() {
        let (_dir, debug) = scratch_log();
        let numeric = HookInput::parse_optional(r#"{"session_id": 42}"#, &debug).unwrap();
        assert_eq!(numeric.session_key(), "42");

        let null = HookInput::parse_optional(r#"{"session_id": null}"#, &debug).unwrap();
        assert_eq!(null.session_key(), "None");

        assert_eq!(HookInput::default().session_key(), "None");
    }

    #[test]
    fn test_session_key_strips_separators() {
        let input = HookInput {
            session_id: Some(Value::String("../etc/passwd".to_string())),
            ..Default::default()
        };
        assert_eq!(input.session_key(), ".._etc_passwd");
    }
}
