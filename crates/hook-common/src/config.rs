//! Hook configuration, resolved once from the environment.

use crate::debug::DebugLog;
use crate::state::StateManager;
use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;

/// Overrides the directory holding pid files and logs.
pub const TMP_DIR_ENV: &str = "MGREP_TMP";

/// Overrides the debug log path.
pub const DEBUG_LOG_ENV: &str = "MGREP_WATCH_LOG";

/// Debug log file name under the temp root when `MGREP_WATCH_LOG` is unset.
pub const DEBUG_LOG_FILE_NAME: &str = "mgrep-watch.log";

/// Paths and lookup settings shared by the session hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookConfig {
    /// Root for pid files and command logs
    pub tmp_dir: Utf8PathBuf,
    /// Append-only diagnostics file
    pub debug_log: Utf8PathBuf,
    /// Executable search path (`PATH`), captured at startup
    pub search_path: Option<OsString>,
}

impl HookConfig {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var_os(key))
    }

    /// Build the configuration from an arbitrary variable lookup.
    ///
    /// Empty values count as unset. Path overrides and the system temp
    /// directory must be valid UTF-8; anything else is an error rather than
    /// a silent fallback.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let utf8_path = |key: &str| -> Result<Option<Utf8PathBuf>> {
            match lookup(key).filter(|value| !value.is_empty()) {
                Some(value) => Utf8PathBuf::try_from(PathBuf::from(value))
                    .map(Some)
                    .with_context(|| format!("{} is not valid UTF-8", key)),
                None => Ok(None),
            }
        };

        let tmp_dir = match utf8_path(TMP_DIR_ENV)? {
            Some(dir) => dir,
            None => Utf8PathBuf::try_from(std::env::temp_dir())
                .context("System temp directory is not valid UTF-8; set MGREP_TMP")?,
        };

        let debug_log = utf8_path(DEBUG_LOG_ENV)?
            .unwrap_or_else(|| tmp_dir.join(DEBUG_LOG_FILE_NAME));

        Ok(Self {
            tmp_dir,
            debug_log,
            search_path: lookup("PATH"),
        })
    }

    /// Create the temp root if it does not exist yet.
    pub fn ensure_tmp_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.tmp_dir)
            .with_context(|| format!("Failed to create temp directory: {}", self.tmp_dir))
    }

    /// Debug logger writing to the configured log path.
    pub fn debug(&self) -> DebugLog {
        DebugLog::new(self.debug_log.clone())
    }

    /// Per-session state files under the temp root.
    pub fn state(&self) -> StateManager {
        StateManager::new(self.tmp_dir.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> HookConfig {
        let vars: HashMap<String, OsString> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), OsString::from(*v)))
            .collect();
        HookConfig::from_lookup(|key| vars.get(key).cloned()).unwrap()
    }

    #[test]
    fn test_tmp_override() {
        let config = config_from(&[("MGREP_TMP", "/var/run/mgrep")]);
        assert_eq!(config.tmp_dir, Utf8PathBuf::from("/var/run/mgrep"));
        assert_eq!(
            config.debug_log,
            Utf8PathBuf::from("/var/run/mgrep/mgrep-watch.log")
        );
    }

    #[test]
    fn test_debug_log_override() {
        let config = config_from(&[
            ("MGREP_TMP", "/var/run/mgrep"),
            ("MGREP_WATCH_LOG", "/var/log/watch.log"),
        ]);
        assert_eq!(config.debug_log, Utf8PathBuf::from("/var/log/watch.log"));
    }

    #[test]
    fn test_defaults_to_system_temp() {
        let config = config_from(&[]);
        let expected = Utf8PathBuf::try_from(std::env::temp_dir()).unwrap();
        assert_eq!(config.tmp_dir, expected);
        assert_eq!(config.debug_log, expected.join("mgrep-watch.log"));
        assert_eq!(config.search_path, None);
    }

    #[test]
    fn test_empty_override_is_ignored() {
        let config = config_from(&[("MGREP_TMP", "")]);
        let expected = Utf8PathBuf::try_from(std::env::temp_dir()).unwrap();
        assert_eq!(config.tmp_dir, expected);
    }

    #[test]
    fn test_captures_search_path() {
        let config = config_from(&[("PATH", "/usr/local/bin:/usr/bin")]);
        assert_eq!(
            config.search_path,
            Some(OsString::from("/usr/local/bin:/usr/bin"))
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_overrides_are_errors() {
        use std::os::unix::ffi::OsStringExt;

        let invalid = || Some(OsString::from_vec(b"/tmp/over\xff".to_vec()));

        let err = HookConfig::from_lookup(|key| match key {
            "MGREP_TMP" => invalid(),
            _ => None,
        })
        .unwrap_err();
        assert!(err.to_string().contains("MGREP_TMP"));

        let err = HookConfig::from_lookup(|key| match key {
            "MGREP_TMP" => Some(OsString::from("/tmp/mgrep")),
            "MGREP_WATCH_LOG" => invalid(),
            _ => None,
        })
        .unwrap_err();
        assert!(err.to_string().contains("MGREP_WATCH_LOG"));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_search_path_is_kept() {
        use std::os::unix::ffi::OsStringExt;

        let raw = b"/opt/bin\xff:/usr/bin".to_vec();
        let config = HookConfig::from_lookup(|key| match key {
            "MGREP_TMP" => Some(OsString::from("/tmp/mgrep")),
            "PATH" => Some(OsString::from_vec(raw.clone())),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.search_path, Some(OsString::from_vec(raw)));
    }

    #[test]
    fn test_ensure_tmp_dir_creates_nested() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let config = config_from(&[("MGREP_TMP", nested.to_str().unwrap())]);

        config.ensure_tmp_dir().unwrap();
        assert!(nested.is_dir());
    }
}
