//! Per-session state files under the temp root.

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use std::fs;

/// Prefix of the pid file recording a session's watcher.
pub const PID_FILE_PREFIX: &str = "mgrep-watch-pid";

/// Prefix of the log capturing a watcher's stdout and stderr.
pub const COMMAND_LOG_PREFIX: &str = "mgrep-watch-command";

/// Manager for session state files in the temp root.
///
/// The pid file is a presence marker: its existence means a watcher was
/// launched for the session. Nothing checks that the recorded process is
/// still alive.
#[derive(Debug, Clone)]
pub struct StateManager {
    /// Base directory for state files
    base_dir: Utf8PathBuf,
}

impl StateManager {
    pub fn new(base_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// `<base>/mgrep-watch-pid-<session>.txt`
    pub fn pid_path(&self, session: &str) -> Utf8PathBuf {
        self.base_dir
            .join(format!("{}-{}.txt", PID_FILE_PREFIX, session))
    }

    /// `<base>/mgrep-watch-command-<session>.log`
    pub fn command_log_path(&self, session: &str) -> Utf8PathBuf {
        self.base_dir
            .join(format!("{}-{}.log", COMMAND_LOG_PREFIX, session))
    }

    /// Check if a watcher is recorded for the session.
    pub fn pid_exists(&self, session: &str) -> bool {
        self.pid_path(session).exists()
    }

    /// Record the watcher's process id.
    pub fn save_pid(&self, session: &str, pid: u32) -> Result<()> {
        let path = self.pid_path(session);
        fs::write(&path, pid.to_string())
            .with_context(|| format!("Failed to write pid file: {}", path))?;
        Ok(())
    }

    /// Load the recorded process id, `None` when no pid file exists.
    pub fn load_pid(&self, session: &str) -> Result<Option<u32>> {
        let path = self.pid_path(session);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read pid file: {}", path))?;

        let pid = content
            .trim()
            .parse::<u32>()
            .with_context(|| format!("Failed to parse pid file: {}", path))?;

        Ok(Some(pid))
    }

    /// Delete the pid file if present.
    pub fn delete_pid(&self, session: &str) -> Result<()> {
        let path = self.pid_path(session);
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to delete pid file: {}", path))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn manager_in(dir: &tempfile::TempDir) -> StateManager {
        StateManager::new(Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap())
    }

    #[test]
    fn test_paths_are_namespaced_by_session() {
        let manager = StateManager::new("/tmp/mgrep");
        assert_eq!(
            manager.pid_path("abc"),
            Utf8PathBuf::from("/tmp/mgrep/mgrep-watch-pid-abc.txt")
        );
        assert_eq!(
            manager.command_log_path("abc"),
            Utf8PathBuf::from("/tmp/mgrep/mgrep-watch-command-abc.log")
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let manager = manager_in(&dir);

        manager.save_pid("abc", 4242).unwrap();
        assert!(manager.pid_exists("abc"));
        assert_eq!(manager.load_pid("abc").unwrap(), Some(4242));
        assert_eq!(
            fs::read_to_string(manager.pid_path("abc")).unwrap(),
            "4242"
        );
    }

    #[test]
    fn test_load_missing() {
        let dir = tempdir().unwrap();
        let manager = manager_in(&dir);

        assert_eq!(manager.load_pid("nonexistent").unwrap(), None);
    }

    #[test]
    fn test_load_garbage_is_error() {
        let dir = tempdir().unwrap();
        let manager = manager_in(&dir);
        fs::write(manager.pid_path("abc"), "not-a-pid").unwrap();

        assert!(manager.load_pid("abc").is_err());
    }

    #[test]
    fn test_delete() {
        let dir = tempdir().unwrap();
        let manager = manager_in(&dir);

        manager.save_pid("abc", 1).unwrap();
        manager.delete_pid("abc").unwrap();
        assert!(!manager.pid_exists("abc"));

        // Deleting again is fine
        manager.delete_pid("abc").unwrap();
    }
}
