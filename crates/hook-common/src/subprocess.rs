//! Subprocess execution utilities.
//!
//! Besides running short shell commands, hooks launch long-lived helpers
//! that must outlive the hook itself. [`spawn_detached`] starts such a
//! process in its own session (POSIX) or process group (Windows) and hands
//! back only its pid.

use anyhow::{Context, Result};
use std::ffi::OsStr;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;

/// `CREATE_NEW_PROCESS_GROUP` from the Win32 process creation flags.
pub const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;

/// Failures while launching a detached process.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("{name} command not found in PATH")]
    ExecutableNotFound {
        name: String,
        #[source]
        source: which::Error,
    },

    #[error("failed to open command log {}", path.display())]
    CommandLog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to spawn {}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Platform family, as far as process detachment is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Posix,
    Windows,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Posix
        }
    }
}

/// How a spawned process is cut loose from its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detach {
    /// `setsid()` in the child before exec
    NewSession,
    /// Process creation flags
    NewProcessGroup { creation_flags: u32 },
}

impl Detach {
    pub fn for_platform(platform: Platform) -> Self {
        match platform {
            Platform::Posix => Detach::NewSession,
            Platform::Windows => Detach::NewProcessGroup {
                creation_flags: CREATE_NEW_PROCESS_GROUP,
            },
        }
    }

    /// Windows creation flags requested by this mode, if any.
    pub fn creation_flags(&self) -> Option<u32> {
        match self {
            Detach::NewSession => None,
            Detach::NewProcessGroup { creation_flags } => Some(*creation_flags),
        }
    }

    pub fn starts_new_session(&self) -> bool {
        matches!(self, Detach::NewSession)
    }
}

/// Everything needed to start a detached process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnPlan {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub detach: Detach,
}

impl SpawnPlan {
    pub fn new<I, S>(program: impl Into<PathBuf>, args: I, platform: Platform) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            detach: Detach::for_platform(platform),
        }
    }

    /// Program followed by its arguments.
    pub fn command_line(&self) -> Vec<String> {
        std::iter::once(self.program.to_string_lossy().into_owned())
            .chain(self.args.iter().cloned())
            .collect()
    }

    fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args).stdin(Stdio::null());
        apply_detach(&mut command, self.detach);
        command
    }
}

#[cfg(unix)]
fn apply_detach(command: &mut Command, detach: Detach) {
    use std::os::unix::process::CommandExt;

    match detach {
        Detach::NewSession => {
            // SAFETY: setsid is async-signal-safe and touches no parent state.
            unsafe {
                command.pre_exec(|| {
                    nix::unistd::setsid()
                        .map(|_| ())
                        .map_err(std::io::Error::from)
                });
            }
        }
        Detach::NewProcessGroup { .. } => {
            command.process_group(0);
        }
    }
}

#[cfg(windows)]
fn apply_detach(command: &mut Command, detach: Detach) {
    use std::os::windows::process::CommandExt;

    let flags = detach.creation_flags().unwrap_or(CREATE_NEW_PROCESS_GROUP);
    command.creation_flags(flags);
}

/// A launched process the caller no longer owns.
///
/// Only the id survives the launch; the child is never waited on or
/// signalled through a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnedProcess {
    pub pid: u32,
}

/// Resolve `name` on `search_path` (a `PATH`-style list).
///
/// On Windows the usual executable extensions (`.exe`, `.cmd`, ...) are
/// tried as well.
pub fn resolve_executable(
    name: &str,
    search_path: Option<&OsStr>,
) -> Result<PathBuf, LaunchError> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    which::which_in(name, search_path, cwd).map_err(|source| LaunchError::ExecutableNotFound {
        name: name.to_string(),
        source,
    })
}

/// Open (create or truncate) the file that captures a child's output.
pub fn open_command_log(path: &Path) -> Result<File, LaunchError> {
    File::create(path).map_err(|source| LaunchError::CommandLog {
        path: path.to_path_buf(),
        source,
    })
}

/// Spawn `plan` detached, with stdout and stderr both sent to `output`.
///
/// Returns as soon as the process has started.
pub fn spawn_detached(plan: &SpawnPlan, output: File) -> Result<SpawnedProcess, LaunchError> {
    let spawn_error = |source: std::io::Error| LaunchError::Spawn {
        program: plan.program.clone(),
        source,
    };
    let stderr = output.try_clone().map_err(spawn_error)?;

    let child = plan
        .to_command()
        .stdout(Stdio::from(output))
        .stderr(Stdio::from(stderr))
        .spawn()
        .map_err(spawn_error)?;

    Ok(SpawnedProcess { pid: child.id() })
}

/// Stop a process started by [`spawn_detached`], together with its group.
///
/// Returns `false` when the process was already gone.
#[cfg(unix)]
pub fn terminate_detached(pid: u32) -> Result<bool> {
    use nix::errno::Errno;
    use nix::sys::signal::{kill, killpg, Signal};
    use nix::unistd::Pid;

    let raw = i32::try_from(pid).with_context(|| format!("Pid out of range: {}", pid))?;
    if raw <= 1 {
        anyhow::bail!("Refusing to signal pid {}", pid);
    }
    let target = Pid::from_raw(raw);

    // The child leads its own session, so its pgid is its pid.
    if killpg(target, Signal::SIGTERM).is_ok() {
        return Ok(true);
    }

    match kill(target, Signal::SIGTERM) {
        Ok(()) => Ok(true),
        Err(Errno::ESRCH) => Ok(false),
        Err(e) => Err(e).with_context(|| format!("Failed to signal pid {}", pid)),
    }
}

/// Stop a process started by [`spawn_detached`], together with its tree.
///
/// Returns `false` when `taskkill` reports failure (usually: already gone).
#[cfg(windows)]
pub fn terminate_detached(pid: u32) -> Result<bool> {
    let result = run_command(&format!("taskkill /PID {} /T /F", pid))?;
    Ok(result.success)
}

/// Result of a command execution.
#[cfg(windows)]
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code (None if killed by signal)
    pub exit_code: Option<i32>,
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
    /// Whether the command succeeded (exit code 0)
    pub success: bool,
}

#[cfg(windows)]
impl CommandResult {
    /// Create from std::process::Output.
    pub fn from_output(output: std::process::Output) -> Self {
        Self {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
        }
    }
}

/// Run a `cmd /C` command and return the result.
#[cfg(windows)]
pub fn run_command(cmd: &str) -> Result<CommandResult> {
    let output = Command::new("cmd")
        .args(["/C", cmd])
        .output()
        .with_context(|| format!("Failed to execute command: {}", cmd))?;

    Ok(CommandResult::from_output(output))
}
