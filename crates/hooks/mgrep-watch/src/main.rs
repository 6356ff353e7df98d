//! SessionStart hook: Launch a detached `mgrep watch` for the session.
//!
//! Records the watcher's pid in `<tmp>/mgrep-watch-pid-<session>.txt` and
//! exits 1 without launching when that file already exists.

use anyhow::Result;
use hook_common::prelude::*;

const WATCHER_EXECUTABLE: &str = "mgrep";
const WATCH_SUBCOMMAND: &str = "watch";
const SKILL_HINT: &str = "You must load mgrep skill for searching and exploring rather than grep";

#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Launched,
    AlreadyRunning,
}

fn main() -> Result<()> {
    let config = HookConfig::from_env()?;
    let debug = config.debug();

    let input = HookInput::read_optional(&debug).unwrap_or_else(|| {
        debug.log("No hook payload; continuing with default session");
        HookInput::default()
    });

    match run(&config, &debug, &input, Platform::current())? {
        Outcome::Launched => {
            let output = HookOutput::session_start().with_context(SKILL_HINT);
            output.write_stdout()?;
            Ok(())
        }
        Outcome::AlreadyRunning => std::process::exit(1),
    }
}

fn run(
    config: &HookConfig,
    debug: &DebugLog,
    input: &HookInput,
    platform: Platform,
) -> Result<Outcome> {
    config.ensure_tmp_dir()?;

    let state = config.state();
    let session = input.session_key();
    let pid_path = state.pid_path(&session);
    if pid_path.exists() {
        debug.log(&format!("PID file already exists: {}", pid_path));
        return Ok(Outcome::AlreadyRunning);
    }

    let process = launch_watch(config, &state, &session, platform)?;
    debug.log(&format!("Started mgrep watch process: {}", process.pid));
    debug.log(&format!("Environment variables: {}", env_names().join(", ")));

    state.save_pid(&session, process.pid)?;
    Ok(Outcome::Launched)
}

/// Start `mgrep watch` detached, logging to the session's command log.
fn launch_watch(
    config: &HookConfig,
    state: &StateManager,
    session: &str,
    platform: Platform,
) -> Result<SpawnedProcess, LaunchError> {
    let log_path = state.command_log_path(session);
    let log = open_command_log(log_path.as_std_path())?;

    let program = resolve_executable(WATCHER_EXECUTABLE, config.search_path.as_deref())?;
    let plan = SpawnPlan::new(program, [WATCH_SUBCOMMAND], platform);

    spawn_detached(&plan, log)
}

/// Names of the current environment variables; values are never logged.
fn env_names() -> Vec<String> {
    let mut names: Vec<String> = std::env::vars_os()
        .map(|(name, _)| name.to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
