//! SessionEnd hook: Stop the session's `mgrep watch` and clear its pid file.
//!
//! Always exits 0; a missing or stale pid file only leaves a note in the
//! debug log.

use anyhow::Result;
use hook_common::prelude::*;

#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    NotRunning,
    Stopped,
    AlreadyGone,
    SignalFailed,
    StalePidFile,
}

fn main() -> Result<()> {
    let config = HookConfig::from_env()?;
    let debug = config.debug();

    let input = HookInput::read_optional(&debug).unwrap_or_else(|| {
        debug.log("No hook payload; continuing with default session");
        HookInput::default()
    });

    run(&config, &debug, &input)?;
    Ok(())
}

fn run(config: &HookConfig, debug: &DebugLog, input: &HookInput) -> Result<Outcome> {
    let state = config.state();
    let session = input.session_key();

    let pid = match state.load_pid(&session) {
        Ok(Some(pid)) => pid,
        Ok(None) => {
            debug.log(&format!("No PID file for session {}", session));
            return Ok(Outcome::NotRunning);
        }
        Err(e) => {
            debug.log(&format!("Discarding unreadable PID file: {:#}", e));
            state.delete_pid(&session)?;
            return Ok(Outcome::StalePidFile);
        }
    };

    let outcome = match terminate_detached(pid) {
        Ok(true) => {
            debug.log(&format!("Stopped mgrep watch process: {}", pid));
            Outcome::Stopped
        }
        Ok(false) => {
            debug.log(&format!("mgrep watch process already gone: {}", pid));
            Outcome::AlreadyGone
        }
        Err(e) => {
            debug.log(&format!("Failed to stop mgrep watch process {}: {:#}", pid, e));
            Outcome::SignalFailed
        }
    };

    state.delete_pid(&session)?;
    Ok(outcome)
}
